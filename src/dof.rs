//! Signed degree-of-freedom indices.
//!
//! Vector-valued bases (edge or face elements) are shared between neighboring elements whose
//! local orientations may disagree. Each local basis function is therefore associated with a
//! global DOF *and* an orientation, and every scatter or gather multiplies by the
//! corresponding sign: an element matrix entry `(i, j)` contributes
//! `sign_i * sign_j * block[(i, j)]` to the global matrix.
//!
//! Legacy code often packs both pieces of information into one signed integer, where a
//! negative value `d` denotes the global DOF `-1 - d` with flipped orientation.
//! [`encode_signed_index`] and [`decode_signed_index`] convert between that representation
//! and [`SignedDof`].
use crate::Real;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Positive,
    Negative,
}

impl Orientation {
    pub fn flipped(self) -> Self {
        match self {
            Orientation::Positive => Orientation::Negative,
            Orientation::Negative => Orientation::Positive,
        }
    }

    /// The orientation of the product of two signs.
    pub fn compose(self, other: Orientation) -> Self {
        if self == other {
            Orientation::Positive
        } else {
            Orientation::Negative
        }
    }

    pub fn sign<T: Real>(self) -> T {
        match self {
            Orientation::Positive => T::one(),
            Orientation::Negative => -T::one(),
        }
    }
}

/// A global DOF index together with the orientation of the local basis function.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SignedDof {
    index: usize,
    orientation: Orientation,
}

impl SignedDof {
    pub const fn new(index: usize, orientation: Orientation) -> Self {
        Self { index, orientation }
    }

    pub const fn positive(index: usize) -> Self {
        Self::new(index, Orientation::Positive)
    }

    pub const fn negative(index: usize) -> Self {
        Self::new(index, Orientation::Negative)
    }

    /// The (non-negative) global index.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn is_negative(&self) -> bool {
        self.orientation == Orientation::Negative
    }

    pub fn sign<T: Real>(&self) -> T {
        self.orientation.sign()
    }
}

impl From<usize> for SignedDof {
    fn from(index: usize) -> Self {
        SignedDof::positive(index)
    }
}

impl fmt::Display for SignedDof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.orientation {
            Orientation::Positive => write!(f, "+{}", self.index),
            Orientation::Negative => write!(f, "-{}", self.index),
        }
    }
}

/// Packs a signed DOF into the legacy integer representation.
///
/// Positive DOFs map to their index, negative DOFs `g` map to `-1 - g`.
///
/// # Panics
///
/// Panics if the index does not fit in an `isize`.
pub fn encode_signed_index(dof: SignedDof) -> isize {
    let index = isize::try_from(dof.index()).expect("DOF index does not fit in isize");
    match dof.orientation() {
        Orientation::Positive => index,
        Orientation::Negative => -1 - index,
    }
}

/// Unpacks the legacy integer representation of a signed DOF.
pub fn decode_signed_index(d: isize) -> SignedDof {
    if d >= 0 {
        SignedDof::positive(d.unsigned_abs())
    } else {
        // -1 - d >= 0 for d < 0, and cannot overflow
        SignedDof::negative((-1 - d).unsigned_abs())
    }
}

/// Decodes a whole list of legacy signed indices.
pub fn decode_signed_indices(indices: &[isize]) -> Vec<SignedDof> {
    indices.iter().copied().map(decode_signed_index).collect()
}
