use weakform::options::{AssemblyOptions, DiagonalPolicy};

#[test]
fn default_options() {
    let options = AssemblyOptions::default();
    assert!(options.skip_zeros);
    assert!(!options.parallel);
    assert_eq!(options.diagonal_policy, DiagonalPolicy::One);
}

#[test]
fn option_builders() {
    let options = AssemblyOptions::default()
        .with_skip_zeros(false)
        .with_diagonal_policy(DiagonalPolicy::Keep)
        .with_parallel(true);
    assert_eq!(
        options,
        AssemblyOptions {
            skip_zeros: false,
            diagonal_policy: DiagonalPolicy::Keep,
            parallel: true,
        }
    );
}

#[test]
fn options_deserialize_with_defaults() {
    let options: AssemblyOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(options, AssemblyOptions::default());

    let options: AssemblyOptions = serde_json::from_str(r#"{ "diagonal_policy": "Keep", "parallel": true }"#).unwrap();
    assert_eq!(options.diagonal_policy, DiagonalPolicy::Keep);
    assert!(options.parallel);
    assert!(options.skip_zeros);

    let json = serde_json::to_string(&options).unwrap();
    assert_eq!(serde_json::from_str::<AssemblyOptions>(&json).unwrap(), options);
}
