mod eliminate;
mod options;
mod space;
