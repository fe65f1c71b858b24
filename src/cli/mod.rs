//! Command-line interface for citeline

pub mod args;

pub use args::{Args, Commands, Verbosity};
