//! Command-line interface components
//!
//! Argument parsing and the handlers behind the two entry points: the
//! benchmark itself and the hidden single-unit worker command.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, GlobalArgs, UnitArgs};
pub use commands::{handle_bench, handle_unit};
