//! Command-line interface.

pub mod args;
pub mod dispatcher;

pub use args::{Cli, Commands, CompletionsArgs, RunArgs, VersionsArgs};
pub use dispatcher::CommandDispatcher;
