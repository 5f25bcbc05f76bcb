//! Command-line configuration and process bootstrap for the level bot.

pub mod bootstrap_helpers;
pub mod cli_args;
pub mod validation;

pub use bootstrap_helpers::init_tracing;
pub use cli_args::Cli;
pub use validation::resolve_non_empty_cli_value;
