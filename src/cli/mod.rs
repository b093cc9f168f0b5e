//! Command-line interface.
//!
//! Called first in `main()`; `--version` and usage exit here, otherwise
//! the parsed [`StartupArgs`] are handed back.
//!
//! ```ignore
//! use streambot::cli::{parse_args, resolve_command};
//!
//! let args = resolve_command(parse_args(std::env::args()));
//! ```

pub mod args;
pub mod version;

pub use args::{parse_args, CliCommand, StartupArgs};
pub use version::{handle_usage_command, handle_version_command, USAGE, VERSION};

/// Run informational commands and return the arguments to start with.
///
/// `Version` and `Usage` never return.
pub fn resolve_command(command: CliCommand) -> StartupArgs {
    match command {
        CliCommand::Version => handle_version_command(),
        CliCommand::Usage => handle_usage_command(),
        CliCommand::Run(args) => args,
    }
}
