//! Version and usage output.

/// The current version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const USAGE: &str = "Usage: <twitch-name> <keyvault clientid> <keyvault certificate>";

/// Handle the --version command.
pub fn handle_version_command() -> ! {
    println!("streambot {}", VERSION);
    std::process::exit(0)
}

/// Print usage and exit with a failure status.
pub fn handle_usage_command() -> ! {
    println!("{}", USAGE);
    std::process::exit(2)
}
