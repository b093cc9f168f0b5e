//! Command-line argument parsing.
//!
//! The bot takes three positional arguments: the chat identity it logs in
//! as, the secret-store client id, and the path of the client certificate.

use std::path::PathBuf;

/// Positional arguments needed to start the bot.
#[derive(Debug, Clone, PartialEq)]
pub struct StartupArgs {
    pub chat_identity: String,
    pub client_id: String,
    pub certificate_path: PathBuf,
}

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Print usage (explicit `--help` or missing arguments)
    Usage,
    /// Run the bot
    Run(StartupArgs),
}

/// Parse command-line arguments and return the appropriate command.
///
/// # Examples
///
/// ```
/// use streambot::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["streambot".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    let mut positional = Vec::new();
    for arg in args.skip(1) {
        // Skip the program name
        match arg.as_str() {
            "--version" | "-V" => return CliCommand::Version,
            "--help" | "-h" => return CliCommand::Usage,
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    match (positional.next(), positional.next(), positional.next()) {
        (Some(chat_identity), Some(client_id), Some(certificate)) => {
            CliCommand::Run(StartupArgs {
                chat_identity,
                client_id,
                certificate_path: PathBuf::from(certificate),
            })
        }
        _ => CliCommand::Usage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        std::iter::once("streambot".to_string())
            .chain(list.iter().map(|s| s.to_string()))
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn test_parse_version_flag() {
        assert_eq!(parse_args(args(&["--version"])), CliCommand::Version);
        assert_eq!(parse_args(args(&["-V"])), CliCommand::Version);
    }

    #[test]
    fn test_parse_help_flag() {
        assert_eq!(parse_args(args(&["--help"])), CliCommand::Usage);
    }

    #[test]
    fn test_parse_run() {
        assert_eq!(
            parse_args(args(&["mybot", "vault-client", "/etc/bot.pem"])),
            CliCommand::Run(StartupArgs {
                chat_identity: "mybot".to_string(),
                client_id: "vault-client".to_string(),
                certificate_path: PathBuf::from("/etc/bot.pem"),
            })
        );
    }

    #[test]
    fn test_too_few_args_is_usage() {
        assert_eq!(parse_args(args(&[])), CliCommand::Usage);
        assert_eq!(parse_args(args(&["mybot", "vault-client"])), CliCommand::Usage);
    }

    #[test]
    fn test_extra_args_are_ignored() {
        assert!(matches!(
            parse_args(args(&["a", "b", "c", "d"])),
            CliCommand::Run(_)
        ));
    }
}
