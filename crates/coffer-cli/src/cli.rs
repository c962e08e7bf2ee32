use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CLI surface definition. Deliberately thin: every command maps 1:1 onto
/// a vault operation, and no vault logic lives in this crate.
#[derive(Parser, Debug)]
#[command(
    name = "coffer",
    about = "Encrypted file vault: files at rest are sealed under per-file keys",
    version,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Store a file under a name, replacing any previous entry.
    Put {
        /// Logical name the file is addressed by.
        name: String,
        /// Path of the file to read.
        file: PathBuf,
    },
    /// Fetch and verify a stored file.
    Get {
        name: String,
        /// Write to this path instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Remove a stored file.
    Rm { name: String },
    /// List stored names.
    Ls,
    /// Run a round-trip check of the vault machinery.
    Health,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version and exit.
    Version,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_put_with_name_and_file() {
        let cli = Cli::try_parse_from(["coffer", "put", "report.txt", "/tmp/report.txt"])
            .expect("parse should succeed");
        assert_eq!(
            cli.command,
            Command::Put {
                name: "report.txt".into(),
                file: PathBuf::from("/tmp/report.txt"),
            }
        );
    }

    #[test]
    fn parses_get_with_output_flag() {
        let cli = Cli::try_parse_from(["coffer", "get", "report.txt", "-o", "/tmp/out"])
            .expect("parse should succeed");
        assert_eq!(
            cli.command,
            Command::Get {
                name: "report.txt".into(),
                output: Some(PathBuf::from("/tmp/out")),
            }
        );
    }

    #[test]
    fn parses_ls_and_health() {
        let cli = Cli::try_parse_from(["coffer", "ls"]).expect("parse should succeed");
        assert_eq!(cli.command, Command::Ls);

        let cli = Cli::try_parse_from(["coffer", "health"]).expect("parse should succeed");
        assert_eq!(cli.command, Command::Health);
    }

    #[test]
    fn parses_config_init_subcommand() {
        let cli = Cli::try_parse_from(["coffer", "config", "init"]).expect("parse should succeed");
        assert_eq!(cli.command, Command::Config(ConfigCommand::Init));
    }

    #[test]
    fn rejects_bare_invocation() {
        assert!(Cli::try_parse_from(["coffer"]).is_err());
    }
}
