use std::path::PathBuf;
use std::time::Duration;

use brity_relay_core::StoreConfig;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "brity-relay")]
#[command(about = "Manage Brity Relay sending accounts", long_about = None)]
pub struct Cli {
    /// Accounts file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub file: Option<PathBuf>,

    /// Longest time a mutation waits for the store lock
    #[arg(long, global = true)]
    pub lock_timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print every account record
    List,
    /// Print accounts without header or cookie contents
    Summaries,
    /// Print one account
    Get { account_id: String },
    /// Add an account from a JSON object (`@path` reads it from a file)
    Create { candidate: String },
    /// Replace an account; the new record may rename it
    Update {
        account_id: String,
        candidate: String,
    },
    /// Remove an account
    Delete { account_id: String },
    /// Make an account the active sending account
    Select { account_id: String },
    /// Clear an account's active flag
    Deselect { account_id: String },
    /// Show which account a worker would send as
    Resolve {
        #[arg(long)]
        account_id: Option<String>,
        #[arg(long)]
        sender: Option<String>,
    },
}

impl Cli {
    /// Environment settings overlaid with command-line flags
    pub fn store_config(&self) -> StoreConfig {
        let mut config = StoreConfig::from_env();
        if let Some(ref path) = self.file {
            config.path.clone_from(path);
        }
        if let Some(ms) = self.lock_timeout_ms {
            config = config.with_lock_timeout(Duration::from_millis(ms));
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "brity-relay",
            "--file",
            "/tmp/relay/accounts.json",
            "--lock-timeout-ms",
            "250",
            "list",
        ]);
        let config = cli.store_config();
        assert_eq!(config.path, PathBuf::from("/tmp/relay/accounts.json"));
        assert_eq!(config.lock_timeout, Duration::from_millis(250));
    }

    #[test]
    fn parses_update_and_resolve() {
        let cli = Cli::parse_from(["brity-relay", "update", "a1", "{\"account_id\":\"a2\"}"]);
        assert!(matches!(
            cli.command,
            Commands::Update { ref account_id, .. } if account_id == "a1"
        ));

        let cli = Cli::parse_from(["brity-relay", "resolve", "--sender", "x@y.com"]);
        match cli.command {
            Commands::Resolve { account_id, sender } => {
                assert!(account_id.is_none());
                assert_eq!(sender.as_deref(), Some("x@y.com"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
