use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "reel-sync")]
#[command(about = "Keep a local media tree in step with its cloud mirror and catalog", long_about = None)]
pub struct Cli {
    /// Make changes. Without it every command is a dry run that prints the plan
    #[arg(long, global = true)]
    pub apply: bool,

    /// Only process this year folder
    #[arg(long, global = true, value_name = "YYYY")]
    pub year: Option<i32>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sync the mirror into the local tree, then reconcile the catalog (default)
    Run,
    /// Dedupe and copy from the remote mirror into the local tree
    Sync,
    /// Reconcile the catalog against the local tree
    Catalog,
    /// Print configuration values
    PrintConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_dry_run() {
        let cli = Cli::parse_from(["reel-sync"]);
        assert!(!cli.apply);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["reel-sync", "catalog", "--apply", "--year", "2024"]);
        assert!(cli.apply);
        assert_eq!(cli.year, Some(2024));
        assert!(matches!(cli.command, Some(Commands::Catalog)));
    }
}
