use clap::{Args, Parser, Subcommand};

use crate::paths::ENV_HOME;

#[derive(Parser)]
#[command(name = "dbfleet")]
#[command(version)]
#[command(about = "Deploy, scale and upgrade distributed database clusters over SSH", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Profile directory (default: ~/.dbfleet)
    #[arg(long, global = true, env = ENV_HOME)]
    pub home: Option<String>,

    /// Bound on concurrent tasks per parallel step (overrides config.toml)
    #[arg(short, long, global = true)]
    pub jobs: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Upgrade a cluster to a newer version
    Upgrade(UpgradeArgs),

    /// Remove instances from a cluster
    ScaleIn(ScaleInArgs),

    /// Start every instance of a cluster
    Start(ClusterArgs),

    /// Stop every instance of a cluster
    Stop(StopArgs),

    /// Stop then start every instance of a cluster
    Restart(StopArgs),

    /// Show the live status of every instance
    Status(ClusterArgs),

    /// Remove every instance and the cluster's local metadata
    Destroy(DestroyArgs),
}

#[derive(Args)]
pub struct ClusterArgs {
    /// Cluster name
    pub cluster: String,
}

#[derive(Args)]
pub struct StopArgs {
    /// Cluster name
    pub cluster: String,

    /// Kill processes instead of stopping them gracefully
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct UpgradeArgs {
    /// Cluster name
    pub cluster: String,

    /// Version to upgrade to
    #[arg(short = 't', long = "target-version")]
    pub target_version: String,

    /// Restart without a graceful leader handoff
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ScaleInArgs {
    /// Cluster name
    pub cluster: String,

    /// Instance IDs (host:port) to remove
    #[arg(short = 'N', long = "node", required = true, value_delimiter = ',')]
    pub nodes: Vec<String>,

    /// Kill removed instances instead of stopping them gracefully
    #[arg(long)]
    pub force: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct DestroyArgs {
    /// Cluster name
    pub cluster: String,

    /// Kill processes instead of stopping them gracefully
    #[arg(long)]
    pub force: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_scale_in_nodes_are_comma_delimited() {
        let cli = Cli::parse_from([
            "dbfleet",
            "scale-in",
            "prod",
            "--node",
            "10.0.2.1:20160,10.0.3.1:4000",
            "-N",
            "10.0.3.2:4000",
        ]);
        let Command::ScaleIn(args) = cli.command else {
            panic!("expected scale-in");
        };
        assert_eq!(args.nodes, vec!["10.0.2.1:20160", "10.0.3.1:4000", "10.0.3.2:4000"]);
        assert!(!args.force);
    }

    #[test]
    fn test_destroy_flags() {
        let cli = Cli::parse_from(["dbfleet", "destroy", "prod", "-y"]);
        let Command::Destroy(args) = cli.command else {
            panic!("expected destroy");
        };
        assert_eq!(args.cluster, "prod");
        assert!(args.yes);
        assert!(!args.force);
    }

    #[test]
    fn test_upgrade_requires_target() {
        assert!(Cli::try_parse_from(["dbfleet", "upgrade", "prod"]).is_err());
        let cli = Cli::parse_from(["dbfleet", "-vv", "upgrade", "prod", "-t", "v4.0.0", "--force"]);
        assert_eq!(cli.verbose, 2);
        let Command::Upgrade(args) = cli.command else {
            panic!("expected upgrade");
        };
        assert_eq!(args.target_version, "v4.0.0");
        assert!(args.force);
    }
}
