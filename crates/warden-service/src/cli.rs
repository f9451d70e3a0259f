use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "warden", version)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decide a single access check against a fixture.
    Check {
        #[arg(long)]
        fixture: PathBuf,
        #[arg(long)]
        user: String,
        #[arg(long)]
        kind: String,
        #[arg(long)]
        resource: String,
        /// Workspace the resource must belong to.
        #[arg(long)]
        via: Option<String>,
        #[arg(long)]
        action: String,
    },
    /// List the actions defined for a resource kind.
    Actions {
        #[arg(long)]
        kind: String,
    },
    /// List the roles of a resource kind with the actions they allow.
    Roles {
        #[arg(long)]
        kind: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_parses_check_subcommand() {
        let cli = Cli::parse_from([
            "warden",
            "check",
            "--fixture",
            "fixture.toml",
            "--user",
            "u1",
            "--kind",
            "document",
            "--resource",
            "d1",
            "--action",
            "Write",
        ]);
        assert!(matches!(
            cli.command,
            Command::Check { ref user, ref kind, ref via, .. }
                if user == "u1" && kind == "document" && via.is_none()
        ));
    }

    #[test]
    fn cli_parses_check_with_via() {
        let cli = Cli::parse_from([
            "warden",
            "check",
            "--fixture",
            "fixture.toml",
            "--user",
            "u1",
            "--kind",
            "document",
            "--resource",
            "d1",
            "--via",
            "w1",
            "--action",
            "Doc.Read",
        ]);
        assert!(matches!(
            cli.command,
            Command::Check { via: Some(ref w), ref action, .. } if w == "w1" && action == "Doc.Read"
        ));
    }

    #[test]
    fn cli_check_requires_action() {
        let result = Cli::try_parse_from([
            "warden",
            "check",
            "--fixture",
            "fixture.toml",
            "--user",
            "u1",
            "--kind",
            "workspace",
            "--resource",
            "w1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parses_actions_subcommand() {
        let cli = Cli::parse_from(["warden", "actions", "--kind", "workspace"]);
        assert!(matches!(cli.command, Command::Actions { ref kind } if kind == "workspace"));
    }

    #[test]
    fn cli_config_flag_works_after_subcommand() {
        let cli = Cli::parse_from([
            "warden",
            "roles",
            "--kind",
            "document",
            "--config",
            "/etc/warden.toml",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/warden.toml")));
        assert!(matches!(cli.command, Command::Roles { ref kind } if kind == "document"));
    }

    #[test]
    fn cli_requires_subcommand() {
        let result = Cli::try_parse_from(["warden"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_version_flag() {
        let result = Cli::try_parse_from(["warden", "--version"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
