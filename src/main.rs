//! ride-estimate - poll ride price estimates between two places
//!
//! Authorizes against the rides API with the OAuth2 authorization code
//! grant, then prints a round-trip fare summary on a fixed interval.

mod api;
mod auth;
mod config;
mod models;
mod places;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::EstimateOptions;
use config::Paths;

const DEFAULT_FROM: &str = "home";
const DEFAULT_TO: &str = "work";
const DEFAULT_INTERVAL_SECS: u64 = 300;

#[derive(Parser)]
#[command(name = "ride-estimate")]
#[command(about = "Poll ride price estimates between two named places", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// App config file (client_id, client_secret, redirect_url)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Credential store file
    #[arg(long, global = true)]
    store: Option<PathBuf>,
}

#[derive(Args, Clone, Debug, PartialEq)]
struct RouteArgs {
    /// Origin place name
    #[arg(short, long, default_value = DEFAULT_FROM)]
    from: String,

    /// Destination place name
    #[arg(short, long, default_value = DEFAULT_TO)]
    to: String,

    /// Print the first product and the full estimate for each direction
    #[arg(short, long)]
    detail: bool,
}

impl Default for RouteArgs {
    fn default() -> Self {
        Self {
            from: DEFAULT_FROM.to_string(),
            to: DEFAULT_TO.to_string(),
            detail: false,
        }
    }
}

impl From<RouteArgs> for EstimateOptions {
    fn from(args: RouteArgs) -> Self {
        Self {
            from: args.from,
            to: args.to,
            detail: args.detail,
        }
    }
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Poll estimates until interrupted (default)
    Watch {
        #[command(flatten)]
        route: RouteArgs,

        /// Seconds between polls
        #[arg(short, long, default_value_t = DEFAULT_INTERVAL_SECS)]
        interval: u64,
    },

    /// Print a single round-trip estimate
    Estimate {
        #[command(flatten)]
        route: RouteArgs,
    },

    /// Authorize the app and store the credential
    Login {
        /// Force the authorization flow even if a valid credential exists
        #[arg(short, long)]
        force: bool,
    },

    /// Exchange the stored refresh token for a new access token
    Refresh,

    /// Remove the stored credential
    Logout,

    /// Show current authentication status
    Status,

    /// List known places
    Places,
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Watch {
            route: RouteArgs::default(),
            interval: DEFAULT_INTERVAL_SECS,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let paths = Paths::resolve(cli.config, cli.store)?;

    let command = cli.command.unwrap_or_default();

    match command {
        Commands::Watch { route, interval } => {
            api::watch(&paths, &route.into(), Duration::from_secs(interval)).await?;
        }
        Commands::Estimate { route } => {
            api::estimate_once(&paths, &route.into()).await?;
        }
        Commands::Login { force } => {
            tracing::info!("Starting authorization flow...");
            auth::login(&paths, force).await?;
        }
        Commands::Refresh => {
            if !auth::refresh(&paths).await? {
                println!("No stored refresh token. Run 'ride-estimate login'.");
            } else {
                println!("Token refreshed successfully.");
            }
        }
        Commands::Logout => {
            tracing::info!("Logging out...");
            auth::logout(&paths).await?;
        }
        Commands::Status => {
            auth::status(&paths).await?;
        }
        Commands::Places => {
            api::list_places(&paths)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_parses() {
        let cli = Cli::try_parse_from(["ride-estimate"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_bare_watch_matches_default_command() {
        let cli = Cli::try_parse_from(["ride-estimate", "watch"]).unwrap();
        assert_eq!(cli.command, Some(Commands::default()));
    }

    #[test]
    fn test_estimate_defaults_match_route_default() {
        let cli = Cli::try_parse_from(["ride-estimate", "estimate"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Estimate {
                route: RouteArgs::default(),
            })
        );
    }

    #[test]
    fn test_watch_args() {
        let cli = Cli::try_parse_from([
            "ride-estimate",
            "watch",
            "--from",
            "work",
            "--to",
            "home",
            "--interval",
            "60",
            "--detail",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Watch { route, interval }) => {
                assert_eq!(route.from, "work");
                assert_eq!(route.to, "home");
                assert!(route.detail);
                assert_eq!(interval, 60);
            }
            _ => panic!("expected watch"),
        }
    }

    #[test]
    fn test_global_store_flag() {
        let cli =
            Cli::try_parse_from(["ride-estimate", "status", "--store", "/tmp/x.toml"]).unwrap();
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/x.toml")));
    }
}
