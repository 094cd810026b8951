//! Lookout CLI - Command line interface for the Lookout status dashboard
//!
//! Shows the PRs and issues that need a user's attention, grouped by parent
//! and bucketed by project iteration.

mod commands;

use clap::{Parser, Subcommand};
use lookout_core::{Config, Secrets};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::GithubArgs;

/// Lookout: a personal status dashboard
#[derive(Parser, Debug)]
#[command(name = "lookout")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// GitHub username (overrides config and env)
    #[arg(long, global = true, env = "GITHUB_USERNAME")]
    username: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Print the GitHub dashboard as JSON
    #[command(visible_alias = "gh")]
    Github(GithubArgs),

    /// Show current configuration
    Config,

    /// Create a secrets file template
    InitSecrets,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries JSON
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = Config::load_with_overrides(cli.username.clone())?;

    if cli.verbose {
        tracing::info!(
            username = ?config.github.username(),
            api_url = %config.github.api_url,
            timeout = ?config.github.timeout,
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("lookout {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Github(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Config) => {
            let github = &config.github;
            println!("Lookout Configuration");
            println!("=====================");
            println!();
            println!("GitHub Settings:");
            println!("  username: {}", github.username().unwrap_or("(not set)"));
            println!("  api_url: {}", github.api_url);
            println!("  graphql_url: {}", github.graphql_url);
            println!("  timeout: {}s", github.timeout.as_secs());
            println!("  closed_window_days: {}", github.closed_window_days);
            println!();
            if let Some(path) = Config::default_config_path() {
                println!("Config file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - using defaults)");
                }
            }
            if let Some(path) = Secrets::default_secrets_path() {
                println!("Secrets file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - run `lookout init-secrets`)");
                }
            }
        }
        Some(Commands::InitSecrets) => {
            let path = Secrets::create_template()?;
            println!("Created secrets template at {}", path.display());
            println!("Add your GitHub token, or set GITHUB_TOKEN instead.");
        }
        None => {
            println!("Lookout - a personal status dashboard");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
