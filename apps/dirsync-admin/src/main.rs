//! dirsync-admin - Administration CLI for dirsync
//!
//! This CLI enables operators to:
//! - Run schema migrations and bootstrap the installation identity
//! - Inspect and edit system settings
//! - Link, unlink and list directory groups
//! - Attach teams and channels to linked groups
//! - Check connectivity to the external directory
//!
//! Configuration comes from the environment (and `.env` if present).
//! Results are printed as JSON on stdout; logs go to stderr.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod context;
mod error;
mod output;

use error::CliResult;

/// dirsync-admin - Directory group sync administration
#[derive(Parser, Debug)]
#[command(name = "dirsync-admin")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply pending database migrations
    Migrate,

    /// Define the installation identity if it does not exist yet
    Bootstrap(commands::database::BootstrapArgs),

    /// Manage system settings
    System(commands::system::SystemArgs),

    /// Manage linked groups
    Groups(commands::groups::GroupsArgs),

    /// External directory diagnostics
    Directory(commands::directory::DirectoryArgs),
}

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,dirsync=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Migrate => commands::database::execute_migrate().await,
        Commands::Bootstrap(args) => commands::database::execute_bootstrap(args).await,
        Commands::System(args) => commands::system::execute(args).await,
        Commands::Groups(args) => commands::groups::execute(args).await,
        Commands::Directory(args) => commands::directory::execute(args).await,
    }
}
