//! External directory commands

use clap::{Args, Subcommand};
use dirsync_connector::ExternalDirectorySource;
use serde_json::json;

use crate::context::directory_from_env;
use crate::error::CliResult;
use crate::output::print_json;

/// Directory commands
#[derive(Args, Debug)]
pub struct DirectoryArgs {
    #[command(subcommand)]
    pub command: DirectoryCommands,
}

#[derive(Subcommand, Debug)]
pub enum DirectoryCommands {
    /// Bind to the directory and run a trivial search
    Test,
}

pub async fn execute(args: DirectoryArgs) -> CliResult<()> {
    match args.command {
        DirectoryCommands::Test => {
            let directory = directory_from_env()?;
            directory.test_connection().await?;
            print_json(&json!({ "directory": directory.display_name(), "reachable": true }))
        }
    }
}
