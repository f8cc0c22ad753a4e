//! System key/value commands

use std::collections::BTreeMap;

use clap::{Args, Subcommand};
use dirsync_db::{SystemRecord, SystemStore};
use serde_json::json;

use crate::context::AppContext;
use crate::error::CliResult;
use crate::output::print_json;

/// System setting commands
#[derive(Args, Debug)]
pub struct SystemArgs {
    #[command(subcommand)]
    pub command: SystemCommands,
}

#[derive(Subcommand, Debug)]
pub enum SystemCommands {
    /// List every setting
    List,

    /// Show one setting
    Get {
        /// Setting name
        name: String,
    },

    /// Create or overwrite a setting
    Set {
        /// Setting name
        name: String,
        /// Value to store
        value: String,
    },

    /// Store a setting only if it has no value yet
    Init {
        /// Setting name
        name: String,
        /// Value to store when absent
        value: String,
    },

    /// Permanently delete a setting
    Delete {
        /// Setting name
        name: String,
    },
}

/// Execute system commands
pub async fn execute(args: SystemArgs) -> CliResult<()> {
    let ctx = AppContext::connect().await?;
    let result = run(&ctx.systems(), args.command).await;
    ctx.finish(result).await
}

async fn run(store: &SystemStore, command: SystemCommands) -> CliResult<()> {
    match command {
        SystemCommands::List => {
            let all: BTreeMap<String, String> = store.get_all().await?.into_iter().collect();
            print_json(&all)
        }
        SystemCommands::Get { name } => {
            let record = store.get_by_name(&name).await?;
            print_json(&record)
        }
        SystemCommands::Set { name, value } => {
            let record = SystemRecord::new(name, value);
            store.save_or_update(&record).await?;
            print_json(&record)
        }
        SystemCommands::Init { name, value } => {
            let (record, inserted) = store
                .insert_if_absent(&SystemRecord::new(name, value))
                .await?;
            print_json(&json!({ "record": record, "inserted": inserted }))
        }
        SystemCommands::Delete { name } => {
            let deleted = store.permanent_delete_by_name(&name).await?;
            print_json(&json!({ "name": name, "deleted": deleted }))
        }
    }
}
