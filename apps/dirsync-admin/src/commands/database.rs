//! Schema migration and installation bootstrap

use clap::Args;
use dirsync_db::bootstrap::ensure_installation;
use dirsync_db::run_migrations;
use serde_json::json;
use tracing::info;

use crate::context::AppContext;
use crate::error::CliResult;
use crate::output::print_json;

/// Arguments for the bootstrap command
#[derive(Args, Debug)]
pub struct BootstrapArgs {
    /// Skip running migrations first
    #[arg(long)]
    pub skip_migrations: bool,
}

pub async fn execute_migrate() -> CliResult<()> {
    let ctx = AppContext::connect().await?;
    let result = migrate(&ctx).await;
    ctx.finish(result).await
}

async fn migrate(ctx: &AppContext) -> CliResult<()> {
    run_migrations(ctx.pool()).await?;
    info!("Database schema is up to date");
    print_json(&json!({ "migrated": true }))
}

pub async fn execute_bootstrap(args: BootstrapArgs) -> CliResult<()> {
    let ctx = AppContext::connect().await?;
    let result = bootstrap(&ctx, &args).await;
    ctx.finish(result).await
}

async fn bootstrap(ctx: &AppContext, args: &BootstrapArgs) -> CliResult<()> {
    if !args.skip_migrations {
        run_migrations(ctx.pool()).await?;
    }
    let result = ensure_installation(&ctx.systems()).await?;
    print_json(&result)
}
