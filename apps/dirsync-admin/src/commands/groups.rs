//! Linked group commands

use clap::{Args, Subcommand, ValueEnum};
use dirsync_core::{DirsyncError, GroupRepository, GroupSource, InternalGroup};
use dirsync_db::{PgGroupRepository, SyncableKind};
use dirsync_reconcile::GroupListFilter;
use serde_json::json;

use crate::context::AppContext;
use crate::error::{CliError, CliResult};
use crate::output::print_json;

/// Linked group commands
#[derive(Args, Debug)]
pub struct GroupsArgs {
    #[command(subcommand)]
    pub command: GroupsCommands,
}

#[derive(Subcommand, Debug)]
pub enum GroupsCommands {
    /// List directory groups with their link state
    List(ListArgs),

    /// Link a directory group
    Link {
        /// Identifier of the group in the directory
        remote_id: String,
    },

    /// Unlink a directory group
    Unlink {
        /// Identifier of the group in the directory
        remote_id: String,
    },

    /// Attach a team or channel to a linked group
    Attach(SyncableArgs),

    /// Detach a team or channel from a linked group
    Detach(SyncableArgs),

    /// Show the teams and channels attached to a linked group
    Syncables {
        /// Identifier of the group in the directory
        remote_id: String,
    },

    /// Refresh every linked group from the directory
    Sync,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Case-insensitive display name substring
    #[arg(long, short)]
    pub query: Option<String>,

    /// Only linked (true) or unlinked (false) groups
    #[arg(long)]
    pub linked: Option<bool>,

    /// Only configured (true) or unconfigured (false) groups
    #[arg(long)]
    pub configured: Option<bool>,

    /// Zero-based page index
    #[arg(long, default_value = "0")]
    pub page: u32,

    /// Groups per page
    #[arg(long, default_value = "50")]
    pub per_page: u32,
}

#[derive(Args, Debug)]
pub struct SyncableArgs {
    /// Identifier of the group in the directory
    pub remote_id: String,

    /// Team or channel identifier
    pub syncable_id: String,

    /// Kind of syncable
    #[arg(long, value_enum, default_value = "team")]
    pub kind: KindArg,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum KindArg {
    Team,
    Channel,
}

impl From<KindArg> for SyncableKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Team => SyncableKind::Team,
            KindArg::Channel => SyncableKind::Channel,
        }
    }
}

/// Execute group commands
pub async fn execute(args: GroupsArgs) -> CliResult<()> {
    let ctx = AppContext::connect().await?;

    let result = match args.command {
        GroupsCommands::List(a) => execute_list(&ctx, a).await,
        GroupsCommands::Link { remote_id } => execute_link(&ctx, &remote_id).await,
        GroupsCommands::Unlink { remote_id } => execute_unlink(&ctx, &remote_id).await,
        GroupsCommands::Attach(a) => execute_attach(&ctx, a).await,
        GroupsCommands::Detach(a) => execute_detach(&ctx, a).await,
        GroupsCommands::Syncables { remote_id } => execute_syncables(&ctx, &remote_id).await,
        GroupsCommands::Sync => execute_sync(&ctx).await,
    };

    ctx.finish(result).await
}

async fn execute_list(ctx: &AppContext, args: ListArgs) -> CliResult<()> {
    let filter = GroupListFilter {
        query: args.query,
        is_linked: args.linked,
        is_configured: args.configured,
    };
    let page = ctx
        .reconciler()?
        .list_merged(args.page, args.per_page, &filter)
        .await?;
    print_json(&page)
}

async fn execute_link(ctx: &AppContext, remote_id: &str) -> CliResult<()> {
    let result = ctx.reconciler()?.link(remote_id).await?;
    print_json(&json!({
        "status": result.outcome.status_code(),
        "outcome": result.outcome,
        "group": result.group,
    }))
}

async fn execute_unlink(ctx: &AppContext, remote_id: &str) -> CliResult<()> {
    let outcome = ctx.reconciler()?.unlink(remote_id).await?;
    print_json(&json!({ "remote_id": remote_id, "outcome": outcome }))
}

async fn execute_sync(ctx: &AppContext) -> CliResult<()> {
    let report = ctx.reconciler()?.sync().await?;
    print_json(&report)
}

async fn execute_attach(ctx: &AppContext, args: SyncableArgs) -> CliResult<()> {
    let groups = ctx.groups();
    let group = active_group(&groups, &args.remote_id).await?;
    let attached = groups
        .attach_syncable(&group.id, &args.syncable_id, args.kind.into())
        .await?;
    print_json(&json!({
        "group_id": group.id,
        "syncable_id": args.syncable_id,
        "attached": attached,
    }))
}

async fn execute_detach(ctx: &AppContext, args: SyncableArgs) -> CliResult<()> {
    let groups = ctx.groups();
    let group = linked_group(&groups, &args.remote_id).await?;
    let detached = groups
        .detach_syncable(&group.id, &args.syncable_id, args.kind.into())
        .await?;
    print_json(&json!({
        "group_id": group.id,
        "syncable_id": args.syncable_id,
        "detached": detached,
    }))
}

async fn execute_syncables(ctx: &AppContext, remote_id: &str) -> CliResult<()> {
    let groups = ctx.groups();
    let group = linked_group(&groups, remote_id).await?;
    let syncables = groups.list_syncables(&group.id).await?;
    print_json(&syncables)
}

/// The internal group for `remote_id`, active or tombstoned.
async fn linked_group(groups: &PgGroupRepository, remote_id: &str) -> CliResult<InternalGroup> {
    groups
        .get_by_remote_id(remote_id, GroupSource::ExternalDirectory)
        .await?
        .ok_or_else(|| DirsyncError::not_found("group", remote_id).into())
}

async fn active_group(groups: &PgGroupRepository, remote_id: &str) -> CliResult<InternalGroup> {
    let group = linked_group(groups, remote_id).await?;
    if !group.is_active() {
        return Err(CliError::Validation(format!(
            "group '{remote_id}' is unlinked; link it first"
        )));
    }
    Ok(group)
}
