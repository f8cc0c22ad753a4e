//! Integration tests for the PostgreSQL linked group repository.
//!
//! These tests require a running PostgreSQL instance.
//! Run with: `cargo test -p dirsync-db --features integration`

#![cfg(feature = "integration")]

mod common;

use common::TestContext;
use dirsync_core::{GroupRepository, GroupSource, GroupState, NewGroup};
use dirsync_db::{PgGroupRepository, SyncableKind};

fn new_group(remote_id: &str, display_name: &str) -> NewGroup {
    NewGroup {
        display_name: display_name.to_string(),
        remote_id: remote_id.to_string(),
        source: GroupSource::ExternalDirectory,
    }
}

#[tokio::test]
async fn test_create_and_lookup() {
    let ctx = TestContext::new().await;
    let repo = PgGroupRepository::new(&ctx.pool);
    let remote_id = TestContext::unique_name("ext");

    let created = repo.create(new_group(&remote_id, "Engineering")).await.unwrap();
    assert!(created.is_active());
    assert_eq!(created.id.to_string().len(), 26);

    let found = repo
        .get_by_remote_id(&remote_id, GroupSource::ExternalDirectory)
        .await
        .unwrap()
        .expect("group should exist");
    assert_eq!(found.id, created.id);
    assert_eq!(found.display_name, "Engineering");

    ctx.delete_group(&remote_id).await;
}

#[tokio::test]
async fn test_lookup_missing_is_none() {
    let ctx = TestContext::new().await;
    let repo = PgGroupRepository::new(&ctx.pool);

    let found = repo
        .get_by_remote_id(&TestContext::unique_name("none"), GroupSource::ExternalDirectory)
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_duplicate_create_is_conflict() {
    let ctx = TestContext::new().await;
    let repo = PgGroupRepository::new(&ctx.pool);
    let remote_id = TestContext::unique_name("dup");

    repo.create(new_group(&remote_id, "A")).await.unwrap();
    let err = repo.create(new_group(&remote_id, "B")).await.unwrap_err();
    assert!(err.is_conflict());

    ctx.delete_group(&remote_id).await;
}

#[tokio::test]
async fn test_soft_delete_and_restore_keep_id() {
    let ctx = TestContext::new().await;
    let repo = PgGroupRepository::new(&ctx.pool);
    let remote_id = TestContext::unique_name("life");

    let created = repo.create(new_group(&remote_id, "Before")).await.unwrap();
    let deleted = repo.soft_delete(&created.id).await.unwrap();
    assert!(matches!(deleted.state, GroupState::Deleted { .. }));

    let mut restored = deleted.clone();
    restored.restore("After".to_string(), remote_id.clone());
    let restored = repo.update(&restored).await.unwrap();

    assert_eq!(restored.id, created.id);
    assert!(restored.is_active());
    assert_eq!(restored.display_name, "After");

    ctx.delete_group(&remote_id).await;
}

#[tokio::test]
async fn test_active_listing_reports_syncables() {
    let ctx = TestContext::new().await;
    let repo = PgGroupRepository::new(&ctx.pool);
    let configured_id = TestContext::unique_name("cfg");
    let plain_id = TestContext::unique_name("plain");
    let gone_id = TestContext::unique_name("gone");

    let configured = repo.create(new_group(&configured_id, "Configured")).await.unwrap();
    repo.create(new_group(&plain_id, "Plain")).await.unwrap();
    let gone = repo.create(new_group(&gone_id, "Gone")).await.unwrap();
    repo.soft_delete(&gone.id).await.unwrap();

    assert!(repo
        .attach_syncable(&configured.id, "team-1", SyncableKind::Team)
        .await
        .unwrap());
    assert!(!repo
        .attach_syncable(&configured.id, "team-1", SyncableKind::Team)
        .await
        .unwrap());

    let ids = vec![configured_id.clone(), plain_id.clone(), gone_id.clone()];
    let mut active = repo
        .list_active_by_remote_ids(&ids, GroupSource::ExternalDirectory)
        .await
        .unwrap();
    active.sort_by(|a, b| a.group.display_name.cmp(&b.group.display_name));

    assert_eq!(active.len(), 2);
    assert_eq!(active[0].group.display_name, "Configured");
    assert!(active[0].has_syncables);
    assert_eq!(active[1].group.display_name, "Plain");
    assert!(!active[1].has_syncables);

    assert_eq!(repo.list_syncables(&configured.id).await.unwrap().len(), 1);
    assert!(repo
        .detach_syncable(&configured.id, "team-1", SyncableKind::Team)
        .await
        .unwrap());

    for id in [&configured_id, &plain_id, &gone_id] {
        ctx.delete_group(id).await;
    }
}

#[tokio::test]
async fn test_active_listing_empty_input() {
    let ctx = TestContext::new().await;
    let repo = PgGroupRepository::new(&ctx.pool);

    let active = repo
        .list_active_by_remote_ids(&[], GroupSource::ExternalDirectory)
        .await
        .unwrap();
    assert!(active.is_empty());
}

#[tokio::test]
async fn test_list_active_excludes_tombstones() {
    let ctx = TestContext::new().await;
    let repo = PgGroupRepository::new(&ctx.pool);
    let kept = TestContext::unique_name("keep");
    let dropped = TestContext::unique_name("drop");

    let group = repo.create(new_group(&kept, "Kept")).await.unwrap();
    let gone = repo.create(new_group(&dropped, "Dropped")).await.unwrap();
    repo.soft_delete(&gone.id).await.unwrap();

    let active = repo.list_active(GroupSource::ExternalDirectory).await.unwrap();
    assert!(active.iter().any(|g| g.id == group.id));
    assert!(active.iter().all(|g| g.id != gone.id));
    assert!(active.windows(2).all(|w| w[0].remote_id <= w[1].remote_id));

    ctx.delete_group(&kept).await;
    ctx.delete_group(&dropped).await;
}
