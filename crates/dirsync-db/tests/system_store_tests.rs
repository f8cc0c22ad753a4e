//! Integration tests for the system key/value store.
//!
//! These tests require a running PostgreSQL instance.
//! Run with: `cargo test -p dirsync-db --features integration`

#![cfg(feature = "integration")]

mod common;

use std::sync::Arc;

use common::TestContext;
use dirsync_db::bootstrap::{ensure_installation, INSTALLATION_DATE_KEY, INSTALLATION_ID_KEY};
use dirsync_db::{DbError, SystemRecord, SystemStore};
use tokio::task::JoinSet;

#[tokio::test]
async fn test_save_get_and_duplicate() {
    let ctx = TestContext::new().await;
    let store = SystemStore::new(&ctx.pool);
    let name = TestContext::unique_name("save");

    store.save(&SystemRecord::new(&name, "one")).await.unwrap();
    let fetched = store.get_by_name(&name).await.unwrap();
    assert_eq!(fetched.value, "one");

    let err = store.save(&SystemRecord::new(&name, "two")).await.unwrap_err();
    assert!(err.is_conflict(), "expected conflict, got {err:?}");

    let all = store.get_all().await.unwrap();
    assert_eq!(all.get(&name).map(String::as_str), Some("one"));

    ctx.delete_system(&name).await;
}

#[tokio::test]
async fn test_get_missing_is_not_found() {
    let ctx = TestContext::new().await;
    let store = SystemStore::new(&ctx.pool);

    let err = store
        .get_by_name(&TestContext::unique_name("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound { resource: "system", .. }));
}

#[tokio::test]
async fn test_update_missing_row_is_ok() {
    let ctx = TestContext::new().await;
    let store = SystemStore::new(&ctx.pool);
    let name = TestContext::unique_name("upd");

    store.update(&SystemRecord::new(&name, "x")).await.unwrap();
    assert!(store.get_by_name(&name).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_save_or_update() {
    let ctx = TestContext::new().await;
    let store = SystemStore::new(&ctx.pool);
    let name = TestContext::unique_name("sou");

    store.save_or_update(&SystemRecord::new(&name, "first")).await.unwrap();
    store.save_or_update(&SystemRecord::new(&name, "second")).await.unwrap();
    assert_eq!(store.get_by_name(&name).await.unwrap().value, "second");

    ctx.delete_system(&name).await;
}

#[tokio::test]
async fn test_permanent_delete() {
    let ctx = TestContext::new().await;
    let store = SystemStore::new(&ctx.pool);
    let name = TestContext::unique_name("del");

    store.save(&SystemRecord::new(&name, "v")).await.unwrap();
    assert!(store.permanent_delete_by_name(&name).await.unwrap());
    assert!(!store.permanent_delete_by_name(&name).await.unwrap());
    assert!(store.get_by_name(&name).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_insert_if_absent_existing_value_wins() {
    let ctx = TestContext::new().await;
    let store = SystemStore::new(&ctx.pool);
    let name = TestContext::unique_name("iia");

    let (stored, inserted) = store
        .insert_if_absent(&SystemRecord::new(&name, "A"))
        .await
        .unwrap();
    assert!(inserted);
    assert_eq!(stored.value, "A");

    let (stored, inserted) = store
        .insert_if_absent(&SystemRecord::new(&name, "B"))
        .await
        .unwrap();
    assert!(!inserted);
    assert_eq!(stored.value, "A");

    ctx.delete_system(&name).await;
}

#[tokio::test]
async fn test_insert_if_absent_overwrites_empty_value() {
    let ctx = TestContext::new().await;
    let store = SystemStore::new(&ctx.pool);
    let name = TestContext::unique_name("empty");

    store.save(&SystemRecord::new(&name, "")).await.unwrap();
    let (stored, inserted) = store
        .insert_if_absent(&SystemRecord::new(&name, "filled"))
        .await
        .unwrap();
    assert!(inserted);
    assert_eq!(stored.value, "filled");
    assert_eq!(store.get_by_name(&name).await.unwrap().value, "filled");

    ctx.delete_system(&name).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_insert_if_absent_race_has_single_winner() {
    let ctx = TestContext::new().await;
    let store = Arc::new(SystemStore::new(&ctx.pool));
    let name = TestContext::unique_name("race");

    let mut tasks = JoinSet::new();
    for i in 0..8 {
        let store = Arc::clone(&store);
        let name = name.clone();
        tasks.spawn(async move {
            store
                .insert_if_absent(&SystemRecord::new(name, format!("writer-{i}")))
                .await
        });
    }

    let mut winners = 0;
    let mut values = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let (record, inserted) = joined.unwrap().unwrap();
        if inserted {
            winners += 1;
        }
        values.push(record.value);
    }

    assert_eq!(winners, 1, "exactly one caller must observe inserted");
    let stored = store.get_by_name(&name).await.unwrap().value;
    assert!(values.iter().all(|v| *v == stored), "all callers see the winner");

    ctx.delete_system(&name).await;
}

#[tokio::test]
async fn test_insert_if_absent_rejects_empty_value() {
    let ctx = TestContext::new().await;
    let store = SystemStore::new(&ctx.pool);
    let name = TestContext::unique_name("blank");

    let err = store
        .insert_if_absent(&SystemRecord::new(&name, ""))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::ValidationFailed { field: "value", .. }));
    assert!(store.get_by_name(&name).await.unwrap_err().is_not_found());

    let (_, inserted) = store
        .insert_if_absent(&SystemRecord::new(&name, "X"))
        .await
        .unwrap();
    assert!(inserted);
    let (stored, inserted) = store
        .insert_if_absent(&SystemRecord::new(&name, "Y"))
        .await
        .unwrap();
    assert!(!inserted);
    assert_eq!(stored.value, "X");

    ctx.delete_system(&name).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_insert_if_absent_distinct_keys_never_report_missing_winner() {
    let ctx = TestContext::new().await;
    let store = Arc::new(SystemStore::new(&ctx.pool));

    let mut names = Vec::new();
    for round in 0..10 {
        let mut tasks = JoinSet::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            let name = TestContext::unique_name(&format!("k{round}{i}"));
            names.push(name.clone());
            tasks.spawn(async move {
                let result = store.insert_if_absent(&SystemRecord::new(&name, "v")).await;
                (name, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (name, result) = joined.unwrap();
            match result {
                Ok((record, inserted)) => {
                    assert!(inserted, "{name} had no other writer");
                    assert_eq!(record.value, "v");
                }
                Err(e) => {
                    assert!(
                        e.is_serialization_failure(),
                        "{name}: expected a retryable storage error, got {e:?}"
                    );
                    assert!(store.get_by_name(&name).await.unwrap_err().is_not_found());
                }
            }
        }
    }

    for name in &names {
        ctx.delete_system(name).await;
    }
}

#[tokio::test]
async fn test_insert_if_absent_rejects_oversized_name() {
    let ctx = TestContext::new().await;
    let store = SystemStore::new(&ctx.pool);

    let err = store
        .insert_if_absent(&SystemRecord::new("n".repeat(65), "v"))
        .await
        .unwrap_err();
    assert!(err.is_validation_failed());
}

#[tokio::test]
async fn test_ensure_installation_is_stable() {
    let ctx = TestContext::new().await;
    let store = SystemStore::new(&ctx.pool);

    let first = ensure_installation(&store).await.unwrap();
    let second = ensure_installation(&store).await.unwrap();

    assert!(!second.created);
    assert_eq!(first.installation_id, second.installation_id);
    assert_eq!(first.installation_date, second.installation_date);

    let stored = store.get_by_name(INSTALLATION_ID_KEY).await.unwrap();
    assert_eq!(stored.value, first.installation_id.to_string());
    assert!(store.get_by_name(INSTALLATION_DATE_KEY).await.is_ok());

    // Only the date missing: the id is kept and the date is filled again.
    store.permanent_delete_by_name(INSTALLATION_DATE_KEY).await.unwrap();
    let third = ensure_installation(&store).await.unwrap();
    assert!(!third.created);
    assert_eq!(third.installation_id, first.installation_id);
    assert!(store.get_by_name(INSTALLATION_DATE_KEY).await.is_ok());
}
