//! Installation identity bootstrap implementation.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{BootstrapError, INSTALLATION_DATE_KEY, INSTALLATION_ID_KEY};
use crate::error::DbError;
use crate::models::{SystemRecord, SystemStore};

/// Attempts per key when the database cancels the serializable insert.
const MAX_ATTEMPTS: u32 = 3;

/// Result of the bootstrap operation.
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapResult {
    /// The installation identity now stored.
    pub installation_id: Uuid,

    /// When the installation was first bootstrapped.
    pub installation_date: DateTime<Utc>,

    /// Whether this call defined the identity (false if it already existed).
    pub created: bool,
}

/// Ensure the installation identity exists, creating it on first boot.
///
/// Safe to call concurrently from several nodes: each key is written with
/// `insert_if_absent`, so every caller ends up with the same values.
#[instrument(skip(store))]
pub async fn ensure_installation(store: &SystemStore) -> Result<BootstrapResult, BootstrapError> {
    let candidate_id = Uuid::new_v4();
    let (id_record, created) = define_once(
        store,
        &SystemRecord::new(INSTALLATION_ID_KEY, candidate_id.to_string()),
    )
    .await?;
    let installation_id = parse_id(&id_record.value)?;

    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let (date_record, _) =
        define_once(store, &SystemRecord::new(INSTALLATION_DATE_KEY, now)).await?;
    let installation_date = parse_date(&date_record.value)?;

    if created {
        info!(
            installation_id = %installation_id,
            "bootstrap.installation.created: Installation identity defined"
        );
    } else {
        info!(
            installation_id = %installation_id,
            "bootstrap.installation.exists: Installation identity already defined"
        );
    }

    Ok(BootstrapResult {
        installation_id,
        installation_date,
        created,
    })
}

/// `insert_if_absent`, retried while the database cancels it with a
/// serialization failure that no concurrent writer of this key explains.
async fn define_once(
    store: &SystemStore,
    record: &SystemRecord,
) -> Result<(SystemRecord, bool), DbError> {
    let mut attempt = 1;
    loop {
        match store.insert_if_absent(record).await {
            Err(e) if e.is_serialization_failure() && attempt < MAX_ATTEMPTS => {
                warn!(key = %record.name, attempt, error = %e, "Retrying installation key");
                attempt += 1;
            }
            other => return other,
        }
    }
}

fn parse_id(raw: &str) -> Result<Uuid, BootstrapError> {
    Uuid::parse_str(raw).map_err(|_| BootstrapError::CorruptValue {
        key: INSTALLATION_ID_KEY,
        value: raw.to_string(),
    })
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>, BootstrapError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| BootstrapError::CorruptValue {
            key: INSTALLATION_DATE_KEY,
            value: raw.to_string(),
        })
}
