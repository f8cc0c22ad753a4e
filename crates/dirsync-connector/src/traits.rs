//! External directory source trait.

use async_trait::async_trait;

use crate::error::ConnectorResult;
use crate::types::{ExternalGroupRecord, PageRequest};

/// Read-only access to groups in an external directory.
///
/// Implementations must return search results in a stable order (display
/// name, then remote id) so that successive pages neither skip nor repeat
/// records.
#[async_trait]
pub trait ExternalDirectorySource: Send + Sync {
    /// Get the display name for this source instance.
    fn display_name(&self) -> &str;

    /// Test the connection to the directory.
    ///
    /// Returns `Ok(())` if the directory is reachable and accepts our
    /// credentials.
    async fn test_connection(&self) -> ConnectorResult<()>;

    /// Search groups whose display name contains `query` (case-insensitive).
    ///
    /// `None` returns every group. A page shorter than `page.per_page` is the
    /// last one.
    async fn search_groups(
        &self,
        query: Option<&str>,
        page: PageRequest,
    ) -> ConnectorResult<Vec<ExternalGroupRecord>>;

    /// Look up a single group by its remote identifier.
    async fn get_group(&self, remote_id: &str) -> ConnectorResult<Option<ExternalGroupRecord>>;
}
