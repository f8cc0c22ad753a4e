//! Join of directory records with internal linkage rows.

use std::collections::HashMap;

use dirsync_connector::ExternalGroupRecord;
use dirsync_core::{GroupId, GroupLinkage};

use crate::types::MixedGroupView;

/// A directory record left-joined to its internal row.
///
/// `internal_id` is the raw id column, empty when nothing matched.
#[derive(Debug)]
struct Candidate {
    record: ExternalGroupRecord,
    internal_id: String,
    has_syncables: bool,
}

impl Candidate {
    fn into_view(self) -> MixedGroupView {
        // Only a full-width surrogate id means the group is linked.
        let internal_id = GroupId::from_materialized(&self.internal_id);
        MixedGroupView {
            remote_id: self.record.remote_id,
            display_name: self.record.display_name,
            has_syncables: internal_id.map(|_| self.has_syncables),
            internal_id,
        }
    }
}

/// Annotate each directory record with its active internal linkage.
///
/// The result is ordered by display name, then remote id.
pub(crate) fn merge(
    records: Vec<ExternalGroupRecord>,
    linkages: Vec<GroupLinkage>,
) -> Vec<MixedGroupView> {
    let mut by_remote_id: HashMap<String, GroupLinkage> = linkages
        .into_iter()
        .map(|l| (l.group.remote_id.clone(), l))
        .collect();

    let mut views: Vec<MixedGroupView> = records
        .into_iter()
        .map(|record| {
            let linkage = by_remote_id.remove(&record.remote_id);
            Candidate {
                internal_id: linkage
                    .as_ref()
                    .map(|l| l.group.id.to_string())
                    .unwrap_or_default(),
                has_syncables: linkage.is_some_and(|l| l.has_syncables),
                record,
            }
            .into_view()
        })
        .collect();

    views.sort_by(|a, b| {
        (a.display_name.as_str(), a.remote_id.as_str())
            .cmp(&(b.display_name.as_str(), b.remote_id.as_str()))
    });
    views
}
