//! Database models for dirsync.

pub mod group_syncable;
pub mod linked_group;
pub mod system_record;

pub use group_syncable::{GroupSyncable, SyncableKind};
pub use linked_group::{LinkedGroupRow, PgGroupRepository};
pub use system_record::{
    SystemRecord, SystemStore, SYSTEM_NAME_MAX_LENGTH, SYSTEM_VALUE_MAX_LENGTH,
};
