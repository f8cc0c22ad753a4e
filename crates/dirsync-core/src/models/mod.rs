//! Domain models for dirsync.

pub mod group;

pub use group::{
    validate_remote_id, GroupLinkage, GroupSource, GroupState, InternalGroup, NewGroup,
    GROUP_DISPLAY_NAME_MAX_LENGTH, REMOTE_ID_MAX_LENGTH,
};
