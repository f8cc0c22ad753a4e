//! CLI command implementations

pub mod database;
pub mod directory;
pub mod groups;
pub mod system;
