//! Core library for parsing creature statblocks into structured records.

pub mod config;
pub mod database;
pub mod error;
pub mod file_utils;
pub mod import;
pub mod models;
pub mod parsers;
pub mod processors;

pub use error::{BestiaryError, Result};
pub use import::{CreatureStore, import_statblock};
pub use models::{AbilityEntry, AttackEntry, CreatureRecord, StatblockFormat};
pub use parsers::parse_statblock;
