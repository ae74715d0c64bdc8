//! Hand-off of parsed records to a persistence backend.

use crate::error::Result;
use crate::models::{CreatureRecord, StatblockFormat};
use crate::parsers::parse_statblock;

/// Persists a parsed creature and returns its new ID.
pub trait CreatureStore {
    fn store_creature(&self, record: &CreatureRecord) -> Result<i64>;
}

/// Parse a statblock and store it. Nothing is stored when parsing fails.
pub fn import_statblock<S: CreatureStore + ?Sized>(
    text: &str,
    format: StatblockFormat,
    store: &S,
) -> Result<i64> {
    let record = parse_statblock(text, format)?;
    let id = store.store_creature(&record)?;
    tracing::info!("Imported '{}' as creature #{}", record.name, id);
    Ok(id)
}
