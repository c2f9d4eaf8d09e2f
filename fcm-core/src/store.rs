//! Model files: the raw occurrence table in `postcard` form.
//!
//! Only the raw table is stored. Loading hands back an `OccurrenceTable`,
//! so every derived table has to be recomputed afterwards.

use std::io::{Read, Write};
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{FcmError, Result};
use crate::io::{read_bytes, write_bytes};
use crate::model::context_key::{key_space, validate_order};
use crate::model::occurrence::OccurrenceTable;

/// Bumped whenever the stored layout changes.
pub const FORMAT_VERSION: u16 = 1;

#[derive(Serialize)]
struct StoredModelRef<'a> {
	version: u16,
	table: &'a OccurrenceTable,
}

#[derive(Deserialize)]
struct StoredModel {
	version: u16,
	table: OccurrenceTable,
}

/// Serializes `table` into `writer`.
///
/// # Errors
/// `StreamUnavailable` if writing fails, `Serialization` if encoding fails.
pub fn save<W: Write>(table: &OccurrenceTable, mut writer: W) -> Result<()> {
	let bytes = postcard::to_stdvec(&StoredModelRef { version: FORMAT_VERSION, table })?;
	writer.write_all(&bytes)?;
	writer.flush()?;
	debug!("saved {} contexts ({} bytes)", table.len(), bytes.len());
	Ok(())
}

/// Reads a table written by `save`.
///
/// # Errors
/// - `StreamUnavailable` if reading fails
/// - `Serialization` for malformed content
/// - `IncompatibleFormat` for a file from another format version
/// - `InvalidOrder` if the stored order or keys are out of range
/// - `CorruptModel` if the stored counts add up past `u64::MAX`
pub fn load<R: Read>(mut reader: R) -> Result<OccurrenceTable> {
	let mut bytes = Vec::new();
	reader.read_to_end(&mut bytes)?;
	decode(&bytes)
}

/// Saves `table` to a file, replacing it.
pub fn save_to_path<P: AsRef<Path>>(table: &OccurrenceTable, path: P) -> Result<()> {
	let bytes = postcard::to_stdvec(&StoredModelRef { version: FORMAT_VERSION, table })?;
	write_bytes(&path, &bytes)?;
	debug!("saved {} contexts to {}", table.len(), path.as_ref().display());
	Ok(())
}

/// Loads a table from a file written by `save_to_path` or `save`.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<OccurrenceTable> {
	let bytes = read_bytes(&path)?;
	let table = decode(&bytes)?;
	debug!("loaded {} contexts from {}", table.len(), path.as_ref().display());
	Ok(table)
}

fn decode(bytes: &[u8]) -> Result<OccurrenceTable> {
	let stored: StoredModel = postcard::from_bytes(bytes)?;
	if stored.version != FORMAT_VERSION {
		return Err(FcmError::IncompatibleFormat(stored.version));
	}

	let order = validate_order(stored.table.order())?;
	if stored.table.keys().any(|key| key.value() >= key_space(order)) {
		return Err(FcmError::InvalidOrder(order));
	}
	if stored.table.checked_total().is_none() {
		return Err(FcmError::CorruptModel("occurrence counts do not fit in 64 bits".to_owned()));
	}
	Ok(stored.table)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::BTreeMap;

	use crate::model::alphabet::ALPHABET_LENGTH;
	use crate::model::context_key::ContextKey;
	use crate::model::occurrence::OccurrenceRow;

	fn trained(text: &str, order: usize) -> OccurrenceTable {
		let mut table = OccurrenceTable::new(order).unwrap();
		table.accumulate(text.chars());
		table
	}

	#[test]
	fn stream_round_trip() {
		let table = trained("a rose is a rose is a rose", 3);
		let mut buffer = Vec::new();
		save(&table, &mut buffer).unwrap();
		let loaded = load(buffer.as_slice()).unwrap();
		assert_eq!(loaded, table);
	}

	#[test]
	fn rejects_other_version() {
		let table = trained("abc", 1);
		let bytes = postcard::to_stdvec(&StoredModelRef { version: FORMAT_VERSION + 1, table: &table }).unwrap();
		assert!(matches!(load(bytes.as_slice()), Err(FcmError::IncompatibleFormat(v)) if v == FORMAT_VERSION + 1));
	}

	/// Same layout as a stored model, without the table invariants.
	#[derive(Serialize)]
	struct RawModel {
		version: u16,
		order: usize,
		rows: BTreeMap<ContextKey, OccurrenceRow>,
	}

	#[test]
	fn rejects_counts_past_u64() {
		let mut counts = [0; ALPHABET_LENGTH];
		counts[0] = u64::MAX;
		counts[1] = 1;
		let rows = BTreeMap::from([(ContextKey::new(0), OccurrenceRow::from_counts(counts))]);
		let bytes = postcard::to_stdvec(&RawModel { version: FORMAT_VERSION, order: 1, rows }).unwrap();
		assert!(matches!(load(bytes.as_slice()), Err(FcmError::CorruptModel(_))));

		// Rows that fit alone but not together
		counts[1] = 0;
		let rows = BTreeMap::from([
			(ContextKey::new(0), OccurrenceRow::from_counts(counts)),
			(ContextKey::new(1), OccurrenceRow::from_counts(counts)),
		]);
		let bytes = postcard::to_stdvec(&RawModel { version: FORMAT_VERSION, order: 1, rows }).unwrap();
		assert!(matches!(load(bytes.as_slice()), Err(FcmError::CorruptModel(_))));
	}

	#[test]
	fn rejects_keys_outside_the_order() {
		let rows = BTreeMap::from([(ContextKey::new(27), OccurrenceRow::new())]);
		let bytes = postcard::to_stdvec(&RawModel { version: FORMAT_VERSION, order: 1, rows }).unwrap();
		assert!(matches!(load(bytes.as_slice()), Err(FcmError::InvalidOrder(1))));
	}

	#[test]
	fn rejects_garbage() {
		assert!(matches!(load(&[0xff, 0xff, 0xff][..]), Err(FcmError::Serialization(_))));
	}

	#[test]
	fn missing_file_is_reported() {
		let dir = tempfile::tempdir().unwrap();
		let result = load_from_path(dir.path().join("missing.fcm"));
		assert!(matches!(result, Err(FcmError::StreamUnavailable(_))));
	}
}
