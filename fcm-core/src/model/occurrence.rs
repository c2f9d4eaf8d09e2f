use std::collections::BTreeMap;
use std::collections::btree_map;
use std::io::{BufReader, Read};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::alphabet::{ALPHABET_LENGTH, Symbol};
use super::context_key::{ContextKey, key_space, validate_order};
use super::window::SlidingWindow;
use crate::error::{FcmError, Result};

/// Counts of each symbol observed right after one context.
///
/// `row[s]` only ever grows, and only while training.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct OccurrenceRow([u64; ALPHABET_LENGTH]);

impl OccurrenceRow {
	/// Row with every count at 0.
	pub fn new() -> Self {
		Self([0; ALPHABET_LENGTH])
	}

	/// Row holding `counts`, indexed by symbol.
	///
	/// # Notes
	/// - Nothing bounds the sum here; a table only accepts the row if its
	///   total still fits in a `u64` (see `OccurrenceTable::insert_row`).
	pub fn from_counts(counts: [u64; ALPHABET_LENGTH]) -> Self {
		Self(counts)
	}

	/// Times `symbol` followed the context.
	pub fn count(&self, symbol: Symbol) -> u64 {
		self.0[symbol.index()]
	}

	/// Every count, indexed by symbol.
	pub fn counts(&self) -> &[u64; ALPHABET_LENGTH] {
		&self.0
	}

	/// Sum of all counts of the row, saturating at `u64::MAX`.
	pub fn total(&self) -> u64 {
		self.0.iter().fold(0u64, |sum, count| sum.saturating_add(*count))
	}

	/// Sum of all counts, `None` if it does not fit in a `u64`.
	pub fn checked_total(&self) -> Option<u64> {
		self.0.iter().try_fold(0u64, |sum, count| sum.checked_add(*count))
	}

	fn increment(&mut self, symbol: Symbol) {
		self.0[symbol.index()] += 1;
	}

	/// Adds `other` cell by cell. Nothing is changed if any cell overflows.
	fn add(&mut self, other: &Self) -> Result<()> {
		let mut sum = self.0;
		for (mine, theirs) in sum.iter_mut().zip(other.0.iter()) {
			*mine = mine.checked_add(*theirs).ok_or(FcmError::CountOverflow)?;
		}
		self.0 = sum;
		Ok(())
	}
}

impl Default for OccurrenceRow {
	fn default() -> Self {
		Self::new()
	}
}

/// Raw occurrence table of an order-`k` model: context key to occurrence row.
///
/// This is the only structure that gets persisted. Everything else is
/// derived from it.
///
/// # Invariants
/// - `order` is within `1..=MAX_ORDER`
/// - Every key is `< 27^order`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct OccurrenceTable {
	order: usize,
	rows: BTreeMap<ContextKey, OccurrenceRow>,
}

impl OccurrenceTable {
	/// Creates an empty table for contexts of `order` symbols.
	///
	/// # Errors
	/// Returns `InvalidOrder` if `order` is 0 or too large for the key space.
	pub fn new(order: usize) -> Result<Self> {
		Ok(Self { order: validate_order(order)?, rows: BTreeMap::new() })
	}

	pub fn order(&self) -> usize {
		self.order
	}

	/// Number of contexts with a row.
	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	/// Row of `key`, `None` for a context never seen.
	pub fn row(&self, key: ContextKey) -> Option<&OccurrenceRow> {
		self.rows.get(&key)
	}

	/// Rows ordered by key.
	pub fn iter(&self) -> btree_map::Iter<'_, ContextKey, OccurrenceRow> {
		self.rows.iter()
	}

	/// Known contexts in ascending key order.
	pub fn keys(&self) -> impl Iterator<Item = ContextKey> + '_ {
		self.rows.keys().copied()
	}

	/// Sum of every count in the table.
	pub fn total_occurrences(&self) -> u64 {
		self.rows.values().fold(0u64, |sum, row| sum.saturating_add(row.total()))
	}

	/// Sum of every count, `None` if it does not fit in a `u64`.
	///
	/// Tables built by training, `insert_row` or `merge` always return
	/// `Some`; a decoded model is checked with this before it is accepted.
	pub fn checked_total(&self) -> Option<u64> {
		self.rows.values().try_fold(0u64, |sum, row| sum.checked_add(row.checked_total()?))
	}

	/// Occurrences of `symbol` right after `context`; 0 for unseen contexts.
	pub fn count(&self, context: ContextKey, symbol: Symbol) -> u64 {
		self.rows.get(&context).map_or(0, |row| row.count(symbol))
	}

	/// Inserts a full row, replacing any existing one.
	///
	/// # Errors
	/// - `InvalidOrder` if `key` is outside the key space of this order
	/// - `CountOverflow` if the table total would no longer fit in a `u64`
	pub fn insert_row(&mut self, key: ContextKey, row: OccurrenceRow) -> Result<()> {
		if key.value() >= key_space(self.order) {
			return Err(FcmError::InvalidOrder(self.order));
		}

		let replaced = self.rows.get(&key).map_or(0, OccurrenceRow::total);
		let others = self.checked_total().ok_or(FcmError::CountOverflow)? - replaced;
		row.checked_total()
			.and_then(|total| total.checked_add(others))
			.ok_or(FcmError::CountOverflow)?;

		self.rows.insert(key, row);
		Ok(())
	}

	/// Single training pass over a character stream.
	///
	/// The first `order` alphabet symbols only prime the context. Each later
	/// symbol is counted as the outcome of the `order` symbols before it.
	/// Characters outside the alphabet are dropped without touching the
	/// window, so contexts span over them.
	///
	/// Returns the number of outcomes counted.
	pub fn accumulate<I>(&mut self, text: I) -> u64
	where
		I: IntoIterator<Item = char>,
	{
		let mut window = SlidingWindow::new(self.order + 1);
		let mut counted = 0u64;
		let mut discarded = 0u64;

		for c in text {
			let symbol = match Symbol::encode(c) {
				Ok(symbol) => symbol,
				Err(_) => {
					discarded += 1;
					continue;
				}
			};

			window.push(symbol);
			// Still priming the context
			if !window.is_full() {
				continue;
			}

			let key = ContextKey::encode(window.head(self.order));
			// The window is full, so it has a last element
			let Some(outcome) = window.last() else { continue };
			let row = self.rows.entry(key).or_default();
			row.increment(outcome);
			trace!("context {key} -> '{outcome}' now {}", row.count(outcome));
			counted += 1;
		}

		debug!("counted {counted} outcomes, discarded {discarded} characters, {} contexts", self.rows.len());
		counted
	}

	/// Trains on a byte stream, each byte read as one character.
	///
	/// Bytes outside ASCII never match the alphabet and are discarded like
	/// any other foreign character.
	///
	/// The stream is consumed through a buffer, never held in memory whole.
	///
	/// # Errors
	/// Returns `StreamUnavailable` if reading fails. Outcomes counted before
	/// the failure stay in the table.
	pub fn accumulate_reader<R: Read>(&mut self, reader: R) -> Result<u64> {
		let mut failure = None;
		let chars = BufReader::new(reader).bytes().map_while(|byte| match byte {
			Ok(byte) => Some(char::from(byte)),
			Err(e) => {
				failure = Some(e);
				None
			}
		});
		let counted = self.accumulate(chars);

		match failure {
			Some(e) => Err(e.into()),
			None => Ok(counted),
		}
	}

	/// Adds every count of `other` into this table.
	///
	/// # Errors
	/// - `OrderMismatch` if the tables were built with different orders
	/// - `CountOverflow` if the merged counts would not fit in a `u64`; the
	///   table is left untouched then
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.order != other.order {
			return Err(FcmError::OrderMismatch { expected: self.order, found: other.order });
		}

		// A grand total that fits bounds every row and every cell
		self.checked_total()
			.zip(other.checked_total())
			.and_then(|(mine, theirs)| mine.checked_add(theirs))
			.ok_or(FcmError::CountOverflow)?;

		for (key, row) in &other.rows {
			self.rows.entry(*key).or_default().add(row)?;
		}

		Ok(())
	}
}
