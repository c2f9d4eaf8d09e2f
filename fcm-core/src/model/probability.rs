use std::collections::BTreeMap;
use std::collections::btree_map;

use log::debug;

use super::alphabet::{ALPHABET_LENGTH, Symbol};
use super::context_key::ContextKey;
use super::occurrence::OccurrenceTable;
use super::statistics::smoothed;

/// Conditional distribution of the next symbol for one context.
pub type ProbabilityRow = [f64; ALPHABET_LENGTH];

/// The context seen most often, ignoring contexts made only of spaces
/// and contexts with no outcome at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MostFrequentContext {
	pub key: ContextKey,
	/// Occurrences counted after `key`.
	pub total: u64,
}

/// Smoothed `P(symbol | context)` for every context of an `OccurrenceTable`.
///
/// Symbols never seen after a context keep a probability of exactly 0 even
/// when `alpha > 0`; smoothing is only applied to observed counts. A row
/// therefore sums to `(T + n * alpha) / (T + 27 * alpha)` for `n` observed
/// symbols, which is 1 only without smoothing or with all 27 observed.
#[derive(Clone, Debug)]
pub struct ProbabilityTable {
	alpha: f64,
	rows: BTreeMap<ContextKey, ProbabilityRow>,
	most_frequent: Option<MostFrequentContext>,
}

impl ProbabilityTable {
	/// Derives every row of `table` and tracks the most frequent context.
	///
	/// # Parameters
	/// - `table`: Raw occurrence counts.
	/// - `alpha`: Smoothing constant, already validated by the caller.
	///
	/// # Notes
	/// - Ties on the most frequent total keep the lowest key.
	/// - A row with no counts stays all zeros.
	pub fn compute(table: &OccurrenceTable, alpha: f64) -> Self {
		let order = table.order();
		let mut rows = BTreeMap::new();
		let mut most_frequent: Option<MostFrequentContext> = None;

		for (key, occurrences) in table.iter() {
			let total = occurrences.total();

			// Strictly larger wins, so ties keep the lowest key
			let larger = most_frequent.is_none_or(|best| total > best.total);
			if larger && total > 0 && !key.is_all_space(order) {
				most_frequent = Some(MostFrequentContext { key: *key, total });
			}

			let mut probabilities = [0.0; ALPHABET_LENGTH];
			for (p, count) in probabilities.iter_mut().zip(occurrences.counts()) {
				*p = if *count == 0 { 0.0 } else { smoothed(*count, total, alpha) };
			}
			rows.insert(*key, probabilities);
		}

		debug!("probabilities for {} contexts, most frequent {:?}", rows.len(), most_frequent);
		Self { alpha, rows, most_frequent }
	}

	/// Smoothing constant the table was computed with.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Full distribution of a context, `None` for an unseen one.
	pub fn get(&self, key: ContextKey) -> Option<&ProbabilityRow> {
		self.rows.get(&key)
	}

	/// `P(symbol | context)`, `None` for an unseen context.
	pub fn probability(&self, key: ContextKey, symbol: Symbol) -> Option<f64> {
		self.rows.get(&key).map(|row| row[symbol.index()])
	}

	/// `None` when no context qualifies (empty table or spaces only).
	pub fn most_frequent(&self) -> Option<MostFrequentContext> {
		self.most_frequent
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	/// Rows ordered by key.
	pub fn iter(&self) -> btree_map::Iter<'_, ContextKey, ProbabilityRow> {
		self.rows.iter()
	}
}
