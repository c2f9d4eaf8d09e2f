use std::collections::BTreeMap;
use std::collections::btree_map;

use log::debug;

use super::alphabet::ALPHABET_LENGTH;
use super::context_key::ContextKey;
use super::occurrence::OccurrenceTable;

/// Additive smoothing shared by every derived table:
/// `(count + alpha) / (total + 27 * alpha)`.
///
/// With `alpha == 0` this is the plain frequency. An empty denominator
/// yields 0 instead of NaN.
pub fn smoothed(count: u64, total: u64, alpha: f64) -> f64 {
	let denominator = total as f64 + ALPHABET_LENGTH as f64 * alpha;
	if denominator == 0.0 {
		return 0.0;
	}
	(count as f64 + alpha) / denominator
}

/// Per-context totals and the probability of the context itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContextStat {
	/// Sum of the context's occurrence row.
	pub total: u64,
	/// Smoothed share of the corpus taken by this context.
	pub probability: f64,
}

/// Statistics derived from an `OccurrenceTable`.
///
/// Always rebuilt from scratch with `compute`; there is no incremental update.
#[derive(Clone, Debug)]
pub struct ContextStatistics {
	alpha: f64,
	grand_total: u64,
	stats: BTreeMap<ContextKey, ContextStat>,
}

impl ContextStatistics {
	pub fn compute(table: &OccurrenceTable, alpha: f64) -> Self {
		let totals: Vec<(ContextKey, u64)> = table.iter().map(|(key, row)| (*key, row.total())).collect();
		let grand_total = totals.iter().fold(0u64, |sum, (_, total)| sum.saturating_add(*total));

		let stats = totals
			.into_iter()
			.map(|(key, total)| {
				let probability = smoothed(total, grand_total, alpha);
				(key, ContextStat { total, probability })
			})
			.collect::<BTreeMap<_, _>>();

		debug!("statistics for {} contexts, {grand_total} occurrences, alpha {alpha}", stats.len());
		Self { alpha, grand_total, stats }
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Sum of every row total.
	pub fn grand_total(&self) -> u64 {
		self.grand_total
	}

	pub fn get(&self, key: ContextKey) -> Option<&ContextStat> {
		self.stats.get(&key)
	}

	pub fn len(&self) -> usize {
		self.stats.len()
	}

	pub fn is_empty(&self) -> bool {
		self.stats.is_empty()
	}

	pub fn keys(&self) -> impl Iterator<Item = ContextKey> + '_ {
		self.stats.keys().copied()
	}

	pub fn iter(&self) -> btree_map::Iter<'_, ContextKey, ContextStat> {
		self.stats.iter()
	}
}
