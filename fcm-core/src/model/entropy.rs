use log::{debug, trace};

use super::occurrence::{OccurrenceRow, OccurrenceTable};
use super::statistics::ContextStatistics;

/// Shannon entropy, in bits, of the next symbol after one context.
///
/// Uses the raw frequencies of the row, never the smoothed table. Symbols
/// with a zero count are skipped (`0 * log2(0) = 0`).
pub fn context_entropy(row: &OccurrenceRow) -> f64 {
	let total = row.total();
	if total == 0 {
		return 0.0;
	}

	row.counts()
		.iter()
		.filter(|count| **count > 0)
		.map(|count| {
			let p = *count as f64 / total as f64;
			-p * p.log2()
		})
		.sum()
}

/// Estimated conditional entropy of the corpus: `Σ H(context) * P(context)`.
///
/// `statistics` must have been computed from `table`; contexts missing from
/// it contribute nothing.
pub fn conditional_entropy(table: &OccurrenceTable, statistics: &ContextStatistics) -> f64 {
	let entropy = table
		.iter()
		.filter_map(|(key, row)| {
			let weight = statistics.get(*key)?.probability;
			let h = context_entropy(row);
			trace!("H({key}) = {h}, P = {weight}");
			Some(h * weight)
		})
		.sum();

	debug!("conditional entropy {entropy} over {} contexts", table.len());
	entropy
}
