use log::debug;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::seq::IteratorRandom;

use super::alphabet::{ALPHABET_LENGTH, Symbol, decode_symbols};
use super::context_key::ContextKey;
use super::probability::{ProbabilityRow, ProbabilityTable};
use super::statistics::ContextStatistics;
use super::window::SlidingWindow;
use crate::config::UnknownContextPolicy;
use crate::error::{FcmError, Result};

/// How a generation run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerationEnd {
	/// Every requested line was produced.
	Completed,
	/// Stopped on a context absent from the model (`UnknownContextPolicy::Stop`).
	UnknownContext(String),
}

/// Random walk over a finite-context model.
///
/// Starts from a context picked uniformly among the known ones. Its text is
/// the beginning of the output, so the first line is `order` characters
/// longer than the others.
pub struct TextGenerator<'a> {
	order: usize,
	statistics: &'a ContextStatistics,
	probabilities: &'a ProbabilityTable,
	policy: UnknownContextPolicy,
}

impl<'a> TextGenerator<'a> {
	pub fn new(
		order: usize,
		statistics: &'a ContextStatistics,
		probabilities: &'a ProbabilityTable,
		policy: UnknownContextPolicy,
	) -> Self {
		Self { order, statistics, probabilities, policy }
	}

	/// Generates `lines` lines of `chars_per_line` symbols, handing each
	/// finished line to `emit`.
	///
	/// # Errors
	/// - `EmptyModel` if no context is known
	/// - `Sampling` if a probability row is not a valid distribution
	/// - Any error returned by `emit`
	pub fn generate<R, F>(&self, rng: &mut R, chars_per_line: usize, lines: usize, mut emit: F) -> Result<GenerationEnd>
	where
		R: Rng + ?Sized,
		F: FnMut(String) -> Result<()>,
	{
		let seed = self.statistics.keys().choose(rng).ok_or(FcmError::EmptyModel)?;
		let seed_symbols = seed.decode(self.order);
		let mut window = SlidingWindow::from_slice(self.order, &seed_symbols);
		let mut line = decode_symbols(&seed_symbols);
		debug!("generating {lines} lines of {chars_per_line} from seed '{line}'");

		for _ in 0..lines {
			for _ in 0..chars_per_line {
				let key = ContextKey::encode(window.iter());
				// A row without any weight is as good as no row
				let symbol = match self.probabilities.get(key).filter(|row| has_weight(row)) {
					Some(row) => sample(row, rng)?,
					None => match self.fallback(key, rng)? {
						Some(symbol) => symbol,
						None => {
							let context = key.to_context_string(self.order);
							if !line.is_empty() {
								emit(line)?;
							}
							return Ok(GenerationEnd::UnknownContext(context));
						}
					},
				};
				window.push(symbol);
				line.push(symbol.decode());
			}
			emit(std::mem::take(&mut line))?;
		}

		Ok(GenerationEnd::Completed)
	}

	/// Generates into a vector of lines.
	pub fn generate_lines<R: Rng + ?Sized>(&self, rng: &mut R, chars_per_line: usize, lines: usize) -> Result<(Vec<String>, GenerationEnd)> {
		let mut output = Vec::with_capacity(lines);
		let end = self.generate(rng, chars_per_line, lines, |line| {
			output.push(line);
			Ok(())
		})?;
		Ok((output, end))
	}

	/// Symbol for a context with no usable row, `None` to stop.
	fn fallback<R: Rng + ?Sized>(&self, key: ContextKey, rng: &mut R) -> Result<Option<Symbol>> {
		debug!("context '{}' never seen, applying {:?}", key.to_context_string(self.order), self.policy);
		match self.policy {
			UnknownContextPolicy::Stop => Ok(None),
			UnknownContextPolicy::Uniform => Ok(Some(uniform(rng))),
			UnknownContextPolicy::MostFrequent => {
				let row = self
					.probabilities
					.most_frequent()
					.and_then(|best| self.probabilities.get(best.key))
					.filter(|row| has_weight(row));
				match row {
					Some(row) => sample(row, rng).map(Some),
					None => Ok(Some(uniform(rng))),
				}
			}
		}
	}
}

/// Draws one symbol with probability proportional to its weight in `row`.
pub fn sample<R: Rng + ?Sized>(row: &ProbabilityRow, rng: &mut R) -> Result<Symbol> {
	let distribution = WeightedIndex::new(row.iter()).map_err(|e| FcmError::Sampling(e.to_string()))?;
	let index = distribution.sample(rng);
	Symbol::from_index(index).ok_or_else(|| FcmError::Sampling(format!("index {index} out of the alphabet")))
}

fn has_weight(row: &ProbabilityRow) -> bool {
	row.iter().any(|p| *p > 0.0)
}

fn uniform<R: Rng + ?Sized>(rng: &mut R) -> Symbol {
	Symbol::from_index(rng.random_range(0..ALPHABET_LENGTH)).unwrap_or(Symbol::SPACE)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::alphabet::encode_str;
	use crate::model::occurrence::{OccurrenceRow, OccurrenceTable};
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn derived(text: &str, order: usize) -> (ContextStatistics, ProbabilityTable) {
		let mut table = OccurrenceTable::new(order).unwrap();
		table.accumulate(text.chars());
		(ContextStatistics::compute(&table, 0.0), ProbabilityTable::compute(&table, 0.0))
	}

	#[test]
	fn sample_only_picks_non_zero_weights() {
		let mut row = [0.0; ALPHABET_LENGTH];
		row[7] = 0.25;
		row[26] = 0.75;
		let mut rng = StdRng::seed_from_u64(7);
		for _ in 0..200 {
			let s = sample(&row, &mut rng).unwrap();
			assert!(s.index() == 7 || s == Symbol::SPACE);
		}
	}

	#[test]
	fn sample_rejects_empty_row() {
		let mut rng = StdRng::seed_from_u64(1);
		assert!(matches!(sample(&[0.0; ALPHABET_LENGTH], &mut rng), Err(FcmError::Sampling(_))));
	}

	#[test]
	fn deterministic_cycle() {
		// Every context has a single successor
		let (statistics, probabilities) = derived("abcabcabca", 2);
		let generator = TextGenerator::new(2, &statistics, &probabilities, UnknownContextPolicy::Stop);
		let mut rng = StdRng::seed_from_u64(42);
		let (lines, end) = generator.generate_lines(&mut rng, 6, 3).unwrap();

		assert_eq!(end, GenerationEnd::Completed);
		assert_eq!(lines.len(), 3);
		assert_eq!(lines[0].len(), 8);
		assert_eq!(lines[1].len(), 6);
		let text = lines.concat();
		assert!("abcabcabcabcabcabcabcabcabc".contains(&text), "{text}");
	}

	#[test]
	fn stop_policy_ends_on_unseen_context() {
		// "ab" -> 'c' but "bc" never has a successor
		let (statistics, probabilities) = derived("abc", 2);
		let generator = TextGenerator::new(2, &statistics, &probabilities, UnknownContextPolicy::Stop);
		let mut rng = StdRng::seed_from_u64(3);
		let (lines, end) = generator.generate_lines(&mut rng, 10, 2).unwrap();

		assert_eq!(end, GenerationEnd::UnknownContext("bc".to_owned()));
		assert_eq!(lines, vec!["abc".to_owned()]);
	}

	#[test]
	fn fallback_policies_keep_going() {
		let (statistics, probabilities) = derived("abc", 2);
		for policy in [UnknownContextPolicy::Uniform, UnknownContextPolicy::MostFrequent] {
			let generator = TextGenerator::new(2, &statistics, &probabilities, policy);
			let mut rng = StdRng::seed_from_u64(11);
			let (lines, end) = generator.generate_lines(&mut rng, 5, 4).unwrap();
			assert_eq!(end, GenerationEnd::Completed);
			assert_eq!(lines.len(), 4);
			assert!(lines.concat().chars().all(|c| Symbol::encode(c).is_ok()));
		}
	}

	fn with_empty_row() -> (ContextStatistics, ProbabilityTable) {
		let mut table = OccurrenceTable::new(2).unwrap();
		table.accumulate("abcab".chars());
		// "ca" -> 'b' is the only way in, and nothing ever follows "ab"
		table.insert_row(ContextKey::encode(&encode_str("ab").unwrap()), OccurrenceRow::new()).unwrap();
		(ContextStatistics::compute(&table, 0.0), ProbabilityTable::compute(&table, 0.0))
	}

	#[test]
	fn empty_row_is_treated_as_unknown() {
		let (statistics, probabilities) = with_empty_row();
		for seed in 0..8 {
			let generator = TextGenerator::new(2, &statistics, &probabilities, UnknownContextPolicy::Stop);
			let (_, end) = generator.generate_lines(&mut StdRng::seed_from_u64(seed), 20, 2).unwrap();
			assert_eq!(end, GenerationEnd::UnknownContext("ab".to_owned()));
		}

		for policy in [UnknownContextPolicy::Uniform, UnknownContextPolicy::MostFrequent] {
			let generator = TextGenerator::new(2, &statistics, &probabilities, policy);
			let (lines, end) = generator.generate_lines(&mut StdRng::seed_from_u64(5), 20, 2).unwrap();
			assert_eq!(end, GenerationEnd::Completed);
			assert_eq!(lines.len(), 2);
		}
	}

	#[test]
	fn only_empty_rows_fall_back_to_uniform() {
		let mut table = OccurrenceTable::new(1).unwrap();
		table.insert_row(ContextKey::new(0), OccurrenceRow::new()).unwrap();
		let statistics = ContextStatistics::compute(&table, 0.0);
		let probabilities = ProbabilityTable::compute(&table, 0.0);
		assert!(probabilities.most_frequent().is_none());

		let generator = TextGenerator::new(1, &statistics, &probabilities, UnknownContextPolicy::MostFrequent);
		let (lines, end) = generator.generate_lines(&mut StdRng::seed_from_u64(9), 10, 1).unwrap();
		assert_eq!(end, GenerationEnd::Completed);
		assert_eq!(lines[0].len(), 11);
	}

	#[test]
	fn empty_model_is_an_error() {
		let (statistics, probabilities) = derived("a", 2);
		let generator = TextGenerator::new(2, &statistics, &probabilities, UnknownContextPolicy::Uniform);
		let mut rng = StdRng::seed_from_u64(0);
		assert!(matches!(generator.generate_lines(&mut rng, 5, 1), Err(FcmError::EmptyModel)));
	}
}
