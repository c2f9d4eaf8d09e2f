use std::io::{Read, Write};

use log::debug;
use rand::Rng;

use super::alphabet::{Symbol, encode_str};
use super::context_key::ContextKey;
use super::entropy::conditional_entropy;
use super::generator::{GenerationEnd, TextGenerator};
use super::occurrence::OccurrenceTable;
use super::probability::{ProbabilityRow, ProbabilityTable};
use super::statistics::ContextStatistics;
use crate::config::FcmConfig;
use crate::error::{FcmError, Result};

/// A finite-context model: the raw occurrence table plus the tables derived
/// from it.
///
/// Derived tables are never rebuilt implicitly. Any change to the raw table
/// (`train`, `merge`) drops them, and callers rebuild with
/// `compute_statistics` / `compute_probabilities` before asking for
/// entropy or text.
#[derive(Debug)]
pub struct Fcm {
	config: FcmConfig,
	occurrences: OccurrenceTable,
	statistics: Option<ContextStatistics>,
	probabilities: Option<ProbabilityTable>,
}

impl Fcm {
	/// Creates an untrained model.
	pub fn new(config: FcmConfig) -> Result<Self> {
		let occurrences = OccurrenceTable::new(config.order())?;
		Ok(Self { config, occurrences, statistics: None, probabilities: None })
	}

	/// Wraps an existing table, e.g. one read back from a model file.
	///
	/// # Errors
	/// Returns `OrderMismatch` if the table order differs from the configured one.
	pub fn from_table(config: FcmConfig, occurrences: OccurrenceTable) -> Result<Self> {
		if occurrences.order() != config.order() {
			return Err(FcmError::OrderMismatch { expected: config.order(), found: occurrences.order() });
		}
		Ok(Self { config, occurrences, statistics: None, probabilities: None })
	}

	pub fn config(&self) -> &FcmConfig {
		&self.config
	}

	pub fn order(&self) -> usize {
		self.config.order()
	}

	pub fn occurrences(&self) -> &OccurrenceTable {
		&self.occurrences
	}

	pub fn statistics(&self) -> Option<&ContextStatistics> {
		self.statistics.as_ref()
	}

	pub fn probabilities(&self) -> Option<&ProbabilityTable> {
		self.probabilities.as_ref()
	}

	/// Counts every context/symbol pair of `text`.
	pub fn train<I: IntoIterator<Item = char>>(&mut self, text: I) -> u64 {
		self.invalidate();
		self.occurrences.accumulate(text)
	}

	/// Trains on a byte stream.
	///
	/// # Errors
	/// Returns `StreamUnavailable` if the stream cannot be read.
	pub fn train_reader<R: Read>(&mut self, reader: R) -> Result<u64> {
		self.invalidate();
		self.occurrences.accumulate_reader(reader)
	}

	/// Adds the counts of another table (e.g. a loaded model) to this one.
	///
	/// # Errors
	/// `OrderMismatch` or `CountOverflow`, leaving the counts unchanged.
	pub fn merge(&mut self, other: &OccurrenceTable) -> Result<()> {
		self.invalidate();
		self.occurrences.merge(other)
	}

	/// Gives the raw table back, dropping derived tables.
	pub fn into_occurrences(self) -> OccurrenceTable {
		self.occurrences
	}

	/// Rebuilds context totals and context probabilities.
	pub fn compute_statistics(&mut self) -> &ContextStatistics {
		self.statistics.insert(ContextStatistics::compute(&self.occurrences, self.config.alpha()))
	}

	/// Rebuilds the conditional probability table.
	pub fn compute_probabilities(&mut self) -> &ProbabilityTable {
		self.probabilities.insert(ProbabilityTable::compute(&self.occurrences, self.config.alpha()))
	}

	/// Rebuilds every derived table.
	pub fn compute_all(&mut self) {
		self.compute_statistics();
		self.compute_probabilities();
	}

	/// Estimated conditional entropy of the training text, in bits per symbol.
	///
	/// # Errors
	/// Returns `StatisticsNotComputed` if statistics are missing or stale.
	pub fn entropy(&self) -> Result<f64> {
		let statistics = self.statistics.as_ref().ok_or(FcmError::StatisticsNotComputed)?;
		Ok(conditional_entropy(&self.occurrences, statistics))
	}

	/// How often `symbol` followed `context` in training; 0 for an unseen context.
	///
	/// # Errors
	/// - `NotInAlphabet` if the symbol or the context holds a foreign character
	/// - `ContextLength` if the context is not exactly `order` characters long
	pub fn symbol_count(&self, symbol: char, context: &str) -> Result<u64> {
		let symbol = Symbol::encode(symbol)?;
		let key = self.context_key(context)?;
		let count = self.occurrences.count(key, symbol);
		debug!("'{symbol}' after '{context}': {count}");
		Ok(count)
	}

	/// Conditional distribution after `context`.
	///
	/// # Errors
	/// - `ProbabilitiesNotComputed` if the table was not built
	/// - `UnknownContext` if `context` never occurred in training
	/// - `NotInAlphabet` / `ContextLength` for a malformed context
	pub fn probabilities_for(&self, context: &str) -> Result<&ProbabilityRow> {
		let probabilities = self.probabilities.as_ref().ok_or(FcmError::ProbabilitiesNotComputed)?;
		let key = self.context_key(context)?;
		probabilities.get(key).ok_or_else(|| FcmError::UnknownContext(context.to_owned()))
	}

	/// Generates text with the configured sizes and unknown-context policy,
	/// handing over each line as soon as it is complete.
	///
	/// # Errors
	/// Fails if a derived table is missing, the model is empty, or `emit` fails.
	pub fn generate<R, F>(&self, rng: &mut R, emit: F) -> Result<GenerationEnd>
	where
		R: Rng + ?Sized,
		F: FnMut(String) -> Result<()>,
	{
		let statistics = self.statistics.as_ref().ok_or(FcmError::StatisticsNotComputed)?;
		let probabilities = self.probabilities.as_ref().ok_or(FcmError::ProbabilitiesNotComputed)?;
		let generator = TextGenerator::new(self.order(), statistics, probabilities, self.config.unknown_context);
		generator.generate(rng, self.config.chars_per_line, self.config.lines, emit)
	}

	/// Generates text into `writer`, flushing after every line.
	pub fn generate_to<R, W>(&self, rng: &mut R, writer: &mut W) -> Result<GenerationEnd>
	where
		R: Rng + ?Sized,
		W: Write,
	{
		self.generate(rng, |line| {
			writeln!(writer, "{line}")?;
			writer.flush()?;
			Ok(())
		})
	}

	/// Generates text into a vector of lines.
	pub fn generate_lines<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<(Vec<String>, GenerationEnd)> {
		let mut lines = Vec::new();
		let end = self.generate(rng, |line| {
			lines.push(line);
			Ok(())
		})?;
		Ok((lines, end))
	}

	fn context_key(&self, context: &str) -> Result<ContextKey> {
		let symbols = encode_str(context)?;
		if symbols.len() != self.order() {
			return Err(FcmError::ContextLength { expected: self.order(), found: symbols.len() });
		}
		Ok(ContextKey::encode(&symbols))
	}

	fn invalidate(&mut self) {
		self.statistics = None;
		self.probabilities = None;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn model(text: &str, order: usize) -> Fcm {
		let mut fcm = Fcm::new(FcmConfig::new(order).unwrap()).unwrap();
		fcm.train(text.chars());
		fcm
	}

	#[test]
	fn derived_tables_are_explicit() {
		let mut fcm = model("the cat sat", 1);
		assert!(matches!(fcm.entropy(), Err(FcmError::StatisticsNotComputed)));

		fcm.compute_statistics();
		assert!(fcm.entropy().is_ok());
		let mut rng = StdRng::seed_from_u64(5);
		assert!(matches!(fcm.generate_lines(&mut rng), Err(FcmError::ProbabilitiesNotComputed)));

		fcm.train("the end".chars());
		assert!(fcm.statistics().is_none());
		assert!(matches!(fcm.entropy(), Err(FcmError::StatisticsNotComputed)));
	}

	#[test]
	fn symbol_count_queries() {
		let fcm = model("the cat sat", 1);
		assert_eq!(fcm.symbol_count('h', "t").unwrap(), 1);
		assert_eq!(fcm.symbol_count('T', "a").unwrap(), 2);
		assert_eq!(fcm.symbol_count('a', "z").unwrap(), 0);
		assert!(matches!(fcm.symbol_count('!', "t"), Err(FcmError::NotInAlphabet('!'))));
		assert!(matches!(
			fcm.symbol_count('a', "ta"),
			Err(FcmError::ContextLength { expected: 1, found: 2 })
		));
	}

	#[test]
	fn strict_probability_lookup() {
		let mut fcm = model("the cat sat", 1);
		assert!(matches!(fcm.probabilities_for("t"), Err(FcmError::ProbabilitiesNotComputed)));
		fcm.compute_probabilities();
		let row = fcm.probabilities_for("t").unwrap();
		assert_eq!(row[Symbol::SPACE.index()], 0.5);
		assert!(matches!(fcm.probabilities_for("z"), Err(FcmError::UnknownContext(c)) if c == "z"));
	}

	#[test]
	fn from_table_checks_order() {
		let table = OccurrenceTable::new(2).unwrap();
		let result = Fcm::from_table(FcmConfig::new(3).unwrap(), table);
		assert!(matches!(result, Err(FcmError::OrderMismatch { expected: 3, found: 2 })));
	}

	#[test]
	fn writes_flushed_lines() {
		let mut config = FcmConfig::new(1).unwrap();
		config.chars_per_line = 4;
		config.lines = 3;
		let mut fcm = Fcm::new(config).unwrap();
		fcm.train("abababab".chars());
		fcm.compute_all();

		let mut out = Vec::new();
		let mut rng = StdRng::seed_from_u64(9);
		let end = fcm.generate_to(&mut rng, &mut out).unwrap();
		assert_eq!(end, GenerationEnd::Completed);

		let text = String::from_utf8(out).unwrap();
		let lines: Vec<&str> = text.lines().collect();
		assert_eq!(lines.len(), 3);
		assert_eq!(lines[0].len(), 5);
		assert!(lines[1..].iter().all(|l| l.len() == 4));
	}
}
