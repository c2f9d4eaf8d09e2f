mod report;

use std::error::Error;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use env_logger::Env;
use log::{LevelFilter, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

use fcm_core::model::occurrence::OccurrenceTable;
use fcm_core::{Fcm, FcmConfig, GenerationEnd, UnknownContextPolicy, store};

/// Builds a finite-context model of a text, reports its statistics and
/// generates new text from it.
///
/// Example: `fcm -k 6 -l 10 -c 100 book.txt`
#[derive(Parser, Debug)]
#[command(name = "fcm", version, about, long_about = None)]
struct Cli {
	/// Context order (number of preceding symbols)
	#[arg(short = 'k', long, default_value_t = 1)]
	order: usize,

	/// Load a saved model and merge it with the training input
	#[arg(short = 'f', long = "load", value_name = "PATH")]
	load: Option<PathBuf>,

	/// Save the model after training
	#[arg(short = 'o', long = "save", value_name = "PATH")]
	save: Option<PathBuf>,

	/// Print the occurrence table and the entropy estimate
	#[arg(short = 's', long = "stats")]
	stats: bool,

	/// Print the conditional probability table
	#[arg(short = 'p', long = "probabilities")]
	probabilities: bool,

	/// Characters per generated line (0 disables generation)
	#[arg(short = 'c', long = "chars", default_value_t = 100)]
	chars_per_line: usize,

	/// Number of generated lines (0 disables generation)
	#[arg(short = 'l', long = "lines", default_value_t = 10)]
	lines: usize,

	/// Smoothing constant used in probability estimation
	#[arg(short = 'a', long, default_value_t = 0.0)]
	alpha: f64,

	/// What to do when generation reaches a context never seen in training
	#[arg(long = "on-unknown", value_enum, default_value_t = OnUnknown::MostFrequent)]
	on_unknown: OnUnknown,

	/// Seed for reproducible generation
	#[arg(long)]
	seed: Option<u64>,

	/// Print all debug messages
	#[arg(short = 'd', long)]
	debug: bool,

	/// Text to learn from
	input: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OnUnknown {
	MostFrequent,
	Uniform,
	Stop,
}

impl From<OnUnknown> for UnknownContextPolicy {
	fn from(value: OnUnknown) -> Self {
		match value {
			OnUnknown::MostFrequent => UnknownContextPolicy::MostFrequent,
			OnUnknown::Uniform => UnknownContextPolicy::Uniform,
			OnUnknown::Stop => UnknownContextPolicy::Stop,
		}
	}
}

impl Cli {
	fn config(&self) -> fcm_core::Result<FcmConfig> {
		let mut config = FcmConfig::new(self.order)?;
		config.set_alpha(self.alpha)?;
		config.chars_per_line = self.chars_per_line;
		config.lines = self.lines;
		config.emit_statistics = self.stats;
		config.unknown_context = self.on_unknown.into();
		Ok(config)
	}
}

fn init_logging(debug: bool) {
	let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));
	if debug {
		builder.filter_level(LevelFilter::Trace);
	}
	let _ = builder.try_init();
}

/// Reads the saved model, if any. A model that cannot be read is reported
/// and training goes on without it.
fn load_saved(cli: &Cli) -> Option<OccurrenceTable> {
	let path = cli.load.as_ref()?;
	match store::load_from_path(path) {
		Ok(table) => {
			info!("loaded {} contexts from {}", table.len(), path.display());
			Some(table)
		}
		Err(e) => {
			eprintln!("Failed to load model '{}': {e}", path.display());
			None
		}
	}
}

fn build_model(cli: &Cli, config: FcmConfig) -> Result<Fcm, Box<dyn Error>> {
	let saved = load_saved(cli);

	let fcm = match &cli.input {
		Some(input) => {
			let file = File::open(input).map_err(|e| format!("Fail opening file '{}' for reading: {e}", input.display()))?;
			info!("using input stream for processing: {}", input.display());

			let mut fcm = Fcm::new(config)?;
			let counted = fcm.train_reader(file)?;
			info!("{counted} symbols counted");

			if let Some(table) = saved {
				if let Err(e) = fcm.merge(&table) {
					eprintln!("Ignoring saved model: {e}");
				}
			}
			fcm
		}
		None => {
			// No corpus: work from the saved model alone, in its own order
			let Some(table) = saved else {
				return Err("No file for processing specified nor a saved model to load".into());
			};
			let mut config = config;
			config.set_order(table.order())?;
			Fcm::from_table(config, table)?
		}
	};

	if let Some(path) = &cli.save {
		match store::save_to_path(fcm.occurrences(), path) {
			Ok(()) => info!("model saved to {}", path.display()),
			Err(e) => eprintln!("Failed to save model '{}': {e}", path.display()),
		}
	}

	Ok(fcm)
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
	let config = cli.config()?;
	let mut fcm = build_model(cli, config)?;
	let stdout = io::stdout();
	let mut out = stdout.lock();

	if fcm.config().emit_statistics {
		report::write_occurrences(&mut out, fcm.occurrences())?;
		fcm.compute_statistics();
		writeln!(out, "Entropy: {}", fcm.entropy()?)?;
	}

	if cli.probabilities || fcm.config().generates_text() {
		fcm.compute_all();
	}

	if cli.probabilities {
		if let Some(probabilities) = fcm.probabilities() {
			report::write_probabilities(&mut out, probabilities, fcm.order())?;
			if let Some(best) = probabilities.most_frequent() {
				writeln!(out, "Most frequent context: '{}' ({} occurrences)", best.key.to_context_string(fcm.order()), best.total)?;
			}
		}
	}

	if fcm.config().generates_text() {
		let mut rng = match cli.seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_os_rng(),
		};
		writeln!(out, "Generating {} lines with {} chars:", fcm.config().lines, fcm.config().chars_per_line)?;
		if let GenerationEnd::UnknownContext(context) = fcm.generate_to(&mut rng, &mut out)? {
			warn!("generation stopped on unseen context '{context}'");
			eprintln!("Generation stopped: context '{context}' never seen in training");
		}
	}

	Ok(())
}

fn main() -> ExitCode {
	let cli = Cli::parse();
	init_logging(cli.debug);

	match run(&cli) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("{e}");
			ExitCode::FAILURE
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::CommandFactory;

	#[test]
	fn cli_definition_is_valid() {
		Cli::command().debug_assert();
	}

	#[test]
	fn defaults_match_the_model_defaults() {
		let cli = Cli::try_parse_from(["fcm", "book.txt"]).unwrap();
		let config = cli.config().unwrap();
		assert_eq!(config, FcmConfig::new(1).unwrap());
		assert_eq!(cli.input, Some(PathBuf::from("book.txt")));
	}

	#[test]
	fn short_flags() {
		let cli = Cli::try_parse_from([
			"fcm", "-k", "3", "-a", "0.5", "-c", "20", "-l", "2", "-s", "-o", "model.fcm", "--on-unknown", "stop", "book.txt",
		])
		.unwrap();
		let config = cli.config().unwrap();
		assert_eq!(config.order(), 3);
		assert_eq!(config.alpha(), 0.5);
		assert_eq!(config.chars_per_line, 20);
		assert_eq!(config.lines, 2);
		assert!(config.emit_statistics);
		assert_eq!(config.unknown_context, UnknownContextPolicy::Stop);
		assert_eq!(cli.save, Some(PathBuf::from("model.fcm")));
	}

	#[test]
	fn invalid_order_is_rejected_by_the_model() {
		let cli = Cli::try_parse_from(["fcm", "-k", "0", "book.txt"]).unwrap();
		assert!(cli.config().is_err());
	}

	#[test]
	fn nothing_to_do_without_input_or_model() {
		let cli = Cli::try_parse_from(["fcm", "-s"]).unwrap();
		let config = cli.config().unwrap();
		assert!(build_model(&cli, config).is_err());
	}

	#[test]
	fn saved_model_is_copied_without_input() {
		let dir = tempfile::tempdir().unwrap();
		let source = dir.path().join("source.fcm");
		let copy = dir.path().join("copy.fcm");

		let mut table = OccurrenceTable::new(2).unwrap();
		table.accumulate("a rose is a rose".chars());
		store::save_to_path(&table, &source).unwrap();

		let cli = Cli::try_parse_from(["fcm", "-f", source.to_str().unwrap(), "-o", copy.to_str().unwrap()]).unwrap();
		let fcm = build_model(&cli, cli.config().unwrap()).unwrap();
		assert_eq!(fcm.order(), 2);

		assert_eq!(store::load_from_path(&copy).unwrap(), table);
	}

	#[test]
	fn trained_model_is_saved() {
		let dir = tempfile::tempdir().unwrap();
		let corpus = dir.path().join("corpus.txt");
		let model = dir.path().join("model.fcm");
		std::fs::write(&corpus, "abcabc").unwrap();

		let cli = Cli::try_parse_from(["fcm", "-k", "2", "-o", model.to_str().unwrap(), corpus.to_str().unwrap()]).unwrap();
		let fcm = build_model(&cli, cli.config().unwrap()).unwrap();

		assert_eq!(&store::load_from_path(&model).unwrap(), fcm.occurrences());
	}
}
