use std::io::{self, Write};

use fcm_core::model::alphabet::ALPHABET;
use fcm_core::model::occurrence::OccurrenceTable;
use fcm_core::model::probability::ProbabilityTable;

/// Room for a quoted context.
fn label_width(order: usize) -> usize {
	(order + 2).max(6)
}

/// Column header shared by both tables.
fn write_header<W: Write>(out: &mut W, order: usize) -> io::Result<()> {
	write!(out, "{:>width$} |", "", width = label_width(order))?;
	for c in ALPHABET.chars() {
		write!(out, "{c:>6} |")?;
	}
	writeln!(out)
}

/// Context → occurrence counts, one row per context.
pub fn write_occurrences<W: Write>(out: &mut W, table: &OccurrenceTable) -> io::Result<()> {
	let order = table.order();
	write_header(out, order)?;
	for (key, row) in table.iter() {
		write!(out, "{:>width$} |", format!("'{}'", key.to_context_string(order)), width = label_width(order))?;
		for count in row.counts() {
			write!(out, "{count:>6} |")?;
		}
		writeln!(out)?;
	}
	Ok(())
}

/// Context → conditional probabilities, one row per context.
pub fn write_probabilities<W: Write>(out: &mut W, table: &ProbabilityTable, order: usize) -> io::Result<()> {
	writeln!(out, "Probabilistic matrix (alpha {}):", table.alpha())?;
	write_header(out, order)?;
	for (key, row) in table.iter() {
		write!(out, "{:>width$} |", format!("'{}'", key.to_context_string(order)), width = label_width(order))?;
		for p in row {
			write!(out, "{p:>6.3} |")?;
		}
		writeln!(out)?;
	}
	Ok(())
}
