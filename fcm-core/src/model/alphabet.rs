use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FcmError, Result};

/// Number of symbols: `a..=z` followed by space.
pub const ALPHABET_LENGTH: usize = 27;

/// Symbols in index order.
pub const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz ";

const SPACE_INDEX: u8 = 26;

/// One symbol of the 27-letter alphabet, stored as its index.
///
/// # Invariants
/// - The wrapped index is always `< ALPHABET_LENGTH`
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u8);

impl Symbol {
	/// The space symbol (index 26).
	pub const SPACE: Symbol = Symbol(SPACE_INDEX);

	/// Case-folds `c` and returns its symbol.
	///
	/// # Errors
	/// Returns `NotInAlphabet` for digits, punctuation, newlines and
	/// anything outside ASCII.
	pub fn encode(c: char) -> Result<Self> {
		match c.to_ascii_lowercase() {
			l @ 'a'..='z' => Ok(Symbol(l as u8 - b'a')),
			' ' => Ok(Symbol::SPACE),
			_ => Err(FcmError::NotInAlphabet(c)),
		}
	}

	/// Builds a symbol from its index, `None` if out of range.
	pub fn from_index(index: usize) -> Option<Self> {
		if index < ALPHABET_LENGTH {
			Some(Symbol(index as u8))
		} else {
			None
		}
	}

	pub fn index(self) -> usize {
		self.0 as usize
	}

	/// Inverse of `encode`: 26 is space, everything else `'a' + index`.
	pub fn decode(self) -> char {
		if self.0 == SPACE_INDEX {
			' '
		} else {
			(b'a' + self.0) as char
		}
	}

	/// Every symbol, in index order.
	pub fn all() -> impl Iterator<Item = Symbol> {
		(0..ALPHABET_LENGTH as u8).map(Symbol)
	}
}

impl fmt::Display for Symbol {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.decode())
	}
}

/// Encodes a whole string, failing on the first character outside the alphabet.
pub fn encode_str(s: &str) -> Result<Vec<Symbol>> {
	s.chars().map(Symbol::encode).collect()
}

/// Decodes a symbol sequence back to text.
pub fn decode_symbols(symbols: &[Symbol]) -> String {
	symbols.iter().map(|s| s.decode()).collect()
}
