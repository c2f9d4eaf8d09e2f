use std::fmt;

use serde::{Deserialize, Serialize};

use super::alphabet::{ALPHABET_LENGTH, Symbol, decode_symbols};
use crate::error::{FcmError, Result};

/// Largest order whose key space `[0, 27^k)` still fits in a `u64`.
pub const MAX_ORDER: usize = 13;

const BASE: u64 = ALPHABET_LENGTH as u64;

/// Integer identifier of a context of `k` symbols.
///
/// The symbol at position `i` of the context (oldest first, as it sits in the
/// window) contributes `index * 27^i`. Keys for order `k` cover exactly
/// `[0, 27^k)`, one per possible context.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextKey(u64);

impl ContextKey {
	/// Wraps a raw key. Range checks against an order are left to the
	/// caller (see `key_space`).
	pub fn new(value: u64) -> Self {
		Self(value)
	}

	pub fn value(self) -> u64 {
		self.0
	}

	/// Encodes a context. Symbols are weighted by their position.
	///
	/// # Parameters
	/// - `context`: Symbols oldest first, at most `MAX_ORDER` of them.
	///
	/// # Returns
	/// The key, `< 27^n` for `n` symbols.
	pub fn encode<'a, I>(context: I) -> Self
	where
		I: IntoIterator<Item = &'a Symbol>,
	{
		let mut weight = 1u64;
		let mut key = 0u64;
		for symbol in context {
			key += symbol.index() as u64 * weight;
			weight = weight.wrapping_mul(BASE);
		}
		Self(key)
	}

	/// Decodes the key into `order` symbols, the exact inverse of `encode`.
	///
	/// Digits are peeled from the lowest weight upwards, removing each
	/// digit's contribution before moving to the next position.
	pub fn decode(self, order: usize) -> Vec<Symbol> {
		let mut number = self.0;
		let mut symbols = Vec::with_capacity(order);
		let mut weight = 1u64;
		for _ in 0..order {
			let digit = (number / weight) % BASE;
			// digit < 27 by construction
			symbols.push(Symbol::from_index(digit as usize).unwrap_or(Symbol::SPACE));
			number -= digit * weight;
			weight = weight.wrapping_mul(BASE);
		}
		symbols
	}

	/// Decoded context as text.
	pub fn to_context_string(self, order: usize) -> String {
		decode_symbols(&self.decode(order))
	}

	/// True if every symbol of the decoded context is a space.
	pub fn is_all_space(self, order: usize) -> bool {
		self.decode(order).iter().all(|s| *s == Symbol::SPACE)
	}
}

impl fmt::Display for ContextKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Checks that `order` is usable as a context length.
///
/// # Returns
/// - `Ok(order)` for `1..=MAX_ORDER`
/// - `Err(InvalidOrder)` otherwise
pub fn validate_order(order: usize) -> Result<usize> {
	if order == 0 || order > MAX_ORDER {
		return Err(FcmError::InvalidOrder(order));
	}
	Ok(order)
}

/// Number of distinct keys of the given order (`27^order`).
pub fn key_space(order: usize) -> u64 {
	BASE.pow(order as u32)
}
