//! Finite-context model components, leaf first:
//! - Alphabet and context-key codecs (`Symbol`, `ContextKey`)
//! - The sliding window used while reading text
//! - The raw occurrence table and its training pass
//! - Derived tables (`ContextStatistics`, `ProbabilityTable`)
//! - Entropy estimation and text generation
//! - `Fcm`, which owns all of the above

/// The 27-symbol alphabet (`a..=z` and space).
pub mod alphabet;

/// Base-27 encoding of fixed-length contexts into integer keys.
pub mod context_key;

/// Fixed-capacity FIFO of the most recent symbols.
pub mod window;

/// Context → symbol counts, built by one pass over the text.
pub mod occurrence;

/// Per-context totals and smoothed context probabilities.
pub mod statistics;

/// Smoothed conditional probabilities and the most frequent context.
pub mod probability;

/// Conditional entropy estimate.
pub mod entropy;

/// Random walk over the probability table.
pub mod generator;

/// The model object tying the tables together.
pub mod fcm;
