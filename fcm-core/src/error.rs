use std::io;

/// Errors reported by the finite-context model.
///
/// Nothing in this crate aborts the process: every failure is handed back
/// to the caller, which decides whether it is fatal.
#[derive(Debug, thiserror::Error)]
pub enum FcmError {
	/// Character outside `a..=z` and space (after case folding).
	#[error("'{0}' is not part of the alphabet")]
	NotInAlphabet(char),

	/// A corpus or model stream could not be opened, read or written.
	#[error("stream unavailable: {0}")]
	StreamUnavailable(#[from] io::Error),

	/// A model could not be encoded or decoded.
	#[error("serialization error: {0}")]
	Serialization(#[from] postcard::Error),

	/// No row exists for the requested context.
	#[error("unknown context '{0}'")]
	UnknownContext(String),

	/// Context order outside `1..=MAX_ORDER`, or a key outside the key
	/// space of the order.
	#[error("order must be between 1 and {max}, got {0}", max = crate::model::context_key::MAX_ORDER)]
	InvalidOrder(usize),

	/// Smoothing constant that is negative, NaN or infinite.
	#[error("alpha must be a finite value >= 0, got {0}")]
	InvalidAlpha(f64),

	/// Two tables of different orders were combined.
	#[error("order mismatch: expected {expected}, found {found}")]
	OrderMismatch { expected: usize, found: usize },

	/// Model file written with another `store::FORMAT_VERSION`.
	#[error("incompatible model format version {0}")]
	IncompatibleFormat(u16),

	/// Model file that decodes but breaks a table invariant.
	#[error("corrupt model: {0}")]
	CorruptModel(String),

	/// Adding counts would exceed `u64::MAX`.
	#[error("occurrence counts overflow")]
	CountOverflow,

	/// Context string whose length differs from the model order.
	#[error("context must have {expected} symbols, got {found}")]
	ContextLength { expected: usize, found: usize },

	/// `compute_statistics` has not run since the last change.
	#[error("context statistics have not been computed")]
	StatisticsNotComputed,

	/// `compute_probabilities` has not run since the last change.
	#[error("conditional probabilities have not been computed")]
	ProbabilitiesNotComputed,

	/// Generation needs at least one known context.
	#[error("the model has no contexts")]
	EmptyModel,

	/// A probability row is not a usable distribution.
	#[error("cannot sample from context: {0}")]
	Sampling(String),
}

/// Shorthand used across the crate.
pub type Result<T> = std::result::Result<T, FcmError>;
