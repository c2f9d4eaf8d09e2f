use crate::error::{FcmError, Result};
use crate::model::context_key::validate_order;

/// What the generator does when the current context was never seen in training.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum UnknownContextPolicy {
	/// Sample from the most frequent context's distribution, or uniformly if
	/// the model has none.
	#[default]
	MostFrequent,
	/// Sample uniformly over the alphabet.
	Uniform,
	/// End generation and return what was produced so far.
	Stop,
}

/// Run parameters of a finite-context model.
///
/// # Invariants
/// - `order` is within `1..=MAX_ORDER`
/// - `alpha` is finite and `>= 0`
#[derive(Clone, Debug, PartialEq)]
pub struct FcmConfig {
	order: usize,
	alpha: f64,

	/// Characters generated per output line.
	pub chars_per_line: usize,

	/// Number of lines to generate.
	pub lines: usize,

	/// Print the occurrence table and entropy.
	pub emit_statistics: bool,

	pub unknown_context: UnknownContextPolicy,
}

impl FcmConfig {
	/// Creates a configuration for contexts of `order` symbols with defaults
	/// for everything else (alpha 0, 10 lines of 100 characters).
	///
	/// # Errors
	/// Returns `InvalidOrder` if the order is 0 or too large.
	pub fn new(order: usize) -> Result<Self> {
		Ok(Self {
			order: validate_order(order)?,
			alpha: 0.0,
			chars_per_line: 100,
			lines: 10,
			emit_statistics: false,
			unknown_context: UnknownContextPolicy::default(),
		})
	}

	pub fn order(&self) -> usize {
		self.order
	}

	/// Changes the context order.
	///
	/// # Errors
	/// Returns `InvalidOrder` if the order is 0 or too large.
	pub fn set_order(&mut self, order: usize) -> Result<()> {
		self.order = validate_order(order)?;
		Ok(())
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Sets the smoothing constant.
	///
	/// # Errors
	/// Returns `InvalidAlpha` for negative, NaN or infinite values.
	pub fn set_alpha(&mut self, alpha: f64) -> Result<()> {
		if !alpha.is_finite() || alpha < 0.0 {
			return Err(FcmError::InvalidAlpha(alpha));
		}
		self.alpha = alpha;
		Ok(())
	}

	/// Generation only runs when both sizes are non-zero.
	pub fn generates_text(&self) -> bool {
		self.chars_per_line > 0 && self.lines > 0
	}
}
