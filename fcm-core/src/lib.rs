//! Finite-context (Markov) model of text over a 27-symbol alphabet.
//!
//! This crate provides:
//! - Training of an order-`k` model from any character or byte stream
//! - Context statistics, smoothed conditional probabilities and an
//!   entropy estimate of the source
//! - Random text generation with the same local statistics
//! - Saving and loading of the raw occurrence table
//!
//! Derived tables are always rebuilt from the raw table, and only when the
//! caller asks for it (see [`Fcm`]).

/// Model components and the `Fcm` model object.
pub mod model;

/// Run parameters.
pub mod config;

/// Error type shared by the whole crate.
pub mod error;

/// Model file persistence.
pub mod store;

/// File helpers.
///
/// Not exposed
pub(crate) mod io;

pub use config::{FcmConfig, UnknownContextPolicy};
pub use error::{FcmError, Result};
pub use model::fcm::Fcm;
pub use model::generator::GenerationEnd;
