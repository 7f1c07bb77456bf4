//! Duty-rate interpreters.
//!
//! - [`GeminiInterpreter`] - hosted reasoning model over HTTP
//! - [`RuleBasedInterpreter`] - deterministic rate arithmetic, no network

pub mod gemini;
pub mod rule_based;

pub use gemini::GeminiInterpreter;
pub use rule_based::RuleBasedInterpreter;
