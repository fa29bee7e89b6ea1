//! Fault determination: lexical rules, an optional LLM oracle, and a tie-break.

pub mod classifier;
pub mod rules;

#[cfg(feature = "gemini")]
pub mod gemini;

pub use classifier::{
    Basis, Determination, FaultClassifier, FaultOracle, NoOracle, OracleError, TieBreak,
};
#[cfg(feature = "gemini")]
pub use gemini::{GeminiConfig, GeminiOracle};
