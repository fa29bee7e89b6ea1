//! Fault determination for a single driver letter.
//!
//! Three stages, in strict priority order:
//!
//! 1. Lexical rules over the letter text ([`crate::rules`]).
//! 2. An optional [`FaultOracle`] (an LLM) given a bounded excerpt.
//! 3. A [`TieBreak`], by default an unweighted coin flip.
//!
//! Classification never fails: oracle errors are logged and fall through to
//! the tie-break.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use faultline_core::DriverType;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use thiserror::Error;
use tracing::{debug, warn};

use crate::rules;

/// Maximum number of characters of a letter sent to the oracle.
pub const ORACLE_EXCERPT_CHARS: usize = 4000;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("no classification service configured")]
    Unavailable,

    #[cfg(feature = "gemini")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Server { status: u16, body: String },
}

/// External text-classification capability used when lexical rules are silent.
#[async_trait]
pub trait FaultOracle: Send + Sync {
    /// Label a letter excerpt as fault or not fault.
    async fn classify(&self, excerpt: &str) -> Result<DriverType, OracleError>;
}

/// Oracle for offline use: always unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOracle;

#[async_trait]
impl FaultOracle for NoOracle {
    async fn classify(&self, _excerpt: &str) -> Result<DriverType, OracleError> {
        Err(OracleError::Unavailable)
    }
}

/// Policy when neither the rules nor the oracle produce a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Unweighted coin flip.
    #[default]
    CoinFlip,
    /// Always the given label.
    Fixed(DriverType),
}

/// Which stage produced a determination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Basis {
    Lexical,
    Oracle,
    TieBreak,
}

impl Basis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lexical => "lexical",
            Self::Oracle => "oracle",
            Self::TieBreak => "tie_break",
        }
    }
}

/// Label for one letter together with the stage that decided it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Determination {
    pub driver_type: DriverType,
    pub basis: Basis,
}

/// Fault classifier with injectable oracle and random source.
pub struct FaultClassifier {
    oracle: Arc<dyn FaultOracle>,
    tie_break: TieBreak,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl Default for FaultClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl FaultClassifier {
    /// Lexical rules and coin flip only; no oracle.
    pub fn new() -> Self {
        Self {
            oracle: Arc::new(NoOracle),
            tie_break: TieBreak::default(),
            rng: Mutex::new(Box::new(StdRng::from_entropy())),
        }
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn FaultOracle>) -> Self {
        self.oracle = oracle;
        self
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Replace the random source used by [`TieBreak::CoinFlip`].
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Mutex::new(Box::new(rng));
        self
    }

    /// Label a letter.
    pub async fn classify(&self, letter: &str) -> DriverType {
        self.determine(letter).await.driver_type
    }

    /// Label a letter and report which stage decided.
    pub async fn determine(&self, letter: &str) -> Determination {
        if let Some(driver_type) = rules::lexical_verdict(letter) {
            debug!(%driver_type, "determined from letter wording");
            return Determination {
                driver_type,
                basis: Basis::Lexical,
            };
        }

        match self.oracle.classify(excerpt(letter)).await {
            Ok(driver_type) => {
                debug!(%driver_type, "determined by classification service");
                return Determination {
                    driver_type,
                    basis: Basis::Oracle,
                };
            }
            Err(OracleError::Unavailable) => {}
            Err(err) => warn!(error = %err, "classification service failed, using tie-break"),
        }

        let driver_type = match self.tie_break {
            TieBreak::Fixed(driver_type) => driver_type,
            TieBreak::CoinFlip => {
                let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                if rng.gen_bool(0.5) {
                    DriverType::Fault
                } else {
                    DriverType::NotFault
                }
            }
        };
        debug!(%driver_type, "no signal in letter, applied tie-break");
        Determination {
            driver_type,
            basis: Basis::TieBreak,
        }
    }
}

/// The leading [`ORACLE_EXCERPT_CHARS`] characters of `letter`.
pub fn excerpt(letter: &str) -> &str {
    match letter.char_indices().nth(ORACLE_EXCERPT_CHARS) {
        Some((end, _)) => &letter[..end],
        None => letter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const AMBIGUOUS: &str = "Please find enclosed a copy of the police report for your records.";

    /// Oracle returning a fixed answer and recording what it was asked.
    struct ScriptedOracle {
        answer: Option<DriverType>,
        calls: AtomicUsize,
        last_len: AtomicUsize,
    }

    impl ScriptedOracle {
        fn new(answer: Option<DriverType>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: AtomicUsize::new(0),
                last_len: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl FaultOracle for ScriptedOracle {
        async fn classify(&self, excerpt: &str) -> Result<DriverType, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.last_len.store(excerpt.chars().count(), Ordering::SeqCst);
            self.answer.ok_or(OracleError::Server {
                status: 503,
                body: "overloaded".into(),
            })
        }
    }

    #[tokio::test]
    async fn strong_fault_signal_is_deterministic() {
        let clf = FaultClassifier::new().with_tie_break(TieBreak::Fixed(DriverType::NotFault));
        for _ in 0..20 {
            let d = clf.determine("You are at fault for this accident.").await;
            assert_eq!(d.driver_type, DriverType::Fault);
            assert_eq!(d.basis, Basis::Lexical);
        }
    }

    #[tokio::test]
    async fn strong_not_fault_signal_is_deterministic() {
        let clf = FaultClassifier::new().with_tie_break(TieBreak::Fixed(DriverType::Fault));
        for _ in 0..20 {
            let d = clf
                .determine("You are not held responsible for this accident.")
                .await;
            assert_eq!(d.driver_type, DriverType::NotFault);
            assert_eq!(d.basis, Basis::Lexical);
        }
    }

    #[tokio::test]
    async fn lexical_match_skips_oracle() {
        let oracle = ScriptedOracle::new(Some(DriverType::NotFault));
        let clf = FaultClassifier::new().with_oracle(oracle.clone());
        assert_eq!(
            clf.classify("You are liable for damages.").await,
            DriverType::Fault
        );
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn ambiguous_without_oracle_reaches_both_labels() {
        let clf = FaultClassifier::new().with_rng(StdRng::seed_from_u64(7));
        let mut fault = 0;
        let mut not_fault = 0;
        for _ in 0..400 {
            let d = clf.determine(AMBIGUOUS).await;
            assert_eq!(d.basis, Basis::TieBreak);
            match d.driver_type {
                DriverType::Fault => fault += 1,
                DriverType::NotFault => not_fault += 1,
            }
        }
        assert!(fault > 100, "fault drawn {fault} times");
        assert!(not_fault > 100, "not_fault drawn {not_fault} times");
    }

    #[tokio::test]
    async fn seeded_rng_is_reproducible() {
        let a = FaultClassifier::new().with_rng(StdRng::seed_from_u64(42));
        let b = FaultClassifier::new().with_rng(StdRng::seed_from_u64(42));
        for _ in 0..32 {
            assert_eq!(a.classify(AMBIGUOUS).await, b.classify(AMBIGUOUS).await);
        }
    }

    #[tokio::test]
    async fn fixed_tie_break() {
        let clf = FaultClassifier::new().with_tie_break(TieBreak::Fixed(DriverType::NotFault));
        let d = clf.determine(AMBIGUOUS).await;
        assert_eq!(d.driver_type, DriverType::NotFault);
        assert_eq!(d.basis, Basis::TieBreak);
    }

    #[tokio::test]
    async fn oracle_answers_ambiguous_letters() {
        let oracle = ScriptedOracle::new(Some(DriverType::Fault));
        let clf = FaultClassifier::new()
            .with_oracle(oracle.clone())
            .with_tie_break(TieBreak::Fixed(DriverType::NotFault));
        let d = clf.determine(AMBIGUOUS).await;
        assert_eq!(d.driver_type, DriverType::Fault);
        assert_eq!(d.basis, Basis::Oracle);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn oracle_failure_degrades_to_tie_break() {
        let oracle = ScriptedOracle::new(None);
        let clf = FaultClassifier::new()
            .with_oracle(oracle.clone())
            .with_tie_break(TieBreak::Fixed(DriverType::Fault));
        let d = clf.determine(AMBIGUOUS).await;
        assert_eq!(d.driver_type, DriverType::Fault);
        assert_eq!(d.basis, Basis::TieBreak);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn oracle_sees_bounded_excerpt() {
        let oracle = ScriptedOracle::new(Some(DriverType::NotFault));
        let clf = FaultClassifier::new().with_oracle(oracle.clone());
        let long_letter = "é".repeat(ORACLE_EXCERPT_CHARS + 500);
        clf.classify(&long_letter).await;
        assert_eq!(oracle.last_len.load(Ordering::SeqCst), ORACLE_EXCERPT_CHARS);
    }

    #[tokio::test]
    async fn no_oracle_is_unavailable() {
        assert!(matches!(
            NoOracle.classify("anything").await,
            Err(OracleError::Unavailable)
        ));
    }

    #[test]
    fn excerpt_of_short_text_is_whole_text() {
        assert_eq!(excerpt("short"), "short");
        assert_eq!(excerpt(""), "");
    }
}
