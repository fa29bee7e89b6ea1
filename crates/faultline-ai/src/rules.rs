//! Lexical fault rules.
//!
//! Letters drafted upstream state the recipient's liability in a handful of
//! stock phrasings. A rule fires when every `all` phrase occurs in the
//! lower-cased letter and no `none` phrase does. At-fault rules are checked
//! before not-at-fault rules, and the first match decides.

use faultline_core::DriverType;

/// A co-occurrence rule over lower-cased letter text.
#[derive(Debug, Clone, Copy)]
pub struct PhraseRule {
    pub all: &'static [&'static str],
    pub none: &'static [&'static str],
}

impl PhraseRule {
    pub fn matches(&self, lowered: &str) -> bool {
        self.all.iter().all(|p| lowered.contains(p))
            && !self.none.iter().any(|p| lowered.contains(p))
    }
}

/// Phrasings that mark the recipient as the at-fault driver.
///
/// The first rule is broad: it also fires on "you are not at fault". That
/// matches how letters have always been labelled and is kept as is.
pub const AT_FAULT_RULES: &[PhraseRule] = &[
    PhraseRule {
        all: &["you are", "at fault"],
        none: &[],
    },
    PhraseRule {
        all: &["you are", "determined to be at fault"],
        none: &[],
    },
    PhraseRule {
        all: &["you are considered the at-fault driver"],
        none: &[],
    },
    PhraseRule {
        all: &["as the at-fault driver"],
        none: &["not-at-fault driver"],
    },
    PhraseRule {
        all: &["you are at fault"],
        none: &["not at fault"],
    },
    PhraseRule {
        all: &["you are liable for damages"],
        none: &[],
    },
];

/// Phrasings that mark the recipient as the not-at-fault driver.
pub const NOT_AT_FAULT_RULES: &[PhraseRule] = &[
    PhraseRule {
        all: &["you are", "not at fault"],
        none: &[],
    },
    PhraseRule {
        all: &["you are considered the not-at-fault driver"],
        none: &[],
    },
    PhraseRule {
        all: &["as the not-at-fault driver"],
        none: &[],
    },
    PhraseRule {
        all: &["you are not held responsible"],
        none: &[],
    },
];

/// Decide a letter from its wording alone, or `None` if no rule fires.
pub fn lexical_verdict(letter: &str) -> Option<DriverType> {
    let lowered = letter.to_lowercase();

    if AT_FAULT_RULES.iter().any(|r| r.matches(&lowered)) {
        return Some(DriverType::Fault);
    }
    if NOT_AT_FAULT_RULES.iter().any(|r| r.matches(&lowered)) {
        return Some(DriverType::NotFault);
    }
    None
}

/// Interpret a free-text model answer as a label.
///
/// Fault only when the answer mentions `fault` and does not say `not_fault`;
/// everything else, including prose the model wraps around its answer,
/// counts as not at fault.
pub fn parse_verdict(answer: &str) -> DriverType {
    let answer = answer.to_lowercase();
    if answer.contains("fault") && !answer.contains("not_fault") {
        DriverType::Fault
    } else {
        DriverType::NotFault
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_at_fault_sentence() {
        assert_eq!(
            lexical_verdict("You are at fault for this accident."),
            Some(DriverType::Fault)
        );
    }

    #[test]
    fn not_held_responsible() {
        assert_eq!(
            lexical_verdict("You are not held responsible for this accident."),
            Some(DriverType::NotFault)
        );
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(
            lexical_verdict("YOU ARE LIABLE FOR DAMAGES to the other vehicle."),
            Some(DriverType::Fault)
        );
    }

    #[test]
    fn considered_at_fault_driver() {
        let letter = "Based on the report, you are considered the at-fault driver.";
        assert_eq!(lexical_verdict(letter), Some(DriverType::Fault));
    }

    #[test]
    fn as_the_at_fault_driver_vetoed_by_not_at_fault_mention() {
        let letter = "Your insurer, as the at-fault driver's carrier, will contact the not-at-fault driver.";
        // Fault rule 4 is vetoed; nothing else fires.
        assert_eq!(lexical_verdict(letter), None);
    }

    #[test]
    fn as_the_not_at_fault_driver() {
        let letter = "We write to you as the not-at-fault driver in this collision.";
        assert_eq!(lexical_verdict(letter), Some(DriverType::NotFault));
    }

    #[test]
    fn broad_rule_labels_you_are_not_at_fault_as_fault() {
        assert_eq!(
            lexical_verdict("You are not at fault."),
            Some(DriverType::Fault)
        );
    }

    #[test]
    fn no_markers() {
        assert_eq!(
            lexical_verdict("Please find enclosed the police report for your records."),
            None
        );
        assert_eq!(lexical_verdict(""), None);
    }

    #[test]
    fn verdict_parsing() {
        assert_eq!(parse_verdict("fault"), DriverType::Fault);
        assert_eq!(parse_verdict("  Fault\n"), DriverType::Fault);
        assert_eq!(parse_verdict("not_fault"), DriverType::NotFault);
        assert_eq!(parse_verdict("NOT_FAULT"), DriverType::NotFault);
        assert_eq!(parse_verdict("unsure"), DriverType::NotFault);
        assert_eq!(parse_verdict(""), DriverType::NotFault);
    }
}
