//! Destructive-operation classification.
//!
//! Two matching policies are supported and they are deliberately not
//! equivalent:
//!
//! - [`MatchPolicy::WordBoundary`] matches a keyword only as a whole word, so
//!   `created_at` does not match `CREATE`.
//! - [`MatchPolicy::Substring`] matches a keyword anywhere, so it does.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{ApprovalError, ApprovalResult};

/// Keywords that mark an operation as destructive unless configured otherwise.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "DELETE", "DROP", "TRUNCATE", "ALTER", "CREATE", "UPDATE", "INSERT",
];

/// How keywords are matched against an operation body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Match only at word boundaries.
    #[default]
    WordBoundary,
    /// Match anywhere, case-insensitively.
    Substring,
}

/// Outcome of classifying one body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Whether any keyword matched.
    pub is_destructive: bool,
    /// Matched keywords in configured order, uppercased, without duplicates.
    /// Non-empty iff `is_destructive`.
    pub matched_keywords: Vec<String>,
}

impl ClassificationResult {
    /// A result with no matches.
    #[must_use]
    pub fn safe() -> Self {
        Self::default()
    }

    /// A result built from the keywords that matched.
    #[must_use]
    pub fn from_matches(matched_keywords: Vec<String>) -> Self {
        Self {
            is_destructive: !matched_keywords.is_empty(),
            matched_keywords,
        }
    }
}

#[derive(Debug, Clone)]
struct Keyword {
    upper: String,
    whole_word: Regex,
}

/// Pure, deterministic keyword classifier.
#[derive(Debug, Clone)]
pub struct Classifier {
    policy: MatchPolicy,
    keywords: Vec<Keyword>,
}

impl Classifier {
    /// Build a classifier over `keywords`.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::InvalidKeyword`] for an empty keyword or one
    /// that cannot be compiled.
    pub fn new<I, S>(policy: MatchPolicy, keywords: I) -> ApprovalResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled: Vec<Keyword> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim();
            if keyword.is_empty() {
                return Err(ApprovalError::InvalidKeyword {
                    keyword: keyword.to_owned(),
                    reason: "keyword is empty".to_owned(),
                });
            }
            let upper = keyword.to_uppercase();
            if compiled.iter().any(|k| k.upper == upper) {
                continue;
            }
            let whole_word = RegexBuilder::new(&format!(r"\b{}\b", regex::escape(&upper)))
                .case_insensitive(true)
                .build()
                .map_err(|e| ApprovalError::InvalidKeyword {
                    keyword: keyword.to_owned(),
                    reason: e.to_string(),
                })?;
            compiled.push(Keyword { upper, whole_word });
        }

        Ok(Self {
            policy,
            keywords: compiled,
        })
    }

    /// A classifier over [`DEFAULT_KEYWORDS`].
    ///
    /// # Errors
    ///
    /// Same as [`Classifier::new`].
    pub fn with_policy(policy: MatchPolicy) -> ApprovalResult<Self> {
        Self::new(policy, DEFAULT_KEYWORDS)
    }

    /// The active matching policy.
    #[must_use]
    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Classify `body`.
    #[must_use]
    pub fn classify(&self, body: &str) -> ClassificationResult {
        let matched = match self.policy {
            MatchPolicy::Substring => {
                let upper = body.to_uppercase();
                self.keywords
                    .iter()
                    .filter(|k| upper.contains(&k.upper))
                    .map(|k| k.upper.clone())
                    .collect()
            },
            MatchPolicy::WordBoundary => self
                .keywords
                .iter()
                .filter(|k| k.whole_word.is_match(body))
                .map(|k| k.upper.clone())
                .collect(),
        };
        ClassificationResult::from_matches(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict() -> Classifier {
        Classifier::with_policy(MatchPolicy::WordBoundary).unwrap()
    }

    #[test]
    fn test_default_keyword_set() {
        let classifier = strict();
        assert_eq!(classifier.policy(), MatchPolicy::WordBoundary);
        for keyword in DEFAULT_KEYWORDS {
            let result = classifier.classify(&format!("{keyword} x"));
            assert_eq!(result.matched_keywords, vec![(*keyword).to_owned()]);
        }
    }

    #[test]
    fn test_standalone_keyword_is_destructive_under_both_policies() {
        for policy in [MatchPolicy::WordBoundary, MatchPolicy::Substring] {
            let result = Classifier::with_policy(policy).unwrap().classify("DROP TABLE foo");
            assert!(result.is_destructive, "{policy:?}");
            assert_eq!(result.matched_keywords, vec!["DROP"]);
        }
    }

    #[test]
    fn test_embedded_keyword_differs_between_policies() {
        let body = "SELECT * FROM created_at_log";

        let strict = strict().classify(body);
        assert!(!strict.is_destructive);
        assert!(strict.matched_keywords.is_empty());

        let naive = Classifier::with_policy(MatchPolicy::Substring)
            .unwrap()
            .classify(body);
        assert!(naive.is_destructive);
        assert_eq!(naive.matched_keywords, vec!["CREATE"]);
    }

    #[test]
    fn test_case_insensitive() {
        let result = strict().classify("delete from users where 1=1");
        assert_eq!(result.matched_keywords, vec!["DELETE"]);
    }

    #[test]
    fn test_multiple_keywords_reported_once_in_order() {
        let result = strict()
            .classify("INSERT INTO t SELECT 1; DELETE FROM t; delete from u");
        assert_eq!(result.matched_keywords, vec!["DELETE", "INSERT"]);
    }

    #[test]
    fn test_underscore_joined_identifier_is_not_a_word() {
        let result = strict().classify("SELECT drop_reason, is_deleted FROM t");
        assert!(!result.is_destructive);
    }

    #[test]
    fn test_keyword_next_to_punctuation_matches() {
        let result = strict().classify("BEGIN;UPDATE(t) SET x = 1");
        assert_eq!(result.matched_keywords, vec!["UPDATE"]);
    }

    #[test]
    fn test_plain_select_is_safe() {
        assert_eq!(
            strict().classify("SELECT 1"),
            ClassificationResult::safe()
        );
    }

    #[test]
    fn test_custom_keywords() {
        let classifier = Classifier::new(MatchPolicy::WordBoundary, ["merge", "MERGE"]).unwrap();
        let result = classifier.classify("MERGE INTO t USING s ON TRUE");
        assert_eq!(result.matched_keywords, vec!["MERGE"]);
        assert!(!classifier.classify("DROP TABLE t").is_destructive);
    }

    #[test]
    fn test_empty_keyword_rejected() {
        assert!(matches!(
            Classifier::new(MatchPolicy::Substring, ["DROP", " "]),
            Err(ApprovalError::InvalidKeyword { .. })
        ));
    }
}
