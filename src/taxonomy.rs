//! Ordered trigger-term tables.
//!
//! One `Taxonomy` type serves both negative detection (category → trigger
//! terms) and rule-based bucketing (cluster name → trigger terms). Rules are
//! an explicit ordered list evaluated in priority order, first match wins —
//! never a map, so priority is visible and testable. Tables are per-call
//! configuration values; nothing here is global.

use serde::{Deserialize, Serialize};

use crate::error::ClusterError;
use crate::keyword;

/// One labeled rule: matches when any trigger term is contained in the
/// normalized keyword text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerRule {
    pub label: String,
    pub triggers: Vec<String>,
}

/// Priority-ordered rule table. Triggers are normalized at construction so
/// matching is a plain substring scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<TriggerRule>", into = "Vec<TriggerRule>")]
pub struct Taxonomy {
    rules: Vec<TriggerRule>,
}

/// A successful lookup: which rule fired and on which trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerMatch<'a> {
    pub label: &'a str,
    pub trigger: &'a str,
}

impl Taxonomy {
    /// Validate and normalize a rule list. Malformed tables are a
    /// `Configuration` error, raised before any keyword is processed.
    pub fn new(rules: Vec<TriggerRule>) -> Result<Self, ClusterError> {
        let mut seen = std::collections::HashSet::new();
        let mut normalized_rules = Vec::with_capacity(rules.len());
        for rule in rules {
            let label = rule.label.trim().to_string();
            if label.is_empty() {
                return Err(ClusterError::Configuration(
                    "taxonomy rule with empty label".into(),
                ));
            }
            if !seen.insert(label.clone()) {
                return Err(ClusterError::Configuration(format!(
                    "duplicate taxonomy label: {label:?}"
                )));
            }
            if rule.triggers.is_empty() {
                return Err(ClusterError::Configuration(format!(
                    "taxonomy rule {label:?} has no triggers"
                )));
            }
            let mut triggers = Vec::with_capacity(rule.triggers.len());
            for raw in &rule.triggers {
                let trigger = keyword::normalize(raw).map_err(|_| {
                    ClusterError::Configuration(format!(
                        "taxonomy rule {label:?} has empty trigger {raw:?}"
                    ))
                })?;
                triggers.push(trigger);
            }
            normalized_rules.push(TriggerRule { label, triggers });
        }
        Ok(Self { rules: normalized_rules })
    }

    /// Convenience constructor for literal tables.
    pub fn from_pairs(pairs: &[(&str, &[&str])]) -> Result<Self, ClusterError> {
        Self::new(
            pairs
                .iter()
                .map(|(label, triggers)| TriggerRule {
                    label: (*label).to_string(),
                    triggers: triggers.iter().map(|t| (*t).to_string()).collect(),
                })
                .collect(),
        )
    }

    /// First matching rule in priority order, or None. Matching is
    /// case-insensitive substring containment on normalized text, so the
    /// trigger "hiring" matches "netflix hiring jobs".
    pub fn first_match(&self, normalized_text: &str) -> Option<TriggerMatch<'_>> {
        self.first_match_indexed(normalized_text).map(|(_, m)| m)
    }

    /// As `first_match`, also reporting the rule's position in the table.
    pub fn first_match_indexed(&self, normalized_text: &str) -> Option<(usize, TriggerMatch<'_>)> {
        for (i, rule) in self.rules.iter().enumerate() {
            for trigger in &rule.triggers {
                if normalized_text.contains(trigger.as_str()) {
                    return Some((
                        i,
                        TriggerMatch {
                            label: &rule.label,
                            trigger,
                        },
                    ));
                }
            }
        }
        None
    }

    pub fn contains_label(&self, label: &str) -> bool {
        self.rules.iter().any(|r| r.label == label)
    }

    pub fn rules(&self) -> &[TriggerRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

impl TryFrom<Vec<TriggerRule>> for Taxonomy {
    type Error = ClusterError;

    fn try_from(rules: Vec<TriggerRule>) -> Result<Self, Self::Error> {
        Self::new(rules)
    }
}

impl From<Taxonomy> for Vec<TriggerRule> {
    fn from(t: Taxonomy) -> Self {
        t.rules
    }
}
