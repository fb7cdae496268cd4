//! Deterministic trigger-table passes: negative detection and rule
//! bucketing. Neither pass suspends; both are total over their input.

use serde::Serialize;
use tracing::debug;

use crate::keyword::Keyword;
use crate::taxonomy::Taxonomy;

/// A keyword excluded from all clustering, tagged with the category and
/// trigger that fired. Membership here and in any cluster is mutually
/// exclusive.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NegativeKeyword {
    pub keyword: Keyword,
    pub category: String,
    pub matched_trigger: String,
}

/// One rule-pass bucket, named after the rule that filled it.
#[derive(Debug, Clone)]
pub struct RuleBucket {
    pub name: String,
    pub members: Vec<Keyword>,
}

/// Scan keywords against the negative taxonomy. Categories are tested in
/// table order, so a keyword matching several categories lands in the
/// highest-priority one exactly once. Returns (flagged, remaining).
pub fn detect_negatives(
    keywords: Vec<Keyword>,
    taxonomy: &Taxonomy,
) -> (Vec<NegativeKeyword>, Vec<Keyword>) {
    let mut negatives = Vec::new();
    let mut remaining = Vec::with_capacity(keywords.len());
    for kw in keywords {
        match taxonomy.first_match(&kw.normalized) {
            Some(m) => {
                let (category, matched_trigger) = (m.label.to_string(), m.trigger.to_string());
                negatives.push(NegativeKeyword {
                    keyword: kw,
                    category,
                    matched_trigger,
                });
            }
            None => remaining.push(kw),
        }
    }
    debug!(flagged = negatives.len(), remaining = remaining.len(), "negative pass");
    (negatives, remaining)
}

/// Assign each keyword to the first matching rule's bucket; unmatched
/// keywords fall through as leftovers for the semantic pass. Buckets come
/// back in rule-table order, empty ones omitted. Identical input order and
/// identical tables yield byte-identical assignment.
pub fn assign_buckets(keywords: Vec<Keyword>, rules: &Taxonomy) -> (Vec<RuleBucket>, Vec<Keyword>) {
    let mut buckets: Vec<Vec<Keyword>> = (0..rules.len()).map(|_| Vec::new()).collect();
    let mut leftovers = Vec::new();
    for kw in keywords {
        match rules.first_match_indexed(&kw.normalized) {
            Some((i, _)) => buckets[i].push(kw),
            None => leftovers.push(kw),
        }
    }
    let buckets: Vec<RuleBucket> = rules
        .rules()
        .iter()
        .zip(buckets)
        .filter(|(_, members)| !members.is_empty())
        .map(|(rule, members)| RuleBucket {
            name: rule.label.clone(),
            members,
        })
        .collect();
    debug!(buckets = buckets.len(), leftovers = leftovers.len(), "rule pass");
    (buckets, leftovers)
}
