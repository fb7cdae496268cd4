//! Keyword records, normalization and duplicate collapse.
//!
//! `KeywordRecord` is the wire shape the keyword source hands over (flat
//! camelCase JSON); `Keyword` is the normalized value the pipeline works on.
//! Keywords are compared by raw text: duplicate raw text collapses to one
//! entry, keeping first-seen metrics unless the caller asks for a merge.

use serde::{Deserialize, Serialize};

use crate::error::ClusterError;

/// Competition level as reported by the keyword source.
/// Variant order is ascending so `max` during a metrics merge prefers the
/// stronger signal over `Unspecified`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Competition {
    #[default]
    Unspecified,
    Low,
    Medium,
    High,
}

/// Search-volume and competition metrics attached to a keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordMetrics {
    pub avg_monthly_searches: u64,
    pub competition: Competition,
    /// 0–100 scale.
    pub competition_index: u8,
    pub low_top_of_page_bid: f64,
    pub high_top_of_page_bid: f64,
}

impl KeywordMetrics {
    /// Merge a duplicate's metrics into this one: max out volume and
    /// competition, widen the bid range.
    fn absorb(&mut self, other: &KeywordMetrics) {
        self.avg_monthly_searches = self.avg_monthly_searches.max(other.avg_monthly_searches);
        self.competition = self.competition.max(other.competition);
        self.competition_index = self.competition_index.max(other.competition_index);
        if other.low_top_of_page_bid > 0.0
            && (self.low_top_of_page_bid == 0.0 || other.low_top_of_page_bid < self.low_top_of_page_bid)
        {
            self.low_top_of_page_bid = other.low_top_of_page_bid;
        }
        self.high_top_of_page_bid = self.high_top_of_page_bid.max(other.high_top_of_page_bid);
    }
}

/// Input record as produced by the keyword source. All metric fields are
/// optional; a record carrying none of them yields a metrics-less keyword
/// (still eligible for negative detection, which is text-only).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordRecord {
    pub keyword: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_monthly_searches: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competition: Option<Competition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competition_index: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_top_of_page_bid: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_top_of_page_bid: Option<f64>,
}

impl KeywordRecord {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            avg_monthly_searches: None,
            competition: None,
            competition_index: None,
            low_top_of_page_bid: None,
            high_top_of_page_bid: None,
        }
    }

    pub fn with_metrics(keyword: impl Into<String>, metrics: KeywordMetrics) -> Self {
        Self {
            keyword: keyword.into(),
            avg_monthly_searches: Some(metrics.avg_monthly_searches),
            competition: Some(metrics.competition),
            competition_index: Some(metrics.competition_index),
            low_top_of_page_bid: Some(metrics.low_top_of_page_bid),
            high_top_of_page_bid: Some(metrics.high_top_of_page_bid),
        }
    }

    fn metrics(&self) -> Option<KeywordMetrics> {
        if self.avg_monthly_searches.is_none()
            && self.competition.is_none()
            && self.competition_index.is_none()
            && self.low_top_of_page_bid.is_none()
            && self.high_top_of_page_bid.is_none()
        {
            return None;
        }
        Some(KeywordMetrics {
            avg_monthly_searches: self.avg_monthly_searches.unwrap_or(0),
            competition: self.competition.unwrap_or_default(),
            competition_index: self.competition_index.unwrap_or(0),
            low_top_of_page_bid: self.low_top_of_page_bid.unwrap_or(0.0),
            high_top_of_page_bid: self.high_top_of_page_bid.unwrap_or(0.0),
        })
    }
}

/// A validated keyword. Immutable once built; identity is the raw `text`.
#[derive(Debug, Clone, Serialize)]
pub struct Keyword {
    /// Raw text as received, whitespace-trimmed.
    #[serde(rename = "keyword")]
    pub text: String,
    /// Lowercased, punctuation collapsed to single spaces.
    #[serde(skip)]
    pub normalized: String,
    /// `normalized` split on whitespace. Stop words retained — trigger
    /// matching operates on substrings, not bags of words.
    #[serde(skip)]
    pub tokens: Vec<String>,
    #[serde(flatten)]
    pub metrics: Option<KeywordMetrics>,
}

impl Keyword {
    pub fn from_record(record: &KeywordRecord) -> Result<Self, ClusterError> {
        let normalized = normalize(&record.keyword)?;
        let tokens = tokenize(&normalized);
        Ok(Self {
            text: record.keyword.trim().to_string(),
            normalized,
            tokens,
            metrics: record.metrics(),
        })
    }
}

/// Canonical form of a keyword: lowercase, punctuation collapsed to single
/// spaces, trimmed. Rejects input with no alphanumeric content.
pub fn normalize(raw: &str) -> Result<String, ClusterError> {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for c in raw.chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            for lc in c.to_lowercase() {
                out.push(lc);
            }
        } else {
            pending_space = true;
        }
    }
    if out.is_empty() {
        return Err(ClusterError::InvalidKeyword(raw.to_string()));
    }
    Ok(out)
}

pub fn tokenize(normalized: &str) -> Vec<String> {
    normalized.split_whitespace().map(str::to_string).collect()
}

/// How duplicate raw text resolves during collapse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DedupPolicy {
    /// First-seen metrics win; later duplicates are dropped wholesale.
    #[default]
    KeepFirst,
    /// Later duplicates fold their metrics into the first-seen entry.
    MergeMetrics,
}

/// Collapse duplicate raw text, preserving first-seen order.
pub fn dedup_keywords(keywords: Vec<Keyword>, policy: DedupPolicy) -> Vec<Keyword> {
    let mut out: Vec<Keyword> = Vec::with_capacity(keywords.len());
    let mut index: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for kw in keywords {
        match index.get(&kw.text) {
            None => {
                index.insert(kw.text.clone(), out.len());
                out.push(kw);
            }
            Some(&i) => {
                if policy == DedupPolicy::MergeMetrics {
                    match (&mut out[i].metrics, kw.metrics) {
                        (Some(existing), Some(dup)) => existing.absorb(&dup),
                        (slot @ None, Some(dup)) => *slot = Some(dup),
                        _ => {}
                    }
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_punctuation() {
        assert_eq!(normalize("  Netflix — Sign-In!! ").unwrap(), "netflix sign in");
    }

    #[test]
    fn normalize_rejects_empty() {
        assert!(matches!(normalize("  ?!  "), Err(ClusterError::InvalidKeyword(_))));
        assert!(matches!(normalize(""), Err(ClusterError::InvalidKeyword(_))));
    }

    #[test]
    fn record_without_metric_fields_has_no_metrics() {
        let kw = Keyword::from_record(&KeywordRecord::new("netflix login")).unwrap();
        assert!(kw.metrics.is_none());
        assert_eq!(kw.tokens, vec!["netflix", "login"]);
    }
}
