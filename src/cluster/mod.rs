//! The clustering pipeline.
//!
//! Control flow: normalize → negative detection → rule buckets → semantic
//! clustering of the leftovers → hybrid reconciliation. All state is created
//! fresh per call and discarded with the result; the embedding fetch is the
//! only await point, and its failure degrades the run to rule-only output
//! instead of aborting it.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::embed::{self, EmbedOptions, EmbeddingProvider};
use crate::error::ClusterError;
use crate::keyword::{self, DedupPolicy, Keyword, KeywordMetrics, KeywordRecord};
use crate::taxonomy::Taxonomy;
use crate::thresholds;

mod hybrid;
mod rules;
mod semantic;

pub use rules::{assign_buckets, detect_negatives, NegativeKeyword, RuleBucket};
pub use semantic::{cluster_semantic, CentroidAccum, SemanticCluster};

use hybrid::ReconcileInput;

/// Reserved bucket for keywords no rule or centroid claims.
pub const OTHER_CLUSTER: &str = "Other";

/// Which passes the pipeline runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    /// Trigger tables only; leftovers stay in "Other". Needs no provider.
    Rule,
    /// Semantic clustering over the full (non-negative) input.
    Semantic,
    /// Rule buckets first, semantic clustering of the leftovers.
    #[default]
    Hybrid,
}

/// Which passes actually contributed clusters to the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Method {
    RuleOnly,
    SemanticOnly,
    Hybrid,
}

/// Where a cluster came from. `Hybrid` marks a semantic cluster reshaped
/// during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterSource {
    Rule,
    Semantic,
    Hybrid,
}

/// Per-call clustering configuration. Taxonomies travel separately — they
/// are data, this is tuning.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Cosine similarity a keyword must reach to join an existing centroid.
    /// Exclusive (0, 1).
    pub similarity_threshold: f64,
    /// Clusters below this size dissolve during reconciliation.
    pub min_cluster_size: usize,
    pub mode: Mode,
    pub dedup: DedupPolicy,
    pub embed: EmbedOptions,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: thresholds::DEFAULT_SIMILARITY,
            min_cluster_size: thresholds::DEFAULT_MIN_CLUSTER_SIZE,
            mode: Mode::default(),
            dedup: DedupPolicy::default(),
            embed: EmbedOptions::default(),
        }
    }
}

impl ClusterConfig {
    /// Structural validation, run before any keyword is touched.
    pub fn validate(&self) -> Result<(), ClusterError> {
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold < 1.0) {
            return Err(ClusterError::Configuration(format!(
                "similarity threshold must be in (0, 1), got {}",
                self.similarity_threshold
            )));
        }
        if self.min_cluster_size == 0 {
            return Err(ClusterError::Configuration(
                "minimum cluster size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// A named group of keywords presumed to share searcher intent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub name: String,
    pub members: Vec<Keyword>,
    pub source: ClusterSource,
    /// Mean embedding — present only when semantic clustering produced or
    /// touched this cluster.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centroid: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_tier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competition_tier: Option<String>,
}

/// A keyword rejected during normalization, reported alongside the result
/// rather than failing the batch.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedKeyword {
    pub text: String,
    pub reason: String,
}

/// The final partition: every accepted keyword is in exactly one cluster or
/// the negative set.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusteringResult {
    /// Stable order: descending member count, then name.
    pub clusters: Vec<Cluster>,
    pub negatives: Vec<NegativeKeyword>,
    pub method: Method,
    /// Keywords accepted after validation and duplicate collapse.
    pub input_count: usize,
    /// `|negatives| + Σ|cluster.members|`; always equals `input_count`.
    pub output_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedKeyword>,
    /// Why the semantic pass was skipped, when it was. A degraded run is
    /// still a complete, internally consistent partition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

/// Run the full pipeline over one batch of keyword records.
///
/// `provider` may be absent for `Mode::Rule`; for the other modes a missing
/// or failing provider degrades the run (method `RULE_ONLY`, leftovers in
/// "Other") rather than failing it.
pub async fn cluster_keywords(
    records: &[KeywordRecord],
    negative_taxonomy: &Taxonomy,
    rule_taxonomy: &Taxonomy,
    config: &ClusterConfig,
    provider: Option<&dyn EmbeddingProvider>,
) -> Result<ClusteringResult, ClusterError> {
    config.validate()?;
    if rule_taxonomy.contains_label(OTHER_CLUSTER) {
        return Err(ClusterError::Configuration(format!(
            "{:?} is a reserved cluster name",
            OTHER_CLUSTER
        )));
    }

    let mut skipped = Vec::new();
    let mut keywords = Vec::with_capacity(records.len());
    for record in records {
        match Keyword::from_record(record) {
            Ok(kw) => keywords.push(kw),
            Err(e) => skipped.push(SkippedKeyword {
                text: record.keyword.clone(),
                reason: e.to_string(),
            }),
        }
    }
    let keywords = keyword::dedup_keywords(keywords, config.dedup);
    let input_count = keywords.len();

    let (negatives, remaining) = detect_negatives(keywords, negative_taxonomy);

    let (rule_buckets, leftovers) = match config.mode {
        Mode::Semantic => (Vec::new(), remaining),
        Mode::Rule | Mode::Hybrid => assign_buckets(remaining, rule_taxonomy),
    };

    let mut degraded = None;
    let mut semantic_clusters = Vec::new();
    let mut unclustered = Vec::new();
    if config.mode == Mode::Rule || leftovers.is_empty() {
        unclustered = leftovers;
    } else {
        match fetch_embeddings(provider, &leftovers, &config.embed).await {
            Ok(vectors) => {
                let items: Vec<(Keyword, Vec<f32>)> =
                    leftovers.into_iter().zip(vectors).collect();
                semantic_clusters = cluster_semantic(items, config.similarity_threshold);
                debug!(clusters = semantic_clusters.len(), "semantic pass");
            }
            Err(e) if e.is_recoverable() => {
                warn!(error = %e, "embedding fetch failed, degrading to rule-only clustering");
                degraded = Some(e.to_string());
                unclustered = leftovers;
            }
            Err(e) => return Err(e),
        }
    }

    let (mut clusters, method) = hybrid::reconcile(ReconcileInput {
        rule_buckets,
        semantic: semantic_clusters,
        unclustered,
        min_cluster_size: config.min_cluster_size,
    });

    for cluster in &mut clusters {
        apply_tiers(cluster);
    }
    clusters.sort_by(|a, b| {
        b.members
            .len()
            .cmp(&a.members.len())
            .then_with(|| a.name.cmp(&b.name))
    });

    let output_count = negatives.len() + clusters.iter().map(|c| c.members.len()).sum::<usize>();
    if output_count != input_count {
        warn!(input_count, output_count, "partition check failed");
        return Err(ClusterError::Internal(format!(
            "partition mismatch: {input_count} keywords in, {output_count} accounted for"
        )));
    }

    info!(
        clusters = clusters.len(),
        negatives = negatives.len(),
        skipped = skipped.len(),
        method = ?method,
        degraded = degraded.is_some(),
        "clustering complete"
    );

    Ok(ClusteringResult {
        clusters,
        negatives,
        method,
        input_count,
        output_count,
        skipped,
        degraded,
    })
}

/// Embedding retrieval for the semantic pass. A missing provider is the
/// same degraded path as a failing one.
async fn fetch_embeddings(
    provider: Option<&dyn EmbeddingProvider>,
    leftovers: &[Keyword],
    opts: &EmbedOptions,
) -> Result<Vec<Vec<f32>>, ClusterError> {
    let Some(provider) = provider else {
        return Err(ClusterError::ProviderUnavailable(
            "no embedding provider configured".into(),
        ));
    };
    let texts: Vec<String> = leftovers.iter().map(|kw| kw.normalized.clone()).collect();
    embed::embed_texts(provider, &texts, opts).await
}

/// Tier labels recovered from member metric averages. Clusters whose
/// members carry no metrics get no tiers.
fn apply_tiers(cluster: &mut Cluster) {
    let metrics: Vec<&KeywordMetrics> =
        cluster.members.iter().filter_map(|kw| kw.metrics.as_ref()).collect();
    if metrics.is_empty() {
        return;
    }
    let count = metrics.len() as u64;
    let avg_volume = metrics.iter().map(|m| m.avg_monthly_searches).sum::<u64>() / count;
    let avg_index =
        (metrics.iter().map(|m| m.competition_index as u64).sum::<u64>() / count) as u8;
    cluster.volume_tier = Some(volume_tier(avg_volume).to_string());
    cluster.competition_tier = Some(competition_tier(avg_index).to_string());
}

fn volume_tier(avg_monthly_searches: u64) -> &'static str {
    if avg_monthly_searches >= 500_000 {
        "High (500K+)"
    } else if avg_monthly_searches >= 10_000 {
        "Medium (10K-100K)"
    } else {
        "Low (<10K)"
    }
}

fn competition_tier(competition_index: u8) -> &'static str {
    if competition_index >= 67 {
        "High (67-100)"
    } else if competition_index >= 34 {
        "Medium (34-66)"
    } else {
        "Low (0-33)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries() {
        assert_eq!(volume_tier(500_000), "High (500K+)");
        assert_eq!(volume_tier(10_000), "Medium (10K-100K)");
        assert_eq!(volume_tier(9_999), "Low (<10K)");
        assert_eq!(competition_tier(67), "High (67-100)");
        assert_eq!(competition_tier(34), "Medium (34-66)");
        assert_eq!(competition_tier(33), "Low (0-33)");
    }
}
