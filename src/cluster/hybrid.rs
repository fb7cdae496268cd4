//! Reconciliation of the rule-based and semantic passes into one partition.
//!
//! Order of operations: close-variant clusters merge first, undersized
//! clusters dissolve into surviving centroids (or "Other"), then final names
//! are derived and deduplicated. The reserved "Other" bucket is exempt from
//! dissolution — it is the fallback destination.

use std::collections::HashMap;

use tracing::debug;

use crate::keyword::Keyword;
use crate::thresholds;
use crate::util::{is_close_variant, truncate_chars};

use super::rules::RuleBucket;
use super::semantic::{CentroidAccum, SemanticCluster};
use super::{Cluster, ClusterSource, Method};

/// Tokens that never name a cluster on their own.
const NAME_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "at", "be", "by", "for", "from", "in", "is", "it",
    "my", "of", "on", "or", "the", "to", "with",
];

pub(super) struct ReconcileInput {
    pub rule_buckets: Vec<RuleBucket>,
    pub semantic: Vec<SemanticCluster>,
    /// Leftovers that never reached the semantic pass (rule-only mode or a
    /// degraded embedding fetch). Routed straight to "Other".
    pub unclustered: Vec<Keyword>,
    pub min_cluster_size: usize,
}

struct Working {
    name: Option<String>,
    source: ClusterSource,
    members: Vec<(Keyword, Option<Vec<f32>>)>,
    accum: Option<CentroidAccum>,
}

pub(super) fn reconcile(input: ReconcileInput) -> (Vec<Cluster>, Method) {
    let ReconcileInput {
        rule_buckets,
        semantic,
        unclustered,
        min_cluster_size,
    } = input;

    let mut working: Vec<Working> = Vec::with_capacity(rule_buckets.len() + semantic.len());
    for bucket in rule_buckets {
        working.push(Working {
            name: Some(bucket.name),
            source: ClusterSource::Rule,
            members: bucket.members.into_iter().map(|kw| (kw, None)).collect(),
            accum: None,
        });
    }
    let semantic_start = working.len();
    for cluster in semantic {
        working.push(Working {
            name: None,
            source: ClusterSource::Semantic,
            members: cluster.members.into_iter().map(|(kw, v)| (kw, Some(v))).collect(),
            accum: Some(cluster.accum),
        });
    }

    merge_close_variants(&mut working, semantic_start);

    // Dissolve undersized clusters: members follow their embedding to the
    // nearest surviving centroid, or fall to "Other" without one.
    let (mut survivors, dissolved): (Vec<Working>, Vec<Working>) = working
        .into_iter()
        .partition(|w| w.members.len() >= min_cluster_size);
    let mut homeless: Vec<Keyword> = unclustered;
    let mut dissolved_count = 0usize;
    for cluster in dissolved {
        dissolved_count += 1;
        for (kw, emb) in cluster.members {
            let Some(vector) = emb else {
                homeless.push(kw);
                continue;
            };
            let mut best: Option<(usize, f64)> = None;
            for (i, survivor) in survivors.iter().enumerate() {
                if let Some(acc) = &survivor.accum {
                    let sim = acc.similarity(&vector);
                    if best.map_or(true, |(_, s)| sim > s) {
                        best = Some((i, sim));
                    }
                }
            }
            match best {
                Some((i, sim)) if sim >= thresholds::REASSIGN_MIN_SIM => {
                    if let Some(acc) = survivors[i].accum.as_mut() {
                        acc.add(&vector);
                    }
                    survivors[i].members.push((kw, Some(vector)));
                    survivors[i].source = ClusterSource::Hybrid;
                }
                _ => homeless.push(kw),
            }
        }
    }
    if dissolved_count > 0 {
        debug!(dissolved = dissolved_count, homeless = homeless.len(), "dissolved undersized clusters");
    }

    // Final naming. Rule clusters keep their configured names; semantic and
    // hybrid clusters derive one from their final membership. "Other" is
    // reserved up front so a derived name can never shadow it.
    let mut names: HashMap<String, usize> = HashMap::new();
    names.insert(super::OTHER_CLUSTER.to_string(), 1);

    let mut clusters: Vec<Cluster> = Vec::with_capacity(survivors.len() + 1);
    for w in survivors {
        let base = match &w.name {
            Some(configured) => configured.clone(),
            None => derive_name(&w.members),
        };
        let name = unique_name(&mut names, base);
        clusters.push(Cluster {
            name,
            members: w.members.into_iter().map(|(kw, _)| kw).collect(),
            source: w.source,
            centroid: w.accum.as_ref().map(CentroidAccum::mean),
            volume_tier: None,
            competition_tier: None,
        });
    }

    if !homeless.is_empty() {
        clusters.push(Cluster {
            name: super::OTHER_CLUSTER.to_string(),
            members: homeless,
            source: ClusterSource::Rule,
            centroid: None,
            volume_tier: None,
            competition_tier: None,
        });
    }

    let semantic_contributed = clusters
        .iter()
        .any(|c| matches!(c.source, ClusterSource::Semantic | ClusterSource::Hybrid));
    let rule_contributed = clusters
        .iter()
        .any(|c| matches!(c.source, ClusterSource::Rule) && c.name != super::OTHER_CLUSTER);
    let method = match (rule_contributed, semantic_contributed) {
        (true, true) => Method::Hybrid,
        (false, true) => Method::SemanticOnly,
        _ => Method::RuleOnly,
    };

    (clusters, method)
}

/// Merge semantic clusters that are close variants of each other
/// (misspellings, plural forms) — the smaller folds into the larger.
/// Clusters are compared by their shortest member text, the member that
/// would have named the group. Only clusters from `start` on participate;
/// rule buckets keep their identity.
fn merge_close_variants(working: &mut Vec<Working>, start: usize) {
    let mut reps: Vec<Option<String>> = working
        .iter()
        .map(|w| {
            if w.name.is_none() {
                representative_text(&w.members)
            } else {
                None
            }
        })
        .collect();

    let mut i = start;
    while i < working.len() {
        let mut j = i + 1;
        while j < working.len() {
            let variants = match (&reps[i], &reps[j]) {
                (Some(a), Some(b)) => is_close_variant(a, b),
                _ => false,
            };
            if variants {
                if working[j].members.len() > working[i].members.len() {
                    working.swap(i, j);
                    reps.swap(i, j);
                }
                let absorbed = working.remove(j);
                reps.remove(j);
                let target = &mut working[i];
                target.members.extend(absorbed.members);
                if let Some(other) = absorbed.accum {
                    match target.accum.as_mut() {
                        Some(acc) => acc.merge(&other),
                        None => target.accum = Some(other),
                    }
                }
            } else {
                j += 1;
            }
        }
        i += 1;
    }
}

/// Shortest normalized member text; ties break lexicographically.
fn representative_text(members: &[(Keyword, Option<Vec<f32>>)]) -> Option<String> {
    members
        .iter()
        .map(|(kw, _)| kw.normalized.as_str())
        .min_by(|a, b| a.chars().count().cmp(&b.chars().count()).then_with(|| a.cmp(b)))
        .map(str::to_string)
}

/// Name a cluster from the most frequent significant token across member
/// texts; ties break to the shortest, then lexicographically first token.
/// Falls back to the first member's text when every token is a stop word.
fn derive_name(members: &[(Keyword, Option<Vec<f32>>)]) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for (kw, _) in members {
        for token in &kw.tokens {
            if NAME_STOP_WORDS.contains(&token.as_str()) {
                continue;
            }
            *counts.entry(token.as_str()).or_default() += 1;
        }
    }
    let best = counts.iter().max_by(|(ta, ca), (tb, cb)| {
        ca.cmp(cb)
            .then_with(|| tb.chars().count().cmp(&ta.chars().count()))
            .then_with(|| tb.cmp(ta))
    });
    match best {
        Some((token, _)) => title_case(token),
        None => members
            .first()
            .map(|(kw, _)| truncate_chars(&kw.text, 30))
            .unwrap_or_else(|| "Unnamed".to_string()),
    }
}

fn title_case(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Disambiguate name collisions with a numeric suffix ("Login 2").
fn unique_name(names: &mut HashMap<String, usize>, base: String) -> String {
    if !names.contains_key(&base) {
        names.insert(base.clone(), 1);
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base} {n}");
        if !names.contains_key(&candidate) {
            names.insert(candidate.clone(), 1);
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_case_first_char() {
        assert_eq!(title_case("login"), "Login");
        assert_eq!(title_case("a"), "A");
    }

    #[test]
    fn unique_name_suffixes() {
        let mut names = HashMap::new();
        assert_eq!(unique_name(&mut names, "Login".into()), "Login");
        assert_eq!(unique_name(&mut names, "Login".into()), "Login 2");
        assert_eq!(unique_name(&mut names, "Login".into()), "Login 3");
    }
}
