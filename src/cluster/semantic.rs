//! Incremental centroid clustering over embeddings.
//!
//! Greedy single pass in input order: each keyword joins the most similar
//! existing centroid when similarity clears the threshold, otherwise it
//! seeds a new cluster. First-come centroids make the algorithm
//! order-sensitive; that is accepted, documented behavior — different input
//! orderings may produce different cluster counts.

use crate::keyword::Keyword;

/// Running centroid: explicit sum-vector + count accumulator. Cosine
/// similarity is scale-invariant, so queries compare against the raw sum;
/// the mean is materialized once, for the result payload. No re-averaging,
/// no float drift from repeated division.
#[derive(Debug, Clone)]
pub struct CentroidAccum {
    sum: Vec<f64>,
    count: usize,
}

impl CentroidAccum {
    pub fn seed(v: &[f32]) -> Self {
        Self {
            sum: v.iter().map(|&x| x as f64).collect(),
            count: 1,
        }
    }

    /// Online update. Vectors of the wrong dimension are rejected upstream;
    /// a mismatch here contributes nothing rather than corrupting the sum.
    pub fn add(&mut self, v: &[f32]) {
        if v.len() != self.sum.len() {
            return;
        }
        for (s, &x) in self.sum.iter_mut().zip(v) {
            *s += x as f64;
        }
        self.count += 1;
    }

    /// Cosine similarity of `v` against the centroid.
    pub fn similarity(&self, v: &[f32]) -> f64 {
        if v.len() != self.sum.len() || v.is_empty() {
            return 0.0;
        }
        let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
        for (s, &x) in self.sum.iter().zip(v) {
            let xf = x as f64;
            dot += s * xf;
            na += s * s;
            nb += xf * xf;
        }
        let denom = na.sqrt() * nb.sqrt();
        if denom == 0.0 {
            0.0
        } else {
            dot / denom
        }
    }

    /// Fold another accumulator in (used when close-variant clusters merge).
    pub fn merge(&mut self, other: &CentroidAccum) {
        if other.sum.len() != self.sum.len() {
            return;
        }
        for (s, o) in self.sum.iter_mut().zip(&other.sum) {
            *s += o;
        }
        self.count += other.count;
    }

    pub fn mean(&self) -> Vec<f32> {
        let n = self.count.max(1) as f64;
        self.sum.iter().map(|&s| (s / n) as f32).collect()
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

/// A cluster produced by the semantic pass. Members keep their embeddings —
/// reconciliation needs them for nearest-centroid reassignment.
#[derive(Debug, Clone)]
pub struct SemanticCluster {
    pub members: Vec<(Keyword, Vec<f32>)>,
    pub accum: CentroidAccum,
}

/// Cluster `items` by cosine similarity against running centroids.
/// A single item yields one singleton cluster, not an error; identical
/// embeddings trivially join (similarity 1.0 ≥ τ). Ties go to the earliest
/// cluster, keeping the pass deterministic for a fixed input order.
pub fn cluster_semantic(items: Vec<(Keyword, Vec<f32>)>, threshold: f64) -> Vec<SemanticCluster> {
    let mut clusters: Vec<SemanticCluster> = Vec::new();
    for (kw, vector) in items {
        let mut best: Option<(usize, f64)> = None;
        for (i, cluster) in clusters.iter().enumerate() {
            let sim = cluster.accum.similarity(&vector);
            if best.map_or(true, |(_, s)| sim > s) {
                best = Some((i, sim));
            }
        }
        match best {
            Some((i, sim)) if sim >= threshold => {
                clusters[i].accum.add(&vector);
                clusters[i].members.push((kw, vector));
            }
            _ => clusters.push(SemanticCluster {
                accum: CentroidAccum::seed(&vector),
                members: vec![(kw, vector)],
            }),
        }
    }
    clusters
}
