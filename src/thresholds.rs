/// Similarity thresholds and size limits for the clustering pipeline.
///
/// Higher = stricter (only very similar items match).
/// The hierarchy: reassignment (loose) < join (moderate) < close-variant (tight)

/// Semantic pass: minimum cosine similarity to join an existing centroid.
/// Tuned for sentence-transformer-class embeddings of short queries.
pub const DEFAULT_SIMILARITY: f64 = 0.62;

/// Reconciliation: floor for reassigning a dissolved cluster's member to the
/// nearest surviving centroid. Below this the member goes to "Other".
pub const REASSIGN_MIN_SIM: f64 = 0.40;

/// Close variants (misspellings, plurals) merge regardless of embeddings.
pub const CLOSE_VARIANT_RATIO: f64 = 0.90;

/// Clusters smaller than this dissolve during reconciliation.
pub const DEFAULT_MIN_CLUSTER_SIZE: usize = 2;

/// Embedding fetch: texts per request. Providers cap batch sizes well above
/// this; smaller batches keep a single timeout from discarding too much work.
pub const EMBED_MAX_BATCH: usize = 64;

/// Embedding fetch: in-flight requests. Stays under typical RPS ceilings.
pub const EMBED_CONCURRENCY: usize = 4;

/// Embedding fetch: per-request deadline in seconds.
pub const EMBED_TIMEOUT_SECS: u64 = 30;
