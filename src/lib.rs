//! adcluster — keyword clustering engine for ad-group planning.
//! Trigger-rule buckets + incremental centroid clustering over embeddings,
//! reconciled into one partition with negatives split out.

pub mod cluster;
pub mod embed;
pub mod error;
pub mod keyword;
pub mod taxonomy;
pub mod thresholds;
pub mod util;

pub use cluster::{
    cluster_keywords, Cluster, ClusterConfig, ClusterSource, ClusteringResult, Method, Mode,
    NegativeKeyword,
};
pub use embed::{CachedEmbedder, EmbedConfig, EmbedOptions, EmbeddingProvider, HttpEmbedder};
pub use error::ClusterError;
pub use keyword::{Competition, DedupPolicy, Keyword, KeywordMetrics, KeywordRecord};
pub use taxonomy::{Taxonomy, TriggerRule};
