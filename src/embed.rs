//! Embedding retrieval: provider trait, OpenAI-compatible HTTP client,
//! LRU caching wrapper, and batched fetch with bounded concurrency.
//!
//! The embedding fetch is the pipeline's only await point and only
//! cancellation point — a per-request timeout aborts the fetch and the
//! caller degrades to rule-only clustering.

use std::num::NonZeroUsize;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ClusterError;
use crate::thresholds;

/// External capability: maps each text in a batch to a fixed-length vector,
/// preserving order. Consumed by the pipeline, never owned by it.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, ClusterError>;
}

/// Batching and backpressure limits for embedding retrieval.
#[derive(Debug, Clone)]
pub struct EmbedOptions {
    /// Texts per provider request.
    pub max_batch_size: usize,
    /// In-flight requests at once.
    pub concurrency: usize,
    /// Per-request deadline.
    pub timeout: Duration,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            max_batch_size: thresholds::EMBED_MAX_BATCH,
            concurrency: thresholds::EMBED_CONCURRENCY,
            timeout: Duration::from_secs(thresholds::EMBED_TIMEOUT_SECS),
        }
    }
}

/// Fetch embeddings for `texts` in bounded-size batches, at most
/// `opts.concurrency` requests in flight. Output order matches input order.
/// Any batch failing or timing out fails the whole fetch — partial
/// embeddings would silently distort the clustering.
pub async fn embed_texts(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    opts: &EmbedOptions,
) -> Result<Vec<Vec<f32>>, ClusterError> {
    if texts.is_empty() {
        return Ok(vec![]);
    }
    let batch_size = opts.max_batch_size.max(1);
    let deadline = opts.timeout;
    let chunks: Vec<Vec<String>> = texts.chunks(batch_size).map(|c| c.to_vec()).collect();
    debug!(texts = texts.len(), batches = chunks.len(), "fetching embeddings");

    let batches: Vec<Vec<Vec<f32>>> = stream::iter(chunks.into_iter().map(|chunk| async move {
        let expected = chunk.len();
        let vectors = tokio::time::timeout(deadline, provider.embed(&chunk))
            .await
            .map_err(|_| ClusterError::ProviderTimeout(deadline))??;
        if vectors.len() != expected {
            return Err(ClusterError::ProviderUnavailable(format!(
                "batch count mismatch: sent {expected} texts, got {} embeddings",
                vectors.len()
            )));
        }
        Ok(vectors)
    }))
    .buffered(opts.concurrency.max(1))
    .try_collect()
    .await?;

    let mut out = Vec::with_capacity(texts.len());
    for batch in batches {
        out.extend(batch);
    }
    Ok(out)
}

/// Connection settings for an OpenAI-compatible `/embeddings` endpoint.
/// Built explicitly by the caller — this core reads no environment.
#[derive(Debug, Clone)]
pub struct EmbedConfig {
    /// Full endpoint URL.
    pub url: String,
    /// Bearer token; empty sends no Authorization header.
    pub api_key: String,
    pub model: String,
}

pub struct HttpEmbedder {
    config: EmbedConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    pub fn new(config: EmbedConfig) -> Result<Self, ClusterError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(thresholds::EMBED_TIMEOUT_SECS))
            .build()
            .map_err(|e| ClusterError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedder {
    async fn embed(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, ClusterError> {
        if batch.is_empty() {
            return Ok(vec![]);
        }
        let req = EmbedRequest {
            model: self.config.model.clone(),
            input: batch.to_vec(),
        };
        let mut builder = self.client.post(&self.config.url).json(&req);
        if !self.config.api_key.is_empty() {
            builder = builder.header("Authorization", format!("Bearer {}", self.config.api_key));
        }
        let resp = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ClusterError::ProviderTimeout(Duration::from_secs(thresholds::EMBED_TIMEOUT_SECS))
            } else {
                ClusterError::ProviderUnavailable(format!("embedding request failed: {e}"))
            }
        })?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClusterError::ProviderUnavailable(format!(
                "embedding API returned {status}: {body}"
            )));
        }
        let parsed: EmbedResponse = resp.json().await.map_err(|e| {
            ClusterError::ProviderUnavailable(format!("embedding response parse failed: {e}"))
        })?;
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

/// Caching wrapper: repeated texts hit the LRU instead of the provider.
/// Owned by the caller across calls — the clustering pipeline itself holds
/// no state beyond one invocation.
pub struct CachedEmbedder<P> {
    inner: P,
    cache: parking_lot::Mutex<CacheInner>,
}

struct CacheInner {
    cache: LruCache<String, Vec<f32>>,
    hits: u64,
    misses: u64,
}

impl<P> CachedEmbedder<P> {
    pub fn new(inner: P, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .unwrap_or(NonZeroUsize::new(128).expect("nonzero literal"));
        Self {
            inner,
            cache: parking_lot::Mutex::new(CacheInner {
                cache: LruCache::new(capacity),
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// (len, capacity, hits, misses)
    pub fn stats(&self) -> (usize, usize, u64, u64) {
        let inner = self.cache.lock();
        (inner.cache.len(), inner.cache.cap().get(), inner.hits, inner.misses)
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for CachedEmbedder<P> {
    async fn embed(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, ClusterError> {
        let mut slots: Vec<Option<Vec<f32>>> = Vec::with_capacity(batch.len());
        let mut missing: Vec<String> = Vec::new();
        {
            let mut inner = self.cache.lock();
            for text in batch {
                match inner.cache.get(text).cloned() {
                    Some(v) => {
                        inner.hits += 1;
                        slots.push(Some(v));
                    }
                    None => {
                        inner.misses += 1;
                        slots.push(None);
                        missing.push(text.clone());
                    }
                }
            }
        }
        if !missing.is_empty() {
            let fetched = self.inner.embed(&missing).await?;
            if fetched.len() != missing.len() {
                return Err(ClusterError::ProviderUnavailable(format!(
                    "batch count mismatch: sent {} texts, got {} embeddings",
                    missing.len(),
                    fetched.len()
                )));
            }
            let mut inner = self.cache.lock();
            let mut pairs = missing.into_iter().zip(fetched);
            for slot in slots.iter_mut().filter(|s| s.is_none()) {
                if let Some((text, vector)) = pairs.next() {
                    inner.cache.put(text, vector.clone());
                    *slot = Some(vector);
                }
            }
        }
        let out: Vec<Vec<f32>> = slots.into_iter().flatten().collect();
        if out.len() != batch.len() {
            return Err(ClusterError::Internal(
                "embed cache produced a short batch".into(),
            ));
        }
        Ok(out)
    }
}

/// Cosine similarity between two vectors. Accumulates in f64 to keep long
/// vectors from losing precision. Mismatched or empty inputs score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
    for i in 0..a.len() {
        let (ai, bi) = (a[i] as f64, b[i] as f64);
        dot += ai * bi;
        na += ai * ai;
        nb += bi * bi;
    }
    let denom = na.sqrt() * nb.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_identical() {
        let v = vec![0.5_f32; 64];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_orthogonal() {
        let a = vec![1.0_f32, 0.0];
        let b = vec![0.0_f32, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-9);
    }

    #[test]
    fn cosine_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn cosine_scale_invariant() {
        // similarity against a centroid sum equals similarity against the
        // mean — the semantic pass relies on this
        let v = vec![0.3_f32, 0.7, 0.1];
        let sum: Vec<f32> = v.iter().map(|x| x * 5.0).collect();
        assert!((cosine_similarity(&v, &sum) - 1.0).abs() < 1e-6);
    }
}
