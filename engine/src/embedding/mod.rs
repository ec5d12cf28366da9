//! Embedding service client
//!
//! Query text is turned into a fixed-length vector by an external service
//! (`POST /embed-single` with `{"texts": [text]}` → `{"embedding": [...]}`).
//!
//! An empty vector is the only failure signal: callers check `is_empty()`
//! and abort the vector stage. Failures are logged here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EmbeddingConfig;

/// Provider interface for query embeddings
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Produce an embedding for `text`; empty on any failure
    async fn embed(&self, text: &str) -> Vec<f32>;
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    texts: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Option<Vec<f32>>,
}

/// HTTP client for the embedding service
#[derive(Debug, Clone)]
pub struct HttpEmbeddingClient {
    base_url: String,
    dimension: usize,
    client: reqwest::Client,
}

impl HttpEmbeddingClient {
    pub fn new(config: &EmbeddingConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            dimension: config.dimension,
            client,
        })
    }

    async fn request(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let url = format!("{}/embed-single", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&EmbedRequest { texts: [text] })
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("embedding service returned {}", response.status());
        }

        let body: EmbedResponse = response.json().await?;
        let embedding = body
            .embedding
            .ok_or_else(|| anyhow::anyhow!("response has no embedding"))?;

        if embedding.len() != self.dimension {
            anyhow::bail!(
                "expected {} dimensions, got {}",
                self.dimension,
                embedding.len()
            );
        }

        Ok(embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingClient {
    async fn embed(&self, text: &str) -> Vec<f32> {
        match self.request(text).await {
            Ok(embedding) => embedding,
            Err(e) => {
                tracing::warn!("Embedding generation failed: {}", e);
                Vec::new()
            }
        }
    }
}
