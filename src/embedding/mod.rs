//! 임베딩 모듈 - Ollama API를 통한 텍스트 벡터화
//!
//! 정책 문서와 사용자 질문을 같은 임베딩 공간의 벡터로 변환합니다.
//! 시맨틱 검색을 위한 핵심 모듈입니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let embedder = OllamaEmbedding::from_settings(&settings)?;
//! let embedding = embedder.embed("기초연금 신청 방법").await?;
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::ollama::OllamaClient;

// ============================================================================
// EmbeddingProvider Trait
// ============================================================================

/// 임베딩 프로바이더 트레이트
///
/// 텍스트를 벡터로 변환하는 인터페이스입니다.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// 단일 텍스트 임베딩
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// 배치 임베딩 (기본 구현: 순차 호출)
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// 프로바이더(모델) 이름
    fn name(&self) -> &str;
}

// ============================================================================
// Ollama Embedding
// ============================================================================

/// `/api/embed` 한 번에 보내는 최대 입력 수
const EMBED_BATCH_SIZE: usize = 32;

/// Ollama 임베딩 구현체
#[derive(Debug, Clone)]
pub struct OllamaEmbedding {
    client: OllamaClient,
    model: String,
}

/// `/api/embed` 요청 본문
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// `/api/embed` 응답
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedding {
    /// 새 임베딩 인스턴스 생성
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// 설정에서 생성
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = OllamaClient::from_settings(settings)?;
        Ok(Self::new(client, settings.embedding_model.clone()))
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbedRequest {
            model: &self.model,
            input,
        };

        let response: EmbedResponse = self
            .client
            .post_json("/api/embed", &request)
            .await
            .with_context(|| format!("Embedding request failed (model: {})", self.model))?;

        if response.embeddings.len() != input.len() {
            anyhow::bail!(
                "Embedding count mismatch: sent {}, received {}",
                input.len(),
                response.embeddings.len()
            );
        }

        Ok(response.embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.request(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Empty embedding response"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        let total_batches = texts.len().div_ceil(EMBED_BATCH_SIZE);

        for (i, batch) in texts.chunks(EMBED_BATCH_SIZE).enumerate() {
            tracing::debug!("Embedding batch {}/{}", i + 1, total_batches);
            results.extend(self.request(batch).await?);
        }

        Ok(results)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::spawn_stub;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// 입력 개수만큼 `[길이, 1.0]` 벡터를 돌려주는 스텁 서버
    async fn stub_embedder(calls: Arc<AtomicUsize>) -> OllamaEmbedding {
        let router = Router::new().route(
            "/api/embed",
            post(move |Json(body): Json<serde_json::Value>| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let embeddings: Vec<Vec<f32>> = body["input"]
                        .as_array()
                        .map(|inputs| {
                            inputs
                                .iter()
                                .map(|t| {
                                    let len = t.as_str().map(|s| s.chars().count()).unwrap_or(0);
                                    vec![len as f32, 1.0]
                                })
                                .collect()
                        })
                        .unwrap_or_default();
                    Json(serde_json::json!({ "model": body["model"], "embeddings": embeddings }))
                }
            }),
        );
        let base_url = spawn_stub(router).await;
        OllamaEmbedding::new(OllamaClient::new(&base_url, None).unwrap(), "embeddinggemma")
    }

    #[tokio::test]
    async fn test_embed_single() {
        let embedder = stub_embedder(Arc::new(AtomicUsize::new(0))).await;
        let embedding = embedder.embed("기초연금").await.unwrap();
        assert_eq!(embedding, vec![4.0, 1.0]);
        assert_eq!(embedder.name(), "embeddinggemma");
    }

    #[tokio::test]
    async fn test_embed_batch_splits_requests() {
        let calls = Arc::new(AtomicUsize::new(0));
        let embedder = stub_embedder(calls.clone()).await;

        let texts: Vec<String> = (0..EMBED_BATCH_SIZE + 5).map(|i| "가".repeat(i + 1)).collect();
        let embeddings = embedder.embed_batch(&texts).await.unwrap();

        assert_eq!(embeddings.len(), texts.len());
        assert_eq!(embeddings[0], vec![1.0, 1.0]);
        assert_eq!(embeddings[EMBED_BATCH_SIZE + 4], vec![(EMBED_BATCH_SIZE + 5) as f32, 1.0]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_embed_batch_empty_makes_no_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let embedder = stub_embedder(calls.clone()).await;
        let embeddings = embedder.embed_batch(&[]).await.unwrap();
        assert!(embeddings.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_count_mismatch_is_error() {
        let router = Router::new().route(
            "/api/embed",
            post(|| async { Json(serde_json::json!({ "embeddings": [] })) }),
        );
        let base_url = spawn_stub(router).await;
        let embedder =
            OllamaEmbedding::new(OllamaClient::new(&base_url, None).unwrap(), "embeddinggemma");

        let err = embedder.embed("질문").await.unwrap_err();
        assert!(err.to_string().contains("mismatch"));
    }
}
