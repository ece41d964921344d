//! 리트리버 - 질문과 가장 가까운 정책 청크 top-k 검색
//!
//! 재순위화, 메타데이터 필터, 유사도 임계값 없이 항상 `min(k, N)`개를 돌려줍니다.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::embedding::EmbeddingProvider;

use super::vector::{SearchResult, VectorStore};

/// 검색할 청크 수 (고정)
pub const RETRIEVAL_K: usize = 3;

/// top-k 리트리버
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    k: usize,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            store,
            k: RETRIEVAL_K,
        }
    }

    /// 질문과 유사한 청크 검색
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .context("Failed to embed query")?;

        let results = self
            .store
            .search(&query_embedding, self.k)
            .await
            .context("Vector search failed")?;

        tracing::debug!(
            "Retrieved {} chunks: {:?}",
            results.len(),
            results.iter().map(|r| r.policy_id.as_str()).collect::<Vec<_>>()
        );

        Ok(results)
    }

    /// 인덱스에 저장된 벡터 수
    pub async fn document_count(&self) -> Result<usize> {
        self.store.count().await
    }
}

/// 검색 결과를 프롬프트용 참고 문서 블록으로 렌더링
pub fn format_context(chunks: &[SearchResult]) -> String {
    chunks
        .iter()
        .map(|chunk| format!("[정책 ID: {}]\n{}", chunk.policy_id, chunk.text.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

// ============================================================================
// Tests
// ============================================================================
