//! Vector Store - 벡터 검색 트레이트 및 유틸리티
//!
//! 인덱스는 코퍼스가 바뀔 때마다 통째로 다시 만들어지므로
//! 삽입/삭제 대신 전체 교체(`replace_all`)만 제공합니다.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

// ============================================================================
// Types
// ============================================================================

/// 벡터 엔트리 (저장용)
#[derive(Debug, Clone)]
pub struct VectorEntry {
    /// 정책 ID (메타데이터)
    pub policy_id: String,
    /// 정책 본문
    pub text: String,
    /// 임베딩 벡터
    pub embedding: Vec<f32>,
}

/// 검색 결과 (검색된 청크)
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// 정책 ID
    pub policy_id: String,
    /// 정책 본문
    pub text: String,
    /// 유사도 스코어 (1 - 코사인 거리)
    pub similarity: f32,
}

// ============================================================================
// VectorStore Trait
// ============================================================================

/// VectorStore 트레이트 (async)
///
/// 벡터 저장소의 공통 인터페이스입니다.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// 기존 벡터를 모두 버리고 주어진 엔트리로 교체
    async fn replace_all(&self, entries: &[VectorEntry]) -> Result<usize>;

    /// 유사도 내림차순으로 최대 `limit`개 검색
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>>;

    /// 벡터 개수 조회
    async fn count(&self) -> Result<usize>;
}
