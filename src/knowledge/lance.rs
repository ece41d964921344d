//! LanceDB Vector Store - 정책 벡터 인덱스
//!
//! 인덱스 디렉토리 안의 `policies` 테이블 하나에 정책 본문, 정책 ID, 임베딩을 저장합니다.
//! 임베딩 차원은 첫 엔트리에서 정해지며, 검색은 코사인 거리를 사용합니다.
//! ref: https://lancedb.github.io/lancedb/

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::connection::Connection;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::DistanceType;

use super::vector::{SearchResult, VectorEntry, VectorStore};

/// 벡터 테이블 이름
const TABLE_NAME: &str = "policies";

// ============================================================================
// LanceVectorStore
// ============================================================================

/// LanceDB 벡터 저장소 구현
pub struct LanceVectorStore {
    db: Connection,
}

impl std::fmt::Debug for LanceVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanceVectorStore").finish_non_exhaustive()
    }
}

impl LanceVectorStore {
    /// LanceDB 저장소 열기
    ///
    /// 인덱스 디렉토리(와 상위 디렉토리)가 없으면 생성합니다.
    ///
    /// # Arguments
    /// * `path` - 인덱스 디렉토리 경로
    pub async fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            tokio::fs::create_dir_all(path)
                .await
                .with_context(|| format!("Failed to create index directory: {}", path.display()))?;
        }

        Self::connect(path).await
    }

    /// 기존 인덱스 열기 (읽기 경로)
    ///
    /// 디렉토리를 만들지 않으며, 없으면 실패합니다.
    pub async fn open_existing(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            anyhow::bail!("Vector index directory not found: {}", path.display());
        }

        Self::connect(path).await
    }

    async fn connect(path: &Path) -> Result<Self> {
        let path_str = path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid path encoding"))?;

        let db = lancedb::connect(path_str)
            .execute()
            .await
            .context("Failed to connect to LanceDB")?;

        Ok(Self { db })
    }

    /// 벡터 테이블 스키마 생성
    fn create_schema(dimension: i32) -> Schema {
        Schema::new(vec![
            Field::new("policy_id", DataType::Utf8, false),
            Field::new("text", DataType::Utf8, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    dimension,
                ),
                false,
            ),
        ])
    }

    /// 엔트리들을 Arrow RecordBatch로 변환
    fn entries_to_batch(entries: &[VectorEntry]) -> Result<RecordBatch> {
        let dimension = entries
            .first()
            .map(|e| e.embedding.len())
            .ok_or_else(|| anyhow::anyhow!("Cannot create batch from empty entries"))?;

        if dimension == 0 {
            anyhow::bail!("Embedding dimension must be non-zero");
        }

        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != dimension) {
            anyhow::bail!(
                "Inconsistent embedding dimension for policy '{}': expected {}, got {}",
                bad.policy_id,
                dimension,
                bad.embedding.len()
            );
        }

        let dimension = i32::try_from(dimension).context("Embedding dimension too large")?;

        let policy_ids: Vec<&str> = entries.iter().map(|e| e.policy_id.as_str()).collect();
        let texts: Vec<&str> = entries.iter().map(|e| e.text.as_str()).collect();

        // 임베딩을 FixedSizeList로 변환
        let embeddings_flat: Vec<f32> = entries
            .iter()
            .flat_map(|e| e.embedding.iter().copied())
            .collect();

        let values = Float32Array::from(embeddings_flat);
        let field = Arc::new(Field::new("item", DataType::Float32, true));
        let embeddings_list = FixedSizeListArray::try_new(
            field,
            dimension,
            Arc::new(values) as Arc<dyn Array>,
            None,
        )
        .context("Failed to create embedding array")?;

        let batch = RecordBatch::try_new(
            Arc::new(Self::create_schema(dimension)),
            vec![
                Arc::new(StringArray::from(policy_ids)),
                Arc::new(StringArray::from(texts)),
                Arc::new(embeddings_list),
            ],
        )
        .context("Failed to create RecordBatch")?;

        Ok(batch)
    }

    /// 벡터 테이블 존재 여부 확인
    pub async fn table_exists(&self) -> Result<bool> {
        let names = self
            .db
            .table_names()
            .execute()
            .await
            .context("Failed to list LanceDB tables")?;
        Ok(names.iter().any(|name| name == TABLE_NAME))
    }

    async fn open_table(&self) -> Result<lancedb::table::Table> {
        self.db
            .open_table(TABLE_NAME)
            .execute()
            .await
            .context("Failed to open vector table")
    }
}

#[async_trait]
impl VectorStore for LanceVectorStore {
    async fn replace_all(&self, entries: &[VectorEntry]) -> Result<usize> {
        // 병합 없이 전체 교체
        if self.table_exists().await? {
            self.db
                .drop_table(TABLE_NAME)
                .await
                .context("Failed to drop previous vector table")?;
        }

        if entries.is_empty() {
            tracing::warn!("No entries to index; vector table left empty");
            return Ok(0);
        }

        let batch = Self::entries_to_batch(entries)?;
        let schema = batch.schema();
        let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);

        self.db
            .create_table(TABLE_NAME, batches)
            .execute()
            .await
            .context("Failed to create vector table")?;

        Ok(entries.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        if limit == 0 || !self.table_exists().await? {
            return Ok(vec![]);
        }

        let table = self.open_table().await?;

        let results = table
            .vector_search(query_embedding.to_vec())
            .context("Failed to create vector search")?
            .distance_type(DistanceType::Cosine)
            .limit(limit)
            .execute()
            .await
            .context("Failed to execute vector search")?;

        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .context("Failed to read search results")?;

        let mut search_results = Vec::new();

        for batch in batches {
            let policy_ids = batch
                .column_by_name("policy_id")
                .and_then(|c| c.as_any().downcast_ref::<StringArray>())
                .ok_or_else(|| anyhow::anyhow!("Missing policy_id column"))?;

            let texts = batch
                .column_by_name("text")
                .and_then(|c| c.as_any().downcast_ref::<StringArray>())
                .ok_or_else(|| anyhow::anyhow!("Missing text column"))?;

            // _distance 컬럼 (LanceDB가 자동 추가)
            let distances = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
                .ok_or_else(|| anyhow::anyhow!("Missing _distance column"))?;

            for i in 0..batch.num_rows() {
                search_results.push(SearchResult {
                    policy_id: policy_ids.value(i).to_string(),
                    text: texts.value(i).to_string(),
                    similarity: 1.0 - distances.value(i),
                });
            }
        }

        search_results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        search_results.truncate(limit);

        Ok(search_results)
    }

    async fn count(&self) -> Result<usize> {
        if !self.table_exists().await? {
            return Ok(0);
        }

        let table = self.open_table().await?;
        let count = table.count_rows(None).await.context("Failed to count rows")?;
        Ok(count)
    }
}

// ============================================================================
// Tests
// ============================================================================
