//! 코퍼스 인덱서 - JSONL → 임베딩 → 벡터 인덱스
//!
//! 한 번 실행되는 배치 작업입니다. 다시 실행하면 기존 인덱스를 통째로 교체합니다.
//! 재시도는 없으며 임베딩 실패 시 전체 작업이 중단됩니다.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::embedding::EmbeddingProvider;

use super::corpus::{load_corpus, PolicyDocument};
use super::lance::LanceVectorStore;
use super::vector::{VectorEntry, VectorStore};

/// 인덱스 매니페스트 파일 이름
pub const MANIFEST_FILE: &str = "index.json";

// ============================================================================
// Index Manifest
// ============================================================================

/// 인덱스 빌드 정보 (`index.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// 인덱스를 만든 임베딩 모델
    pub embedding_model: String,
    /// 임베딩 차원 (빈 인덱스면 0)
    pub dimension: usize,
    pub document_count: usize,
    pub built_at: DateTime<Utc>,
}

impl IndexManifest {
    /// 인덱스 디렉토리에서 매니페스트 읽기 (없으면 `None`)
    pub fn load(index_dir: &Path) -> Result<Option<Self>> {
        let path = index_dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let manifest = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(manifest))
    }

    /// 인덱스 디렉토리에 매니페스트 쓰기
    pub fn save(&self, index_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(index_dir)
            .with_context(|| format!("Failed to create {}", index_dir.display()))?;

        let path = index_dir.join(MANIFEST_FILE);
        let content = serde_json::to_string_pretty(self).context("Failed to serialize manifest")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// 이미 만들어진 인덱스 열기 (읽기 전용 경로)
///
/// 매니페스트가 없거나, 문서가 있다고 기록됐는데 벡터 테이블이 없으면 실패합니다.
/// 디렉토리는 만들지 않습니다.
pub async fn open_index(index_dir: &Path) -> Result<(IndexManifest, LanceVectorStore)> {
    let manifest = IndexManifest::load(index_dir)?.ok_or_else(|| {
        anyhow::anyhow!(
            "No index manifest in {}; run `welfare-rag index` first",
            index_dir.display()
        )
    })?;

    let store = LanceVectorStore::open_existing(index_dir).await?;

    if manifest.document_count > 0 && !store.table_exists().await? {
        anyhow::bail!(
            "Vector table missing in {} (manifest lists {} documents); rebuild with `welfare-rag index`",
            index_dir.display(),
            manifest.document_count
        );
    }

    Ok((manifest, store))
}

/// 인덱싱 결과
#[derive(Debug, Clone)]
pub struct IndexReport {
    pub manifest: IndexManifest,
    pub index_dir: PathBuf,
    pub elapsed: Duration,
}

// ============================================================================
// CorpusIndexer
// ============================================================================

/// 코퍼스 인덱서
pub struct CorpusIndexer {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl CorpusIndexer {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// 문서들을 임베딩하여 벡터 저장소를 교체
    ///
    /// # Returns
    /// 임베딩 차원 (문서가 없으면 0)
    pub async fn index_documents(&self, docs: &[PolicyDocument]) -> Result<usize> {
        let texts: Vec<String> = docs.iter().map(|d| d.text.clone()).collect();

        let embeddings = self
            .embedder
            .embed_batch(&texts)
            .await
            .context("Failed to embed corpus")?;

        if embeddings.len() != docs.len() {
            anyhow::bail!(
                "Embedding provider returned {} vectors for {} documents",
                embeddings.len(),
                docs.len()
            );
        }

        let dimension = embeddings.first().map(Vec::len).unwrap_or(0);

        let entries: Vec<VectorEntry> = docs
            .iter()
            .zip(embeddings)
            .map(|(doc, embedding)| VectorEntry {
                policy_id: doc.policy_id.clone(),
                text: doc.text.clone(),
                embedding,
            })
            .collect();

        self.store
            .replace_all(&entries)
            .await
            .context("Failed to write vector index")?;

        Ok(dimension)
    }

    /// 코퍼스 파일 전체 인덱싱 후 매니페스트 기록
    pub async fn run(&self, corpus_path: &Path, index_dir: &Path) -> Result<IndexReport> {
        let started = Instant::now();

        let docs = load_corpus(corpus_path)?;

        // 교체 도중 실패하면 이전 매니페스트가 남지 않도록 먼저 지움
        let stale = index_dir.join(MANIFEST_FILE);
        if stale.exists() {
            std::fs::remove_file(&stale)
                .with_context(|| format!("Failed to remove {}", stale.display()))?;
        }

        let dimension = self.index_documents(&docs).await?;

        let manifest = IndexManifest {
            embedding_model: self.embedder.name().to_string(),
            dimension,
            document_count: docs.len(),
            built_at: Utc::now(),
        };
        manifest.save(index_dir)?;

        let elapsed = started.elapsed();
        tracing::info!(
            "Indexed {} documents into {} (dimension: {}, {:?})",
            manifest.document_count,
            index_dir.display(),
            dimension,
            elapsed
        );

        Ok(IndexReport {
            manifest,
            index_dir: index_dir.to_path_buf(),
            elapsed,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
