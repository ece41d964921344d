//! 테스트 전용 더블 (임베딩, 벡터 저장소, 언어 모델, Ollama 스텁 서버)

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use anyhow::{bail, Result};
use async_trait::async_trait;
use axum::Router;

use crate::embedding::EmbeddingProvider;
use crate::knowledge::{PolicyDocument, SearchResult, VectorEntry, VectorStore};
use crate::llm::LanguageModel;

/// 임의 포트에 스텁 서버를 띄우고 base URL 반환
pub async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

// ============================================================================
// Embedding
// ============================================================================

/// 토큰/문자 해시 기반 결정적 임베딩
///
/// 0번 성분에 항상 바이어스를 넣어 빈 문자열도 영벡터가 되지 않습니다.
#[derive(Debug, Clone)]
pub struct HashEmbedding {
    pub dimension: usize,
}

impl Default for HashEmbedding {
    fn default() -> Self {
        Self { dimension: 64 }
    }
}

impl HashEmbedding {
    fn bucket(&self, feature: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        feature.hash(&mut hasher);
        1 + (hasher.finish() as usize) % (self.dimension - 1)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];
        vector[0] = 0.5;

        for token in text.split_whitespace() {
            vector[self.bucket(token)] += 1.0;
        }
        for c in text.chars().filter(|c| !c.is_whitespace()) {
            vector[self.bucket(&c.to_string())] += 0.25;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        Ok(vector.into_iter().map(|x| x / norm).collect())
    }

    fn name(&self) -> &str {
        "hash-embedding"
    }
}

/// 항상 실패하는 임베딩
pub struct FailingEmbedding;

#[async_trait]
impl EmbeddingProvider for FailingEmbedding {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        bail!("embedding service unavailable")
    }

    fn name(&self) -> &str {
        "failing-embedding"
    }
}

// ============================================================================
// Vector Store
// ============================================================================

/// 코사인 유사도 (길이가 다르거나 영벡터면 0.0)
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// 인메모리 벡터 저장소 (전수 코사인 검색)
#[derive(Default)]
pub struct MemoryVectorStore {
    entries: RwLock<Vec<VectorEntry>>,
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn replace_all(&self, entries: &[VectorEntry]) -> Result<usize> {
        let mut guard = self.entries.write().unwrap();
        *guard = entries.to_vec();
        Ok(guard.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let guard = self.entries.read().unwrap();
        let mut results: Vec<SearchResult> = guard
            .iter()
            .map(|entry| SearchResult {
                policy_id: entry.policy_id.clone(),
                text: entry.text.clone(),
                similarity: cosine_similarity(query_embedding, &entry.embedding),
            })
            .collect();

        results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        results.truncate(limit);
        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().unwrap().len())
    }
}

// ============================================================================
// Language Models
// ============================================================================

/// 고정 응답을 돌려주고 받은 프롬프트를 기록하는 모델
pub struct ScriptedModel {
    response: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.response.clone())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// 항상 주어진 메시지로 실패하는 모델
pub struct FailingModel {
    message: String,
}

impl FailingModel {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl LanguageModel for FailingModel {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        bail!("Ollama API error (404 Not Found): {}", self.message)
    }

    fn name(&self) -> &str {
        "failing"
    }
}

// ============================================================================
// Corpus
// ============================================================================

pub fn sample_documents() -> Vec<PolicyDocument> {
    vec![
        PolicyDocument::new(
            "P-001",
            "기초연금은 만 65세 이상 어르신 중 소득인정액이 선정기준액 이하인 분께 매월 연금을 지급합니다. 주소지 읍면동 주민센터나 국민연금공단 지사에서 신청합니다.",
        ),
        PolicyDocument::new(
            "P-002",
            "에너지바우처는 기초생활수급자 중 노인, 장애인, 영유아 가구에 난방비와 냉방비를 바우처로 지원합니다. 매년 5월부터 12월까지 거주지 동주민센터에서 신청합니다.",
        ),
        PolicyDocument::new(
            "P-003",
            "장애인 활동지원 서비스는 혼자서 일상생활이 어려운 장애인에게 활동지원사의 신체활동, 가사활동, 이동 보조를 제공합니다. 국민연금공단 방문조사 후 급여량이 결정됩니다.",
        ),
        PolicyDocument::new(
            "P-004",
            "청년 월세 특별지원은 부모와 따로 사는 만 19세에서 34세 무주택 청년에게 월 최대 20만원의 월세를 최장 12개월 지원합니다. 복지로 누리집에서 온라인으로 신청할 수 있습니다.",
        ),
        PolicyDocument::new(
            "P-005",
            "긴급복지 지원은 주소득자의 사망, 실직, 질병 등으로 갑자기 생계가 어려워진 가구에 생계비, 의료비, 주거비를 신속하게 지원합니다. 보건복지상담센터 129로 문의할 수 있습니다.",
        ),
    ]
}

/// 디렉토리에 `policy_corpus.jsonl` 작성 후 경로 반환
pub fn write_corpus(dir: &Path, docs: &[PolicyDocument]) -> PathBuf {
    let path = dir.join("policy_corpus.jsonl");
    let lines: Vec<String> = docs
        .iter()
        .map(|doc| serde_json::to_string(doc).unwrap())
        .collect();
    std::fs::write(&path, lines.join("\n") + "\n").unwrap();
    path
}

mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]) - 1.0).abs() < 0.0001);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 0.0001);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_hash_embedding_is_deterministic_and_non_zero() {
        let embedder = HashEmbedding::default();
        let a = embedder.embed("기초연금 신청").await.unwrap();
        let b = embedder.embed("기초연금 신청").await.unwrap();
        assert_eq!(a, b);

        let empty = embedder.embed("").await.unwrap();
        assert!(empty.iter().any(|x| *x != 0.0));
    }
}
