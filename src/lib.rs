//! welfare-rag - 복지 정책 문서 RAG 질의응답 서비스
//!
//! 정책 코퍼스(JSONL)를 Ollama 임베딩으로 LanceDB에 인덱싱하고,
//! 검색된 정책 문서를 근거로 챗봇 답변, 신청 가이드, 요약을 생성합니다.

pub mod assistant;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod knowledge;
pub mod llm;
pub mod ollama;
pub mod server;

#[cfg(test)]
mod testing;

// Re-exports
pub use assistant::{AssistantError, Guide, WelfareAnswer, WelfareAssistant};
pub use config::Settings;
pub use embedding::{EmbeddingProvider, OllamaEmbedding};
pub use knowledge::{
    CorpusIndexer, IndexManifest, LanceVectorStore, PolicyDocument, Retriever, SearchResult,
    VectorEntry, VectorStore,
};
pub use llm::{LanguageModel, OllamaChat};
pub use ollama::OllamaClient;
