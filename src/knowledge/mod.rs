//! Knowledge 모듈 - 정책 코퍼스 인덱싱과 검색
//!
//! - Corpus: JSONL 정책 문서 로드
//! - LanceDB: 벡터 인덱스 저장 및 코사인 검색
//! - Indexer: 코퍼스 → 임베딩 → 인덱스 (전체 교체)
//! - Retriever: 질문 → top-k 정책 청크

mod corpus;
mod indexer;
mod lance;
mod retriever;
mod vector;

// Re-exports
pub use corpus::{load_corpus, parse_corpus, PolicyDocument};
pub use indexer::{open_index, CorpusIndexer, IndexManifest, IndexReport, MANIFEST_FILE};
pub use lance::LanceVectorStore;
pub use retriever::{format_context, Retriever, RETRIEVAL_K};
pub use vector::{SearchResult, VectorEntry, VectorStore};
