//! CLI 모듈
//!
//! welfare-rag 명령어 정의 및 구현

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::Settings;
use crate::embedding::{EmbeddingProvider, OllamaEmbedding};
use crate::knowledge::{
    open_index, CorpusIndexer, IndexManifest, LanceVectorStore, Retriever, VectorStore,
};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "welfare-rag")]
#[command(version, about = "복지 정책 문서 RAG 질의응답 서비스", long_about = None)]
pub struct Cli {
    /// 설정 파일 경로 (기본: ./welfare-rag.toml, 없으면 건너뜀)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// JSONL 코퍼스를 임베딩하여 벡터 인덱스 생성 (기존 인덱스 교체)
    Index {
        /// 코퍼스 파일 경로
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// 인덱스 디렉토리
        #[arg(long)]
        index_dir: Option<PathBuf>,
    },

    /// 질의응답 HTTP 서버 실행
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,

        /// 인덱스 디렉토리
        #[arg(long)]
        index_dir: Option<PathBuf>,
    },

    /// 인덱스 검색 (top-k 청크 출력)
    Query {
        /// 검색 질문
        query: String,

        /// 인덱스 디렉토리
        #[arg(long)]
        index_dir: Option<PathBuf>,
    },

    /// 설정 및 인덱스 상태 확인
    Status,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Index { corpus, index_dir } => {
            if let Some(corpus) = corpus {
                settings.corpus_path = corpus;
            }
            if let Some(index_dir) = index_dir {
                settings.index_dir = index_dir;
            }
            cmd_index(&settings).await
        }
        Commands::Serve {
            host,
            port,
            index_dir,
        } => {
            if let Some(host) = host {
                settings.host = host;
            }
            if let Some(port) = port {
                settings.port = port;
            }
            if let Some(index_dir) = index_dir {
                settings.index_dir = index_dir;
            }
            crate::server::serve(&settings).await
        }
        Commands::Query { query, index_dir } => {
            if let Some(index_dir) = index_dir {
                settings.index_dir = index_dir;
            }
            cmd_query(&settings, &query).await
        }
        Commands::Status => cmd_status(&settings).await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 인덱스 생성 명령어 (index)
async fn cmd_index(settings: &Settings) -> Result<()> {
    println!("[*] 코퍼스: {}", settings.corpus_path.display());
    println!(
        "[*] 임베딩 모델: {} ({})",
        settings.embedding_model, settings.ollama_url
    );

    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OllamaEmbedding::from_settings(settings)?);
    let store: Arc<dyn VectorStore> = Arc::new(
        LanceVectorStore::open(&settings.index_dir)
            .await
            .context("LanceVectorStore 열기 실패")?,
    );

    let report = CorpusIndexer::new(embedder, store)
        .run(&settings.corpus_path, &settings.index_dir)
        .await
        .context("인덱스 생성 실패")?;

    if report.manifest.document_count == 0 {
        println!("[!] 코퍼스에 문서가 없습니다. 빈 인덱스가 생성되었습니다.");
    }

    println!(
        "[OK] {} 건 인덱싱 완료 (차원: {}, {:.1}초)",
        report.manifest.document_count,
        report.manifest.dimension,
        report.elapsed.as_secs_f64()
    );
    println!("     인덱스: {}", report.index_dir.display());

    Ok(())
}

/// 검색 명령어 (query)
async fn cmd_query(settings: &Settings, query: &str) -> Result<()> {
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OllamaEmbedding::from_settings(settings)?);
    let (_, store) = open_index(&settings.index_dir)
        .await
        .context("인덱스 열기 실패")?;
    let retriever = Retriever::new(embedder, Arc::new(store));

    println!("[*] 검색 중: \"{}\"", query);

    let results = retriever.retrieve(query).await.context("검색 실패")?;

    if results.is_empty() {
        println!("\n[!] 검색 결과가 없습니다. 인덱스가 비어 있습니다.");
        return Ok(());
    }

    println!("\n[OK] 검색 결과 ({} 건):\n", results.len());

    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. [정책 ID: {}] (유사도: {:.3})",
            i + 1,
            result.policy_id,
            result.similarity
        );
        println!("   내용: {}", truncate_text(&result.text, 200));
        println!();
    }

    Ok(())
}

/// 상태 확인 명령어 (status)
async fn cmd_status(settings: &Settings) -> Result<()> {
    println!("welfare-rag v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("[*] Ollama: {}", settings.ollama_url);
    println!("    임베딩 모델: {}", settings.embedding_model);
    println!("    채팅 모델: {} (temperature {})", settings.chat_model, settings.temperature);
    println!("[*] 코퍼스: {}", settings.corpus_path.display());
    println!("[*] 인덱스 디렉토리: {}", settings.index_dir.display());

    match IndexManifest::load(&settings.index_dir) {
        Ok(Some(manifest)) => {
            println!(
                "[OK] 매니페스트: {} 건, 차원 {}, 생성 {}",
                manifest.document_count,
                manifest.dimension,
                manifest.built_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            if manifest.embedding_model != settings.embedding_model {
                println!(
                    "[!] 인덱스 임베딩 모델({})이 설정({})과 다릅니다. 다시 인덱싱하세요.",
                    manifest.embedding_model, settings.embedding_model
                );
            }
        }
        Ok(None) => println!("[!] 매니페스트 없음: 인덱스가 아직 생성되지 않았습니다."),
        Err(e) => println!("[!] 매니페스트 읽기 실패: {}", e),
    }

    if settings.index_dir.exists() {
        match LanceVectorStore::open_existing(&settings.index_dir).await {
            Ok(store) => match store.count().await {
                Ok(count) => println!("[OK] 벡터 인덱스: {} 청크", count),
                Err(e) => println!("[!] 벡터 수 조회 실패: {}", e),
            },
            Err(e) => println!("[!] 벡터 인덱스 열기 실패: {}", e),
        }
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 텍스트 자르기 (한 줄로 정리)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from([
            "welfare-rag",
            "serve",
            "--port",
            "9000",
            "--index-dir",
            "/tmp/idx",
        ])
        .unwrap();

        match cli.command {
            Commands::Serve {
                host,
                port,
                index_dir,
            } => {
                assert!(host.is_none());
                assert_eq!(port, Some(9000));
                assert_eq!(index_dir, Some(PathBuf::from("/tmp/idx")));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["welfare-rag", "status", "--config", "custom.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 5), "hello...");
        assert_eq!(truncate_text("hello\nworld", 20), "hello world");
    }

    #[test]
    fn test_truncate_unicode() {
        let truncated = truncate_text("기초연금 신청 안내", 4);
        assert_eq!(truncated, "기초연금...");
    }
}
