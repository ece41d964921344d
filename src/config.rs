//! 설정 모듈
//!
//! 기본값 → TOML 파일 → `WELFARE_RAG_*` 환경변수 순서로 병합합니다.
//! CLI 플래그는 로드 이후 [`Settings`] 필드를 직접 덮어씁니다.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// 기본 설정 파일 이름 (작업 디렉토리 기준)
pub const DEFAULT_CONFIG_FILE: &str = "welfare-rag.toml";

/// 환경변수 접두사 (예: `WELFARE_RAG_CHAT_MODEL`)
pub const ENV_PREFIX: &str = "WELFARE_RAG_";

/// 서비스 전체 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Ollama 서버 주소
    pub ollama_url: String,
    /// 임베딩 모델 이름
    pub embedding_model: String,
    /// 채팅(LLM) 모델 이름
    pub chat_model: String,
    /// 샘플링 온도
    pub temperature: f32,
    /// JSONL 코퍼스 경로
    pub corpus_path: PathBuf,
    /// 벡터 인덱스 디렉토리
    pub index_dir: PathBuf,
    pub host: String,
    pub port: u16,
    /// 모델/임베딩 호출 타임아웃 (초). 없으면 무제한
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            embedding_model: "embeddinggemma".to_string(),
            chat_model: "gemma3:4b".to_string(),
            temperature: 0.2,
            corpus_path: PathBuf::from("./data/policy_corpus.jsonl"),
            index_dir: PathBuf::from("./vectorstores/policies"),
            host: "127.0.0.1".to_string(),
            port: 8000,
            request_timeout_secs: None,
        }
    }
}

impl Settings {
    /// 설정 로드
    ///
    /// `config_path`가 주어지면 해당 파일이 반드시 존재해야 합니다.
    /// 생략하면 `welfare-rag.toml`을 찾고, 없으면 건너뜁니다.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_path {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
        }

        let settings: Settings = Self::figment(config_path)
            .extract()
            .context("Failed to load configuration")?;

        tracing::debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    fn figment(config_path: Option<&Path>) -> Figment {
        let file = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// 서버 바인드 주소 (`host:port`)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ============================================================================
// Tests
// ============================================================================
