//! Ollama HTTP 클라이언트
//!
//! 임베딩(`/api/embed`)과 채팅(`/api/chat`) 호출이 공유하는 저수준 클라이언트입니다.
//! 상태 코드 확인과 `{"error": "..."}` 에러 본문 해석을 한 곳에서 처리합니다.
//!
//! ref: https://github.com/ollama/ollama/blob/main/docs/api.md

use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::Settings;

/// Ollama 에러 응답
#[derive(Debug, Deserialize)]
struct OllamaErrorBody {
    error: String,
}

/// Ollama REST 클라이언트
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    http: reqwest::Client,
}

impl OllamaClient {
    /// 새 클라이언트 생성
    ///
    /// # Arguments
    /// * `base_url` - Ollama 서버 주소 (예: `http://localhost:11434`)
    /// * `timeout` - 요청 타임아웃 (`None`이면 무제한)
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// 설정에서 생성
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(&settings.ollama_url, settings.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// JSON 요청을 보내고 JSON 응답을 역직렬화
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<OllamaErrorBody>(&text) {
                anyhow::bail!("Ollama API error ({}): {}", status, error.error);
            }
            anyhow::bail!("Ollama API error ({}): {}", status, text);
        }

        serde_json::from_str(&text).with_context(|| format!("Failed to parse response from {}", url))
    }
}

// ============================================================================
// Tests
// ============================================================================
