//! 언어 모델 모듈 - Ollama 채팅 API 호출
//!
//! 렌더링된 프롬프트 하나를 사용자 메시지로 보내고 응답 텍스트를 그대로 돌려줍니다.
//! 스트리밍, 대화 기록, 재시도는 없습니다.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::ollama::OllamaClient;

/// 언어 모델 트레이트
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// 프롬프트에 대한 응답 텍스트 생성
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// 모델 이름
    fn name(&self) -> &str;
}

/// Ollama `/api/chat` 구현체
#[derive(Debug, Clone)]
pub struct OllamaChat {
    client: OllamaClient,
    model: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

impl OllamaChat {
    pub fn new(client: OllamaClient, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
        }
    }

    /// 설정에서 생성
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = OllamaClient::from_settings(settings)?;
        Ok(Self::new(
            client,
            settings.chat_model.clone(),
            settings.temperature,
        ))
    }
}

#[async_trait]
impl LanguageModel for OllamaChat {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
            options: ChatOptions {
                temperature: self.temperature,
            },
        };

        let response: ChatResponse = self
            .client
            .post_json("/api/chat", &request)
            .await
            .with_context(|| format!("Chat request failed (model: {})", self.model))?;

        tracing::debug!(
            "Model {} answered ({} chars)",
            self.model,
            response.message.content.chars().count()
        );

        Ok(response.message.content)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Tests
// ============================================================================
