//! Assistant 모듈 - 프롬프트 조립 → 모델 호출 → 출력 파싱
//!
//! 세 가지 단발성 파이프라인을 제공합니다.
//! - `guide`: 문서 → 구조화된 신청 가이드 ([`WelfareAnswer`])
//! - `summarize`: 문서 → 2~3문장 요약
//! - `chat`: 질문 → 검색된 참고 문서 기반 답변
//!
//! 각 호출은 독립적이며 대화 기록이나 재시도가 없습니다.

pub mod answer;
pub mod prompt;

use std::sync::Arc;

use anyhow::Context;

use crate::knowledge::{format_context, Retriever};
use crate::llm::LanguageModel;

pub use answer::{format_instructions, parse_welfare_answer, Guide, OutputParserError, WelfareAnswer};
pub use prompt::{PromptError, PromptTemplate, NOT_IN_DOCUMENT_MESSAGE, REFUSAL_MESSAGE};

use prompt::{CHATBOT_PROMPT, GUIDE_PROMPT, SUMMARY_PROMPT};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("request body has no `question` field")]
    MissingQuestion,

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error("retrieval failed: {0:#}")]
    Retrieval(anyhow::Error),

    #[error("language model call failed: {0:#}")]
    Model(anyhow::Error),

    #[error(transparent)]
    Output(#[from] OutputParserError),
}

// ============================================================================
// WelfareAssistant
// ============================================================================

/// 복지 안내 어시스턴트
///
/// 프로세스 시작 시 한 번 만들어지고 요청 간에 공유됩니다. 내부 상태를 바꾸지 않습니다.
pub struct WelfareAssistant {
    llm: Arc<dyn LanguageModel>,
    retriever: Retriever,
    format_instructions: String,
}

impl WelfareAssistant {
    pub fn new(llm: Arc<dyn LanguageModel>, retriever: Retriever) -> anyhow::Result<Self> {
        let format_instructions =
            format_instructions().context("Failed to render WelfareAnswer schema")?;

        Ok(Self {
            llm,
            retriever,
            format_instructions,
        })
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn model_name(&self) -> &str {
        self.llm.name()
    }

    /// 문서에서 신청 가이드 추출
    pub async fn guide(&self, question: Option<&str>) -> Result<WelfareAnswer, AssistantError> {
        let question = require_question(question)?;

        let prompt = GUIDE_PROMPT.render(&[
            ("format_instructions", self.format_instructions.as_str()),
            ("question", question),
        ])?;

        let raw = self.invoke(&prompt).await?;
        let answer = parse_welfare_answer(&raw)?;

        tracing::debug!("Guide extracted with {} keywords", answer.keywords.len());
        Ok(answer)
    }

    /// 문서 요약
    pub async fn summarize(&self, question: Option<&str>) -> Result<String, AssistantError> {
        let question = require_question(question)?;

        let prompt = SUMMARY_PROMPT.render(&[("question", question)])?;
        let summary = self.invoke(&prompt).await?;

        tracing::debug!("Summary has {} sentences", count_sentences(&summary));
        Ok(summary)
    }

    /// 참고 문서 기반 챗봇 답변
    pub async fn chat(&self, question: Option<&str>) -> Result<String, AssistantError> {
        let question = require_question(question)?;

        let chunks = self
            .retriever
            .retrieve(question)
            .await
            .map_err(AssistantError::Retrieval)?;
        let context = format_context(&chunks);

        let prompt = CHATBOT_PROMPT.render(&[
            ("not_in_document", NOT_IN_DOCUMENT_MESSAGE),
            ("refusal", REFUSAL_MESSAGE),
            ("context", context.as_str()),
            ("question", question),
        ])?;
        self.invoke(&prompt).await
    }

    async fn invoke(&self, prompt: &str) -> Result<String, AssistantError> {
        self.llm
            .complete(prompt)
            .await
            .map_err(AssistantError::Model)
    }
}

fn require_question(question: Option<&str>) -> Result<&str, AssistantError> {
    question.ok_or(AssistantError::MissingQuestion)
}

/// 문장 종결 부호(`.`, `!`, `?`, `。`) 기준 문장 수
///
/// 연속된 종결 부호(`...`)는 한 번으로 세고, 부호 없이 끝나는 마지막 문장도 셉니다.
pub fn count_sentences(text: &str) -> usize {
    let mut count = 0;
    let mut has_content = false;

    for c in text.chars() {
        if matches!(c, '.' | '!' | '?' | '。') {
            if has_content {
                count += 1;
                has_content = false;
            }
        } else if c.is_alphanumeric() {
            has_content = true;
        }
    }

    if has_content {
        count += 1;
    }

    count
}

// ============================================================================
// Tests
// ============================================================================
