//! 구조화 응답 (`WelfareAnswer`) 스키마와 파서
//!
//! 모델 출력에서 JSON 객체를 꺼내 고정된 스키마로 검증합니다.
//! 스키마에 맞지 않으면 부분적으로 채운 객체 대신 에러를 돌려줍니다.

use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("fence pattern is valid"));

/// 복지 안내 정보 (육하원칙)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Guide {
    /// 신청 대상
    pub who: String,
    /// 신청 시기 또는 기간
    pub when: String,
    /// 신청 장소 또는 채널
    #[serde(rename = "where")]
    pub where_: String,
    /// 지원 내용
    pub what: String,
    /// 신청 방법
    pub how: String,
    /// 지원 목적
    pub why: String,
}

/// 복지 가이드 응답
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WelfareAnswer {
    /// 핵심 키워드 리스트
    pub keywords: Vec<String>,
    /// 복지 안내 정보 (who, when, where, what, how, why)
    pub guide: Guide,
}

#[derive(Debug, thiserror::Error)]
pub enum OutputParserError {
    #[error("model output contains no JSON object. Got: {output}")]
    NoJson { output: String },

    #[error("failed to parse WelfareAnswer from model output: {message}. Got: {output}")]
    Invalid { message: String, output: String },
}

/// 프롬프트에 넣을 출력 형식 안내 (스키마 포함)
pub fn format_instructions() -> serde_json::Result<String> {
    let schema = schemars::schema_for!(WelfareAnswer);
    let schema_json = serde_json::to_string_pretty(&schema)?;

    Ok(format!(
        "The output must be a JSON instance that conforms to the JSON schema below.\n\
         Every field is required; use \"\" for guide fields that the document does not state.\n\
         \n\
         Here is the output schema:\n\
         ```\n{}\n```",
        schema_json
    ))
}

/// 모델 출력 → `WelfareAnswer`
pub fn parse_welfare_answer(raw: &str) -> Result<WelfareAnswer, OutputParserError> {
    let json = extract_json(raw).ok_or_else(|| OutputParserError::NoJson {
        output: raw.to_string(),
    })?;

    serde_json::from_str(json).map_err(|e| OutputParserError::Invalid {
        message: e.to_string(),
        output: raw.to_string(),
    })
}

/// 코드 펜스 안의 JSON, 그대로의 JSON, 또는 가장 바깥 `{...}` 구간 순서로 찾기
fn extract_json(raw: &str) -> Option<&str> {
    if let Some(body) = CODE_FENCE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
    {
        if body.starts_with('{') {
            return Some(body);
        }
    }

    let trimmed = raw.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed);
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| &raw[start..=end])
}

// ============================================================================
// Tests
// ============================================================================
