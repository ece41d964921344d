//! API 라우트 핸들러

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde_json::Value;

use super::error::ApiError;
use super::AppState;
use crate::assistant::WelfareAnswer;

/// 모든 엔드포인트 공통 요청 본문
///
/// Content-Type과 무관하게 본문을 JSON 객체로 읽습니다. `question`이 없거나 `null`이면
/// `None`으로 두어 파이프라인에서 거절하고, 문자열이 아닌 값은 JSON 텍스트로 바꿔 넘깁니다.
#[derive(Debug, Default, PartialEq)]
pub struct QuestionRequest {
    pub question: Option<String>,
}

impl QuestionRequest {
    pub fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| ApiError::invalid_request(format!("Invalid JSON body: {}", e)))?;

        let Value::Object(mut fields) = value else {
            return Err(ApiError::invalid_request("Request body must be a JSON object"));
        };

        let question = match fields.remove("question") {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text),
            Some(other) => Some(other.to_string()),
        };

        Ok(Self { question })
    }
}

/// POST /chatbot - 참고 문서 기반 답변
pub async fn chatbot(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<String>, ApiError> {
    let req = QuestionRequest::from_body(&body)?;
    let answer = state.assistant.chat(req.question.as_deref()).await?;
    Ok(Json(answer))
}

/// POST /aiHelper - 구조화된 신청 가이드
pub async fn ai_helper(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<WelfareAnswer>, ApiError> {
    let req = QuestionRequest::from_body(&body)?;
    let answer = state.assistant.guide(req.question.as_deref()).await?;
    Ok(Json(answer))
}

/// POST /summary - 2~3문장 요약
pub async fn summary(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<String>, ApiError> {
    let req = QuestionRequest::from_body(&body)?;
    let summary = state.assistant.summarize(req.question.as_deref()).await?;
    Ok(Json(summary))
}

/// GET /health - 인덱스 및 모델 상태
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    match state.assistant.retriever().document_count().await {
        Ok(vectors) => Json(serde_json::json!({
            "status": "ok",
            "vectors": vectors,
            "embedding_model": state.embedding_model,
            "chat_model": state.assistant.model_name(),
        })),
        Err(e) => {
            tracing::warn!("Health check could not read index: {:#}", e);
            Json(serde_json::json!({
                "status": "degraded",
                "vectors": null,
                "embedding_model": state.embedding_model,
                "chat_model": state.assistant.model_name(),
                "error": e.to_string(),
            }))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
