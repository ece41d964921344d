//! API 에러 → HTTP 응답
//!
//! 모든 실패는 `500 {"detail": "<message>"}` 하나로 응답합니다.
//! 원인 구분은 로그 레벨로만 남깁니다.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::Level;

use crate::assistant::AssistantError;

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    detail: &'a str,
}

/// HTTP 핸들러 에러
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
    /// 응답 시 로그 레벨 (요청 자체의 문제는 WARN)
    level: Level,
}

impl ApiError {
    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
            level: Level::ERROR,
        }
    }

    /// 요청 본문 문제. 상태 코드는 동일하게 500
    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self {
            level: Level::WARN,
            ..Self::internal(detail)
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn level(&self) -> Level {
        self.level
    }
}

impl From<AssistantError> for ApiError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::MissingQuestion => Self::invalid_request(err.to_string()),
            _ => Self::internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.level == Level::WARN {
            tracing::warn!("Rejected request: {}", self.detail);
        } else {
            tracing::error!("Request failed: {}", self.detail);
        }

        (
            self.status,
            Json(ErrorBody {
                detail: &self.detail,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::OutputParserError;

    #[test]
    fn test_every_assistant_error_maps_to_500() {
        let errors = [
            AssistantError::MissingQuestion,
            AssistantError::Model(anyhow::anyhow!("connection refused")),
            AssistantError::Retrieval(anyhow::anyhow!("table missing")),
            AssistantError::Output(OutputParserError::NoJson {
                output: "hello".to_string(),
            }),
        ];

        for err in errors {
            let api: ApiError = err.into();
            assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert!(!api.detail().is_empty());
        }
    }

    #[test]
    fn test_conversion_only_classifies_level() {
        let missing: ApiError = AssistantError::MissingQuestion.into();
        assert_eq!(missing.level(), Level::WARN);

        let failed: ApiError = AssistantError::Model(anyhow::anyhow!("timeout")).into();
        assert_eq!(failed.level(), Level::ERROR);

        let bad_body = ApiError::invalid_request("expected value at line 1 column 1");
        assert_eq!(bad_body.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(bad_body.level(), Level::WARN);
    }

    #[tokio::test]
    async fn test_response_body_has_detail() {
        let response = ApiError::internal("boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({ "detail": "boom" }));
    }
}
