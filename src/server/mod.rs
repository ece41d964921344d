//! HTTP 질의 서비스
//!
//! 시작 시 인덱스와 모델 클라이언트를 한 번 준비하고, 이후 요청 간에 읽기 전용으로 공유합니다.
//!
//! | Method | Path | 응답 |
//! |---|---|---|
//! | POST | `/chatbot` | 답변 문자열 |
//! | POST | `/aiHelper` | `WelfareAnswer` |
//! | POST | `/summary` | 요약 문자열 |
//! | GET | `/health` | 인덱스/모델 상태 |

mod error;
mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::assistant::WelfareAssistant;
use crate::config::Settings;
use crate::embedding::{EmbeddingProvider, OllamaEmbedding};
use crate::knowledge::{open_index, Retriever, VectorStore};
use crate::llm::{LanguageModel, OllamaChat};

pub use error::ApiError;
pub use routes::QuestionRequest;

/// 핸들러 공유 상태
pub struct AppState {
    pub assistant: WelfareAssistant,
    /// 질문 임베딩에 쓰는 모델 이름
    pub embedding_model: String,
}

/// 라우터 구성 (CORS: 모든 origin/method/header 허용)
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chatbot", post(routes::chatbot))
        .route("/aiHelper", post(routes::ai_helper))
        .route("/summary", post(routes::summary))
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// 인덱스를 열고 모델 클라이언트를 준비
///
/// 인덱스가 없으면 서버를 띄우지 않고 실패합니다.
pub async fn load_state(settings: &Settings) -> Result<AppState> {
    let index_dir = &settings.index_dir;

    let (manifest, store) = open_index(index_dir)
        .await
        .with_context(|| format!("Failed to load vector index: {}", index_dir.display()))?;

    if manifest.embedding_model != settings.embedding_model {
        tracing::warn!(
            "Index was built with embedding model '{}' but '{}' is configured; retrieval quality may suffer",
            manifest.embedding_model,
            settings.embedding_model
        );
    }

    let vectors = store.count().await.context("Failed to count indexed vectors")?;
    tracing::info!(
        "Loaded vector index from {} ({} vectors, dimension {}, built at {})",
        index_dir.display(),
        vectors,
        manifest.dimension,
        manifest.built_at.to_rfc3339()
    );

    let store: Arc<dyn VectorStore> = Arc::new(store);
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OllamaEmbedding::from_settings(settings)?);
    let llm: Arc<dyn LanguageModel> = Arc::new(OllamaChat::from_settings(settings)?);

    let assistant = WelfareAssistant::new(llm, Retriever::new(embedder, store))?;

    Ok(AppState {
        assistant,
        embedding_model: settings.embedding_model.clone(),
    })
}

/// 서버 실행 (Ctrl+C로 종료)
pub async fn serve(settings: &Settings) -> Result<()> {
    let state = Arc::new(load_state(settings).await?);
    let app = build_router(state);

    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Welfare RAG server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutting down");
        })
        .await
        .context("Server error")?;

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
