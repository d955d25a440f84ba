use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use libris_http::{error::AppError, extract::JsonBody};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::client::{RecommendationError, Recommender, Suggestion, SuggestionDraft};
use crate::modules::books::catalog::SharedCatalog;
use crate::modules::books::routes::BookResponse;

#[derive(Clone)]
pub struct RecommendationsState {
    pub recommender: Recommender,
    pub catalog: SharedCatalog,
    in_flight: Arc<AtomicBool>,
}

impl RecommendationsState {
    pub fn new(recommender: Recommender, catalog: SharedCatalog) -> Self {
        Self {
            recommender,
            catalog,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Holds the in-flight flag; released on drop, including when the caller goes away.
struct InFlightGuard(Arc<AtomicBool>);

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag.clone()))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub prompt: String,
}

impl From<RecommendationError> for AppError {
    fn from(err: RecommendationError) -> Self {
        match err {
            RecommendationError::EmptyPrompt => AppError::validation(
                vec![json!({"field": "prompt", "error": "required"})],
                err.user_message(),
            ),
            RecommendationError::MalformedResponse(_) | RecommendationError::ServiceError(_) => {
                tracing::error!(error = %err, "error generating recommendation");
                AppError::bad_gateway(err.user_message())
            }
        }
    }
}

/// Routes mounted under `/api/recommendations`.
pub fn router(state: RecommendationsState) -> Router {
    Router::new()
        .route("/", post(recommend))
        .route("/accept", post(accept))
        .route("/health", get(health_check))
        .with_state(state)
}

async fn recommend(
    State(state): State<RecommendationsState>,
    JsonBody(request): JsonBody<RecommendRequest>,
) -> Result<Json<Suggestion>, AppError> {
    let _guard = InFlightGuard::acquire(&state.in_flight).ok_or_else(|| {
        AppError::conflict(
            Vec::new(),
            "a recommendation request is already in progress",
        )
    })?;

    let suggestion = state.recommender.recommend(&request.prompt).await?;
    tracing::info!(title = %suggestion.title, genre = %suggestion.genre, "recommendation ready");
    Ok(Json(suggestion))
}

async fn accept(
    State(state): State<RecommendationsState>,
    JsonBody(draft): JsonBody<SuggestionDraft>,
) -> Result<(StatusCode, Json<BookResponse>), AppError> {
    let new_book = draft.into_new_book();
    new_book.validate()?;

    let book = state.catalog.write().await.add(new_book);
    tracing::info!(id = %book.id, title = %book.title, genre = %book.genre, "recommendation accepted");
    Ok((StatusCode::CREATED, Json(book.into())))
}

async fn health_check(State(state): State<RecommendationsState>) -> &'static str {
    if state.is_busy() {
        "recommendations module is busy"
    } else {
        "recommendations module is healthy"
    }
}
