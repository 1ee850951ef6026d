use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{FeedbackEvent, MealCandidate, RecommendationContext, UserProfile};
use super::repository::{BanditStateStore, RecommendationHistoryStore};
use super::service::RecommendationService;

/// Request body accepted by `POST /api/v1/recommendations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub profile: UserProfile,
    pub context: RecommendationContext,
    pub candidates: Vec<MealCandidate>,
    #[serde(default)]
    pub feedback: Vec<FeedbackEvent>,
}

/// Router builder exposing the recommendation endpoint.
pub fn recommendation_router<B, H>(service: Arc<RecommendationService<B, H>>) -> Router
where
    B: BanditStateStore + 'static,
    H: RecommendationHistoryStore + 'static,
{
    Router::new()
        .route("/api/v1/recommendations", post(recommend_handler::<B, H>))
        .with_state(service)
}

pub(crate) async fn recommend_handler<B, H>(
    State(service): State<Arc<RecommendationService<B, H>>>,
    axum::Json(request): axum::Json<RecommendationRequest>,
) -> Response
where
    B: BanditStateStore + 'static,
    H: RecommendationHistoryStore + 'static,
{
    let outcome = tokio::task::spawn_blocking(move || {
        service.recommend(
            &request.profile,
            &request.context,
            &request.candidates,
            &request.feedback,
        )
    })
    .await;

    match outcome {
        Ok(Ok(response)) => (StatusCode::OK, axum::Json(response)).into_response(),
        Ok(Err(error)) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        Err(join_error) => {
            tracing::error!(%join_error, "recommendation task failed");
            let payload = json!({
                "error": "recommendation task failed",
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
