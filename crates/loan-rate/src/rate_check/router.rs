use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::applicant::{ApplicantDraft, FieldName, RawValue};
use super::scoring::ScoringCollaborator;
use super::service::RateCheckService;
use crate::error::AppError;

/// Router builder exposing the rate check form endpoints.
pub fn rate_check_router<S>(service: Arc<RateCheckService<S>>) -> Router
where
    S: ScoringCollaborator + 'static,
{
    Router::new()
        .route("/api/v1/rate-check/steps", get(steps_handler::<S>))
        .route("/api/v1/rate-check/preview", post(preview_handler::<S>))
        .route("/api/v1/rate-check/normalize", post(normalize_handler::<S>))
        .route("/api/v1/rate-check/submit", post(submit_handler::<S>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct PreviewRequest {
    pub(crate) field: FieldName,
    pub(crate) value: RawValue,
}

pub(crate) async fn steps_handler<S>(State(service): State<Arc<RateCheckService<S>>>) -> Response
where
    S: ScoringCollaborator + 'static,
{
    (StatusCode::OK, Json(service.steps())).into_response()
}

pub(crate) async fn preview_handler<S>(
    State(service): State<Arc<RateCheckService<S>>>,
    Json(request): Json<PreviewRequest>,
) -> Response
where
    S: ScoringCollaborator + 'static,
{
    match service.preview(request.field, &request.value) {
        Some(preview) => (StatusCode::OK, Json(preview)).into_response(),
        None => {
            let payload = json!({
                "field": request.field,
                "normalized": serde_json::Value::Null,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn normalize_handler<S>(
    State(service): State<Arc<RateCheckService<S>>>,
    Json(draft): Json<ApplicantDraft>,
) -> Result<Response, AppError>
where
    S: ScoringCollaborator + 'static,
{
    let features = service
        .normalize(&draft)
        .map_err(|error| AppError::RateCheck(error.into()))?;
    Ok((StatusCode::OK, Json(features)).into_response())
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<RateCheckService<S>>>,
    Json(draft): Json<ApplicantDraft>,
) -> Result<Response, AppError>
where
    S: ScoringCollaborator + 'static,
{
    let quote = service.quote(&draft).await?;
    Ok((StatusCode::OK, Json(quote)).into_response())
}
