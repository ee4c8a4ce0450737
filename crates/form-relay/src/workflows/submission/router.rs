use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde_json::json;
use tracing::error;

use super::domain::{Question, SubmissionEvent};
use super::repository::{DispatchPublisher, StatusLedger};
use super::service::{SubmissionService, SubmissionServiceError};

/// Router builder exposing submission intake and catalog registration.
pub fn submission_router<L, D>(service: Arc<SubmissionService<L, D>>) -> Router
where
    L: StatusLedger + 'static,
    D: DispatchPublisher + 'static,
{
    Router::new()
        .route("/api/v1/submissions", post(submit_handler::<L, D>))
        .route(
            "/api/v1/forms/:form_id/questions",
            put(register_form_handler::<L, D>),
        )
        .route(
            "/api/v1/forms/:form_id/catalog",
            get(catalog_handler::<L, D>),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<L, D>(
    State(service): State<Arc<SubmissionService<L, D>>>,
    axum::Json(event): axum::Json<SubmissionEvent>,
) -> Response
where
    L: StatusLedger + 'static,
    D: DispatchPublisher + 'static,
{
    let outcome = tokio::task::spawn_blocking(move || service.process(&event)).await;

    match outcome {
        Ok(Ok(receipt)) => (StatusCode::ACCEPTED, axum::Json(receipt)).into_response(),
        Ok(Err(err @ SubmissionServiceError::ConfigurationMissing { .. })) => {
            error!(error = %err, "submission aborted");
            let payload = json!({ "error": err.to_string() });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
        Ok(Err(err)) => {
            error!(error = %err, "downstream rejected submission");
            let payload = json!({ "error": err.to_string() });
            (StatusCode::BAD_GATEWAY, axum::Json(payload)).into_response()
        }
        Err(join_error) => {
            error!(error = %join_error, "submission task failed");
            let payload = json!({ "error": "submission processing failed" });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn register_form_handler<L, D>(
    State(service): State<Arc<SubmissionService<L, D>>>,
    Path(form_id): Path<String>,
    axum::Json(questions): axum::Json<Vec<Question>>,
) -> Response
where
    L: StatusLedger + 'static,
    D: DispatchPublisher + 'static,
{
    let catalog = service.register_form(&form_id, &questions);
    let payload = json!({
        "form_id": form_id,
        "entries": catalog.len(),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn catalog_handler<L, D>(
    State(service): State<Arc<SubmissionService<L, D>>>,
    Path(form_id): Path<String>,
) -> Response
where
    L: StatusLedger + 'static,
    D: DispatchPublisher + 'static,
{
    match service.catalog(&form_id) {
        Some(catalog) => (StatusCode::OK, axum::Json(catalog.as_ref().clone())).into_response(),
        None => {
            let payload = json!({
                "error": format!("no catalog registered for form '{form_id}'"),
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
    }
}
