// src/handlers/notification.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::notification::PointsAssignedRequest,
    notifications::{PointsAssignedNotifier, RequestContext},
};

/// Notifies a student that their submission was scored.
///
/// Responds 202 once the payload is valid; delivery problems are only logged.
pub async fn points_assigned(
    State(config): State<Config>,
    State(notifier): State<Arc<PointsAssignedNotifier>>,
    headers: HeaderMap,
    Json(payload): Json<PointsAssignedRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    if !payload.points.is_finite() {
        return Err(AppError::BadRequest("points must be a finite number".to_string()));
    }

    let ctx = RequestContext::from_headers(&headers, &config);
    notifier
        .send_points_assigned(
            &ctx,
            &payload.teacher,
            &payload.student,
            &payload.submission,
            payload.points,
        )
        .await;

    Ok(StatusCode::ACCEPTED)
}
