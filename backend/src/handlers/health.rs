use axum::Json;

use crate::models::StatusResponse;

pub async fn health() -> Json<StatusResponse> {
    Json(StatusResponse::new("ok"))
}
