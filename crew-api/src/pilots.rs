use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use crew_core::{ReservationHandle, ScheduleConfirmation, TripRequest};
use serde::Serialize;
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationResponse {
    pub is_confirmed: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/pilots/next-available", post(get_next_available))
        .route("/v1/pilots/confirm", post(confirm_schedule))
}

/// POST /v1/pilots/next-available
/// Find a free pilot for the trip and place a hold on them
async fn get_next_available(
    State(state): State<AppState>,
    Json(req): Json<TripRequest>,
) -> Result<Json<ReservationHandle>, AppError> {
    req.validate(state.clock.now())?;

    let handle = state.reservations.get_next_available(&req).await?;
    info!(
        "Next available pilot for {} {} -> {}: {:?}",
        req.location, req.departure_date_time, req.return_date_time, handle.pilot_id
    );
    Ok(Json(handle))
}

/// POST /v1/pilots/confirm
/// Turn a hold into a firm booking
async fn confirm_schedule(
    State(state): State<AppState>,
    Json(req): Json<ScheduleConfirmation>,
) -> Result<Json<ConfirmationResponse>, AppError> {
    let is_confirmed = state.reservations.confirm(&req).await?;
    Ok(Json(ConfirmationResponse { is_confirmed }))
}
