use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::engine::queue::{submit_day, submit_tour};
use crate::engine::suggestions::suggest_guides;
use crate::error::AppError;
use crate::models::assignment::{DayAssignmentResult, GuideSuggestion, TourAssignmentResult};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/schedules/:schedule_id/auto-assign", post(auto_assign_tour))
        .route("/days/:date/auto-assign", post(auto_assign_day))
        .route(
            "/schedules/:schedule_id/bookings/:booking_id/suggestions",
            get(guide_suggestions),
        )
}

async fn auto_assign_tour(
    State(state): State<Arc<AppState>>,
    Path(schedule_id): Path<Uuid>,
) -> Result<Json<TourAssignmentResult>, AppError> {
    let result = submit_tour(&state, schedule_id).await?;
    Ok(Json(result))
}

async fn auto_assign_day(
    State(state): State<Arc<AppState>>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<DayAssignmentResult>, AppError> {
    let result = submit_day(&state, date).await?;
    Ok(Json(result))
}

async fn guide_suggestions(
    State(state): State<Arc<AppState>>,
    Path((schedule_id, booking_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Vec<GuideSuggestion>>, AppError> {
    let suggestions = suggest_guides(state.assignments.as_ref(), schedule_id, booking_id).await?;
    Ok(Json(suggestions))
}
