use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::option::AvailabilityReport;
use crate::models::pricing::{CapacityFit, GuestBreakdown, PriceQuote, PricingModel};
use crate::pricing::availability::check_availability;
use crate::pricing::calculator::{calculate_price, check_capacity_fit};
use crate::state::AppState;

/// Largest party accepted by the availability and quote endpoints.
pub const MAX_PARTY_SIZE: u32 = 500;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tours/:tour_id/availability", get(tour_availability))
        .route("/pricing/quote", post(quote))
}

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub pricing: PricingModel,
    pub guests: GuestBreakdown,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub quote: Option<PriceQuote>,
    pub capacity: CapacityFit,
}

async fn tour_availability(
    State(state): State<Arc<AppState>>,
    Path(tour_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityReport>, AppError> {
    if query.adults == 0 {
        return Err(AppError::BadRequest("at least one adult is required".to_string()));
    }

    let guests = GuestBreakdown::new(query.adults, query.children, query.infants);
    check_party_size(&guests)?;
    let report = check_availability(
        state.availability.as_ref(),
        tour_id,
        query.date,
        guests,
        state.alternative_date_window,
    )
    .await?;

    let result = if report.sold_out { "sold_out" } else { "available" };
    state
        .metrics
        .availability_checks_total
        .with_label_values(&[result])
        .inc();

    Ok(Json(report))
}

async fn quote(Json(payload): Json<QuoteRequest>) -> Result<Json<QuoteResponse>, AppError> {
    if payload.guests.total() == 0 {
        return Err(AppError::BadRequest("guests cannot be empty".to_string()));
    }
    check_party_size(&payload.guests)?;

    Ok(Json(QuoteResponse {
        quote: calculate_price(&payload.pricing, &payload.guests),
        capacity: check_capacity_fit(&payload.pricing, &payload.guests),
    }))
}

fn check_party_size(guests: &GuestBreakdown) -> Result<(), AppError> {
    match guests.checked_total() {
        Some(total) if total <= MAX_PARTY_SIZE => Ok(()),
        _ => Err(AppError::BadRequest(format!(
            "party size must be at most {MAX_PARTY_SIZE} guests"
        ))),
    }
}
