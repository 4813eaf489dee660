//! Booking creation, lookup and cancellation.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{BerthType, Booking, BookingId, BookingStatus, TrainId, UserId};
use serde::{Deserialize, Serialize};
use store::ReservationStore;

use super::parse_id;
use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub user_id: String,
    pub train_id: String,
}

#[derive(Serialize)]
pub struct BookingResponse {
    pub id: String,
    pub user_id: String,
    pub train_id: String,
    pub status: BookingStatus,
    pub berth_type: Option<BerthType>,
    /// Two-decimal string, e.g. `"1000.00"`.
    pub amount: String,
    pub booked_at: String,
    pub updated_at: String,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id.to_string(),
            user_id: booking.user_id.to_string(),
            train_id: booking.train_id.to_string(),
            status: booking.status,
            berth_type: booking.berth_type,
            amount: booking.amount.to_decimal_string(),
            booked_at: booking.booked_at.to_rfc3339(),
            updated_at: booking.updated_at.to_rfc3339(),
        }
    }
}

/// POST /bookings — book a passenger onto a train.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: ReservationStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let user_id = UserId::from_uuid(parse_id("user_id", &req.user_id)?);
    let train_id = TrainId::from_uuid(parse_id("train_id", &req.train_id)?);

    let booking = state
        .booking_service
        .create_booking(user_id, train_id)
        .await?;

    Ok((StatusCode::CREATED, Json(booking.into())))
}

/// GET /bookings/:id — load a booking.
#[tracing::instrument(skip(state))]
pub async fn get<S: ReservationStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking_id = BookingId::from_uuid(parse_id("booking id", &id)?);
    let booking = state
        .booking_service
        .get_booking(booking_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Booking {id} not found")))?;

    Ok(Json(booking.into()))
}

/// DELETE /bookings/:id — cancel a booking and promote the queue behind it.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: ReservationStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let booking_id = BookingId::from_uuid(parse_id("booking id", &id)?);
    state.booking_service.cancel_booking(booking_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
