//! Train registration, availability and booking lists.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{BookingStatus, Train, TrainId};
use domain::NewTrain;
use serde::{Deserialize, Serialize};
use store::ReservationStore;

use super::bookings::BookingResponse;
use super::parse_id;
use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateTrainRequest {
    pub train_name: String,
    pub train_number: String,
}

#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct TrainResponse {
    pub id: String,
    pub train_name: String,
    pub train_number: String,
    pub total_confirmed_berths: u32,
    pub total_rac_berths: u32,
    pub available_confirmed_berths: u32,
    pub available_rac_spots: u32,
    pub waiting_list_count: u32,
    pub lower_berths_available: u32,
    pub middle_berths_available: u32,
    pub upper_berths_available: u32,
    pub side_lower_berths_available: u32,
    pub side_upper_berths_available: u32,
    pub updated_at: String,
}

impl From<Train> for TrainResponse {
    fn from(train: Train) -> Self {
        Self {
            id: train.id.to_string(),
            train_name: train.train_name,
            train_number: train.train_number,
            total_confirmed_berths: train.total_confirmed_berths,
            total_rac_berths: train.total_rac_berths,
            available_confirmed_berths: train.available_confirmed_berths,
            available_rac_spots: train.available_rac_spots,
            waiting_list_count: train.waiting_list_count,
            lower_berths_available: train.lower_berths_available,
            middle_berths_available: train.middle_berths_available,
            upper_berths_available: train.upper_berths_available,
            side_lower_berths_available: train.side_lower_berths_available,
            side_upper_berths_available: train.side_upper_berths_available,
            updated_at: train.updated_at.to_rfc3339(),
        }
    }
}

/// POST /trains — register a train with full capacity.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: ReservationStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateTrainRequest>,
) -> Result<(StatusCode, Json<TrainResponse>), ApiError> {
    let train = state
        .booking_service
        .create_train(NewTrain::new(req.train_name, req.train_number))
        .await?;

    Ok((StatusCode::CREATED, Json(train.into())))
}

/// GET /trains/:id — current availability.
#[tracing::instrument(skip(state))]
pub async fn get<S: ReservationStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<TrainResponse>, ApiError> {
    let train_id = TrainId::from_uuid(parse_id("train id", &id)?);
    let train = state
        .booking_service
        .get_train(train_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Train {id} not found")))?;

    Ok(Json(train.into()))
}

/// GET /trains/:id/bookings — bookings in booking order, optionally by status.
#[tracing::instrument(skip(state))]
pub async fn bookings<S: ReservationStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let train_id = TrainId::from_uuid(parse_id("train id", &id)?);
    let status = query
        .status
        .as_deref()
        .map(str::parse::<BookingStatus>)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let bookings = state
        .booking_service
        .list_bookings(train_id, status)
        .await?;

    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}
