//! Passenger registration and lookup.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{User, UserId};
use domain::NewUser;
use serde::{Deserialize, Serialize};
use store::ReservationStore;

use super::parse_id;
use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub age: u32,
    pub gender: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub is_child: bool,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name,
            age: user.age,
            gender: user.gender,
            is_child: user.is_child,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// POST /users — register a passenger.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: ReservationStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state
        .booking_service
        .create_user(NewUser::new(req.name, req.age, req.gender))
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /users/:id — load a passenger.
#[tracing::instrument(skip(state))]
pub async fn get<S: ReservationStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = UserId::from_uuid(parse_id("user id", &id)?);
    let user = state
        .booking_service
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {id} not found")))?;

    Ok(Json(user.into()))
}
