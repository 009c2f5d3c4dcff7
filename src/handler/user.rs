use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

use crate::app::state::AppState;
use crate::domain::UserIn;
use crate::error::ApiError;

/// Handler for POST /register
pub async fn register_handler(
    State(state): State<AppState>,
    Json(user): Json<UserIn>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    info!(email = %user.email, "Registering user");

    if !user.is_valid_email() {
        return Err(ApiError::Validation("Invalid email address".to_string()));
    }

    let email = user.email.trim().to_string();
    if state.store.find_user_by_email(&email).await?.is_some() {
        info!(email = %email, "Email already registered");
        return Err(ApiError::Conflict(
            "A user with that email already exists".to_string(),
        ));
    }

    let access_token = Uuid::new_v4().simple().to_string();
    let created = state.store.create_user(email, access_token).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "detail": "User created.",
            "id": created.id,
            "access_token": created.access_token,
            "token_type": "bearer",
        })),
    ))
}
