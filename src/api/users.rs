//! User account endpoints and password hashing.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::{Query, WithRejection};
use std::sync::Arc;

use crate::db::query::PageParams;
use crate::db::{CreateUserRequest, User, UserResponse};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_email, validate_password, validate_required};
use super::{IdPath, JsonBody, QueryParams};

/// Hash a password using Argon2 with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Check a password against a stored Argon2 hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

fn validate_create_request(req: &CreateUserRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("email", validate_email(&req.email));
    errors.check("name", validate_required("Name", &req.name, 100));
    errors.check("password", validate_password(&req.password));
    errors.finish()
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(params), _): QueryParams<PageParams>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let page = params.resolve(&state.config.search)?;
    let users = User::list(&state.db, page).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): IdPath<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    Ok(Json(User::get(&state.db, id).await?.into()))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): JsonBody<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    validate_create_request(&req)?;

    let password_hash = hash_password(&req.password).map_err(|e| {
        tracing::error!("Failed to hash password: {}", e);
        ApiError::internal("Failed to hash password")
    })?;

    let user = User::create(&state.db, req.email.trim(), req.name.trim(), &password_hash).await?;
    tracing::info!(user_id = user.id, "Created user");

    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): IdPath<i64>,
) -> Result<StatusCode, ApiError> {
    User::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
