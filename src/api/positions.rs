//! Position endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::{Query, WithRejection};
use std::sync::Arc;

use crate::db::query::{PageParams, PositionSearch, PositionSearchParams};
use crate::db::{CreatePositionRequest, Position, UpdatePositionRequest};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    validate_amount, validate_max_len, validate_optional, validate_required, validate_salary_range,
};
use super::{IdPath, JsonBody, QueryParams};

const MAX_TITLE_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 2000;

fn validate_create_request(req: &CreatePositionRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("title", validate_required("Title", &req.title, MAX_TITLE_LEN));
    errors.check(
        "description",
        validate_max_len("Description", req.description.as_deref(), MAX_DESCRIPTION_LEN),
    );
    errors.check("salary_range_min", validate_amount(req.salary_range_min));
    errors.check("salary_range_max", validate_amount(req.salary_range_max));
    errors.check(
        "salary_range_min",
        validate_salary_range(req.salary_range_min, req.salary_range_max),
    );
    errors.finish()
}

/// Only the bounds sent in the request are checked here; the model
/// re-checks the merged range against the stored row.
fn validate_update_request(req: &UpdatePositionRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("title", validate_optional("Title", &req.title, MAX_TITLE_LEN));
    errors.check(
        "description",
        validate_max_len(
            "Description",
            req.description.as_ref().and_then(|d| d.as_deref()),
            MAX_DESCRIPTION_LEN,
        ),
    );
    errors.check("salary_range_min", validate_amount(req.salary_range_min.flatten()));
    errors.check("salary_range_max", validate_amount(req.salary_range_max.flatten()));
    errors.finish()
}

pub async fn list_positions(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(params), _): QueryParams<PageParams>,
) -> Result<Json<Vec<Position>>, ApiError> {
    let page = params.resolve(&state.config.search)?;
    Ok(Json(Position::list(&state.db, page).await?))
}

pub async fn get_position(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): IdPath<i64>,
) -> Result<Json<Position>, ApiError> {
    Ok(Json(Position::get(&state.db, id).await?))
}

/// Create a position inside an existing department
pub async fn create_position(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): JsonBody<CreatePositionRequest>,
) -> Result<(StatusCode, Json<Position>), ApiError> {
    validate_create_request(&req)?;

    let position = Position::create(&state.db, &req).await?;
    tracing::info!(
        position_id = position.id,
        department_id = position.department_id,
        "Created position"
    );

    Ok((StatusCode::CREATED, Json(position)))
}

pub async fn update_position(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): IdPath<i64>,
    WithRejection(Json(req), _): JsonBody<UpdatePositionRequest>,
) -> Result<Json<Position>, ApiError> {
    validate_update_request(&req)?;
    Ok(Json(Position::update(&state.db, id, &req).await?))
}

/// Delete a position; refused while any employee holds it
pub async fn delete_position(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): IdPath<i64>,
) -> Result<StatusCode, ApiError> {
    Position::delete(&state.db, id).await?;
    tracing::info!(position_id = id, "Deleted position");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn search_positions(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(params), _): QueryParams<PositionSearchParams>,
) -> Result<Json<Vec<Position>>, ApiError> {
    let search = PositionSearch::from_params(params, &state.config.search)?;
    Ok(Json(Position::search(&state.db, &search).await?))
}
