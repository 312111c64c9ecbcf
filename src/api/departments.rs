//! Department endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::{Query, WithRejection};
use std::sync::Arc;

use crate::db::query::{DepartmentSearch, DepartmentSearchParams, PageParams};
use crate::db::{CreateDepartmentRequest, Department, Employee, UpdateDepartmentRequest};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_max_len, validate_optional, validate_required};
use super::{remove_employee_files, IdPath, JsonBody, QueryParams};

const MAX_TITLE_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 2000;

fn validate_create_request(req: &CreateDepartmentRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("title", validate_required("Title", &req.title, MAX_TITLE_LEN));
    errors.check(
        "description",
        validate_max_len("Description", req.description.as_deref(), MAX_DESCRIPTION_LEN),
    );
    errors.finish()
}

fn validate_update_request(req: &UpdateDepartmentRequest) -> Result<(), ApiError> {
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
    errors.finish()
}

/// List departments in insertion order
pub async fn list_departments(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(params), _): QueryParams<PageParams>,
) -> Result<Json<Vec<Department>>, ApiError> {
    let page = params.resolve(&state.config.search)?;
    Ok(Json(Department::list(&state.db, page).await?))
}

pub async fn get_department(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): IdPath<i64>,
) -> Result<Json<Department>, ApiError> {
    Ok(Json(Department::get(&state.db, id).await?))
}

pub async fn create_department(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): JsonBody<CreateDepartmentRequest>,
) -> Result<(StatusCode, Json<Department>), ApiError> {
    validate_create_request(&req)?;

    let department = Department::create(&state.db, &req).await?;
    tracing::info!(department_id = department.id, title = %department.title, "Created department");

    Ok((StatusCode::CREATED, Json(department)))
}

pub async fn update_department(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): IdPath<i64>,
    WithRejection(Json(req), _): JsonBody<UpdateDepartmentRequest>,
) -> Result<Json<Department>, ApiError> {
    validate_update_request(&req)?;
    Ok(Json(Department::update(&state.db, id, &req).await?))
}

/// Delete a department together with its positions, employees and documents
pub async fn delete_department(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): IdPath<i64>,
) -> Result<StatusCode, ApiError> {
    let employee_ids = Employee::ids_in_department(&state.db, id).await?;

    Department::delete(&state.db, id).await?;
    tracing::info!(department_id = id, employees = employee_ids.len(), "Deleted department");

    for employee_id in employee_ids {
        remove_employee_files(&state, employee_id).await;
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Substring search over title and description
pub async fn search_departments(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(params), _): QueryParams<DepartmentSearchParams>,
) -> Result<Json<Vec<Department>>, ApiError> {
    let search = DepartmentSearch::from_params(params, &state.config.search)?;
    Ok(Json(Department::search(&state.db, &search).await?))
}
