//! Employee endpoints, including simple and advanced search.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::{Query, WithRejection};
use std::sync::Arc;

use crate::db::query::{AdvancedSearchParams, EmployeeFilter, EmployeeSearchParams, PageParams};
use crate::db::{CreateEmployeeRequest, Employee, EmployeePage, UpdateEmployeeRequest};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    validate_amount, validate_email, validate_max_len, validate_optional, validate_phone,
    validate_required,
};
use super::{remove_employee_files, IdPath, JsonBody, QueryParams};

const MAX_NAME_LEN: usize = 50;
const MAX_CITY_LEN: usize = 50;
const MAX_WORKING_DAYS_LEN: usize = 20;
const MAX_ADDRESS_LEN: usize = 500;

fn validate_create_request(req: &CreateEmployeeRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    errors.check("first_name", validate_required("First name", &req.first_name, MAX_NAME_LEN));
    errors.check("last_name", validate_required("Last name", &req.last_name, MAX_NAME_LEN));
    errors.check("email", validate_email(&req.email));
    errors.check("phone", validate_phone(req.phone.as_deref()));
    errors.check("address", validate_max_len("Address", req.address.as_deref(), MAX_ADDRESS_LEN));
    errors.check("city", validate_max_len("City", req.city.as_deref(), MAX_CITY_LEN));
    errors.check(
        "working_days",
        validate_max_len("Working days", req.working_days.as_deref(), MAX_WORKING_DAYS_LEN),
    );
    errors.check("ctc", validate_amount(req.ctc));
    errors.check("monthly_salary", validate_amount(req.monthly_salary));

    if let (Some(born), Some(joined)) = (req.date_of_birth, req.join_date) {
        if joined < born {
            errors.add("join_date", "join_date must not be before date_of_birth");
        }
    }

    errors.finish()
}

/// Supplied value of a nullable field, if it is neither absent nor cleared
fn supplied<T>(value: &Option<Option<T>>) -> Option<&T> {
    value.as_ref().and_then(|v| v.as_ref())
}

fn validate_update_request(req: &UpdateEmployeeRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    errors.check("first_name", validate_optional("First name", &req.first_name, MAX_NAME_LEN));
    errors.check("last_name", validate_optional("Last name", &req.last_name, MAX_NAME_LEN));
    if let Some(ref email) = req.email {
        errors.check("email", validate_email(email));
    }
    errors.check("phone", validate_phone(supplied(&req.phone).map(String::as_str)));
    errors.check(
        "address",
        validate_max_len("Address", supplied(&req.address).map(String::as_str), MAX_ADDRESS_LEN),
    );
    errors.check(
        "city",
        validate_max_len("City", supplied(&req.city).map(String::as_str), MAX_CITY_LEN),
    );
    errors.check(
        "working_days",
        validate_max_len(
            "Working days",
            supplied(&req.working_days).map(String::as_str),
            MAX_WORKING_DAYS_LEN,
        ),
    );
    errors.check("ctc", validate_amount(supplied(&req.ctc).copied()));
    errors.check("monthly_salary", validate_amount(supplied(&req.monthly_salary).copied()));

    errors.finish()
}

pub async fn list_employees(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(params), _): QueryParams<PageParams>,
) -> Result<Json<Vec<Employee>>, ApiError> {
    let page = params.resolve(&state.config.search)?;
    Ok(Json(Employee::list(&state.db, page).await?))
}

pub async fn get_employee(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): IdPath<i64>,
) -> Result<Json<Employee>, ApiError> {
    Ok(Json(Employee::get(&state.db, id).await?))
}

/// Create an employee; the position must belong to the given department
pub async fn create_employee(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): JsonBody<CreateEmployeeRequest>,
) -> Result<(StatusCode, Json<Employee>), ApiError> {
    validate_create_request(&req)?;

    let employee = Employee::create(&state.db, &req).await?;
    tracing::info!(
        employee_id = employee.id,
        department_id = employee.department_id,
        position_id = employee.position_id,
        "Created employee"
    );

    Ok((StatusCode::CREATED, Json(employee)))
}

pub async fn update_employee(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): IdPath<i64>,
    WithRejection(Json(req), _): JsonBody<UpdateEmployeeRequest>,
) -> Result<Json<Employee>, ApiError> {
    validate_update_request(&req)?;
    Ok(Json(Employee::update(&state.db, id, &req).await?))
}

/// Delete an employee, their document records and their uploaded files
pub async fn delete_employee(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): IdPath<i64>,
) -> Result<StatusCode, ApiError> {
    Employee::delete(&state.db, id).await?;
    tracing::info!(employee_id = id, "Deleted employee");

    remove_employee_files(&state, id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// Single-valued filters, default ordering, items only
pub async fn search_employees(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(params), _): QueryParams<EmployeeSearchParams>,
) -> Result<Json<Vec<Employee>>, ApiError> {
    let filter = EmployeeFilter::from_simple(params, &state.config.search)?;
    let page = Employee::search(&state.db, &filter).await?;
    Ok(Json(page.items))
}

/// Full-text search, multi-valued filters, sorting and paging with a total
pub async fn advanced_search_employees(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(params), _): QueryParams<AdvancedSearchParams>,
) -> Result<Json<EmployeePage>, ApiError> {
    let filter = EmployeeFilter::from_advanced(params, &state.config.search)?;
    let page = Employee::search(&state.db, &filter).await?;

    tracing::debug!(
        total = page.total,
        returned = page.items.len(),
        sort_by = ?filter.sort_by,
        "Advanced employee search"
    );

    Ok(Json(page))
}
