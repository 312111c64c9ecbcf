mod departments;
mod documents;
mod employees;
pub mod error;
mod positions;
pub mod users;
mod validation;

use axum::{
    extract::{DefaultBodyLimit, Path},
    routing::get,
    Json, Router,
};
use axum_extra::extract::{Query, WithRejection};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;
use error::ApiError;

/// JSON body whose rejections become `validation_error` responses
pub(crate) type JsonBody<T> = WithRejection<Json<T>, ApiError>;
/// Path parameters whose rejections become `validation_error` responses
pub(crate) type IdPath<T> = WithRejection<Path<T>, ApiError>;
/// Query string (repeated keys allowed) whose rejections become `validation_error` responses
pub(crate) type QueryParams<T> = WithRejection<Query<T>, ApiError>;

/// Best-effort removal of everything uploaded for an employee whose rows are gone.
pub(crate) async fn remove_employee_files(state: &AppState, employee_id: i64) {
    if let Err(e) = state.documents.remove_employee(employee_id).await {
        tracing::warn!(employee_id, error = %e, "Failed to remove employee uploads");
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let hr_routes = Router::new()
        // Departments
        .route(
            "/departments",
            get(departments::list_departments).post(departments::create_department),
        )
        .route(
            "/departments/",
            get(departments::list_departments).post(departments::create_department),
        )
        .route("/departments/search", get(departments::search_departments))
        .route(
            "/departments/:id",
            get(departments::get_department)
                .put(departments::update_department)
                .patch(departments::update_department)
                .delete(departments::delete_department),
        )
        // Positions
        .route(
            "/positions",
            get(positions::list_positions).post(positions::create_position),
        )
        .route(
            "/positions/",
            get(positions::list_positions).post(positions::create_position),
        )
        .route("/positions/search", get(positions::search_positions))
        .route(
            "/positions/:id",
            get(positions::get_position)
                .put(positions::update_position)
                .patch(positions::update_position)
                .delete(positions::delete_position),
        )
        // Employees
        .route(
            "/employees",
            get(employees::list_employees).post(employees::create_employee),
        )
        .route(
            "/employees/",
            get(employees::list_employees).post(employees::create_employee),
        )
        .route("/employees/search", get(employees::search_employees))
        .route(
            "/employees/advanced-search",
            get(employees::advanced_search_employees),
        )
        .route(
            "/employees/:id",
            get(employees::get_employee)
                .put(employees::update_employee)
                .patch(employees::update_employee)
                .delete(employees::delete_employee),
        )
        // Generic documents
        .route(
            "/documents",
            get(documents::list_documents).post(documents::create_document),
        )
        .route(
            "/documents/",
            get(documents::list_documents).post(documents::create_document),
        )
        .route(
            "/documents/:id",
            get(documents::get_document).delete(documents::delete_document),
        );

    // Uploads get their own body limit
    let upload_routes = Router::new()
        .route(
            "/employees/:id/documents",
            get(documents::list_employee_documents).post(documents::upload_employee_document),
        )
        .route(
            "/employees/:id/documents/",
            get(documents::list_employee_documents).post(documents::upload_employee_document),
        )
        .route(
            "/employees/:id/documents/:doc_id",
            get(documents::download_employee_document).delete(documents::delete_employee_document),
        )
        .layer(DefaultBodyLimit::max(state.config.uploads.max_file_size));

    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health_check))
        .nest("/hr", hr_routes.merge(upload_routes))
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/", get(users::list_users).post(users::create_user))
        .route("/users/:id", get(users::get_user).delete(users::delete_user))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Welcome to the HR API" }))
}

async fn health_check() -> &'static str {
    "OK"
}
