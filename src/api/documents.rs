//! Employee document uploads and generic HR document records.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::{Query, WithRejection};
use bytes::Bytes;
use std::sync::Arc;

use crate::db::query::PageParams;
use crate::db::{
    CreateDocumentRequest, Document, DocumentListQuery, Employee, EmployeeDocument,
    NewEmployeeDocument, StoreError,
};
use crate::storage::document_path;
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::validate_required;
use super::{IdPath, JsonBody, QueryParams};

const MAX_TITLE_LEN: usize = 200;
const MAX_TYPE_LEN: usize = 100;

/// Upload a file for an employee.
///
/// Expects multipart fields `document_type` (text) and `file`. The bytes are
/// written to `employee_{id}/{document_type}_{file_name}` before the record
/// is inserted, so a stored record always had its file written.
pub async fn upload_employee_document(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(employee_id), _): IdPath<i64>,
    WithRejection(mut multipart, _): WithRejection<Multipart, ApiError>,
) -> Result<(StatusCode, Json<EmployeeDocument>), ApiError> {
    if !Employee::exists(&state.db, employee_id).await? {
        return Err(StoreError::not_found(Employee::ENTITY, employee_id).into());
    }

    let mut document_type: Option<String> = None;
    let mut upload: Option<(Option<String>, Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("document_type") => document_type = Some(field.text().await?),
            Some("file") => {
                let file_name = field.file_name().map(|s| s.to_string());
                upload = Some((file_name, field.bytes().await?));
            }
            _ => {}
        }
    }

    let mut errors = ValidationErrorBuilder::new();
    let document_type = document_type.unwrap_or_default().trim().to_string();
    errors.check(
        "document_type",
        validate_required("Document type", &document_type, MAX_TYPE_LEN),
    );

    let (raw_name, data) = upload.unwrap_or_default();
    // Keep only the client's base name, never its directory.
    let file_name = raw_name
        .as_deref()
        .and_then(|n| n.rsplit(['/', '\\']).next())
        .unwrap_or("")
        .trim()
        .to_string();
    if file_name.is_empty() {
        errors.add("file", "A file field with a file name is required");
    } else if data.is_empty() {
        errors.add("file", "Empty file provided");
    }
    errors.finish()?;

    let file_path = document_path(employee_id, &document_type, &file_name)?;
    let size = data.len();
    state.documents.put(&file_path, data).await?;

    let record = EmployeeDocument::create(
        &state.db,
        &NewEmployeeDocument {
            employee_id,
            document_type: &document_type,
            file_name: &file_name,
            file_path: &file_path,
        },
    )
    .await?;

    tracing::info!(
        employee_id,
        document_id = record.id,
        path = %file_path,
        size,
        "Stored employee document"
    );

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_employee_documents(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(employee_id), _): IdPath<i64>,
) -> Result<Json<Vec<EmployeeDocument>>, ApiError> {
    if !Employee::exists(&state.db, employee_id).await? {
        return Err(StoreError::not_found(Employee::ENTITY, employee_id).into());
    }
    Ok(Json(EmployeeDocument::list_for_employee(&state.db, employee_id).await?))
}

/// Quote-safe ASCII file name for `Content-Disposition`
fn disposition_name(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| {
            if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Stream back the stored bytes of one of the employee's documents
pub async fn download_employee_document(
    State(state): State<Arc<AppState>>,
    WithRejection(Path((employee_id, document_id)), _): IdPath<(i64, i64)>,
) -> Result<Response, ApiError> {
    let record = EmployeeDocument::get_for_employee(&state.db, employee_id, document_id).await?;
    let data = state.documents.get(&record.file_path).await?;

    let content_type = mime_guess::from_path(&record.file_name)
        .first_or_octet_stream()
        .to_string();
    let disposition = format!(
        "attachment; filename=\"{}\"",
        disposition_name(&record.file_name)
    );

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    )
        .into_response())
}

/// Delete the record, then the file unless another record shares it
pub async fn delete_employee_document(
    State(state): State<Arc<AppState>>,
    WithRejection(Path((employee_id, document_id)), _): IdPath<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    let record = EmployeeDocument::delete_for_employee(&state.db, employee_id, document_id).await?;
    tracing::info!(employee_id, document_id, "Deleted employee document");

    if !EmployeeDocument::path_in_use(&state.db, &record.file_path).await? {
        if let Err(e) = state.documents.remove(&record.file_path).await {
            tracing::warn!(path = %record.file_path, error = %e, "Failed to remove document file");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

// -------------------------------------------------------------------------
// Generic documents
// -------------------------------------------------------------------------

fn validate_create_request(req: &CreateDocumentRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("title", validate_required("Title", &req.title, MAX_TITLE_LEN));
    errors.check("doc_type", validate_required("Document type", &req.doc_type, MAX_TYPE_LEN));
    errors.finish()
}

/// List documents, optionally only those of one employee
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(params), _): QueryParams<DocumentListQuery>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let page = PageParams {
        skip: params.skip,
        limit: params.limit,
    }
    .resolve(&state.config.search)?;

    Ok(Json(Document::list(&state.db, params.employee_id, page).await?))
}

pub async fn get_document(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): IdPath<i64>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(Document::get(&state.db, id).await?))
}

pub async fn create_document(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): JsonBody<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    validate_create_request(&req)?;

    let document = Document::create(&state.db, &req).await?;
    tracing::info!(
        document_id = document.id,
        employee_id = document.employee_id,
        "Created document"
    );

    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): IdPath<i64>,
) -> Result<StatusCode, ApiError> {
    Document::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
