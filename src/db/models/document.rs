//! Employee upload records and generic HR documents.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::common::{now_timestamp, Page};
use crate::db::{StoreError, StoreResult};

/// A file uploaded for an employee; the bytes live in the document store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmployeeDocument {
    pub id: i64,
    pub employee_id: i64,
    pub document_type: String,
    pub file_name: String,
    /// Path relative to the upload root
    pub file_path: String,
    pub uploaded_at: String,
}

pub struct NewEmployeeDocument<'a> {
    pub employee_id: i64,
    pub document_type: &'a str,
    pub file_name: &'a str,
    pub file_path: &'a str,
}

impl EmployeeDocument {
    pub const ENTITY: &'static str = "Employee document";

    pub async fn create(db: &SqlitePool, doc: &NewEmployeeDocument<'_>) -> StoreResult<EmployeeDocument> {
        let now = now_timestamp();

        let record = sqlx::query_as::<_, EmployeeDocument>(
            r#"
            INSERT INTO employee_documents (employee_id, document_type, file_name, file_path, uploaded_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(doc.employee_id)
        .bind(doc.document_type)
        .bind(doc.file_name)
        .bind(doc.file_path)
        .bind(&now)
        .fetch_one(db)
        .await?;

        Ok(record)
    }

    pub async fn list_for_employee(db: &SqlitePool, employee_id: i64) -> StoreResult<Vec<EmployeeDocument>> {
        let docs = sqlx::query_as::<_, EmployeeDocument>(
            "SELECT * FROM employee_documents WHERE employee_id = ? ORDER BY id ASC",
        )
        .bind(employee_id)
        .fetch_all(db)
        .await?;
        Ok(docs)
    }

    /// Look up a document only through the employee that owns it.
    pub async fn get_for_employee(
        db: &SqlitePool,
        employee_id: i64,
        id: i64,
    ) -> StoreResult<EmployeeDocument> {
        sqlx::query_as::<_, EmployeeDocument>(
            "SELECT * FROM employee_documents WHERE id = ? AND employee_id = ?",
        )
        .bind(id)
        .bind(employee_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| StoreError::not_found(Self::ENTITY, id))
    }

    pub async fn delete_for_employee(db: &SqlitePool, employee_id: i64, id: i64) -> StoreResult<EmployeeDocument> {
        sqlx::query_as::<_, EmployeeDocument>(
            "DELETE FROM employee_documents WHERE id = ? AND employee_id = ? RETURNING *",
        )
        .bind(id)
        .bind(employee_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| StoreError::not_found(Self::ENTITY, id))
    }

    /// Whether any record still points at `file_path`; re-uploads with the
    /// same type and name share one file.
    pub async fn path_in_use(db: &SqlitePool, file_path: &str) -> StoreResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM employee_documents WHERE file_path = ?")
                .bind(file_path)
                .fetch_one(db)
                .await?;
        Ok(count > 0)
    }
}

/// Generic HR document (passport, contract, certificate, ...)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: i64,
    pub employee_id: i64,
    pub title: String,
    pub doc_type: String,
    pub number: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub title: String,
    #[serde(alias = "type")]
    pub doc_type: String,
    pub number: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub employee_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentListQuery {
    pub employee_id: Option<i64>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl Document {
    pub const ENTITY: &'static str = "Document";

    pub async fn create(db: &SqlitePool, req: &CreateDocumentRequest) -> StoreResult<Document> {
        if let (Some(issued), Some(expires)) = (req.issue_date, req.expiry_date) {
            if expires < issued {
                return Err(StoreError::validation(
                    "expiry_date",
                    "expiry_date must not be before issue_date",
                ));
            }
        }

        let now = now_timestamp();
        let document = sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (employee_id, title, doc_type, number, issue_date, expiry_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(req.employee_id)
        .bind(&req.title)
        .bind(&req.doc_type)
        .bind(&req.number)
        .bind(req.issue_date)
        .bind(req.expiry_date)
        .bind(&now)
        .fetch_one(db)
        .await?;

        Ok(document)
    }

    pub async fn get(db: &SqlitePool, id: i64) -> StoreResult<Document> {
        sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| StoreError::not_found(Self::ENTITY, id))
    }

    pub async fn list(db: &SqlitePool, employee_id: Option<i64>, page: Page) -> StoreResult<Vec<Document>> {
        let documents = sqlx::query_as::<_, Document>(
            r#"
            SELECT * FROM documents
            WHERE (? IS NULL OR employee_id = ?)
            ORDER BY id ASC LIMIT ? OFFSET ?
            "#,
        )
        .bind(employee_id)
        .bind(employee_id)
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(db)
        .await?;
        Ok(documents)
    }

    pub async fn delete(db: &SqlitePool, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(Self::ENTITY, id));
        }
        Ok(())
    }
}
