//! Department models and storage operations.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use super::common::{double_option, now_timestamp, search_text, Page, PartialUpdate};
use crate::db::query::DepartmentSearch;
use crate::db::{StoreError, StoreResult};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Department {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateDepartmentRequest {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateDepartmentRequest {
    pub title: Option<String>,
    /// `Some(None)` clears the description
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

impl Department {
    pub const ENTITY: &'static str = "Department";

    pub async fn create(db: &SqlitePool, req: &CreateDepartmentRequest) -> StoreResult<Department> {
        let now = now_timestamp();

        let department = sqlx::query_as::<_, Department>(
            r#"
            INSERT INTO departments (title, description, title_lower, description_lower, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&req.title)
        .bind(&req.description)
        .bind(search_text(&req.title))
        .bind(req.description.as_deref().map(search_text))
        .bind(&now)
        .bind(&now)
        .fetch_one(db)
        .await?;

        tracing::debug!(department_id = department.id, "Department created");
        Ok(department)
    }

    pub async fn get(db: &SqlitePool, id: i64) -> StoreResult<Department> {
        sqlx::query_as::<_, Department>("SELECT * FROM departments WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| StoreError::not_found(Self::ENTITY, id))
    }

    pub async fn list(db: &SqlitePool, page: Page) -> StoreResult<Vec<Department>> {
        let departments = sqlx::query_as::<_, Department>(
            "SELECT * FROM departments ORDER BY id ASC LIMIT ? OFFSET ?",
        )
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(db)
        .await?;
        Ok(departments)
    }

    /// Partial update: absent fields keep their stored value.
    pub async fn update(
        db: &SqlitePool,
        id: i64,
        req: &UpdateDepartmentRequest,
    ) -> StoreResult<Department> {
        let mut update = PartialUpdate::new("departments", now_timestamp());
        update
            .set_some("title", req.title.as_deref())
            .set_some("title_lower", req.title.as_deref().map(search_text))
            .set_some("description", req.description.as_ref().map(|d| d.as_deref()))
            .set_some(
                "description_lower",
                req.description
                    .as_ref()
                    .map(|d| d.as_deref().map(search_text)),
            );

        let mut qb = update.returning(id);
        let department = qb.build_query_as::<Department>().fetch_optional(db).await?;
        department.ok_or_else(|| StoreError::not_found(Self::ENTITY, id))
    }

    /// Delete a department together with its positions, employees and their documents.
    pub async fn delete(db: &SqlitePool, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM departments WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(Self::ENTITY, id));
        }

        tracing::debug!(department_id = id, "Department deleted with dependents");
        Ok(())
    }

    /// Substring search across title and description
    pub async fn search(db: &SqlitePool, search: &DepartmentSearch) -> StoreResult<Vec<Department>> {
        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("SELECT * FROM departments");
        search.push_where(&mut qb);
        qb.push(" ORDER BY id ASC LIMIT ");
        qb.push_bind(search.page.limit);
        qb.push(" OFFSET ");
        qb.push_bind(search.page.skip);

        let departments = qb.build_query_as::<Department>().fetch_all(db).await?;
        Ok(departments)
    }
}
