//! Position models and storage operations.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use super::common::{double_option, now_timestamp, search_text, Page, PartialUpdate};
use crate::db::query::PositionSearch;
use crate::db::{StoreError, StoreResult};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Position {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub department_id: i64,
    pub salary_range_min: Option<f64>,
    pub salary_range_max: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePositionRequest {
    pub title: String,
    pub description: Option<String>,
    pub department_id: i64,
    pub salary_range_min: Option<f64>,
    pub salary_range_max: Option<f64>,
}

/// Partial update; for the nullable fields `Some(None)` clears the stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePositionRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub department_id: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub salary_range_min: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub salary_range_max: Option<Option<f64>>,
}

fn check_salary_range(min: Option<f64>, max: Option<f64>) -> StoreResult<()> {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(StoreError::validation(
                "salary_range_min",
                "salary_range_min must not exceed salary_range_max",
            ));
        }
    }
    Ok(())
}

async fn require_department(conn: &mut SqliteConnection, department_id: i64) -> StoreResult<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM departments WHERE id = ?")
        .bind(department_id)
        .fetch_one(&mut *conn)
        .await?;
    if count == 0 {
        return Err(StoreError::ConstraintViolation(format!(
            "Department {} does not exist",
            department_id
        )));
    }
    Ok(())
}

impl Position {
    pub const ENTITY: &'static str = "Position";

    pub async fn create(db: &SqlitePool, req: &CreatePositionRequest) -> StoreResult<Position> {
        check_salary_range(req.salary_range_min, req.salary_range_max)?;

        let mut tx = db.begin().await?;
        require_department(&mut tx, req.department_id).await?;

        let now = now_timestamp();
        let position = sqlx::query_as::<_, Position>(
            r#"
            INSERT INTO positions (
                title, description, department_id, salary_range_min, salary_range_max,
                title_lower, description_lower, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.department_id)
        .bind(req.salary_range_min)
        .bind(req.salary_range_max)
        .bind(search_text(&req.title))
        .bind(req.description.as_deref().map(search_text))
        .bind(&now)
        .bind(&now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            position_id = position.id,
            department_id = position.department_id,
            "Position created"
        );
        Ok(position)
    }

    pub async fn get(db: &SqlitePool, id: i64) -> StoreResult<Position> {
        let mut conn = db.acquire().await?;
        Self::fetch(&mut conn, id).await
    }

    pub(crate) async fn fetch(conn: &mut SqliteConnection, id: i64) -> StoreResult<Position> {
        sqlx::query_as::<_, Position>("SELECT * FROM positions WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| StoreError::not_found(Self::ENTITY, id))
    }

    pub async fn list(db: &SqlitePool, page: Page) -> StoreResult<Vec<Position>> {
        let positions = sqlx::query_as::<_, Position>(
            "SELECT * FROM positions ORDER BY id ASC LIMIT ? OFFSET ?",
        )
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(db)
        .await?;
        Ok(positions)
    }

    /// Partial update.
    ///
    /// Moving a position to another department is refused while employees
    /// hold it, since their department would no longer match.
    pub async fn update(
        db: &SqlitePool,
        id: i64,
        req: &UpdatePositionRequest,
    ) -> StoreResult<Position> {
        let mut tx = db.begin().await?;
        let existing = Self::fetch(&mut tx, id).await?;

        check_salary_range(
            req.salary_range_min.unwrap_or(existing.salary_range_min),
            req.salary_range_max.unwrap_or(existing.salary_range_max),
        )?;

        if let Some(department_id) = req.department_id {
            if department_id != existing.department_id {
                require_department(&mut tx, department_id).await?;

                let holders: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM employees WHERE position_id = ?")
                        .bind(id)
                        .fetch_one(&mut *tx)
                        .await?;
                if holders > 0 {
                    return Err(StoreError::ConstraintViolation(format!(
                        "Position {} is held by {} employee(s) and cannot change department",
                        id, holders
                    )));
                }
            }
        }

        let mut update = PartialUpdate::new("positions", now_timestamp());
        update
            .set_some("title", req.title.as_deref())
            .set_some("title_lower", req.title.as_deref().map(search_text))
            .set_some("description", req.description.as_ref().map(|d| d.as_deref()))
            .set_some(
                "description_lower",
                req.description
                    .as_ref()
                    .map(|d| d.as_deref().map(search_text)),
            )
            .set_some("department_id", req.department_id)
            .set_some("salary_range_min", req.salary_range_min)
            .set_some("salary_range_max", req.salary_range_max);

        let mut qb = update.returning(id);
        let position = qb.build_query_as::<Position>().fetch_one(&mut *tx).await?;

        tx.commit().await?;
        Ok(position)
    }

    /// Delete a position that no employee holds.
    pub async fn delete(db: &SqlitePool, id: i64) -> StoreResult<()> {
        let mut tx = db.begin().await?;
        Self::fetch(&mut tx, id).await?;

        let holders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees WHERE position_id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if holders > 0 {
            return Err(StoreError::ConstraintViolation(format!(
                "Position {} is still held by {} employee(s)",
                id, holders
            )));
        }

        sqlx::query("DELETE FROM positions WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn search(db: &SqlitePool, search: &PositionSearch) -> StoreResult<Vec<Position>> {
        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("SELECT * FROM positions");
        search.push_where(&mut qb);
        qb.push(" ORDER BY id ASC LIMIT ");
        qb.push_bind(search.page.limit);
        qb.push(" OFFSET ");
        qb.push_bind(search.page.skip);

        let positions = qb.build_query_as::<Position>().fetch_all(db).await?;
        Ok(positions)
    }
}
