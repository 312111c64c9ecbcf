mod error;
mod models;
pub mod query;

pub use error::{StoreError, StoreResult};
pub use models::*;

use anyhow::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::config::DatabaseConfig;

pub type DbPool = SqlitePool;

/// Execute a SQL migration file, properly handling comments
async fn execute_sql(pool: &SqlitePool, sql: &str) -> Result<()> {
    for statement in sql.split(';') {
        // Strip SQL comment lines (lines starting with --)
        let cleaned: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = cleaned.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(pool).await?;
        }
    }
    Ok(())
}

/// Open the on-disk database under `data_dir` and bring the schema up to date.
pub async fn init(data_dir: &Path, config: &DatabaseConfig) -> Result<DbPool> {
    let db_path = data_dir.join(&config.file_name);
    let db_url = format!("sqlite:{}", db_path.display());

    info!("Initializing database at {}", db_path.display());

    // foreign_keys is a per-connection pragma, so it lives on the connect
    // options rather than being issued once against the pool.
    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    info!("Database initialized successfully");
    Ok(pool)
}

/// Single-connection in-memory database, used by tests and `--ephemeral` runs.
pub async fn init_in_memory() -> Result<DbPool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    // Every connection to :memory: is its own database, so the pool must
    // never open a second one or drop the first.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    // Migration 001: departments, positions, employees
    execute_sql(pool, include_str!("../../migrations/001_initial.sql")).await?;

    // Migration 002: employee uploads and generic documents
    let has_documents_table: Option<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master WHERE type='table' AND name='employee_documents'",
    )
    .fetch_optional(pool)
    .await?;
    if has_documents_table.is_none() {
        execute_sql(pool, include_str!("../../migrations/002_documents.sql")).await?;
    }

    // Migration 003: user accounts
    let has_users_table: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name='users'")
            .fetch_optional(pool)
            .await?;
    if has_users_table.is_none() {
        execute_sql(pool, include_str!("../../migrations/003_users.sql")).await?;
    }

    // Migration 004: lowercased search columns
    let has_search_text: Option<(String,)> = sqlx::query_as(
        "SELECT name FROM pragma_table_info('employees') WHERE name = 'first_name_lower'",
    )
    .fetch_optional(pool)
    .await?;
    if has_search_text.is_none() {
        execute_sql(pool, include_str!("../../migrations/004_search_text.sql")).await?;
        backfill_search_text(pool).await?;
    }

    info!("Migrations completed");
    Ok(())
}

/// Fill the `*_lower` columns of rows written before they existed.
async fn backfill_search_text(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool.begin().await?;

    for table in ["departments", "positions"] {
        let rows: Vec<(i64, String, Option<String>)> =
            sqlx::query_as(&format!("SELECT id, title, description FROM {}", table))
                .fetch_all(&mut *tx)
                .await?;
        for (id, title, description) in rows {
            sqlx::query(&format!(
                "UPDATE {} SET title_lower = ?, description_lower = ? WHERE id = ?",
                table
            ))
            .bind(search_text(&title))
            .bind(description.as_deref().map(search_text))
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }
    }

    let employees: Vec<(i64, String, String, String, Option<String>)> =
        sqlx::query_as("SELECT id, first_name, last_name, email, phone FROM employees")
            .fetch_all(&mut *tx)
            .await?;
    let count = employees.len();
    for (id, first_name, last_name, email, phone) in employees {
        sqlx::query(
            "UPDATE employees SET first_name_lower = ?, last_name_lower = ?, email_lower = ?, phone_lower = ? WHERE id = ?",
        )
        .bind(search_text(&first_name))
        .bind(search_text(&last_name))
        .bind(search_text(&email))
        .bind(phone.as_deref().map(search_text))
        .bind(id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    info!(employees = count, "Backfilled search columns");
    Ok(())
}
