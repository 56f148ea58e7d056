//! Schema migrations for todo tables
//!
//! Idempotent: safe to run on every start, including from several
//! instances at once (serialized by an advisory lock).

use sqlx::PgPool;

use super::DbError;

/// Advisory lock key held while migrating
const MIGRATION_LOCK_KEY: i64 = 0x746f_646f_6374_6c;

/// Create tables and indexes if they don't exist yet
pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Running todo migrations...");

    let mut tx = pool.begin().await?;

    // Released on commit or rollback
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS todo_groups (
            id SERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            color VARCHAR(50)
        )
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS todos (
            id SERIAL PRIMARY KEY,
            title VARCHAR(255) NOT NULL,
            description TEXT,
            completed BOOLEAN NOT NULL DEFAULT FALSE,
            note TEXT,
            group_id INTEGER REFERENCES todo_groups(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_todos_group ON todos(group_id)")
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!("Todo migrations complete");
    Ok(())
}
