//! Todo repository
//!
//! Writes that reference a group lock the group row (`FOR KEY SHARE`) in the
//! same transaction, so a concurrent group delete cannot orphan the todo.

use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};

use super::groups::lock_group;
use crate::db::DbError;
use crate::models::TodoTitle;

/// Todo record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Todo {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub note: Option<String>,
    pub group_id: Option<i32>,
}

/// Fields for a new todo
#[derive(Debug, Clone)]
pub struct NewTodo {
    pub title: TodoTitle,
    pub description: Option<String>,
    pub completed: bool,
    pub note: Option<String>,
    pub group_id: Option<i32>,
}

/// Partial update for a todo.
///
/// `None` leaves a column untouched. For nullable columns `Some(None)`
/// clears the value.
#[derive(Debug, Clone, Default)]
pub struct TodoChanges {
    pub title: Option<TodoTitle>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub note: Option<Option<String>>,
    pub group_id: Option<Option<i32>>,
}

impl TodoChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.note.is_none()
            && self.group_id.is_none()
    }
}

/// Todo repository
pub struct TodoRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> TodoRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all todos, ordered by id.
    pub async fn list(&self) -> Result<Vec<Todo>, DbError> {
        let todos = sqlx::query_as(
            r#"
            SELECT id, title, description, completed, note, group_id
            FROM todos
            ORDER BY id
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(todos)
    }

    /// Create a todo, verifying its group exists first (atomic).
    pub async fn create(&self, new: NewTodo) -> Result<Todo, DbError> {
        let mut tx = self.pool.begin().await?;

        if let Some(group_id) = new.group_id {
            lock_group(&mut tx, group_id).await?;
        }

        let todo: Todo = sqlx::query_as(
            r#"
            INSERT INTO todos (title, description, completed, note, group_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, completed, note, group_id
            "#,
        )
        .bind(new.title.as_str())
        .bind(new.description.as_deref())
        .bind(new.completed)
        .bind(new.note.as_deref())
        .bind(new.group_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(todo_id = todo.id, group_id = ?todo.group_id, "todo created");
        Ok(todo)
    }

    /// Get a single todo by id.
    pub async fn get(&self, id: i32) -> Result<Todo, DbError> {
        sqlx::query_as(
            r#"
            SELECT id, title, description, completed, note, group_id
            FROM todos
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("todo", id))
    }

    /// Apply only the supplied fields (atomic).
    ///
    /// Fails with NotFound if the todo is absent, or if a non-null
    /// `group_id` does not reference an existing group.
    pub async fn update(&self, id: i32, changes: TodoChanges) -> Result<Todo, DbError> {
        let mut tx = self.pool.begin().await?;

        // Group row before todo row, the same order GroupRepo::delete takes
        // them. A missing todo still reports as the todo.
        if let Some(Some(group_id)) = changes.group_id {
            ensure_todo(&mut tx, id).await?;
            lock_group(&mut tx, group_id).await?;
        }

        let current = lock_todo(&mut tx, id).await?;

        if changes.is_empty() {
            tx.commit().await?;
            return Ok(current);
        }

        let mut query = QueryBuilder::<Postgres>::new("UPDATE todos SET ");
        {
            let mut set = query.separated(", ");
            if let Some(title) = changes.title {
                set.push("title = ").push_bind_unseparated(title.into_string());
            }
            if let Some(description) = changes.description {
                set.push("description = ").push_bind_unseparated(description);
            }
            if let Some(completed) = changes.completed {
                set.push("completed = ").push_bind_unseparated(completed);
            }
            if let Some(note) = changes.note {
                set.push("note = ").push_bind_unseparated(note);
            }
            if let Some(group_id) = changes.group_id {
                set.push("group_id = ").push_bind_unseparated(group_id);
            }
        }
        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING id, title, description, completed, note, group_id");

        let todo: Todo = query.build_query_as().fetch_one(&mut *tx).await?;

        tx.commit().await?;
        tracing::debug!(todo_id = id, "todo updated");
        Ok(todo)
    }

    /// Delete a todo permanently.
    pub async fn delete(&self, id: i32) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("todo", id));
        }

        tracing::debug!(todo_id = id, "todo deleted");
        Ok(())
    }
}

/// Existence check that takes no row lock.
async fn ensure_todo(conn: &mut PgConnection, id: i32) -> Result<(), DbError> {
    let found: Option<(i32,)> = sqlx::query_as("SELECT id FROM todos WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    found.map(|_| ()).ok_or_else(|| DbError::not_found("todo", id))
}

/// Fetch a todo and hold its row lock until the transaction ends.
async fn lock_todo(conn: &mut PgConnection, id: i32) -> Result<Todo, DbError> {
    sqlx::query_as(
        r#"
        SELECT id, title, description, completed, note, group_id
        FROM todos
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("todo", id))
}
