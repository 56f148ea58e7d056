//! Todo group repository
//!
//! Groups are always returned together with their todos:
//! - list: two queries in one snapshot (groups, then `group_id = ANY(..)`)
//! - delete: todos then group in one transaction (cascade)

use std::collections::HashMap;

use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};

use super::todos::Todo;
use crate::db::DbError;
use crate::models::{GroupColor, GroupName};

/// Todo group record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TodoGroup {
    pub id: i32,
    pub name: String,
    pub color: Option<String>,
}

/// Group with the todos that reference it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupWithTodos {
    pub id: i32,
    pub name: String,
    pub color: Option<String>,
    pub todos: Vec<Todo>,
}

impl GroupWithTodos {
    fn new(group: TodoGroup, todos: Vec<Todo>) -> Self {
        Self {
            id: group.id,
            name: group.name,
            color: group.color,
            todos,
        }
    }
}

/// Fields for a new group
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub name: GroupName,
    pub color: Option<GroupColor>,
}

/// Partial update for a group; `color: Some(None)` clears the color.
#[derive(Debug, Clone, Default)]
pub struct GroupChanges {
    pub name: Option<GroupName>,
    pub color: Option<Option<GroupColor>>,
}

impl GroupChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.color.is_none()
    }
}

/// Todo group repository
pub struct GroupRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> GroupRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all groups with their todos.
    pub async fn list(&self) -> Result<Vec<GroupWithTodos>, DbError> {
        let mut tx = self.pool.begin().await?;

        // Both reads must see the same snapshot
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;

        let groups: Vec<TodoGroup> = sqlx::query_as(
            r#"
            SELECT id, name, color
            FROM todo_groups
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        let ids: Vec<i32> = groups.iter().map(|g| g.id).collect();
        let todos: Vec<Todo> = sqlx::query_as(
            r#"
            SELECT id, title, description, completed, note, group_id
            FROM todos
            WHERE group_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut by_group: HashMap<i32, Vec<Todo>> = HashMap::new();
        for todo in todos {
            if let Some(group_id) = todo.group_id {
                by_group.entry(group_id).or_default().push(todo);
            }
        }

        Ok(groups
            .into_iter()
            .map(|g| {
                let todos = by_group.remove(&g.id).unwrap_or_default();
                GroupWithTodos::new(g, todos)
            })
            .collect())
    }

    /// Create a group. A new group owns no todos.
    pub async fn create(&self, new: NewGroup) -> Result<GroupWithTodos, DbError> {
        let group: TodoGroup = sqlx::query_as(
            r#"
            INSERT INTO todo_groups (name, color)
            VALUES ($1, $2)
            RETURNING id, name, color
            "#,
        )
        .bind(new.name.as_str())
        .bind(new.color.as_ref().map(GroupColor::as_str))
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(group_id = group.id, "todo group created");
        Ok(GroupWithTodos::new(group, Vec::new()))
    }

    /// Get a single group by id with its todos.
    pub async fn get(&self, id: i32) -> Result<GroupWithTodos, DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;

        let group: TodoGroup = sqlx::query_as(
            r#"
            SELECT id, name, color
            FROM todo_groups
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("todo group", id))?;

        let todos = todos_for_group(&mut tx, id).await?;
        tx.commit().await?;

        Ok(GroupWithTodos::new(group, todos))
    }

    /// Apply only the supplied fields (atomic).
    pub async fn update(&self, id: i32, changes: GroupChanges) -> Result<GroupWithTodos, DbError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, TodoGroup>(
            r#"
            SELECT id, name, color
            FROM todo_groups
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("todo group", id))?;

        let group = if changes.is_empty() {
            current
        } else {
            let mut query = QueryBuilder::<Postgres>::new("UPDATE todo_groups SET ");
            {
                let mut set = query.separated(", ");
                if let Some(name) = changes.name {
                    set.push("name = ").push_bind_unseparated(name.into_string());
                }
                if let Some(color) = changes.color {
                    set.push("color = ")
                        .push_bind_unseparated(color.map(GroupColor::into_string));
                }
            }
            query
                .push(" WHERE id = ")
                .push_bind(id)
                .push(" RETURNING id, name, color");

            let group: TodoGroup = query.build_query_as().fetch_one(&mut *tx).await?;
            tracing::debug!(group_id = id, "todo group updated");
            group
        };

        let todos = todos_for_group(&mut tx, id).await?;
        tx.commit().await?;

        Ok(GroupWithTodos::new(group, todos))
    }

    /// Delete a group and every todo referencing it (atomic).
    ///
    /// Returns the number of todos removed with the group.
    pub async fn delete(&self, id: i32) -> Result<u64, DbError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<(i32,)> =
            sqlx::query_as("SELECT id FROM todo_groups WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        if exists.is_none() {
            return Err(DbError::not_found("todo group", id));
        }

        let todos_deleted = sqlx::query("DELETE FROM todos WHERE group_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM todo_groups WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(group_id = id, todos_deleted, "todo group deleted");
        Ok(todos_deleted)
    }
}

/// Verify a group exists and hold a key-share lock on it until the
/// transaction ends, blocking concurrent deletes of that group.
pub(crate) async fn lock_group(conn: &mut PgConnection, id: i32) -> Result<(), DbError> {
    let found: Option<(i32,)> =
        sqlx::query_as("SELECT id FROM todo_groups WHERE id = $1 FOR KEY SHARE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    found
        .map(|_| ())
        .ok_or_else(|| DbError::not_found("todo group", id))
}

async fn todos_for_group(conn: &mut PgConnection, group_id: i32) -> Result<Vec<Todo>, DbError> {
    let todos = sqlx::query_as(
        r#"
        SELECT id, title, description, completed, note, group_id
        FROM todos
        WHERE group_id = $1
        ORDER BY id
        "#,
    )
    .bind(group_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(todos)
}
