//! Todo endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::repos::{NewTodo, Todo, TodoChanges, TodoRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{ValidId, ValidJson};
use crate::http::server::AppState;
use crate::models::{free_text, Patch, TodoTitle, ValidationError};

/// Create todo request
#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub note: Option<String>,
    pub group_id: Option<i32>,
}

impl CreateTodoRequest {
    fn into_new_todo(self) -> Result<NewTodo, ValidationError> {
        Ok(NewTodo {
            title: TodoTitle::new(self.title)?,
            description: self
                .description
                .map(|d| free_text(d, "description"))
                .transpose()?,
            completed: self.completed,
            note: self.note.map(|n| free_text(n, "note")).transpose()?,
            group_id: self.group_id,
        })
    }
}

/// Update todo request; every field is optional and omitted fields are kept
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateTodoRequest {
    pub title: Patch<String>,
    pub description: Patch<String>,
    pub completed: Patch<bool>,
    pub note: Patch<String>,
    pub group_id: Patch<i32>,
}

impl UpdateTodoRequest {
    fn into_changes(self) -> Result<TodoChanges, ValidationError> {
        Ok(TodoChanges {
            title: self.title.try_map(TodoTitle::new)?.into_required("title")?,
            description: self
                .description
                .try_map(|d| free_text(d, "description"))?
                .into_change(),
            completed: self.completed.into_required("completed")?,
            note: self.note.try_map(|n| free_text(n, "note"))?.into_change(),
            group_id: self.group_id.into_change(),
        })
    }
}

/// Todo response
#[derive(Debug, Serialize)]
pub struct TodoResponse {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub note: Option<String>,
    pub group_id: Option<i32>,
}

impl From<Todo> for TodoResponse {
    fn from(t: Todo) -> Self {
        Self {
            id: t.id,
            title: t.title,
            description: t.description,
            completed: t.completed,
            note: t.note,
            group_id: t.group_id,
        }
    }
}

/// Delete confirmation
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: &'static str,
}

/// GET /todos - list all todos
async fn list_todos(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TodoResponse>>, ApiError> {
    let todos = TodoRepo::new(&state.pool).list().await?;
    Ok(Json(todos.into_iter().map(TodoResponse::from).collect()))
}

/// POST /todos - create a todo, optionally inside a group
async fn create_todo(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<CreateTodoRequest>,
) -> Result<(StatusCode, Json<TodoResponse>), ApiError> {
    let new = req.into_new_todo()?;
    let todo = TodoRepo::new(&state.pool).create(new).await?;

    Ok((StatusCode::CREATED, Json(TodoResponse::from(todo))))
}

/// GET /todos/{id} - get a single todo
async fn get_todo(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<TodoResponse>, ApiError> {
    let todo = TodoRepo::new(&state.pool).get(id).await?;
    Ok(Json(TodoResponse::from(todo)))
}

/// PUT /todos/{id} - partial update
async fn update_todo(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
    ValidJson(req): ValidJson<UpdateTodoRequest>,
) -> Result<Json<TodoResponse>, ApiError> {
    let changes = req.into_changes()?;
    let todo = TodoRepo::new(&state.pool).update(id, changes).await?;
    Ok(Json(TodoResponse::from(todo)))
}

/// DELETE /todos/{id}
async fn delete_todo(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<DeletedResponse>, ApiError> {
    TodoRepo::new(&state.pool).delete(id).await?;
    Ok(Json(DeletedResponse {
        message: "Todo deleted",
    }))
}

/// Todo routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/{id}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_request_defaults() {
        let req: CreateTodoRequest = serde_json::from_value(json!({"title": "Draft report"})).unwrap();
        assert!(!req.completed);
        assert_eq!(req.group_id, None);

        let new = req.into_new_todo().unwrap();
        assert_eq!(new.title.as_str(), "Draft report");
    }

    #[test]
    fn create_request_requires_title() {
        let res = serde_json::from_value::<CreateTodoRequest>(json!({"description": "x"}));
        assert!(res.is_err());
    }

    #[test]
    fn update_keeps_omitted_fields_out_of_changes() {
        let req: UpdateTodoRequest = serde_json::from_value(json!({"completed": true})).unwrap();
        let changes = req.into_changes().unwrap();
        assert_eq!(changes.completed, Some(true));
        assert!(changes.title.is_none());
        assert!(changes.description.is_none());
        assert!(changes.note.is_none());
        assert!(changes.group_id.is_none());
    }

    #[test]
    fn update_null_clears_nullable_fields() {
        let req: UpdateTodoRequest =
            serde_json::from_value(json!({"note": null, "group_id": null})).unwrap();
        let changes = req.into_changes().unwrap();
        assert_eq!(changes.note, Some(None));
        assert_eq!(changes.group_id, Some(None));
    }

    #[test]
    fn update_rejects_null_title_and_completed() {
        let req: UpdateTodoRequest = serde_json::from_value(json!({"title": null})).unwrap();
        assert_eq!(
            req.into_changes().unwrap_err(),
            ValidationError::Null { field: "title" }
        );

        let req: UpdateTodoRequest = serde_json::from_value(json!({"completed": null})).unwrap();
        assert_eq!(
            req.into_changes().unwrap_err(),
            ValidationError::Null { field: "completed" }
        );
    }

    #[test]
    fn update_rejects_blank_title() {
        let req: UpdateTodoRequest = serde_json::from_value(json!({"title": "  "})).unwrap();
        assert!(matches!(
            req.into_changes().unwrap_err(),
            ValidationError::Empty { field: "title" }
        ));
    }

    #[test]
    fn nul_characters_are_validation_errors() {
        let req: CreateTodoRequest =
            serde_json::from_value(json!({"title": "a\u{0000}b"})).unwrap();
        assert!(matches!(
            req.into_new_todo().unwrap_err(),
            ValidationError::InvalidFormat { field: "title", .. }
        ));

        let req: CreateTodoRequest =
            serde_json::from_value(json!({"title": "ok", "note": "n\u{0000}"})).unwrap();
        assert!(matches!(
            req.into_new_todo().unwrap_err(),
            ValidationError::InvalidFormat { field: "note", .. }
        ));

        let req: UpdateTodoRequest =
            serde_json::from_value(json!({"description": "\u{0000}"})).unwrap();
        assert!(matches!(
            req.into_changes().unwrap_err(),
            ValidationError::InvalidFormat { field: "description", .. }
        ));
    }

    #[test]
    fn response_shape_serializes_nulls() {
        let todo = Todo {
            id: 1,
            title: "Draft report".into(),
            description: None,
            completed: false,
            note: None,
            group_id: Some(1),
        };
        let value = serde_json::to_value(TodoResponse::from(todo)).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 1,
                "title": "Draft report",
                "description": null,
                "completed": false,
                "note": null,
                "group_id": 1
            })
        );
    }
}
