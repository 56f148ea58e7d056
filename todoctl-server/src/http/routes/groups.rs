//! Todo group endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use super::todos::{DeletedResponse, TodoResponse};
use crate::db::repos::{GroupChanges, GroupRepo, GroupWithTodos, NewGroup};
use crate::http::error::ApiError;
use crate::http::extractors::{ValidId, ValidJson};
use crate::http::server::AppState;
use crate::models::{GroupColor, GroupName, Patch, ValidationError};

/// Create group request
#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub color: Option<String>,
}

impl CreateGroupRequest {
    fn into_new_group(self) -> Result<NewGroup, ValidationError> {
        Ok(NewGroup {
            name: GroupName::new(self.name)?,
            color: self.color.map(GroupColor::new).transpose()?,
        })
    }
}

/// Update group request; omitted fields are kept, `color: null` clears
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateGroupRequest {
    pub name: Patch<String>,
    pub color: Patch<String>,
}

impl UpdateGroupRequest {
    fn into_changes(self) -> Result<GroupChanges, ValidationError> {
        Ok(GroupChanges {
            name: self.name.try_map(GroupName::new)?.into_required("name")?,
            color: self.color.try_map(GroupColor::new)?.into_change(),
        })
    }
}

/// Group response, including the group's todos
#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub id: i32,
    pub name: String,
    pub color: Option<String>,
    pub todos: Vec<TodoResponse>,
}

impl From<GroupWithTodos> for GroupResponse {
    fn from(g: GroupWithTodos) -> Self {
        Self {
            id: g.id,
            name: g.name,
            color: g.color,
            todos: g.todos.into_iter().map(TodoResponse::from).collect(),
        }
    }
}

/// GET /groups - list all groups with their todos
async fn list_groups(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<GroupResponse>>, ApiError> {
    let groups = GroupRepo::new(&state.pool).list().await?;
    Ok(Json(groups.into_iter().map(GroupResponse::from).collect()))
}

/// POST /groups - create a new group
async fn create_group(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), ApiError> {
    let new = req.into_new_group()?;
    let group = GroupRepo::new(&state.pool).create(new).await?;

    Ok((StatusCode::CREATED, Json(GroupResponse::from(group))))
}

/// GET /groups/{id} - get a single group
async fn get_group(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<GroupResponse>, ApiError> {
    let group = GroupRepo::new(&state.pool).get(id).await?;
    Ok(Json(GroupResponse::from(group)))
}

/// PUT /groups/{id} - partial update
async fn update_group(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
    ValidJson(req): ValidJson<UpdateGroupRequest>,
) -> Result<Json<GroupResponse>, ApiError> {
    let changes = req.into_changes()?;
    let group = GroupRepo::new(&state.pool).update(id, changes).await?;
    Ok(Json(GroupResponse::from(group)))
}

/// DELETE /groups/{id} - delete the group and all of its todos
async fn delete_group(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<DeletedResponse>, ApiError> {
    GroupRepo::new(&state.pool).delete(id).await?;
    Ok(Json(DeletedResponse {
        message: "Todo group deleted",
    }))
}

/// Group routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route(
            "/groups/{id}",
            get(get_group).put(update_group).delete(delete_group),
        )
}
