use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::AppState;

use super::ApiError;

// ─── Domain types ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "viewer".into()
}

// ─── GET /api/users/:id ──────────────────────────────────────────

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    state
        .store
        .users
        .read()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("user '{id}'")))
}

// ─── POST /api/users ─────────────────────────────────────────────

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<User>, ApiError> {
    if !req.email.contains('@') {
        return Err(ApiError::Invalid(format!("'{}' is not an email address", req.email)));
    }

    let mut users = state.store.users.write();
    let user = User {
        id: crate::mock_data::user_id(users.len() + 1),
        name: req.name,
        email: req.email,
        role: req.role,
    };
    users.insert(user.id.clone(), user.clone());

    Ok(Json(user))
}
