use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::AppState;

use super::ApiError;

// ─── Domain type ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    /// Price in cents (e.g. 12999 = $129.99)
    pub price: u64,
    pub stock: u32,
}

// ─── GET /api/products/:id ───────────────────────────────────────

pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    state
        .store
        .products
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("product '{id}'")))
}
