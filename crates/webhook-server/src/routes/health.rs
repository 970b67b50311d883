//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::error::Result;
use crate::state::AppState;

#[derive(Serialize)]
pub struct Health {
    pub status: String,
    pub version: String,
}

/// Health check endpoint with a database connectivity check.
pub async fn health(State(state): State<AppState>) -> Result<Json<Health>> {
    database::restaurant::list_restaurants(state.db.pool()).await?;

    Ok(Json(Health {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
