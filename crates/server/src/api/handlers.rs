use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use lumiere_core::config::Config;
use lumiere_core::upload::{default_categories, Category, License};

use crate::metrics;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<Config> {
    Json(state.config().clone())
}

pub async fn list_categories() -> Json<Vec<Category>> {
    Json(default_categories())
}

#[derive(Serialize)]
pub struct LicenseInfo {
    pub id: &'static str,
    pub description: &'static str,
}

pub async fn list_licenses() -> Json<Vec<LicenseInfo>> {
    Json(
        License::all()
            .into_iter()
            .map(|license| LicenseInfo {
                id: license.as_str(),
                description: license.description(),
            })
            .collect(),
    )
}

/// Prometheus text exposition, with dynamic gauges refreshed first.
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> String {
    metrics::collect_dynamic_metrics(&state).await;
    metrics::encode_metrics()
}
