//! Admin HTTP surface: health, guild listing, metrics and runtime profiles.

use axum::{
    Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use ephemeral_core::StateCache;
use prometheus::{Encoder, Registry, TextEncoder};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

/// Runtime profiles served under `/debug/pprof/`.
pub const PROFILES: &[(&str, &str)] = &[
    ("runtime", "Tokio worker count and alive task count"),
    ("tasks", "Number of tasks alive on the runtime"),
];

/// Shared state of the admin handlers.
#[derive(Clone)]
pub struct AdminState {
    cache: Arc<StateCache>,
    registry: Registry,
}

impl AdminState {
    /// Creates admin state over the bot's cache and metrics registry.
    pub fn new(cache: Arc<StateCache>, registry: Registry) -> Self {
        Self { cache, registry }
    }
}

/// One row of `GET /guilds`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildEntry {
    /// Guild name
    pub name: String,
    /// Member count
    pub member_count: u64,
}

/// Builds the admin router.
pub fn admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/guilds", get(guilds))
        .route("/metrics", get(metrics))
        .route("/debug/pprof/", get(pprof_index))
        .route("/debug/pprof/:profile", get(pprof_profile))
        .with_state(state)
}

async fn root() -> StatusCode {
    StatusCode::OK
}

async fn guilds(State(state): State<AdminState>) -> Json<Vec<GuildEntry>> {
    let mut entries: Vec<GuildEntry> = state
        .cache
        .guild_summaries()
        .into_iter()
        .map(|g| GuildEntry {
            name: g.name,
            member_count: g.member_count,
        })
        .collect();
    entries.sort_by(|a, b| {
        b.member_count
            .cmp(&a.member_count)
            .then_with(|| a.name.cmp(&b.name))
    });
    Json(entries)
}

async fn metrics(State(state): State<AdminState>) -> Response {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&state.registry.gather(), &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    (
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}

async fn pprof_index() -> String {
    let mut body = String::from("Available profiles:\n");
    for (name, description) in PROFILES {
        body.push_str(&format!("  {name}: {description}\n"));
    }
    body
}

async fn pprof_profile(Path(profile): Path<String>) -> Response {
    let metrics = tokio::runtime::Handle::current().metrics();
    match profile.as_str() {
        "runtime" => Json(json!({
            "workers": metrics.num_workers(),
            "alive_tasks": metrics.num_alive_tasks(),
        }))
        .into_response(),
        "tasks" => Json(json!({ "alive_tasks": metrics.num_alive_tasks() })).into_response(),
        _ => (StatusCode::NOT_FOUND, format!("Unknown profile: {profile}\n")).into_response(),
    }
}
