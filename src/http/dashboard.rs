//! Read-only dashboard data API.
//!
//! Serves the aggregates an operator dashboard needs: block totals,
//! currently blocked IPs, attack-type breakdown, and recent events.
//! Everything under the dashboard prefix bypasses detection, so these
//! routes can be polled at any volume without tripping a heuristic.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::http::server::AppState;
use crate::store::{BlockRecord, StoreError, SuspiciousEvent};

/// How many recent audit entries the data endpoint returns.
const RECENT_LOG_LIMIT: u32 = 50;

#[derive(Serialize)]
pub struct GatewayStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct AttackTypeCount {
    pub reason: String,
    pub count: i64,
}

#[derive(Serialize)]
pub struct DashboardStats {
    pub total_blocked_events: i64,
    pub unique_blocked_ips: usize,
    pub attack_types: Vec<AttackTypeCount>,
}

#[derive(Serialize)]
pub struct DashboardData {
    pub stats: DashboardStats,
    pub blocked_ips: Vec<BlockRecord>,
    pub logs: Vec<SuspiciousEvent>,
}

/// Routes nested under the configured dashboard prefix.
pub fn dashboard_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_status))
        .route("/data", get(get_data))
}

pub async fn get_status() -> Json<GatewayStatus> {
    Json(GatewayStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

pub async fn get_data(
    State(state): State<AppState>,
) -> Result<Json<DashboardData>, StatusCode> {
    build_data(&state).map(Json).map_err(|e| {
        tracing::error!(error = %e, "Failed to load dashboard data");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

fn build_data(state: &AppState) -> Result<DashboardData, StoreError> {
    let total_blocked_events = state.store.total_blocked_events()?;
    let blocked_ips: Vec<BlockRecord> = state.store.active_blocks(Utc::now())?;
    let attack_types = state
        .store
        .reason_breakdown()?
        .into_iter()
        .map(|(reason, count)| AttackTypeCount { reason, count })
        .collect();
    let logs = state.store.recent_events(RECENT_LOG_LIMIT)?;

    Ok(DashboardData {
        stats: DashboardStats {
            total_blocked_events,
            unique_blocked_ips: blocked_ips.len(),
            attack_types,
        },
        blocked_ips,
        logs,
    })
}
