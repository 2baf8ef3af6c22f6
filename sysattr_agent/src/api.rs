//! JSON HTTP endpoints. Every request takes its own snapshot.

use axum::{
    extract::{Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::io;
use std::net::Ipv4Addr;
use sysattr::types::{CpuUsage, DeviceIdentity, DiskUsage, MemoryUsage, ThermalReading, Totals};
use sysattr::UsageError;
use tracing::warn;

use crate::state::AppState;

pub enum ApiError {
    Usage(UsageError),
    Io(io::Error),
}

impl From<UsageError> for ApiError {
    fn from(e: UsageError) -> Self {
        ApiError::Usage(e)
    }
}

impl From<io::Error> for ApiError {
    fn from(e: io::Error) -> Self {
        ApiError::Io(e)
    }
}

pub fn usage_status(e: &UsageError) -> StatusCode {
    match e {
        UsageError::InvalidDataDirectory | UsageError::MountNotFound(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        UsageError::SnapshotUnavailable { .. } | UsageError::SensorUnavailable => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::Usage(e) => (usage_status(&e), e.to_string()),
            ApiError::Io(e) if e.kind() == io::ErrorKind::InvalidInput => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            ApiError::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };
        warn!(status = status.as_u16(), "request failed: {msg}");
        (status, Json(json!({ "error": msg }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Rejects requests without `?token=` when the agent was started with one.
pub async fn require_token(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
    req: Request,
    next: Next,
) -> Response {
    if let Some(expected) = state.auth_token.as_ref() {
        match q.get("token") {
            Some(t) if t == expected => {}
            _ => return StatusCode::UNAUTHORIZED.into_response(),
        }
    }
    next.run(req).await
}

pub async fn disk_usage(State(state): State<AppState>) -> ApiResult<DiskUsage> {
    let usage = sysattr::disk_usage(
        state.source.as_ref(),
        state.registry.as_ref(),
        state.data_dir.as_path(),
    )
    .await?;
    Ok(Json(usage))
}

pub async fn memory_usage(State(state): State<AppState>) -> ApiResult<MemoryUsage> {
    let usage = sysattr::memory_usage(state.source.as_ref(), state.registry.as_ref()).await?;
    Ok(Json(usage))
}

pub async fn cpu_usage(State(state): State<AppState>) -> ApiResult<CpuUsage> {
    let usage = sysattr::cpu_usage(state.source.as_ref(), state.registry.as_ref()).await?;
    Ok(Json(usage))
}

pub async fn system_disk_usage(State(state): State<AppState>) -> ApiResult<Totals> {
    let totals = sysattr::system_disk_usage(state.source.as_ref(), state.data_dir.as_path()).await?;
    Ok(Json(totals))
}

pub async fn system_memory_usage(State(state): State<AppState>) -> ApiResult<Totals> {
    Ok(Json(sysattr::system_memory_usage(state.source.as_ref()).await?))
}

pub async fn cpu_temperature(State(state): State<AppState>) -> ApiResult<ThermalReading> {
    Ok(Json(sysattr::cpu_temperature(state.source.as_ref()).await?))
}

pub async fn device(State(state): State<AppState>) -> Json<DeviceIdentity> {
    Json(sysattr::detect_device(state.source.as_ref()).await)
}

pub async fn ip_addresses(State(state): State<AppState>) -> Json<Vec<Ipv4Addr>> {
    Json(sysattr::ip_addresses(state.source.as_ref()).await)
}

#[derive(Debug, Deserialize)]
pub struct GovernorRequest {
    pub governor: String,
}

pub async fn set_cpu_governor(
    State(state): State<AppState>,
    Json(req): Json<GovernorRequest>,
) -> Result<StatusCode, ApiError> {
    state.source.set_cpu_governor(&req.governor).await?;
    Ok(StatusCode::NO_CONTENT)
}
