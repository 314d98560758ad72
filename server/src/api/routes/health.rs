//! Liveness and readiness endpoints

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::data::IssueRepository;
use crate::data::logs::LogService;

pub const CHECK_MONGODB: &str = "MongoDB";
pub const CHECK_LOG_DIRECTORY: &str = "LogDirectory";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveResponse {
    pub overall_status: HealthStatus,
    pub total_checks_duration: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyCheck {
    pub status: HealthStatus,
    pub duration: String,
    pub exception: Option<String>,
    pub data: Map<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub overall_status: HealthStatus,
    pub total_checks_duration: String,
    pub dependency_health_checks: Map<String, Value>,
}

/// Seconds with two decimals
fn format_duration(duration: Duration) -> String {
    format!("{:.2}", duration.as_secs_f64())
}

/// Shared state for readiness checks
#[derive(Clone)]
pub struct HealthApiState {
    pub issues: Arc<dyn IssueRepository>,
    pub logs: Arc<LogService>,
}

/// Build health routes
pub fn routes(issues: Arc<dyn IssueRepository>, logs: Arc<LogService>) -> Router<()> {
    Router::new()
        .route("/live", get(live))
        .route("/ready", get(ready))
        .with_state(HealthApiState { issues, logs })
}

/// The process is up; no dependency is touched
pub async fn live() -> impl IntoResponse {
    Json(LiveResponse {
        overall_status: HealthStatus::Healthy,
        total_checks_duration: format_duration(Duration::ZERO),
    })
}

async fn check_mongodb(issues: &dyn IssueRepository) -> DependencyCheck {
    let started = Instant::now();
    let (status, exception, data) = match issues.health().await {
        Ok(health) => {
            let mut data = Map::new();
            data.insert("recordCount".to_string(), health.record_count.into());
            data.insert("sampleRead".to_string(), health.sample_read.into());
            if health.record_count > 0 && !health.sample_read {
                (
                    HealthStatus::Unhealthy,
                    Some("Issue collection cannot retrieve records".to_string()),
                    data,
                )
            } else {
                (HealthStatus::Healthy, None, data)
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "MongoDB health check failed");
            (HealthStatus::Unhealthy, Some(e.to_string()), Map::new())
        }
    };
    DependencyCheck {
        status,
        duration: format_duration(started.elapsed()),
        exception,
        data,
    }
}

async fn check_log_directory(logs: &LogService) -> DependencyCheck {
    let started = Instant::now();
    let mut data = Map::new();
    let (status, exception) = match logs.check_writable().await {
        Ok(root) => {
            data.insert("path".to_string(), root.display().to_string().into());
            (HealthStatus::Healthy, None)
        }
        Err(e) => {
            tracing::error!(error = %e, "Log directory health check failed");
            data.insert("path".to_string(), logs.root().display().to_string().into());
            (HealthStatus::Unhealthy, Some(e.to_string()))
        }
    };
    DependencyCheck {
        status,
        duration: format_duration(started.elapsed()),
        exception,
        data,
    }
}

/// Probe every dependency; 503 unless all are healthy
pub async fn ready(State(state): State<HealthApiState>) -> impl IntoResponse {
    let started = Instant::now();
    let (mongo, log_dir) = tokio::join!(
        check_mongodb(state.issues.as_ref()),
        check_log_directory(&state.logs)
    );

    let overall_status = if mongo.status == HealthStatus::Healthy
        && log_dir.status == HealthStatus::Healthy
    {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    };

    let mut checks = Map::new();
    for (name, check) in [(CHECK_MONGODB, mongo), (CHECK_LOG_DIRECTORY, log_dir)] {
        match serde_json::to_value(check) {
            Ok(value) => {
                checks.insert(name.to_string(), value);
            }
            Err(e) => tracing::warn!(check = name, error = %e, "Failed to serialize health check"),
        }
    }

    let status = match overall_status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (
        status,
        Json(ReadyResponse {
            overall_status,
            total_checks_duration: format_duration(started.elapsed()),
            dependency_health_checks: checks,
        }),
    )
}
