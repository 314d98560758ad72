//! Dashboard metrics endpoint

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::types::ApiError;
use crate::data::IssueRepository;
use crate::domain::DashboardKpi;

#[derive(Clone)]
pub struct MetricsApiState {
    pub issues: Arc<dyn IssueRepository>,
}

/// Build metrics routes (mounted at `/api/metrics`)
pub fn routes(issues: Arc<dyn IssueRepository>) -> Router<()> {
    Router::new()
        .route("/api/metrics/{project}", get(get_metrics))
        .with_state(MetricsApiState { issues })
}

/// Daily, monthly and lifelong counters for one project
pub async fn get_metrics(
    State(state): State<MetricsApiState>,
    Path(project): Path<String>,
) -> Result<Json<DashboardKpi>, ApiError> {
    let today = Utc::now().date_naive();
    let kpi = state.issues.metrics(&project, today).await?;
    Ok(Json(kpi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::data::issues::memory::MemoryIssueStore;
    use crate::domain::Issue;

    fn issue(project: &str, category: Option<&str>, status: &str, days_ago: u64) -> Issue {
        let submitted = Utc::now() - chrono::Duration::days(days_ago as i64);
        Issue {
            project: Some(project.to_string()),
            category: category.map(String::from),
            resolve_status: Some(status.to_string()),
            submission_date: Some(submitted),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_metrics_for_project() {
        let store = Arc::new(MemoryIssueStore::new());
        for issue in [
            issue("Safari", Some("Crash"), "New", 0),
            issue("Safari", Some("Crash"), "Closed", 0),
            issue("Safari", Some("UI"), "Investigating", 0),
            issue("Safari", Some("UI"), "New", 3),
            issue("Safari", None, "Closed", 40),
            issue("Other", Some("Crash"), "New", 0),
        ] {
            store.insert(issue).await.unwrap();
        }

        let response = routes(store)
            .oneshot(
                Request::builder()
                    .uri("/api/metrics/Safari")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let kpi: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        // Submitted since yesterday: New, Closed, Investigating
        assert_eq!(kpi["dailyNewCount"], 1);
        assert_eq!(kpi["dailyClosedCount"], 1);
        assert_eq!(kpi["dailyInProgressCount"], 1);

        assert_eq!(kpi["lifelongTotal"], 5);
        assert_eq!(kpi["lifelongClosed"], 2);
        assert_eq!(kpi["lifelongInProgress"], 1);
        assert_eq!(kpi["lifelongCategoryLabels"], serde_json::json!(["Crash", "UI", "Not Set"]));
        assert_eq!(kpi["lifelongCategoryValues"], serde_json::json!([2, 2, 1]));

        // Only the three-day-old issue falls inside the window that ends before today
        assert_eq!(kpi["monthlyChartXLabels"].as_array().unwrap().len(), 30);
        assert_eq!(kpi["monthlyCategoryLabels"], serde_json::json!(["UI"]));
        let row = kpi["monthlyCategoryValues"][0].as_array().unwrap();
        assert_eq!(row.iter().filter_map(|v| v.as_u64()).sum::<u64>(), 1);
        assert_eq!(row[27], 1);
    }
}
