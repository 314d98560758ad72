//! Dashboard KPI model and the aggregation that does not need the database

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::core::constants::{METRICS_LABEL_FORMAT, METRICS_MONTHLY_DAYS, METRICS_STATUS_NOT_SET};

/// Metrics for one project, grouped by time period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardKpi {
    /// Issues submitted since yesterday that are still `New`
    pub daily_new_count: u64,
    pub daily_closed_count: u64,
    pub daily_in_progress_count: u64,

    /// `MM-dd` labels, oldest first
    pub monthly_chart_x_labels: Vec<String>,
    pub monthly_category_labels: Vec<String>,
    /// One row per category label, one column per x label
    pub monthly_category_values: Vec<Vec<u64>>,

    pub lifelong_total: u64,
    pub lifelong_closed: u64,
    pub lifelong_in_progress: u64,
    pub lifelong_category_labels: Vec<String>,
    pub lifelong_category_values: Vec<u64>,
    pub lifelong_resolve_status_labels: Vec<String>,
    pub lifelong_resolve_status_values: Vec<u64>,
}

/// Issues neither new nor closed
pub fn in_progress(total: u64, new: u64, closed: u64) -> u64 {
    total.saturating_sub(new).saturating_sub(closed)
}

/// Label for a distinct field value; missing or empty values are "Not Set"
pub fn breakdown_label(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => METRICS_STATUS_NOT_SET.to_string(),
    }
}

/// First day of the monthly window
pub fn monthly_window_start(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_days(Days::new(METRICS_MONTHLY_DAYS as u64))
        .unwrap_or(today)
}

/// Per-category daily submission counts over the monthly window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyBreakdown {
    pub x_labels: Vec<String>,
    pub categories: Vec<String>,
    pub values: Vec<Vec<u64>>,
}

/// Build the monthly chart from `(category, submission day)` pairs.
///
/// Days run from `today - 30` for 30 days. Categories keep first-seen order.
pub fn monthly_breakdown<'a, I>(today: NaiveDate, submissions: I) -> MonthlyBreakdown
where
    I: IntoIterator<Item = (Option<&'a str>, NaiveDate)>,
{
    let start = monthly_window_start(today);
    let days: Vec<NaiveDate> = (0..METRICS_MONTHLY_DAYS as u64)
        .filter_map(|offset| start.checked_add_days(Days::new(offset)))
        .collect();

    let mut categories: Vec<String> = Vec::new();
    let mut values: Vec<Vec<u64>> = Vec::new();

    for (category, day) in submissions {
        let label = breakdown_label(category);
        let row = match categories.iter().position(|c| *c == label) {
            Some(index) => index,
            None => {
                categories.push(label);
                values.push(vec![0; days.len()]);
                categories.len() - 1
            }
        };
        if let Some(column) = days.iter().position(|d| *d == day) {
            values[row][column] += 1;
        }
    }

    MonthlyBreakdown {
        x_labels: days
            .iter()
            .map(|d| d.format(METRICS_LABEL_FORMAT).to_string())
            .collect(),
        categories,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_in_progress_saturates() {
        assert_eq!(in_progress(10, 3, 2), 5);
        assert_eq!(in_progress(1, 3, 2), 0);
    }

    #[test]
    fn test_breakdown_label() {
        assert_eq!(breakdown_label(Some("Crash")), "Crash");
        assert_eq!(breakdown_label(Some("")), "Not Set");
        assert_eq!(breakdown_label(None), "Not Set");
    }

    #[test]
    fn test_monthly_labels_cover_thirty_days() {
        let breakdown = monthly_breakdown(date(2024, 3, 31), std::iter::empty());
        assert_eq!(breakdown.x_labels.len(), 30);
        assert_eq!(breakdown.x_labels.first().unwrap(), "03-01");
        assert_eq!(breakdown.x_labels.last().unwrap(), "03-30");
        assert!(breakdown.categories.is_empty());
    }

    #[test]
    fn test_monthly_counts_per_category_and_day() {
        let today = date(2024, 3, 31);
        let submissions = vec![
            (Some("Crash"), date(2024, 3, 1)),
            (Some("UI"), date(2024, 3, 2)),
            (Some("Crash"), date(2024, 3, 1)),
            (None, date(2024, 3, 30)),
            // outside the window
            (Some("Crash"), date(2024, 3, 31)),
        ];
        let breakdown = monthly_breakdown(today, submissions);

        assert_eq!(breakdown.categories, vec!["Crash", "UI", "Not Set"]);
        assert_eq!(breakdown.values[0][0], 2);
        assert_eq!(breakdown.values[0].iter().sum::<u64>(), 2);
        assert_eq!(breakdown.values[1][1], 1);
        assert_eq!(breakdown.values[2][29], 1);
    }

    #[test]
    fn test_kpi_serializes_camel_case() {
        let kpi = DashboardKpi {
            daily_new_count: 1,
            ..Default::default()
        };
        let json = serde_json::to_value(&kpi).unwrap();
        assert_eq!(json["dailyNewCount"], 1);
        assert!(json.get("monthlyChartXLabels").is_some());
    }
}
