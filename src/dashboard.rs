//! Admin dashboard: KPI counts and chart series, loaded as one batch.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::error::ConsoleResult;
use crate::models::AdminLog;
use crate::query::count_from_value;
use crate::resources::{AdminLogs, Assets, AuditRequests, ServiceRequests};
use crate::rest::RestClient;

pub const RECENT_ACTIVITY_LIMIT: usize = 10;

/// One slice of the asset-by-category pie.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CategorySlice {
    pub name: String,
    pub value: u64,
}

/// One bar of the monthly service-request trend.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MonthlyPoint {
    pub month: String,
    pub requests: u64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub total_assets: u64,
    pub allocated_assets: u64,
    pub pending_requests: u64,
    pub ongoing_audits: u64,
    pub asset_distribution: Vec<CategorySlice>,
    pub requests_trend: Vec<MonthlyPoint>,
    pub recent_activity: Vec<AdminLog>,
}

/// Fetches every dashboard input concurrently. The first failure fails the
/// whole load and no partial snapshot is returned.
#[instrument(skip(client))]
pub async fn load(client: &RestClient) -> ConsoleResult<DashboardSnapshot> {
    let assets = client.resource::<Assets>();
    let requests = client.resource::<ServiceRequests>();
    let audits = client.resource::<AuditRequests>();
    let logs = client.resource::<AdminLogs>();

    let (total_assets, allocated_assets, by_category, pending_requests, monthly, ongoing_audits, mut recent) =
        futures::try_join!(
            assets.total_count(),
            assets.allocated_count(),
            assets.by_category(),
            requests.pending_count(),
            requests.monthly(),
            audits.ongoing_count(),
            logs.recent(),
        )?;
    recent.truncate(RECENT_ACTIVITY_LIMIT);

    let snapshot = DashboardSnapshot {
        total_assets,
        allocated_assets,
        pending_requests,
        ongoing_audits,
        asset_distribution: category_distribution(&by_category),
        requests_trend: monthly_trend(&monthly),
        recent_activity: recent,
    };
    info!(
        total_assets,
        allocated_assets,
        pending_requests,
        ongoing_audits,
        "dashboard loaded"
    );
    Ok(snapshot)
}

fn field<'a>(row: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|key| row.get(*key).filter(|value| !value.is_null()))
}

fn row_count(row: &Value) -> u64 {
    field(row, &["count", "Count"])
        .and_then(count_from_value)
        .unwrap_or(0)
}

pub fn category_distribution(rows: &[Value]) -> Vec<CategorySlice> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let name = match field(row, &["categoryName", "CategoryName"]) {
                Some(Value::String(name)) => name.clone(),
                Some(other) => other.to_string(),
                None => {
                    let id = match field(row, &["categoryId", "CategoryId"]) {
                        Some(Value::String(id)) => id.clone(),
                        Some(id) => id.to_string(),
                        None => (index + 1).to_string(),
                    };
                    format!("Category {id}")
                }
            };
            CategorySlice {
                name,
                value: row_count(row),
            }
        })
        .collect()
}

/// Rows without a month are dropped; `YYYY-MM` becomes `Mon YYYY` and any
/// other label is kept as sent.
pub fn monthly_trend(rows: &[Value]) -> Vec<MonthlyPoint> {
    rows.iter()
        .filter_map(|row| {
            let month = field(row, &["month", "Month"])?.as_str()?;
            if month.is_empty() {
                return None;
            }
            Some(MonthlyPoint {
                month: month_label(month),
                requests: row_count(row),
            })
        })
        .collect()
}

pub fn month_label(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let shaped = bytes.len() == 7
        && bytes[4] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || b.is_ascii_digit());
    if !shaped {
        return raw.to_owned();
    }
    NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d")
        .map(|date| date.format("%b %Y").to_string())
        .unwrap_or_else(|_| raw.to_owned())
}

/// `dd Mon yyyy, hh:mm AM` for activity timestamps; unparseable input is
/// shown unchanged.
pub fn format_timestamp(raw: &str) -> String {
    const DISPLAY: &str = "%d %b %Y, %I:%M %p";
    let raw = raw.trim();
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return stamp.format(DISPLAY).to_string();
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|stamp| stamp.format(DISPLAY).to_string())
        .unwrap_or_else(|_| raw.to_owned())
}
