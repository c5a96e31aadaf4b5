//! Top-level pipeline: raw days in, dashboard snapshot out.

use std::path::Path;

use chrono::Utc;
use nutrition_core::error::Result;
use nutrition_core::models::RawDayMap;
use serde::Serialize;
use tracing::info;

use crate::aggregator::{DailySeriesPoint, NutritionAggregator, WeeklySeriesPoint};
use crate::reader::load_data;

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    /// RFC 3339 timestamp when the snapshot was generated.
    pub generated_at: String,
    pub days_processed: usize,
    pub weeks_created: usize,
}

/// Everything the views need from one load of the data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub daily: Vec<DailySeriesPoint>,
    pub weekly: Vec<WeeklySeriesPoint>,
    pub metadata: SnapshotMetadata,
}

impl DashboardSnapshot {
    /// A snapshot with no days, used before the first successful load.
    pub fn empty() -> Self {
        analyze(&RawDayMap::new())
    }

    pub fn is_empty(&self) -> bool {
        self.daily.is_empty()
    }

    /// Most recent day with a strict date key.
    pub fn latest_day(&self) -> Option<&DailySeriesPoint> {
        self.daily
            .iter()
            .rev()
            .find(|p| nutrition_core::time_utils::parse_date_key(&p.date).is_some())
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Derive the daily and weekly series from `days`.
pub fn analyze(days: &RawDayMap) -> DashboardSnapshot {
    let daily = NutritionAggregator::normalize_daily(days);
    let weekly = NutritionAggregator::aggregate_weekly(&daily);

    let metadata = SnapshotMetadata {
        generated_at: Utc::now().to_rfc3339(),
        days_processed: daily.len(),
        weeks_created: weekly.len(),
    };

    DashboardSnapshot {
        daily,
        weekly,
        metadata,
    }
}

/// Read and enrich the files in `data_dir`, then [`analyze`] them.
pub fn load_dashboard(data_dir: &Path) -> Result<DashboardSnapshot> {
    let days = load_data(data_dir)?;
    let snapshot = analyze(&days);
    info!(
        days = snapshot.metadata.days_processed,
        weeks = snapshot.metadata.weeks_created,
        "dashboard data loaded"
    );
    Ok(snapshot)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{DAYS_FILE, PRODUCTS_FILE};
    use nutrition_core::error::DashboardError;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_json(dir: &Path, name: &str, value: &serde_json::Value) {
        std::fs::write(dir.join(name), value.to_string()).unwrap();
    }

    #[test]
    fn test_analyze_empty() {
        let snapshot = DashboardSnapshot::empty();
        assert!(snapshot.is_empty());
        assert!(snapshot.weekly.is_empty());
        assert_eq!(snapshot.metadata.days_processed, 0);
        assert!(!snapshot.metadata.generated_at.is_empty());
        assert!(snapshot.latest_day().is_none());
    }

    #[test]
    fn test_analyze_counts_days_and_weeks() {
        let days: RawDayMap = serde_json::from_value(json!({
            "2024-03-10": { "daily": { "energy": 2000 } },
            "2024-03-11": { "daily": { "energy": 1800 } },
            "2024-03-12": { "daily": { "energy": 1900 } }
        }))
        .unwrap();

        let snapshot = analyze(&days);
        assert_eq!(snapshot.metadata.days_processed, 3);
        assert_eq!(snapshot.metadata.weeks_created, 2);
        assert_eq!(snapshot.weekly[0].date, "2024-10");
        assert_eq!(snapshot.weekly[1].calories, 3700.0);
        assert_eq!(snapshot.latest_day().unwrap().date, "2024-03-12");
    }

    #[test]
    fn test_latest_day_skips_malformed_keys() {
        let days: RawDayMap = serde_json::from_value(json!({
            "2024-03-10": { "daily": { "energy": 2000 } },
            "someday": { "daily": { "energy": 1 } }
        }))
        .unwrap();

        let snapshot = analyze(&days);
        assert_eq!(snapshot.daily.last().unwrap().date, "someday");
        assert_eq!(snapshot.latest_day().unwrap().date, "2024-03-10");
    }

    #[test]
    fn test_load_dashboard_enriches_before_aggregating() {
        let dir = TempDir::new().unwrap();
        write_json(
            dir.path(),
            DAYS_FILE,
            &json!({
                "2024-03-11": {
                    "daily": { "energy": 500 },
                    "consumed": {
                        "products": [
                            { "product_id": "p1", "amount": 200, "daytime": "lunch" }
                        ]
                    }
                }
            }),
        );
        write_json(
            dir.path(),
            PRODUCTS_FILE,
            &json!({ "p1": { "name": "rice", "nutrients": { "energy.energy": 1.3 } } }),
        );

        let snapshot = load_dashboard(dir.path()).unwrap();
        let item = snapshot.daily[0]
            .record
            .consumed
            .as_ref()
            .unwrap()
            .products
            .as_ref()
            .unwrap()
            .first()
            .unwrap();
        assert_eq!(item.name.as_deref(), Some("rice"));
        assert!((item.nutrient(nutrition_core::models::ENERGY) - 260.0).abs() < 1e-9);
    }

    #[test]
    fn test_load_dashboard_missing_days_file() {
        let dir = TempDir::new().unwrap();
        let err = load_dashboard(dir.path()).unwrap_err();
        assert!(matches!(err, DashboardError::DataFileNotFound(_)));
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let value = serde_json::to_value(DashboardSnapshot::empty()).unwrap();
        assert!(value["metadata"]["daysProcessed"].is_number());
        assert!(value["daily"].is_array());
    }
}
