//! Date bucketing and nutrient aggregation.
//!
//! Turns the raw per-day payload into the ordered daily series, the ISO-week
//! calorie series and per-meal groupings the views consume. Nothing here can
//! fail: every missing field reads as zero or an empty list.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use nutrition_core::models::{ConsumedItem, MacroTotals, MealType, RawDayMap, RawDayRecord};
use nutrition_core::time_utils::{date_key, parse_date_key, week_key};
use serde::Serialize;
use tracing::warn;

// ── DailySeriesPoint ──────────────────────────────────────────────────────────

/// One normalized day, ready for charts and calendar cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySeriesPoint {
    /// The `YYYY-MM-DD` key the day was delivered under.
    pub date: String,
    pub calories: f64,
    pub calorie_goal: f64,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
    pub water: f64,
    /// The record this point was derived from, for detail views.
    #[serde(rename = "originalData")]
    pub record: RawDayRecord,
}

impl DailySeriesPoint {
    fn from_record(date: &str, record: &RawDayRecord) -> Self {
        Self {
            date: date.to_string(),
            calories: record.energy(),
            calorie_goal: record.calorie_goal(),
            carbs: record.carb(),
            protein: record.protein(),
            fat: record.fat(),
            water: record.water_intake(),
            record: record.clone(),
        }
    }
}

// ── WeeklySeriesPoint ─────────────────────────────────────────────────────────

/// Calorie totals for one ISO week.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySeriesPoint {
    /// Week key, e.g. `"2024-11"`.
    pub date: String,
    pub calories: f64,
    pub calorie_goal: f64,
}

impl WeeklySeriesPoint {
    fn new(key: String) -> Self {
        Self {
            date: key,
            calories: 0.0,
            calorie_goal: 0.0,
        }
    }

    fn add_point(&mut self, point: &DailySeriesPoint) {
        self.calories += point.calories;
        self.calorie_goal += point.calorie_goal;
    }
}

// ── MealGroup ─────────────────────────────────────────────────────────────────

/// The items logged against one meal on one day, with their sums.
#[derive(Debug, Clone, PartialEq)]
pub struct MealGroup {
    pub meal: MealType,
    pub items: Vec<ConsumedItem>,
    pub totals: MacroTotals,
}

impl MealGroup {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ── SeriesTotals ──────────────────────────────────────────────────────────────

/// Sums across a run of daily points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesTotals {
    pub calories: f64,
    pub calorie_goal: f64,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
    pub water: f64,
    pub days: u32,
}

// ── NutritionAggregator ───────────────────────────────────────────────────────

/// Stateless helper that derives every series from a raw day map.
pub struct NutritionAggregator;

impl NutritionAggregator {
    /// One point per key, ascending by calendar date.
    ///
    /// Keys that are not strict `YYYY-MM-DD` dates sort after every valid
    /// date, in key order.
    pub fn normalize_daily(days: &RawDayMap) -> Vec<DailySeriesPoint> {
        let mut points: Vec<DailySeriesPoint> = days
            .iter()
            .map(|(date, record)| DailySeriesPoint::from_record(date, record))
            .collect();

        points.sort_by(|a, b| compare_date_keys(&a.date, &b.date));
        points
    }

    /// Sum calories and calorie goals per ISO week, ascending by week key.
    ///
    /// Input order does not matter. Points whose date cannot be parsed are
    /// skipped.
    pub fn aggregate_weekly(points: &[DailySeriesPoint]) -> Vec<WeeklySeriesPoint> {
        // BTreeMap keeps week keys sorted; zero-padded keys sort chronologically.
        let mut weeks: BTreeMap<String, WeeklySeriesPoint> = BTreeMap::new();

        for point in points {
            let Some(date) = parse_date_key(&point.date) else {
                warn!(date = %point.date, "skipping day with unparseable date key");
                continue;
            };
            let key = week_key(date);
            weeks
                .entry(key.clone())
                .or_insert_with(|| WeeklySeriesPoint::new(key))
                .add_point(point);
        }

        weeks.into_values().collect()
    }

    /// Items logged against `meal`: products, then simple products, then
    /// recipe portions, each in original order.
    pub fn meal_items(record: &RawDayRecord, meal: MealType) -> Vec<&ConsumedItem> {
        let Some(consumed) = record.consumed.as_ref() else {
            return Vec::new();
        };
        consumed
            .iter_all()
            .filter(|item| item.is_meal(meal))
            .collect()
    }

    /// [`Self::meal_items`] plus energy and macro sums.
    pub fn meal_group(record: &RawDayRecord, meal: MealType) -> MealGroup {
        let items = Self::meal_items(record, meal);
        let totals: MacroTotals = items.iter().copied().collect();
        MealGroup {
            meal,
            items: items.into_iter().cloned().collect(),
            totals,
        }
    }

    /// Non-empty meal groups for a day, breakfast through snack.
    pub fn meal_groups(record: &RawDayRecord) -> Vec<MealGroup> {
        MealType::ALL
            .into_iter()
            .map(|meal| Self::meal_group(record, meal))
            .filter(|group| !group.is_empty())
            .collect()
    }

    /// The point keyed exactly `YYYY-MM-DD` for the given day, if any.
    pub fn find_day(
        points: &[DailySeriesPoint],
        year: i32,
        month: u32,
        day: u32,
    ) -> Option<&DailySeriesPoint> {
        let key = date_key(year, month, day)?;
        Self::find_by_key(points, &key)
    }

    /// The point whose date string equals `key`.
    pub fn find_by_key<'a>(points: &'a [DailySeriesPoint], key: &str) -> Option<&'a DailySeriesPoint> {
        points.iter().find(|p| p.date == key)
    }

    /// Sum every field across `points`.
    pub fn calculate_totals(points: &[DailySeriesPoint]) -> SeriesTotals {
        let mut totals = SeriesTotals::default();
        for point in points {
            totals.calories += point.calories;
            totals.calorie_goal += point.calorie_goal;
            totals.carbs += point.carbs;
            totals.protein += point.protein;
            totals.fat += point.fat;
            totals.water += point.water;
            totals.days += 1;
        }
        totals
    }
}

fn compare_date_keys(a: &str, b: &str) -> Ordering {
    match (parse_date_key(a), parse_date_key(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use nutrition_core::models::ENERGY;
    use serde_json::json;

    fn days(value: serde_json::Value) -> RawDayMap {
        serde_json::from_value(value).expect("valid day map")
    }

    fn day_with_energy(energy: f64, goal: f64) -> serde_json::Value {
        json!({ "daily": { "energy": energy, "energy_goal": goal } })
    }

    fn meal_day() -> RawDayRecord {
        serde_json::from_value(json!({
            "consumed": {
                "products": [
                    { "name": "rice", "daytime": "lunch", "nutrients": { "energy.energy": 200 } },
                    { "name": "toast", "daytime": "breakfast", "nutrients": { "energy.energy": 90 } }
                ],
                "simple_products": [
                    { "name": "salad", "daytime": "lunch", "nutrients": { "energy.energy": 300, "nutrient.fat": 12 } }
                ],
                "recipe_portions": [
                    { "name": "stew", "daytime": "dinner", "nutrients": { "energy.energy": 650 } }
                ]
            }
        }))
        .expect("valid record")
    }

    // ── normalize_daily ───────────────────────────────────────────────────────

    #[test]
    fn test_normalize_one_point_per_key_sorted() {
        let raw = days(json!({
            "2024-03-20": day_with_energy(1800.0, 2000.0),
            "2024-03-02": day_with_energy(2100.0, 2000.0),
            "2024-02-28": day_with_energy(1500.0, 2000.0)
        }));
        let points = NutritionAggregator::normalize_daily(&raw);

        let dates: Vec<&str> = points.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-02-28", "2024-03-02", "2024-03-20"]);
        assert_eq!(points[1].calories, 2100.0);
        assert_eq!(points[1].calorie_goal, 2000.0);
    }

    #[test]
    fn test_normalize_missing_daily_is_all_zero() {
        let raw = days(json!({ "2024-03-15": {} }));
        let points = NutritionAggregator::normalize_daily(&raw);

        assert_eq!(points.len(), 1);
        let p = &points[0];
        assert_eq!(p.calories, 0.0);
        assert_eq!(p.calorie_goal, 0.0);
        assert_eq!(p.carbs, 0.0);
        assert_eq!(p.protein, 0.0);
        assert_eq!(p.fat, 0.0);
        assert_eq!(p.water, 0.0);
    }

    #[test]
    fn test_normalize_reads_every_field() {
        let raw = days(json!({
            "2024-03-15": {
                "daily": { "energy": 1900, "carb": 210, "protein": 95, "fat": 60 },
                "goals": { "energy.energy": 2200 },
                "water": { "water_intake": 1750 }
            }
        }));
        let p = &NutritionAggregator::normalize_daily(&raw)[0];
        assert_eq!(p.calories, 1900.0);
        assert_eq!(p.carbs, 210.0);
        assert_eq!(p.protein, 95.0);
        assert_eq!(p.fat, 60.0);
        assert_eq!(p.calorie_goal, 2200.0);
        assert_eq!(p.water, 1750.0);
        assert!(p.record.daily.is_some());
    }

    #[test]
    fn test_normalize_unparseable_keys_sort_last() {
        let raw = days(json!({
            "2024-3-1": {},
            "2024-03-10": {},
            "2023-12-31": {}
        }));
        let dates: Vec<String> = NutritionAggregator::normalize_daily(&raw)
            .into_iter()
            .map(|p| p.date)
            .collect();
        assert_eq!(dates, vec!["2023-12-31", "2024-03-10", "2024-3-1"]);
    }

    #[test]
    fn test_empty_input_yields_empty_series() {
        let points = NutritionAggregator::normalize_daily(&RawDayMap::new());
        assert!(points.is_empty());
        assert!(NutritionAggregator::aggregate_weekly(&points).is_empty());
    }

    // ── aggregate_weekly ──────────────────────────────────────────────────────

    #[test]
    fn test_weekly_sums_calories_and_goals() {
        let raw = days(json!({
            "2024-03-11": day_with_energy(1800.0, 2000.0),
            "2024-03-17": day_with_energy(2200.0, 2000.0),
            "2024-03-18": day_with_energy(1000.0, 1500.0)
        }));
        let weeks = NutritionAggregator::aggregate_weekly(&NutritionAggregator::normalize_daily(&raw));

        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].date, "2024-11");
        assert_eq!(weeks[0].calories, 4000.0);
        assert_eq!(weeks[0].calorie_goal, 4000.0);
        assert_eq!(weeks[1].date, "2024-12");
        assert_eq!(weeks[1].calories, 1000.0);
        assert_eq!(weeks[1].calorie_goal, 1500.0);
    }

    #[test]
    fn test_weekly_year_boundary_goes_to_thursday_year() {
        let raw = days(json!({
            "2020-12-31": day_with_energy(100.0, 0.0),
            "2021-01-01": day_with_energy(200.0, 0.0),
            "2021-01-04": day_with_energy(400.0, 0.0)
        }));
        let weeks = NutritionAggregator::aggregate_weekly(&NutritionAggregator::normalize_daily(&raw));

        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].date, "2020-53");
        assert_eq!(weeks[0].calories, 300.0);
        assert_eq!(weeks[1].date, "2021-01");
        assert_eq!(weeks[1].calories, 400.0);
    }

    #[test]
    fn test_weekly_independent_of_input_order() {
        let raw = days(json!({
            "2024-01-01": day_with_energy(1.0, 10.0),
            "2024-01-09": day_with_energy(2.0, 20.0),
            "2024-01-10": day_with_energy(4.0, 40.0),
            "2024-02-14": day_with_energy(8.0, 80.0)
        }));
        let points = NutritionAggregator::normalize_daily(&raw);
        let mut reversed = points.clone();
        reversed.reverse();

        assert_eq!(
            NutritionAggregator::aggregate_weekly(&points),
            NutritionAggregator::aggregate_weekly(&reversed)
        );
    }

    #[test]
    fn test_weekly_skips_unparseable_dates() {
        let raw = days(json!({
            "2024-01-01": day_with_energy(500.0, 0.0),
            "garbage": day_with_energy(900.0, 0.0)
        }));
        let weeks = NutritionAggregator::aggregate_weekly(&NutritionAggregator::normalize_daily(&raw));
        assert_eq!(weeks.len(), 1);
        assert_eq!(weeks[0].calories, 500.0);
    }

    // ── meal grouping ─────────────────────────────────────────────────────────

    #[test]
    fn test_meal_items_concatenation_order() {
        let record = meal_day();
        let lunch = NutritionAggregator::meal_items(&record, MealType::Lunch);
        let names: Vec<&str> = lunch.iter().filter_map(|i| i.name.as_deref()).collect();
        assert_eq!(names, vec!["rice", "salad"]);

        assert!(NutritionAggregator::meal_items(&record, MealType::Snack).is_empty());
    }

    #[test]
    fn test_meal_items_without_consumed() {
        let record = RawDayRecord::default();
        assert!(NutritionAggregator::meal_items(&record, MealType::Lunch).is_empty());
    }

    #[test]
    fn test_meal_totals_default_missing_nutrients() {
        let record: RawDayRecord = serde_json::from_value(json!({
            "consumed": {
                "products": [
                    { "daytime": "lunch", "nutrients": { "energy.energy": 200, "nutrient.protein": 8 } },
                    { "daytime": "lunch", "nutrients": { "energy.energy": 300 } }
                ],
                "simple_products": [
                    { "daytime": "lunch", "nutrients": { "nutrient.carb": 5 } },
                    { "daytime": "lunch" }
                ]
            }
        }))
        .unwrap();

        let group = NutritionAggregator::meal_group(&record, MealType::Lunch);
        assert_eq!(group.items.len(), 4);
        assert_eq!(group.totals.calories, 500.0);
        assert_eq!(group.totals.protein, 8.0);
        assert_eq!(group.totals.carbs, 5.0);
        assert_eq!(group.totals.fat, 0.0);
    }

    #[test]
    fn test_meal_groups_fixed_order_skip_empty() {
        let groups = NutritionAggregator::meal_groups(&meal_day());
        let meals: Vec<MealType> = groups.iter().map(|g| g.meal).collect();
        assert_eq!(
            meals,
            vec![MealType::Breakfast, MealType::Lunch, MealType::Dinner]
        );
        assert_eq!(groups[1].totals.calories, 500.0);
        assert_eq!(groups[1].totals.fat, 12.0);
        assert_eq!(groups[2].items[0].nutrient(ENERGY), 650.0);
    }

    #[test]
    fn test_unknown_daytime_matches_no_meal() {
        let record: RawDayRecord = serde_json::from_value(json!({
            "consumed": { "products": [ { "daytime": "brunch" } ] }
        }))
        .unwrap();
        assert!(NutritionAggregator::meal_groups(&record).is_empty());
    }

    // ── calendar lookup ───────────────────────────────────────────────────────

    #[test]
    fn test_find_day_requires_zero_padded_key() {
        let raw = days(json!({
            "2024-3-15": day_with_energy(1.0, 0.0),
            "2024-03-16": day_with_energy(2.0, 0.0)
        }));
        let points = NutritionAggregator::normalize_daily(&raw);

        assert!(NutritionAggregator::find_day(&points, 2024, 3, 15).is_none());
        let found = NutritionAggregator::find_day(&points, 2024, 3, 16).expect("padded key");
        assert_eq!(found.calories, 2.0);
    }

    #[test]
    fn test_find_day_exact_match() {
        let raw = days(json!({ "2024-03-15": day_with_energy(1234.0, 0.0) }));
        let points = NutritionAggregator::normalize_daily(&raw);
        let found = NutritionAggregator::find_day(&points, 2024, 3, 15).expect("present");
        assert_eq!(found.date, "2024-03-15");
        assert!(NutritionAggregator::find_day(&points, 2024, 3, 14).is_none());
        assert!(NutritionAggregator::find_day(&points, 2024, 2, 30).is_none());
    }

    // ── calculate_totals ──────────────────────────────────────────────────────

    #[test]
    fn test_calculate_totals() {
        let raw = days(json!({
            "2024-01-01": { "daily": { "energy": 1000, "protein": 50 }, "water": { "water_intake": 500 } },
            "2024-01-02": { "daily": { "energy": 1500, "protein": 70 }, "water": { "water_intake": 750 } }
        }));
        let totals = NutritionAggregator::calculate_totals(&NutritionAggregator::normalize_daily(&raw));
        assert_eq!(totals.days, 2);
        assert_eq!(totals.calories, 2500.0);
        assert_eq!(totals.protein, 120.0);
        assert_eq!(totals.water, 1250.0);
    }

    #[test]
    fn test_calculate_totals_empty() {
        let totals = NutritionAggregator::calculate_totals(&[]);
        assert_eq!(totals, SeriesTotals::default());
    }
}
