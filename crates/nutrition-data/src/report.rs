//! View models for the calendar, the printable weekly report and the day
//! detail panel.

use chrono::{Datelike, NaiveDate};
use nutrition_core::models::MacroTotals;
use nutrition_core::time_utils::{
    format_date_key, month_layout, shift_month, week_days, week_start,
};

use crate::aggregator::{DailySeriesPoint, MealGroup, NutritionAggregator};

// ── Calendar ──────────────────────────────────────────────────────────────────

/// One day cell in a month grid.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDay {
    pub day: u32,
    /// `None` renders as a non-interactive cell.
    pub point: Option<DailySeriesPoint>,
}

impl CalendarDay {
    pub fn is_selectable(&self) -> bool {
        self.point.is_some()
    }
}

/// A Monday-first month grid.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthCalendar {
    pub year: i32,
    pub month: u32,
    pub leading_blanks: u32,
    pub days: Vec<CalendarDay>,
}

impl MonthCalendar {
    /// Build the grid for `year`/`month`; `None` for an invalid month.
    pub fn build(points: &[DailySeriesPoint], year: i32, month: u32) -> Option<Self> {
        let layout = month_layout(year, month)?;
        let days = (1..=layout.days)
            .map(|day| CalendarDay {
                day,
                point: NutritionAggregator::find_day(points, year, month, day).cloned(),
            })
            .collect();
        Some(Self {
            year,
            month,
            leading_blanks: layout.leading_blanks,
            days,
        })
    }

    /// The grid `months` months before (negative) or after this one.
    pub fn shifted(&self, points: &[DailySeriesPoint], months: i32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(self.year, self.month, 1)?;
        let target = shift_month(first, months);
        Self::build(points, target.year(), target.month())
    }

    /// Days that have data.
    pub fn active_days(&self) -> usize {
        self.days.iter().filter(|d| d.is_selectable()).count()
    }
}

// ── Weekly report ─────────────────────────────────────────────────────────────

/// One day of the weekly report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDay {
    pub date: NaiveDate,
    pub point: Option<DailySeriesPoint>,
    /// Non-empty meal groups, breakfast through snack.
    pub meals: Vec<MealGroup>,
}

/// Monday-to-Sunday report for the week containing an anchor date.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyReport {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub days: Vec<ReportDay>,
}

impl WeeklyReport {
    pub fn build(points: &[DailySeriesPoint], anchor: NaiveDate) -> Self {
        let dates = week_days(week_start(anchor));
        let days = dates
            .iter()
            .map(|&date| {
                let point =
                    NutritionAggregator::find_by_key(points, &format_date_key(date)).cloned();
                let meals = point
                    .as_ref()
                    .map(|p| NutritionAggregator::meal_groups(&p.record))
                    .unwrap_or_default();
                ReportDay { date, point, meals }
            })
            .collect();

        Self {
            week_start: dates[0],
            week_end: dates[6],
            days,
        }
    }

    /// The report one week earlier.
    pub fn previous(&self, points: &[DailySeriesPoint]) -> Self {
        Self::build(points, self.week_start - chrono::Duration::days(7))
    }

    /// The report one week later.
    pub fn next(&self, points: &[DailySeriesPoint]) -> Self {
        Self::build(points, self.week_start + chrono::Duration::days(7))
    }

    pub fn total_calories(&self) -> f64 {
        self.days
            .iter()
            .filter_map(|d| d.point.as_ref())
            .map(|p| p.calories)
            .sum()
    }
}

// ── Day detail ────────────────────────────────────────────────────────────────

/// Summary and meal breakdown for a single selected day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayDetail {
    pub date: String,
    pub calories: f64,
    pub calorie_goal: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub water: f64,
    pub meals: Vec<MealGroup>,
}

impl DayDetail {
    pub fn from_point(point: &DailySeriesPoint) -> Self {
        Self {
            date: point.date.clone(),
            calories: point.calories,
            calorie_goal: point.calorie_goal,
            protein: point.protein,
            carbs: point.carbs,
            fat: point.fat,
            water: point.water,
            meals: NutritionAggregator::meal_groups(&point.record),
        }
    }

    /// Sum over every meal group (may differ from the provider's daily totals).
    pub fn logged_totals(&self) -> MacroTotals {
        self.meals
            .iter()
            .fold(MacroTotals::default(), |acc, group| MacroTotals {
                calories: acc.calories + group.totals.calories,
                protein: acc.protein + group.totals.protein,
                carbs: acc.carbs + group.totals.carbs,
                fat: acc.fat + group.totals.fat,
            })
    }

    pub fn weekday(&self) -> Option<chrono::Weekday> {
        nutrition_core::time_utils::parse_date_key(&self.date).map(|d| d.weekday())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
