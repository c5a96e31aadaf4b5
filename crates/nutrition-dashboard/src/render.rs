//! Plain-text rendering of the dashboard views.

use std::fmt::Write;

use chrono::{Datelike, NaiveDate, Weekday};
use nutrition_core::formatting::{
    calorie_progress, format_macro_line, format_number, format_quantity, progress_bar,
    round_display, DEFAULT_CALENDAR_TARGET,
};
use nutrition_core::i18n::Translator;
use nutrition_core::models::{ConsumedItem, ENERGY};
use nutrition_core::time_utils::format_date_key;
use nutrition_data::aggregator::{DailySeriesPoint, MealGroup, NutritionAggregator, WeeklySeriesPoint};
use nutrition_data::analysis::DashboardSnapshot;
use nutrition_data::report::{DayDetail, MonthCalendar, WeeklyReport};

const PROGRESS_WIDTH: usize = 10;

/// Render `view` for `anchor`. Unknown view names fall back to the daily table.
pub fn render_view(view: &str, snapshot: &DashboardSnapshot, anchor: NaiveDate, t: &Translator) -> String {
    match view {
        "weekly" => render_weekly(&snapshot.weekly, t),
        "calendar" => match MonthCalendar::build(&snapshot.daily, anchor.year(), anchor.month()) {
            Some(calendar) => render_calendar(&calendar, t),
            None => format!("{}\n", t.translate("no_data")),
        },
        "report" => render_report(&WeeklyReport::build(&snapshot.daily, anchor), t),
        "day" => {
            let key = format_date_key(anchor);
            let detail = NutritionAggregator::find_by_key(&snapshot.daily, &key).map(DayDetail::from_point);
            render_day(&key, detail.as_ref(), t)
        }
        _ => render_daily(&snapshot.daily, t),
    }
}

// ── Daily / weekly tables ─────────────────────────────────────────────────────

pub fn render_daily(points: &[DailySeriesPoint], t: &Translator) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", t.translate("daily_view"));
    if points.is_empty() {
        let _ = writeln!(out, "{}", t.translate("no_data"));
        return out;
    }

    let _ = writeln!(
        out,
        "{:<12} {:>10} {:>10} {:>9} {:>9} {:>9} {:>8}",
        t.translate("date"),
        t.translate("calories"),
        t.translate("calorie_goal"),
        t.translate("protein"),
        t.translate("carbs"),
        t.translate("fat"),
        t.translate("water"),
    );
    for p in points {
        let _ = writeln!(
            out,
            "{:<12} {:>10} {:>10} {:>9} {:>9} {:>9} {:>8}",
            p.date,
            format_number(p.calories, 0),
            format_number(p.calorie_goal, 0),
            format_number(p.protein, 1),
            format_number(p.carbs, 1),
            format_number(p.fat, 1),
            format_number(p.water, 0),
        );
    }

    let totals = NutritionAggregator::calculate_totals(points);
    let _ = writeln!(
        out,
        "{:<12} {:>10} {:>10} {:>9} {:>9} {:>9} {:>8}",
        format!("{} ({})", t.translate("total"), totals.days),
        format_number(totals.calories, 0),
        format_number(totals.calorie_goal, 0),
        format_number(totals.protein, 1),
        format_number(totals.carbs, 1),
        format_number(totals.fat, 1),
        format_number(totals.water, 0),
    );
    out
}

pub fn render_weekly(weeks: &[WeeklySeriesPoint], t: &Translator) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", t.translate("weekly_view"));
    if weeks.is_empty() {
        let _ = writeln!(out, "{}", t.translate("no_data"));
        return out;
    }

    let _ = writeln!(
        out,
        "{:<10} {:>12} {:>12}",
        t.translate("week"),
        t.translate("calories"),
        t.translate("calorie_goal")
    );
    for w in weeks {
        let _ = writeln!(
            out,
            "{:<10} {:>12} {:>12}",
            w.date,
            format_number(w.calories, 0),
            format_number(w.calorie_goal, 0)
        );
    }
    out
}

// ── Calendar ──────────────────────────────────────────────────────────────────

pub fn render_calendar(calendar: &MonthCalendar, t: &Translator) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}-{:02}", t.translate("calendar"), calendar.year, calendar.month);

    let header: Vec<String> = WEEKDAYS
        .iter()
        .map(|w| format!("{:>4}", t.translate(weekday_key(*w))))
        .collect();
    let _ = writeln!(out, "{}", header.join(" "));

    // Days with data are marked with `*`.
    let mut cells: Vec<String> = (0..calendar.leading_blanks).map(|_| "    ".to_string()).collect();
    cells.extend(calendar.days.iter().map(|d| {
        let marker = if d.is_selectable() { "*" } else { " " };
        format!("{:>3}{}", d.day, marker)
    }));
    for week in cells.chunks(7) {
        let _ = writeln!(out, "{}", week.join(" "));
    }

    let active: Vec<_> = calendar
        .days
        .iter()
        .filter_map(|d| d.point.as_ref().map(|p| (d.day, p)))
        .collect();
    if active.is_empty() {
        let _ = writeln!(out, "\n{}", t.translate("no_data"));
        return out;
    }

    out.push('\n');
    for (day, point) in active {
        let percent = calorie_progress(point.calories, DEFAULT_CALENDAR_TARGET);
        let _ = writeln!(
            out,
            "{:>3} {} {:>3}% {:>7} kcal",
            day,
            progress_bar(percent, PROGRESS_WIDTH),
            round_display(percent),
            format_number(point.calories, 0)
        );
    }
    out
}

// ── Weekly report ─────────────────────────────────────────────────────────────

pub fn render_report(report: &WeeklyReport, t: &Translator) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} / {}",
        t.translate("weekly_report"),
        format_date_key(report.week_start),
        format_date_key(report.week_end)
    );

    for day in &report.days {
        let _ = writeln!(
            out,
            "\n{} {}",
            t.translate(weekday_key(day.date.weekday())),
            format_date_key(day.date)
        );
        match &day.point {
            None => {
                let _ = writeln!(out, "  {}", t.translate("no_data_for_day"));
            }
            Some(point) => {
                let _ = writeln!(
                    out,
                    "  {}: {} / {} kcal",
                    t.translate("calories"),
                    format_number(point.calories, 0),
                    format_number(point.calorie_goal, 0)
                );
                write_meals(&mut out, &day.meals, t);
            }
        }
    }

    let _ = writeln!(
        out,
        "\n{}: {} kcal",
        t.translate("total"),
        format_number(report.total_calories(), 0)
    );
    out
}

// ── Day detail ────────────────────────────────────────────────────────────────

pub fn render_day(date: &str, detail: Option<&DayDetail>, t: &Translator) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", t.translate("day_details"), date);

    let Some(detail) = detail else {
        let _ = writeln!(out, "{}", t.translate("no_data_for_day"));
        return out;
    };

    let rows = [
        ("calories", format!("{} kcal", format_number(detail.calories, 0))),
        ("calorie_goal", format!("{} kcal", format_number(detail.calorie_goal, 0))),
        ("protein", format!("{} g", format_number(detail.protein, 1))),
        ("carbs", format!("{} g", format_number(detail.carbs, 1))),
        ("fat", format!("{} g", format_number(detail.fat, 1))),
        ("water", format!("{} ml", format_number(detail.water, 0))),
    ];
    for (key, value) in rows {
        let _ = writeln!(out, "  {:<20} {}", t.translate(key), value);
    }

    write_meals(&mut out, &detail.meals, t);
    out
}

// ── Helpers ───────────────────────────────────────────────────────────────────

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn weekday_key(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "mon",
        Weekday::Tue => "tue",
        Weekday::Wed => "wed",
        Weekday::Thu => "thu",
        Weekday::Fri => "fri",
        Weekday::Sat => "sat",
        Weekday::Sun => "sun",
    }
}

fn write_meals(out: &mut String, meals: &[MealGroup], t: &Translator) {
    for group in meals {
        let _ = writeln!(
            out,
            "  {}: {}",
            t.translate(group.meal.as_str()),
            format_macro_line(&group.totals)
        );
        for item in &group.items {
            let _ = writeln!(out, "    - {}", item_line(item, t));
        }
    }
}

fn item_line(item: &ConsumedItem, t: &Translator) -> String {
    let mut line = match item.name.as_deref() {
        Some(name) => name.to_string(),
        None => t.translate("unknown"),
    };
    if let Some(quantity) = format_quantity(item, t) {
        let _ = write!(line, " ({quantity})");
    }
    let _ = write!(line, " {} kcal", round_display(item.nutrient(ENERGY)));
    line
}

// ── Tests ─────────────────────────────────────────────────────────────────────
