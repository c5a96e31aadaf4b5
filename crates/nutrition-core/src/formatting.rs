use crate::i18n::Translator;
use crate::models::{ConsumedItem, MacroTotals};

/// Calorie target the calendar progress bar is drawn against.
pub const DEFAULT_CALENDAR_TARGET: f64 = 2500.0;

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use nutrition_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    // Scale up by a relative hair so 1.005 does not print as 1.00.
    let digits = format!("{:.*}", decimals as usize, value.abs() * (1.0 + 1e-12));
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (digits.as_str(), None),
    };

    let mut out = String::with_capacity(digits.len() + whole.len() / 3 + 1);
    if value < 0.0 && digits.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        out.push('-');
    }
    for (i, digit) in whole.char_indices() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

/// Round to the nearest whole number for display (halves away from zero).
pub fn round_display(value: f64) -> i64 {
    value.round() as i64
}

/// Render a plain number the way the payload carries it: `150.0` as `"150"`,
/// `1.5` as `"1.5"`.
pub fn format_amount(value: f64) -> String {
    format!("{}", value)
}

/// Human-readable quantity for a consumed item.
///
/// * with a serving: `"{amount} {unit} ({serving_quantity} {serving})"`
/// * without:        `"{amount} {unit}"`
///
/// `unit` is the item's base unit, `"g"` when absent or empty; an empty
/// serving counts as no serving. Both units go through `translator`. Returns `None` when the item has no positive amount.
///
/// ```
/// use nutrition_core::formatting::format_quantity;
/// use nutrition_core::i18n::{Language, Translator};
/// use nutrition_core::models::ConsumedItem;
///
/// let item = ConsumedItem { amount: Some(150.0), ..Default::default() };
/// let t = Translator::new(Language::En);
/// assert_eq!(format_quantity(&item, &t).as_deref(), Some("150 g"));
/// ```
pub fn format_quantity(item: &ConsumedItem, translator: &Translator) -> Option<String> {
    let amount = item.amount.filter(|a| *a > 0.0)?;
    let unit = item.base_unit.as_deref().filter(|u| !u.is_empty()).unwrap_or("g");
    let unit = translator.translate(unit);

    let quantity = match item.serving.as_deref().filter(|s| !s.is_empty()) {
        Some(serving) => {
            let serving = translator.translate(serving);
            match item.serving_quantity {
                Some(count) => format!(
                    "{} {} ({} {})",
                    format_amount(amount),
                    unit,
                    format_amount(count),
                    serving
                ),
                None => format!("{} {} ({})", format_amount(amount), unit, serving),
            }
        }
        None => format!("{} {}", format_amount(amount), unit),
    };
    Some(quantity)
}

/// One-line energy and macro summary, e.g. `"512 kcal • P: 30g • C: 48g • F: 20g"`.
pub fn format_macro_line(totals: &MacroTotals) -> String {
    format!(
        "{} kcal • P: {}g • C: {}g • F: {}g",
        round_display(totals.calories),
        round_display(totals.protein),
        round_display(totals.carbs),
        round_display(totals.fat)
    )
}

/// `calories / target` as a percentage clamped to `0..=100`.
///
/// Returns `0.0` when `target` is not positive.
///
/// ```
/// use nutrition_core::formatting::calorie_progress;
///
/// assert_eq!(calorie_progress(1250.0, 2500.0), 50.0);
/// assert_eq!(calorie_progress(4000.0, 2500.0), 100.0);
/// assert_eq!(calorie_progress(100.0, 0.0), 0.0);
/// ```
pub fn calorie_progress(calories: f64, target: f64) -> f64 {
    if target <= 0.0 {
        return 0.0;
    }
    ((calories / target) * 100.0).clamp(0.0, 100.0)
}

/// A fixed-width text bar of `width` cells filled to `percent`.
pub fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    let mut bar = String::with_capacity(width * 3);
    bar.push_str(&"█".repeat(filled));
    bar.push_str(&"░".repeat(width - filled));
    bar
}

// ── Tests ──────────────────────────────────────────────────────────────────────
