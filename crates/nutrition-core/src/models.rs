use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ── Nutrient keys ─────────────────────────────────────────────────────────────

/// Energy in kcal.
pub const ENERGY: &str = "energy.energy";
/// Protein in grams.
pub const PROTEIN: &str = "nutrient.protein";
/// Carbohydrate in grams.
pub const CARB: &str = "nutrient.carb";
/// Fat in grams.
pub const FAT: &str = "nutrient.fat";

// ── NutrientMap ───────────────────────────────────────────────────────────────

/// Mapping from a nutrient key (e.g. `"energy.energy"`) to its value.
///
/// Lookups never fail: a missing key and an explicit `null` both read as `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NutrientMap(BTreeMap<String, Option<f64>>);

impl NutrientMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `key`, or `0.0` when the key is absent or null.
    pub fn get(&self, key: &str) -> f64 {
        self.0.get(key).copied().flatten().unwrap_or(0.0)
    }

    /// Whether `key` is present with a non-null value.
    pub fn contains(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(Some(_)))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.0.insert(key.into(), Some(value));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Multiply every non-null value by `factor`. Null entries are dropped.
    pub fn scaled(&self, factor: f64) -> Self {
        Self(
            self.0
                .iter()
                .filter_map(|(k, v)| v.map(|v| (k.clone(), Some(v * factor))))
                .collect(),
        )
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for NutrientMap {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), Some(v))).collect())
    }
}

// ── MealType ──────────────────────────────────────────────────────────────────

/// The time of day an item was logged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    /// All meal types in presentation order.
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    /// The `daytime` value used in the raw payload, also the translation key.
    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            "snack" => Ok(MealType::Snack),
            other => Err(format!("unknown meal type: {other}")),
        }
    }
}

// ── Raw payload ───────────────────────────────────────────────────────────────

/// Per-day totals reported by the data provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyTotals {
    #[serde(default)]
    pub energy: Option<f64>,
    #[serde(default)]
    pub carb: Option<f64>,
    #[serde(default)]
    pub protein: Option<f64>,
    #[serde(default)]
    pub fat: Option<f64>,
    #[serde(default)]
    pub energy_goal: Option<f64>,
}

/// Water intake for the day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaterRecord {
    #[serde(default)]
    pub water_intake: Option<f64>,
}

/// One logged product, simple product, or recipe portion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsumedItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Raw meal key; unknown values simply never match a [`MealType`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daytime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serving: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serving_quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrients: Option<NutrientMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portion_count: Option<f64>,
}

impl ConsumedItem {
    /// Nutrient value for `key`; `0.0` when the item has no nutrients at all.
    pub fn nutrient(&self, key: &str) -> f64 {
        self.nutrients.as_ref().map_or(0.0, |n| n.get(key))
    }

    pub fn is_meal(&self, meal: MealType) -> bool {
        self.daytime.as_deref() == Some(meal.as_str())
    }
}

/// The three collections of consumed items for one day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsumedGroups {
    #[serde(default)]
    pub products: Option<Vec<ConsumedItem>>,
    #[serde(default)]
    pub simple_products: Option<Vec<ConsumedItem>>,
    #[serde(default)]
    pub recipe_portions: Option<Vec<ConsumedItem>>,
}

impl ConsumedGroups {
    /// Every item: products, then simple products, then recipe portions.
    pub fn iter_all(&self) -> impl Iterator<Item = &ConsumedItem> {
        self.products
            .iter()
            .chain(self.simple_products.iter())
            .chain(self.recipe_portions.iter())
            .flatten()
    }
}

/// One day's nutrition payload as delivered by the data provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDayRecord {
    #[serde(default)]
    pub daily: Option<DailyTotals>,
    #[serde(default)]
    pub goals: Option<NutrientMap>,
    #[serde(default)]
    pub water: Option<WaterRecord>,
    #[serde(default)]
    pub consumed: Option<ConsumedGroups>,
}

impl RawDayRecord {
    fn daily_field(&self, pick: impl Fn(&DailyTotals) -> Option<f64>) -> f64 {
        self.daily.as_ref().and_then(pick).unwrap_or(0.0)
    }

    pub fn energy(&self) -> f64 {
        self.daily_field(|d| d.energy)
    }

    pub fn carb(&self) -> f64 {
        self.daily_field(|d| d.carb)
    }

    pub fn protein(&self) -> f64 {
        self.daily_field(|d| d.protein)
    }

    pub fn fat(&self) -> f64 {
        self.daily_field(|d| d.fat)
    }

    /// `daily.energy_goal`, else `goals["energy.energy"]`, else `0.0`.
    ///
    /// A zero daily goal counts as unset, so the `goals` map still applies.
    pub fn calorie_goal(&self) -> f64 {
        self.daily
            .as_ref()
            .and_then(|d| d.energy_goal)
            .filter(|goal| *goal != 0.0)
            .or_else(|| {
                self.goals
                    .as_ref()
                    .filter(|g| g.contains(ENERGY))
                    .map(|g| g.get(ENERGY))
            })
            .unwrap_or(0.0)
    }

    pub fn water_intake(&self) -> f64 {
        self.water
            .as_ref()
            .and_then(|w| w.water_intake)
            .unwrap_or(0.0)
    }
}

/// Raw days keyed by their `YYYY-MM-DD` date string.
pub type RawDayMap = BTreeMap<String, RawDayRecord>;

// ── MacroTotals ───────────────────────────────────────────────────────────────

/// Energy and macronutrient sums across a set of consumed items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl MacroTotals {
    /// Add one item's nutrients; missing keys count as zero.
    pub fn add_item(&mut self, item: &ConsumedItem) {
        self.calories += item.nutrient(ENERGY);
        self.protein += item.nutrient(PROTEIN);
        self.carbs += item.nutrient(CARB);
        self.fat += item.nutrient(FAT);
    }
}

impl<'a> FromIterator<&'a ConsumedItem> for MacroTotals {
    fn from_iter<I: IntoIterator<Item = &'a ConsumedItem>>(iter: I) -> Self {
        let mut totals = MacroTotals::default();
        for item in iter {
            totals.add_item(item);
        }
        totals
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
