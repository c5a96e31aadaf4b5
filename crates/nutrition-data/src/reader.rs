//! Loading of the exported day and product files.
//!
//! The data directory holds `days.json` (date key → day record) and, when the
//! product export has run, `products.json`. Product and recipe entries in the
//! day file only carry ids; [`enrich`] resolves names, units and nutrient
//! values from the catalog.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use nutrition_core::error::{DashboardError, Result};
use nutrition_core::models::{NutrientMap, RawDayMap};
use nutrition_core::settings::app_dir;
use serde::Deserialize;
use tracing::{debug, warn};

/// Day export file name inside the data directory.
pub const DAYS_FILE: &str = "days.json";
/// Product/recipe catalog file name inside the data directory.
pub const PRODUCTS_FILE: &str = "products.json";

// ── ProductCatalog ────────────────────────────────────────────────────────────

/// One product or recipe from the catalog. Nutrient values are per unit of
/// amount (products) or per portion (recipes).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CatalogEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nutrients: Option<NutrientMap>,
    #[serde(default)]
    pub base_unit: Option<String>,
}

/// Products and recipes keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    entries: HashMap<String, CatalogEntry>,
}

impl ProductCatalog {
    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.get(id)
    }

    pub fn insert(&mut self, id: impl Into<String>, entry: CatalogEntry) {
        self.entries.insert(id.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build from either an object keyed by id or an array of objects that
    /// carry an `"id"` field. Entries that fail to parse are skipped.
    pub fn from_value(value: serde_json::Value) -> Self {
        let mut catalog = Self::default();

        let pairs: Vec<(String, serde_json::Value)> = match value {
            serde_json::Value::Object(map) => map.into_iter().collect(),
            serde_json::Value::Array(items) => items
                .into_iter()
                .filter_map(|item| {
                    let id = item.get("id")?.as_str()?.to_string();
                    Some((id, item))
                })
                .collect(),
            other => {
                warn!(kind = %json_kind(&other), "product catalog is neither an object nor an array");
                return catalog;
            }
        };

        for (id, raw) in pairs {
            match serde_json::from_value::<CatalogEntry>(raw) {
                Ok(entry) => catalog.insert(id, entry),
                Err(e) => debug!(id = %id, error = %e, "skipping malformed catalog entry"),
            }
        }

        catalog
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Data directory: `data_dir` when given, else `~/.nutrition-dashboard/data`.
pub fn resolve_data_dir(data_dir: Option<&Path>) -> PathBuf {
    match data_dir {
        Some(p) => p.to_path_buf(),
        None => app_dir().join("data"),
    }
}

/// Read and parse the day export at `path`.
pub fn load_days(path: &Path) -> Result<RawDayMap> {
    if !path.exists() {
        return Err(DashboardError::DataFileNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| DashboardError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let days: RawDayMap = serde_json::from_str(&content)?;
    debug!(days = days.len(), path = %path.display(), "loaded day export");
    Ok(days)
}

/// Read the product catalog at `path`.
///
/// A missing or unreadable catalog is not fatal: an empty catalog is returned
/// and the day data is shown without resolved names.
pub fn load_catalog(path: &Path) -> ProductCatalog {
    if !path.exists() {
        debug!(path = %path.display(), "no product catalog");
        return ProductCatalog::default();
    }
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read product catalog");
            return ProductCatalog::default();
        }
    };
    match serde_json::from_str::<serde_json::Value>(&content) {
        Ok(value) => ProductCatalog::from_value(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse product catalog");
            ProductCatalog::default()
        }
    }
}

/// Counters reported by [`enrich`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichStats {
    pub products_resolved: usize,
    pub recipes_resolved: usize,
    pub recipes_unresolved: usize,
}

/// Resolve catalog data into the day records in place.
///
/// * products with a known `product_id` get the catalog name and base unit,
///   and nutrients scaled by `amount`;
/// * recipe portions with a known `recipe_id` get the catalog name, base unit
///   (`"g"` when the catalog has none) and nutrients scaled by `portion_count`.
///
/// When the catalog entry has no nutrients the item keeps its own.
pub fn enrich(days: &mut RawDayMap, catalog: &ProductCatalog) -> EnrichStats {
    let mut stats = EnrichStats::default();
    if catalog.is_empty() {
        return stats;
    }

    for (date, record) in days.iter_mut() {
        let Some(consumed) = record.consumed.as_mut() else {
            continue;
        };

        for product in consumed.products.iter_mut().flatten() {
            let Some(entry) = product.product_id.as_deref().and_then(|id| catalog.get(id)) else {
                continue;
            };
            product.name = entry.name.clone().or(product.name.take());
            product.base_unit = entry.base_unit.clone().or(product.base_unit.take());
            if let Some(nutrients) = entry.nutrients.as_ref().filter(|n| !n.is_empty()) {
                product.nutrients = Some(nutrients.scaled(product.amount.unwrap_or(0.0)));
            }
            stats.products_resolved += 1;
        }

        for recipe in consumed.recipe_portions.iter_mut().flatten() {
            let Some(recipe_id) = recipe.recipe_id.as_deref() else {
                warn!(date = %date, "recipe portion without recipe_id");
                stats.recipes_unresolved += 1;
                continue;
            };
            let Some(entry) = catalog.get(recipe_id) else {
                warn!(
                    date = %date,
                    recipe_id = %recipe_id,
                    "recipe not found in product catalog; was the product export run?"
                );
                stats.recipes_unresolved += 1;
                continue;
            };
            recipe.name = entry.name.clone().or(recipe.name.take());
            recipe.base_unit = Some(entry.base_unit.clone().unwrap_or_else(|| "g".to_string()));
            if let Some(nutrients) = entry.nutrients.as_ref().filter(|n| !n.is_empty()) {
                recipe.nutrients = Some(nutrients.scaled(recipe.portion_count.unwrap_or(0.0)));
            }
            stats.recipes_resolved += 1;
        }
    }

    debug!(
        products = stats.products_resolved,
        recipes = stats.recipes_resolved,
        unresolved = stats.recipes_unresolved,
        "catalog enrichment done"
    );
    stats
}

/// Load `days.json`, resolve it against `products.json`, and return the days.
pub fn load_data(data_dir: &Path) -> Result<RawDayMap> {
    let mut days = load_days(&data_dir.join(DAYS_FILE))?;
    let catalog = load_catalog(&data_dir.join(PRODUCTS_FILE));
    enrich(&mut days, &catalog);
    Ok(days)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
