//! Data layer for the nutrition dashboard.
//!
//! Reads the per-day payload and product catalog from disk, fills in item
//! names and nutrients, and derives the daily, weekly, meal and calendar
//! views the dashboard renders.

pub mod aggregator;
pub mod analysis;
pub mod reader;
pub mod report;

pub use nutrition_core as core;
