//! Core types for the nutrition dashboard.
//!
//! Holds the raw day model delivered by the data provider, the error type
//! shared by every crate, ISO date/week helpers, display formatting, the
//! translation catalogs and CLI settings.

rust_i18n::i18n!("locales", fallback = "fr");

pub mod error;
pub mod formatting;
pub mod i18n;
pub mod models;
pub mod settings;
pub mod time_utils;
