//! Display-string lookup over the `locales/*.yml` catalogs.
//!
//! A [`Translator`] is passed explicitly to whatever renders text, so the
//! aggregation code never depends on an ambient locale. Keys missing from the
//! selected locale resolve through French, then to the key itself.

use std::fmt;
use std::str::FromStr;

/// Supported display languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Fr,
    En,
}

impl Language {
    /// Language used when a key is missing from the selected locale.
    pub const DEFAULT: Language = Language::Fr;

    pub fn code(self) -> &'static str {
        match self {
            Language::Fr => "fr",
            Language::En => "en",
        }
    }

    /// Pick a language from a POSIX locale tag such as `"en_US.UTF-8"`.
    ///
    /// Anything not recognised maps to [`Language::DEFAULT`].
    pub fn from_locale_tag(tag: &str) -> Language {
        let lang = tag
            .split(['_', '-', '.'])
            .next()
            .unwrap_or_default()
            .to_lowercase();
        lang.parse().unwrap_or(Language::DEFAULT)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fr" => Ok(Language::Fr),
            "en" => Ok(Language::En),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

// ── Translator ────────────────────────────────────────────────────────────────

/// Resolves translation keys for one active language.
#[derive(Debug, Clone, Copy, Default)]
pub struct Translator {
    language: Language,
}

impl Translator {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Selected language, then French, then the key itself.
    pub fn translate(&self, key: &str) -> String {
        let locale = self.language.code();
        let text = rust_i18n::t!(key, locale = locale);
        // A key missing from every locale comes back prefixed with the locale.
        if text == format!("{locale}.{key}") {
            key.to_string()
        } else {
            text.into_owned()
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
