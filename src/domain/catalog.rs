//! Location label catalog
//!
//! Maps a feed location code to its area name and display label in each
//! supported language. Loaded once at startup and read-only afterwards.

use crate::domain::types::Language;
use anyhow::Context;
use rustc_hash::FxHashMap;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Per-language names for one location code
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelEntry {
    pub area_name_by_lang: FxHashMap<Language, String>,
    pub label_by_lang: FxHashMap<Language, String>,
}

impl LabelEntry {
    pub fn area_name(&self, lang: Language) -> Option<&str> {
        self.area_name_by_lang.get(&lang).map(String::as_str)
    }

    pub fn label(&self, lang: Language) -> Option<&str> {
        self.label_by_lang.get(&lang).map(String::as_str)
    }

    /// Builder for tests and hand-built catalogs
    pub fn with(mut self, lang: Language, area: &str, label: &str) -> Self {
        self.area_name_by_lang.insert(lang, area.to_string());
        self.label_by_lang.insert(lang, label.to_string());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct LabelCatalog {
    entries: FxHashMap<String, LabelEntry>,
}

impl LabelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: impl Into<String>, entry: LabelEntry) {
        self.entries.insert(code.into(), entry);
    }

    pub fn get(&self, code: &str) -> Option<&LabelEntry> {
        self.entries.get(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse the upstream catalog format:
    /// `{ "<code>": { "areaname_he": "...", "label_he": "...", ... } }`
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let raw: HashMap<String, HashMap<String, serde_json::Value>> =
            serde_json::from_str(json).context("Failed to parse label catalog")?;

        let mut catalog = Self::new();
        for (code, fields) in raw {
            let mut entry = LabelEntry::default();
            for (key, value) in fields {
                // Non-string fields (ids, coordinates) are not display data
                let Some(text) = value.as_str() else { continue };
                let area_lang = key.strip_prefix("areaname_").and_then(Language::from_code);
                let label_lang = key.strip_prefix("label_").and_then(Language::from_code);
                if let Some(lang) = area_lang {
                    entry.area_name_by_lang.insert(lang, text.to_string());
                } else if let Some(lang) = label_lang {
                    entry.label_by_lang.insert(lang, text.to_string());
                }
            }
            catalog.entries.insert(code, entry);
        }
        Ok(catalog)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read label catalog {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("Invalid label catalog {}", path.display()))
    }
}

impl FromIterator<(String, LabelEntry)> for LabelCatalog {
    fn from_iter<I: IntoIterator<Item = (String, LabelEntry)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_str() {
        let json = r#"{
            "שדרות, איבים, ניר עם": {
                "areaname_he": "עוטף עזה",
                "areaname_en": "Gaza Envelope",
                "label_he": "שדרות, איבים, ניר עם",
                "label_en": "Sderot, Ivim, Nir Am",
                "label_fr": "ignored",
                "migun_time": 15
            }
        }"#;
        let catalog = LabelCatalog::from_json_str(json).unwrap();
        assert_eq!(catalog.len(), 1);

        let entry = catalog.get("שדרות, איבים, ניר עם").unwrap();
        assert_eq!(entry.area_name(Language::En), Some("Gaza Envelope"));
        assert_eq!(entry.label(Language::He), Some("שדרות, איבים, ניר עם"));
        assert_eq!(entry.label(Language::Ru), None);
        assert_eq!(entry.label_by_lang.len(), 2);
    }

    #[test]
    fn test_from_json_str_rejects_non_object() {
        assert!(LabelCatalog::from_json_str("[1, 2, 3]").is_err());
    }

    #[test]
    fn test_from_file_missing() {
        let err = LabelCatalog::from_file("/nonexistent/labels.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/labels.json"));
    }
}
