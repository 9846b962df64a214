//! Localize location codes and group them by area
//!
//! Grouping keys on the localized (unreversed) area name, so reversal and
//! highlighting never change which codes end up together. Codes missing from
//! the catalog land in the `UNKNOWN_AREA` bucket with the raw code as label.

use crate::domain::catalog::LabelCatalog;
use crate::domain::types::{AreaGroup, DisplayEntry, GroupedAlert, LabelItem, Language};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::Arc;

/// Area bucket for codes the catalog does not know
pub const UNKNOWN_AREA: &str = "Unknown";

#[derive(Debug, Clone)]
pub struct DisplayOptions {
    pub language: Language,
    /// Reverse strings character-wise for terminals without bidi rendering
    pub reverse: bool,
    /// Case-sensitive substring to flag in area names and labels
    pub highlight: Option<String>,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self { language: Language::He, reverse: false, highlight: None }
    }
}

pub struct AreaGrouper {
    catalog: Arc<LabelCatalog>,
    options: DisplayOptions,
}

impl AreaGrouper {
    pub fn new(catalog: Arc<LabelCatalog>, options: DisplayOptions) -> Self {
        Self { catalog, options }
    }

    /// Group with this grouper's configured language, reverse and highlight
    pub fn group(&self, location_codes: &[String]) -> GroupedAlert {
        group(
            &self.catalog,
            location_codes,
            self.options.language,
            self.options.reverse,
            self.options.highlight.as_deref(),
        )
    }

    /// Resolve one code to (area, label), falling back per field
    fn localize<'a>(
        catalog: &'a LabelCatalog,
        code: &'a str,
        lang: Language,
    ) -> (&'a str, &'a str) {
        match catalog.get(code) {
            Some(entry) => (
                entry.area_name(lang).unwrap_or(UNKNOWN_AREA),
                entry.label(lang).unwrap_or(code),
            ),
            None => (UNKNOWN_AREA, code),
        }
    }
}

/// Build the area -> labels grouping for one alert
///
/// Areas keep first-seen order, and labels keep first-seen order within their
/// area. Every input code yields exactly one label entry.
pub fn group(
    catalog: &LabelCatalog,
    location_codes: &[String],
    language: Language,
    reverse: bool,
    highlight: Option<&str>,
) -> GroupedAlert {
    let mut areas: Vec<AreaGroup> = Vec::new();
    let mut index_by_area: FxHashMap<&str, usize> = FxHashMap::default();

    for code in location_codes {
        let (area, label) = AreaGrouper::localize(catalog, code, language);

        let idx = *index_by_area.entry(area).or_insert_with(|| {
            areas.push(AreaGroup {
                area: display_entry(area, reverse, highlight),
                labels: SmallVec::new(),
            });
            areas.len() - 1
        });

        areas[idx].labels.push(LabelItem {
            code: code.clone(),
            label: display_entry(label, reverse, highlight),
        });
    }

    GroupedAlert { areas }
}

/// Highlight matching runs on the localized text before any reversal;
/// `raw` keeps that text for consumers that do not render it
fn display_entry(raw: &str, reverse: bool, highlight: Option<&str>) -> DisplayEntry {
    let highlighted = highlight.is_some_and(|h| !h.is_empty() && raw.contains(h));
    let text = if reverse { raw.chars().rev().collect() } else { raw.to_string() };
    DisplayEntry { raw: raw.to_string(), text, highlighted }
}
