//! Shared types for the alarm pipeline

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Display language for area names and labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    He,
    Ar,
    Ru,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::En, Language::He, Language::Ar, Language::Ru];

    /// Suffix used by the catalog fields (`areaname_<code>`, `label_<code>`)
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::He => "he",
            Language::Ar => "ar",
            Language::Ru => "ru",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|lang| lang.code() == code)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// One decoded response from the alert feed
///
/// An empty `location_codes` list means there is no active alert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAlert {
    pub alarm_id: Option<String>,
    pub location_codes: Vec<String>,
}

impl RawAlert {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(alarm_id: impl Into<String>, location_codes: Vec<String>) -> Self {
        Self { alarm_id: Some(alarm_id.into()), location_codes }
    }

    pub fn is_empty(&self) -> bool {
        self.location_codes.is_empty()
    }
}

/// A localized string plus whether it matched the highlight filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayEntry {
    /// Localized text as it appears in the catalog
    pub raw: String,
    /// Text for terminal and desktop output (reversed when requested)
    pub text: String,
    pub highlighted: bool,
}

impl DisplayEntry {
    /// Entry whose display text is the localized text unchanged
    pub fn plain(text: impl Into<String>) -> Self {
        let raw = text.into();
        Self { text: raw.clone(), raw, highlighted: false }
    }
}

/// A single localized location inside an area
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelItem {
    /// Raw location code from the feed
    pub code: String,
    pub label: DisplayEntry,
}

/// All labels that share one area name, in first-seen order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaGroup {
    pub area: DisplayEntry,
    pub labels: SmallVec<[LabelItem; 4]>,
}

impl AreaGroup {
    pub fn label_texts(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|item| item.label.text.as_str())
    }
}

/// Location codes grouped by area, ready for rendering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedAlert {
    pub areas: Vec<AreaGroup>,
}

impl GroupedAlert {
    pub fn label_count(&self) -> usize {
        self.areas.iter().map(|a| a.labels.len()).sum()
    }

    pub fn area(&self, name: &str) -> Option<&AreaGroup> {
        self.areas.iter().find(|a| a.area.text == name)
    }
}

/// The unit handed to the notification fan-out
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    Alert { grouped: GroupedAlert, alarm_id: Option<String>, at: DateTime<Local> },
    Routine { at: DateTime<Local> },
    Error { message: String, at: DateTime<Local> },
}

impl NotificationEvent {
    pub fn alert(grouped: GroupedAlert, alarm_id: Option<String>) -> Self {
        Self::Alert { grouped, alarm_id, at: Local::now() }
    }

    pub fn routine() -> Self {
        Self::Routine { at: Local::now() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into(), at: Local::now() }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Alert { .. } => "alert",
            Self::Routine { .. } => "routine",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_codes_round_trip() {
        for lang in Language::ALL {
            assert_eq!(Language::from_code(lang.code()), Some(lang));
        }
        assert_eq!(Language::from_code("fr"), None);
    }

    #[test]
    fn test_raw_alert_empty() {
        assert!(RawAlert::none().is_empty());
        assert!(!RawAlert::new("1", vec!["a".to_string()]).is_empty());
    }
}
