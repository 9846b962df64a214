//! Domain models - core alarm types and the label catalog
//!
//! This module contains the canonical data types used throughout the system:
//! - `RawAlert` - one decoded feed response
//! - `GroupedAlert` - localized locations grouped by area
//! - `NotificationEvent` - what the fan-out delivers to sinks
//! - `LabelCatalog` - location code to localized names
//! - `FeedError` - per-cycle error taxonomy

pub mod catalog;
pub mod error;
pub mod types;

pub use catalog::{LabelCatalog, LabelEntry};
pub use error::FeedError;
pub use types::{
    AreaGroup, DisplayEntry, GroupedAlert, LabelItem, Language, NotificationEvent, RawAlert,
};
