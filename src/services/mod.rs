//! Services - alert state and notification logic
//!
//! This module contains the core logic between the feed and the sinks:
//! - `state_tracker` - Decides when a poll result becomes an alert or routine event
//! - `grouper` - Localizes location codes and groups them by area
//! - `fanout` - Delivers events to the console and optional sinks
//! - `monitor` - Poll loop tying the feed, tracker, grouper and fan-out together

pub mod fanout;
pub mod grouper;
pub mod monitor;
pub mod state_tracker;

// Re-export commonly used types
pub use fanout::NotificationFanout;
pub use grouper::{AreaGrouper, DisplayOptions};
pub use monitor::AlarmMonitor;
pub use state_tracker::{AlertStateTracker, EngineState, TrackerSettings, Transition};
