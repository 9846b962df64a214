//! Alert dedup / routine throttle state machine
//!
//! Two states: IDLE (no active alert) and ACTIVE. The tracker decides, per poll
//! result, whether anything user-visible should happen:
//! - a changed set of location codes emits an alert (every poll when
//!   `repeat_alarms` is set)
//! - the first idle poll after an alert emits a routine "all clear", after that
//!   at most one routine message per `routine_delay`

use crate::domain::types::RawAlert;
use rustc_hash::FxHashSet;
use std::time::{Duration, Instant};
use tracing::debug;

/// State carried between poll cycles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineState {
    /// Codes of the most recent non-empty alert; empty while idle
    pub active_codes: FxHashSet<String>,
    /// When the last routine message went out (None until the first one)
    pub last_routine_emit_time: Option<Instant>,
}

impl EngineState {
    pub fn is_active(&self) -> bool {
        !self.active_codes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerSettings {
    pub repeat_alarms: bool,
    pub routine_delay: Duration,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self { repeat_alarms: false, routine_delay: Duration::from_secs(300) }
    }
}

/// What a poll result should produce downstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Alert { alarm_id: Option<String>, location_codes: Vec<String> },
    Routine,
}

/// Advance `state` by one poll result
pub fn advance(
    state: &mut EngineState,
    alert: &RawAlert,
    settings: &TrackerSettings,
    now: Instant,
) -> Option<Transition> {
    if alert.is_empty() {
        let throttle_elapsed = match state.last_routine_emit_time {
            Some(last) => now.saturating_duration_since(last) > settings.routine_delay,
            None => true,
        };
        let clearing = state.is_active();
        state.active_codes.clear();

        if clearing || throttle_elapsed {
            debug!(clearing = %clearing, "tracker_routine");
            state.last_routine_emit_time = Some(now);
            return Some(Transition::Routine);
        }
        return None;
    }

    let codes: FxHashSet<String> = alert.location_codes.iter().cloned().collect();
    let changed = codes != state.active_codes;
    state.active_codes = codes;

    if settings.repeat_alarms || changed {
        debug!(
            codes = %alert.location_codes.len(),
            changed = %changed,
            "tracker_alert"
        );
        Some(Transition::Alert {
            alarm_id: alert.alarm_id.clone(),
            location_codes: alert.location_codes.clone(),
        })
    } else {
        None
    }
}

/// Owns the `EngineState` for the lifetime of the poll loop
#[derive(Debug, Default)]
pub struct AlertStateTracker {
    state: EngineState,
    settings: TrackerSettings,
}

impl AlertStateTracker {
    pub fn new(settings: TrackerSettings) -> Self {
        Self { state: EngineState::default(), settings }
    }

    pub fn update(&mut self, alert: &RawAlert, now: Instant) -> Option<Transition> {
        advance(&mut self.state, alert, &self.settings, now)
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }
}
