//! Notification sink interface
//!
//! Every output (console, desktop, MQTT) implements `NotificationSink`.
//! Optional outputs that are unconfigured or unsupported on this host are
//! represented by `NoopSink`, so the fan-out never branches per event.

use crate::domain::types::NotificationEvent;
use async_trait::async_trait;

#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Short name used in logs and error lines
    fn name(&self) -> &'static str;

    /// Disabled sinks are skipped by the fan-out
    fn is_enabled(&self) -> bool {
        true
    }

    async fn dispatch(&self, event: &NotificationEvent) -> anyhow::Result<()>;
}

/// Stand-in for an optional sink that is turned off
#[derive(Debug, Clone, Copy)]
pub struct NoopSink {
    name: &'static str,
}

impl NoopSink {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[async_trait]
impl NotificationSink for NoopSink {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_enabled(&self) -> bool {
        false
    }

    async fn dispatch(&self, _event: &NotificationEvent) -> anyhow::Result<()> {
        Ok(())
    }
}
