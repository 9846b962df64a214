//! Poll loop orchestration
//!
//! One cycle: fetch -> parse -> state tracker -> (on transition) group ->
//! fan-out, then sleep for the polling delay. Cycles never overlap. Every
//! error except an access denial is reported and the next cycle runs as usual.

use crate::domain::error::FeedError;
use crate::domain::types::{NotificationEvent, RawAlert};
use crate::infra::metrics::Metrics;
use crate::io::feed;
use crate::io::poller::AlertFeed;
use crate::services::fanout::NotificationFanout;
use crate::services::grouper::AreaGrouper;
use crate::services::state_tracker::{AlertStateTracker, Transition};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

pub struct AlarmMonitor {
    feed: Box<dyn AlertFeed>,
    tracker: AlertStateTracker,
    grouper: AreaGrouper,
    fanout: NotificationFanout,
    metrics: Arc<Metrics>,
    polling_delay: Duration,
}

impl AlarmMonitor {
    pub fn new(
        feed: Box<dyn AlertFeed>,
        tracker: AlertStateTracker,
        grouper: AreaGrouper,
        fanout: NotificationFanout,
        metrics: Arc<Metrics>,
        polling_delay: Duration,
    ) -> Self {
        Self { feed, tracker, grouper, fanout, metrics, polling_delay }
    }

    pub fn tracker(&self) -> &AlertStateTracker {
        &self.tracker
    }

    /// Poll until shutdown; only returns an error for `AccessDenied`
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), FeedError> {
        info!(
            polling_delay_ms = %self.polling_delay.as_millis(),
            sinks = ?self.fanout.sink_names(),
            "monitor_started"
        );

        loop {
            self.poll_once().await?;

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("monitor_shutdown");
                        return Ok(());
                    }
                }
                _ = tokio::time::sleep(self.polling_delay) => {}
            }
        }
    }

    /// Run a single poll cycle
    pub async fn poll_once(&mut self) -> Result<(), FeedError> {
        let fetch_start = Instant::now();
        let fetched = self.feed.fetch().await;
        self.metrics.record_poll(fetch_start.elapsed().as_micros() as u64);

        let alert = match fetched.and_then(|body| feed::parse(body.as_deref())) {
            Ok(alert) => alert,
            Err(e) => {
                self.report_error(&e).await;
                return if e.is_fatal() { Err(e) } else { Ok(()) };
            }
        };

        self.process(&alert).await;
        Ok(())
    }

    /// Feed one decoded alert through the tracker and fan out any transition
    pub async fn process(&mut self, alert: &RawAlert) {
        let Some(transition) = self.tracker.update(alert, Instant::now()) else {
            debug!(codes = %alert.location_codes.len(), "poll_unchanged");
            return;
        };

        let event = match transition {
            Transition::Alert { alarm_id, location_codes } => {
                let grouped = self.grouper.group(&location_codes);
                self.metrics.record_alert();
                info!(
                    alarm_id = ?alarm_id,
                    codes = %location_codes.len(),
                    areas = %grouped.areas.len(),
                    "alert_emitted"
                );
                NotificationEvent::alert(grouped, alarm_id)
            }
            Transition::Routine => {
                self.metrics.record_routine();
                info!("routine_emitted");
                NotificationEvent::routine()
            }
        };

        self.fanout.dispatch(&event).await;
    }

    async fn report_error(&self, e: &FeedError) {
        match e {
            FeedError::Parse(_) | FeedError::Schema(_) => {
                self.metrics.record_parse_error();
                warn!(error = %e, "feed_parse_failed");
            }
            FeedError::AccessDenied => {
                self.metrics.record_fetch_error();
                error!(error = %e, "feed_access_denied");
            }
            _ => {
                self.metrics.record_fetch_error();
                warn!(error = %e, "feed_fetch_failed");
            }
        }
        self.fanout.dispatch(&NotificationEvent::error(e.to_string())).await;
    }
}
