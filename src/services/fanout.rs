//! Notification fan-out
//!
//! Delivers each event to the console and then to every enabled optional
//! sink. Sinks are isolated from each other: a failing or slow sink is logged,
//! counted and reported as a console warning, and the remaining sinks still
//! run. Nothing here ever fails the poll loop.

use crate::domain::types::NotificationEvent;
use crate::infra::metrics::Metrics;
use crate::io::console::ConsoleSink;
use crate::io::sink::NotificationSink;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound on a single sink dispatch
pub const DEFAULT_SINK_TIMEOUT: Duration = Duration::from_millis(500);

pub struct NotificationFanout {
    console: Arc<ConsoleSink>,
    sinks: Vec<Box<dyn NotificationSink>>,
    metrics: Arc<Metrics>,
    sink_timeout: Duration,
}

impl NotificationFanout {
    pub fn new(console: Arc<ConsoleSink>, metrics: Arc<Metrics>) -> Self {
        Self { console, sinks: Vec::new(), metrics, sink_timeout: DEFAULT_SINK_TIMEOUT }
    }

    pub fn with_sink(mut self, sink: Box<dyn NotificationSink>) -> Self {
        self.add_sink(sink);
        self
    }

    pub fn with_sink_timeout(mut self, timeout: Duration) -> Self {
        self.sink_timeout = timeout;
        self
    }

    /// Register an optional sink; disabled sinks are dropped here
    pub fn add_sink(&mut self, sink: Box<dyn NotificationSink>) {
        if sink.is_enabled() {
            debug!(sink = %sink.name(), "fanout_sink_added");
            self.sinks.push(sink);
        } else {
            debug!(sink = %sink.name(), "fanout_sink_disabled");
        }
    }

    pub fn sink_names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Deliver one event everywhere; returns how many sinks failed
    pub async fn dispatch(&self, event: &NotificationEvent) -> usize {
        let mut failures = 0;

        if let Err(e) = self.console.dispatch(event).await {
            failures += 1;
            self.metrics.record_sink_failure();
            warn!(sink = "console", event = %event.kind(), error = %e, "sink_dispatch_failed");
        }

        for sink in &self.sinks {
            let result = match tokio::time::timeout(self.sink_timeout, sink.dispatch(event)).await {
                Ok(result) => result,
                Err(_) => Err(anyhow::anyhow!("timed out after {:?}", self.sink_timeout)),
            };

            if let Err(e) = result {
                failures += 1;
                self.report_sink_failure(sink.name(), event, &e).await;
            }
        }

        failures
    }

    /// Surface a sink failure on the console error path
    async fn report_sink_failure(
        &self,
        name: &str,
        event: &NotificationEvent,
        error: &anyhow::Error,
    ) {
        self.metrics.record_sink_failure();
        warn!(sink = %name, event = %event.kind(), error = %error, "sink_dispatch_failed");

        let notice = NotificationEvent::error(format!("{} notification failed: {:#}", name, error));
        if let Err(e) = self.console.dispatch(&notice).await {
            warn!(error = %e, "console_error_report_failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::GroupedAlert;
    use crate::io::console::ConsoleOptions;
    use crate::io::sink::NoopSink;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::io::Write;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Sink that records event kinds, optionally failing or stalling
    #[derive(Clone)]
    struct TestSink {
        name: &'static str,
        seen: Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
        stall: bool,
    }

    impl TestSink {
        fn new(name: &'static str) -> Self {
            Self { name, seen: Arc::default(), fail: false, stall: false }
        }
    }

    #[async_trait]
    impl NotificationSink for TestSink {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn dispatch(&self, event: &NotificationEvent) -> anyhow::Result<()> {
            self.seen.lock().push(event.kind());
            if self.stall {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if self.fail {
                anyhow::bail!("broker unreachable");
            }
            Ok(())
        }
    }

    fn fanout(quiet: bool) -> (NotificationFanout, SharedBuf, Arc<Metrics>) {
        let buf = SharedBuf::default();
        let console = Arc::new(ConsoleSink::with_writer(
            Box::new(buf.clone()),
            ConsoleOptions { quiet, ..Default::default() },
        ));
        let metrics = Arc::new(Metrics::new());
        (NotificationFanout::new(console, metrics.clone()), buf, metrics)
    }

    fn empty_alert() -> NotificationEvent {
        NotificationEvent::alert(GroupedAlert::default(), None)
    }

    fn output(buf: &SharedBuf) -> String {
        String::from_utf8(buf.0.lock().clone()).unwrap()
    }

    #[tokio::test]
    async fn test_all_sinks_receive_event() {
        let a = TestSink::new("a");
        let b = TestSink::new("b");
        let (fanout, _, _) = fanout(false);
        let fanout = fanout.with_sink(Box::new(a.clone())).with_sink(Box::new(b.clone()));

        let failures = fanout.dispatch(&empty_alert()).await;
        assert_eq!(failures, 0);
        assert_eq!(*a.seen.lock(), vec!["alert"]);
        assert_eq!(*b.seen.lock(), vec!["alert"]);
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_stop_others() {
        let failing = TestSink { fail: true, ..TestSink::new("mqtt") };
        let after = TestSink::new("after");
        let (fanout, buf, metrics) = fanout(false);
        let fanout = fanout.with_sink(Box::new(failing)).with_sink(Box::new(after.clone()));

        let failures = fanout.dispatch(&empty_alert()).await;
        assert_eq!(failures, 1);
        assert_eq!(*after.seen.lock(), vec!["alert"]);
        assert_eq!(metrics.report().sink_failures, 1);
        assert!(output(&buf).contains("mqtt notification failed: broker unreachable"));
    }

    #[tokio::test]
    async fn test_stalled_sink_is_timed_out() {
        let stalled = TestSink { stall: true, ..TestSink::new("desktop") };
        let after = TestSink::new("after");
        let (fanout, buf, _) = fanout(false);
        let fanout = fanout
            .with_sink_timeout(Duration::from_millis(50))
            .with_sink(Box::new(stalled))
            .with_sink(Box::new(after.clone()));

        let failures = fanout.dispatch(&NotificationEvent::routine()).await;
        assert_eq!(failures, 1);
        assert_eq!(*after.seen.lock(), vec!["routine"]);
        assert!(output(&buf).contains("desktop notification failed: timed out"));
    }

    #[tokio::test]
    async fn test_quiet_hides_failure_report_but_still_counts() {
        let failing = TestSink { fail: true, ..TestSink::new("mqtt") };
        let (fanout, buf, metrics) = fanout(true);
        let fanout = fanout.with_sink(Box::new(failing));

        assert_eq!(fanout.dispatch(&empty_alert()).await, 1);
        assert_eq!(metrics.report().sink_failures, 1);
        assert!(!output(&buf).contains("failed"));
    }

    #[test]
    fn test_disabled_sinks_are_not_registered() {
        let (fanout, _, _) = fanout(false);
        let fanout = fanout
            .with_sink(Box::new(NoopSink::new("desktop")))
            .with_sink(Box::new(TestSink::new("mqtt")));
        assert_eq!(fanout.sink_names(), vec!["mqtt"]);
    }
}
