//! Desktop notification sink
//!
//! One OS notification per area on alert events. The platform backend is
//! detected once at startup (`osascript` on macOS, `notify-send` elsewhere);
//! when neither is available the caller gets a disabled `NoopSink` instead.

use crate::domain::types::NotificationEvent;
use crate::io::sink::{NoopSink, NotificationSink};
use anyhow::Context;
use async_trait::async_trait;
use std::env;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, warn};

const OSASCRIPT: &str = "/usr/bin/osascript";

/// Something that can show a titled notification on the desktop
pub trait DesktopNotifier: Send + Sync {
    fn notify(&self, title: &str, body: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Osascript(PathBuf),
    NotifySend(PathBuf),
}

impl Backend {
    /// Probe the host once for a usable notification command
    pub fn detect() -> Option<Self> {
        if cfg!(target_os = "macos") && Path::new(OSASCRIPT).is_file() {
            return Some(Backend::Osascript(PathBuf::from(OSASCRIPT)));
        }
        find_in_path("notify-send").map(Backend::NotifySend)
    }

    fn command(&self, title: &str, body: &str) -> Command {
        match self {
            Backend::Osascript(path) => {
                let mut cmd = Command::new(path);
                cmd.arg("-e").arg(format!(
                    "display notification {} with title {}",
                    applescript_string(body),
                    applescript_string(title)
                ));
                cmd
            }
            Backend::NotifySend(path) => {
                let mut cmd = Command::new(path);
                cmd.args(["--app-name", "alarmwatch", "--urgency", "critical", title, body]);
                cmd
            }
        }
    }
}

impl DesktopNotifier for Backend {
    fn notify(&self, title: &str, body: &str) -> anyhow::Result<()> {
        // Fire and forget: tokio reaps the child in the background
        self.command(title, body)
            .spawn()
            .with_context(|| format!("Failed to spawn notifier {:?}", self))?;
        Ok(())
    }
}

fn find_in_path(program: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths).map(|dir| dir.join(program)).find(|path| path.is_file())
}

/// Quote a value as an AppleScript string literal
fn applescript_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

pub struct DesktopSink {
    notifier: Box<dyn DesktopNotifier>,
}

impl DesktopSink {
    pub fn new(notifier: Box<dyn DesktopNotifier>) -> Self {
        Self { notifier }
    }

    /// Concrete sink when the platform supports it, disabled stand-in otherwise
    pub fn detect() -> Box<dyn NotificationSink> {
        match Backend::detect() {
            Some(backend) => {
                debug!(backend = ?backend, "desktop_notifier_detected");
                Box::new(Self::new(Box::new(backend)))
            }
            None => {
                warn!("desktop_notifier_unsupported");
                Box::new(NoopSink::new("desktop"))
            }
        }
    }
}

#[async_trait]
impl NotificationSink for DesktopSink {
    fn name(&self) -> &'static str {
        "desktop"
    }

    async fn dispatch(&self, event: &NotificationEvent) -> anyhow::Result<()> {
        let NotificationEvent::Alert { grouped, .. } = event else {
            return Ok(());
        };

        // Try every area even if one fails; report the first failure
        let mut first_err = None;
        for area in &grouped.areas {
            let title = format!("Alarms at {}", area.area.text);
            let body = area.label_texts().collect::<Vec<_>>().join(", ");
            if let Err(e) = self.notifier.notify(&title, &body) {
                warn!(area = %area.area.text, error = %e, "desktop_notify_failed");
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{AreaGroup, DisplayEntry, GroupedAlert, LabelItem};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default, Clone)]
    struct RecordingNotifier {
        calls: Arc<Mutex<Vec<(String, String)>>>,
        fail_on: Option<String>,
    }

    impl DesktopNotifier for RecordingNotifier {
        fn notify(&self, title: &str, body: &str) -> anyhow::Result<()> {
            self.calls.lock().push((title.to_string(), body.to_string()));
            if self.fail_on.as_deref() == Some(title) {
                anyhow::bail!("notifier crashed");
            }
            Ok(())
        }
    }

    fn area(name: &str, labels: &[&str]) -> AreaGroup {
        AreaGroup {
            area: DisplayEntry::plain(name),
            labels: labels
                .iter()
                .map(|l| LabelItem { code: l.to_string(), label: DisplayEntry::plain(*l) })
                .collect(),
        }
    }

    fn alert() -> NotificationEvent {
        NotificationEvent::alert(
            GroupedAlert {
                areas: vec![area("North", &["Alpha", "Beta"]), area("South", &["Gamma"])],
            },
            Some("1".to_string()),
        )
    }

    #[tokio::test]
    async fn test_one_notification_per_area() {
        let notifier = RecordingNotifier::default();
        let sink = DesktopSink::new(Box::new(notifier.clone()));
        sink.dispatch(&alert()).await.unwrap();

        let calls = notifier.calls.lock().clone();
        assert_eq!(
            calls,
            vec![
                ("Alarms at North".to_string(), "Alpha, Beta".to_string()),
                ("Alarms at South".to_string(), "Gamma".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_ignores_routine_and_error() {
        let notifier = RecordingNotifier::default();
        let sink = DesktopSink::new(Box::new(notifier.clone()));
        sink.dispatch(&NotificationEvent::routine()).await.unwrap();
        sink.dispatch(&NotificationEvent::error("timeout")).await.unwrap();
        assert!(notifier.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failure_does_not_skip_remaining_areas() {
        let notifier = RecordingNotifier {
            fail_on: Some("Alarms at North".to_string()),
            ..Default::default()
        };
        let sink = DesktopSink::new(Box::new(notifier.clone()));
        let err = sink.dispatch(&alert()).await.unwrap_err();
        assert!(err.to_string().contains("notifier crashed"));
        assert_eq!(notifier.calls.lock().len(), 2);
    }

    #[test]
    fn test_applescript_string_escapes_quotes() {
        assert_eq!(applescript_string(r#"Tel "Aviv" \ Yafo"#), r#""Tel \"Aviv\" \\ Yafo""#);
    }

    #[test]
    fn test_osascript_command_line() {
        let backend = Backend::Osascript(PathBuf::from(OSASCRIPT));
        let cmd = backend.command("Alarms at North", "Alpha, Beta");
        let args: Vec<String> =
            cmd.as_std().get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec![
                "-e".to_string(),
                r#"display notification "Alpha, Beta" with title "Alarms at North""#.to_string()
            ]
        );
    }
}
