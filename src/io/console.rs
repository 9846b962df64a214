//! Console sink
//!
//! Renders every event as timestamped lines on stdout (or any writer).
//! Alerts print one line per area; `quiet` hides routine and error lines but
//! never alerts.

use crate::domain::types::{AreaGroup, DisplayEntry, GroupedAlert, NotificationEvent};
use crate::infra::config::Config;
use crate::io::sink::NotificationSink;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use crossterm::style::Stylize;
use parking_lot::Mutex;
use std::io::{IsTerminal, Write};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleOptions {
    pub quiet: bool,
    pub show_alarm_id: bool,
    pub color: bool,
}

impl ConsoleOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            quiet: config.quiet(),
            show_alarm_id: config.show_alarm_id(),
            color: config.color().unwrap_or_else(|| std::io::stdout().is_terminal()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Tone {
    Area,
    Label,
    Highlight,
    Routine,
    Warning,
}

pub struct ConsoleSink {
    out: Mutex<Box<dyn Write + Send>>,
    options: ConsoleOptions,
}

impl ConsoleSink {
    pub fn stdout(options: ConsoleOptions) -> Self {
        Self::with_writer(Box::new(std::io::stdout()), options)
    }

    pub fn with_writer(out: Box<dyn Write + Send>, options: ConsoleOptions) -> Self {
        Self { out: Mutex::new(out), options }
    }

    /// Text for one event, or None when `quiet` suppresses it
    pub fn render(&self, event: &NotificationEvent) -> Option<String> {
        match event {
            NotificationEvent::Alert { grouped, alarm_id, at } => {
                Some(self.render_alert(grouped, alarm_id.as_deref(), at))
            }
            NotificationEvent::Routine { at } if !self.options.quiet => Some(format!(
                "{} {}\n",
                timestamp(at),
                self.paint("No active alarms", Tone::Routine)
            )),
            NotificationEvent::Error { message, at } if !self.options.quiet => {
                Some(format!("{} {}\n", timestamp(at), self.paint(message, Tone::Warning)))
            }
            _ => None,
        }
    }

    fn render_alert(
        &self,
        grouped: &GroupedAlert,
        alarm_id: Option<&str>,
        at: &DateTime<Local>,
    ) -> String {
        let mut text = format!("{}\n", timestamp(at));
        for area in &grouped.areas {
            text.push_str(&self.render_area(area));
        }
        if self.options.show_alarm_id {
            if let Some(id) = alarm_id {
                text.push_str(&format!("({})\n", id));
            }
        }
        text
    }

    fn render_area(&self, area: &AreaGroup) -> String {
        let name = if area.area.highlighted {
            self.paint(&area.area.text, Tone::Highlight)
        } else {
            self.paint(&area.area.text, Tone::Area)
        };
        // Pad outside the styling so escape codes don't count toward the width
        let pad = " ".repeat(20usize.saturating_sub(area.area.text.chars().count()));
        let labels: Vec<String> =
            area.labels.iter().map(|item| self.paint_entry(&item.label)).collect();
        format!("\t{}{} \t{}\n", name, pad, labels.join(", "))
    }

    fn paint_entry(&self, entry: &DisplayEntry) -> String {
        if entry.highlighted {
            self.paint(&entry.text, Tone::Highlight)
        } else {
            self.paint(&entry.text, Tone::Label)
        }
    }

    fn paint(&self, text: &str, tone: Tone) -> String {
        if !self.options.color {
            return match tone {
                Tone::Highlight => format!("*{}*", text),
                _ => text.to_string(),
            };
        }
        match tone {
            Tone::Area => text.red().bold().to_string(),
            Tone::Label => text.red().to_string(),
            Tone::Highlight => text.black().on_yellow().bold().to_string(),
            Tone::Routine => text.green().to_string(),
            Tone::Warning => text.yellow().to_string(),
        }
    }
}

fn timestamp(at: &DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

#[async_trait]
impl NotificationSink for ConsoleSink {
    fn name(&self) -> &'static str {
        "console"
    }

    async fn dispatch(&self, event: &NotificationEvent) -> anyhow::Result<()> {
        let Some(text) = self.render(event) else {
            return Ok(());
        };
        let mut out = self.out.lock();
        out.write_all(text.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}
