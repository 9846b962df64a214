//! MQTT publisher for alert labels
//!
//! `MqttSink` turns each alert into one message per label and queues them on
//! the egress channel without blocking. Filtering and payloads use the
//! localized text, never the reversed terminal rendering. `MqttPublisher` owns the broker
//! connection: it connects once at startup, runs the rumqttc event loop on its
//! own task and drains the channel to the configured topic (QoS 1).

use crate::domain::types::NotificationEvent;
use crate::infra::config::Config;
use crate::io::egress_channel::{EgressMessage, EgressSender, LabelPayload};
use crate::io::sink::NotificationSink;
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// MQTT publisher actor
///
/// Receives messages from the egress channel and publishes them to the topic.
pub struct MqttPublisher {
    client: AsyncClient,
    rx: mpsc::Receiver<EgressMessage>,
    topic: String,
}

impl MqttPublisher {
    /// Create a new MQTT publisher
    ///
    /// Connects to the broker at the configured MQTT host/port.
    pub fn new(config: &Config, rx: mpsc::Receiver<EgressMessage>) -> Self {
        let client_id = config
            .mqtt_client_id()
            .map(str::to_string)
            .unwrap_or_else(|| format!("alarmwatch-{}", uuid::Uuid::now_v7().simple()));
        let mut mqttoptions =
            MqttOptions::new(client_id.clone(), config.mqtt_host(), config.mqtt_port());
        mqttoptions.set_keep_alive(Duration::from_secs(30));
        mqttoptions.set_clean_session(true);

        // Set credentials if configured
        if let (Some(username), Some(password)) = (config.mqtt_username(), config.mqtt_password()) {
            mqttoptions.set_credentials(username, password);
        }

        let (client, eventloop) = AsyncClient::new(mqttoptions, 100);

        // Spawn the eventloop handler
        tokio::spawn(async move {
            let mut eventloop = eventloop;
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!(client_id = %client_id, "mqtt_egress_connected");
                    }
                    Ok(Event::Incoming(Packet::PubAck(_))) => {
                        // QoS 1 acknowledgement received
                        debug!("mqtt_egress_puback");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "mqtt_egress_error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        Self { client, rx, topic: config.mqtt_topic().to_string() }
    }

    /// Run the publisher loop
    ///
    /// Processes messages from the channel and publishes to MQTT.
    /// Runs until shutdown signal is received or every sender is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(topic = %self.topic, "mqtt_egress_started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("mqtt_egress_shutdown");
                        // Drain remaining messages
                        while let Ok(msg) = self.rx.try_recv() {
                            self.publish_message(msg).await;
                        }
                        return;
                    }
                }
                msg = self.rx.recv() => {
                    match msg {
                        Some(msg) => self.publish_message(msg).await,
                        None => {
                            info!("mqtt_egress_channel_closed");
                            return;
                        }
                    }
                }
            }
        }
    }

    async fn publish_message(&self, msg: EgressMessage) {
        match msg {
            EgressMessage::Label(payload) => {
                let json = match serde_json::to_string(&payload) {
                    Ok(json) => json,
                    Err(e) => {
                        error!(error = %e, "mqtt_egress_encode_failed");
                        return;
                    }
                };
                // QoS 1 for alerts (at-least-once delivery)
                if let Err(e) = self
                    .client
                    .publish(&self.topic, QoS::AtLeastOnce, false, json.into_bytes())
                    .await
                {
                    error!(error = %e, label = %payload.label, "mqtt_egress_publish_failed");
                }
            }
        }
    }
}

/// Bus sink: one message per alerted label
pub struct MqttSink {
    sender: EgressSender,
    /// Lower-cased filter substrings; empty publishes everything
    filters: Vec<String>,
}

impl MqttSink {
    pub fn new(sender: EgressSender, filters: &[String]) -> Self {
        let filters = filters
            .iter()
            .map(|f| f.trim().to_lowercase())
            .filter(|f| !f.is_empty())
            .collect();
        Self { sender, filters }
    }

    /// A label passes when no filter is set, or any filter occurs in the
    /// label or its area name (case-insensitive, on the localized text)
    pub fn matches(&self, area: &str, label: &str) -> bool {
        if self.filters.is_empty() {
            return true;
        }
        let area = area.to_lowercase();
        let label = label.to_lowercase();
        self.filters.iter().any(|f| label.contains(f.as_str()) || area.contains(f.as_str()))
    }
}

#[async_trait]
impl NotificationSink for MqttSink {
    fn name(&self) -> &'static str {
        "mqtt"
    }

    async fn dispatch(&self, event: &NotificationEvent) -> anyhow::Result<()> {
        let NotificationEvent::Alert { grouped, alarm_id, at } = event else {
            return Ok(());
        };

        let ts = at.to_rfc3339();
        let mut queued = 0usize;
        let mut dropped = 0usize;
        let mut first_err = None;
        for area in &grouped.areas {
            for item in &area.labels {
                if !self.matches(&area.area.raw, &item.label.raw) {
                    continue;
                }
                let payload = LabelPayload {
                    alarm_id: alarm_id.clone(),
                    area: area.area.raw.clone(),
                    label: item.label.raw.clone(),
                    code: item.code.clone(),
                    highlighted: item.label.highlighted,
                    ts: ts.clone(),
                };
                // Attempt every label; drops are reported once at the end
                match self.sender.send_label(payload) {
                    Ok(()) => queued += 1,
                    Err(e) => {
                        dropped += 1;
                        if first_err.is_none() {
                            first_err = Some(e);
                        }
                    }
                }
            }
        }
        debug!(queued = %queued, dropped = %dropped, "mqtt_labels_queued");

        match first_err {
            Some(e) => anyhow::bail!("{} of {} labels dropped: {}", dropped, queued + dropped, e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{LabelCatalog, LabelEntry};
    use crate::domain::types::{AreaGroup, DisplayEntry, GroupedAlert, LabelItem, Language};
    use crate::io::egress_channel::create_egress_channel;
    use crate::services::grouper::group;

    fn area(name: &str, labels: &[&str]) -> AreaGroup {
        AreaGroup {
            area: DisplayEntry::plain(name),
            labels: labels
                .iter()
                .map(|l| LabelItem { code: format!("code_{}", l), label: DisplayEntry::plain(*l) })
                .collect(),
        }
    }

    fn alert() -> NotificationEvent {
        NotificationEvent::alert(
            GroupedAlert {
                areas: vec![area("Haifa Bay", &["Kiryat Ata", "Tira"]), area("Dan", &["Tel Aviv"])],
            },
            Some("42".to_string()),
        )
    }

    fn drain(rx: &mut mpsc::Receiver<EgressMessage>) -> Vec<LabelPayload> {
        let mut out = Vec::new();
        while let Ok(EgressMessage::Label(payload)) = rx.try_recv() {
            out.push(payload);
        }
        out
    }

    #[tokio::test]
    async fn test_publishes_one_message_per_label() {
        let (sender, mut rx) = create_egress_channel(16);
        let sink = MqttSink::new(sender, &[]);
        sink.dispatch(&alert()).await.unwrap();

        let sent = drain(&mut rx);
        let labels: Vec<&str> = sent.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Kiryat Ata", "Tira", "Tel Aviv"]);
        assert_eq!(sent[2].area, "Dan");
        assert_eq!(sent[2].code, "code_Tel Aviv");
        assert_eq!(sent[0].alarm_id.as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn test_filter_matches_label_or_area_case_insensitive() {
        let (sender, mut rx) = create_egress_channel(16);
        let sink = MqttSink::new(sender, &["TEL".to_string(), "haifa".to_string()]);
        sink.dispatch(&alert()).await.unwrap();

        let labels: Vec<String> = drain(&mut rx).into_iter().map(|p| p.label).collect();
        assert_eq!(labels, vec!["Kiryat Ata", "Tira", "Tel Aviv"]);

        let (sender, mut rx) = create_egress_channel(16);
        let sink = MqttSink::new(sender, &["tira".to_string()]);
        sink.dispatch(&alert()).await.unwrap();
        let labels: Vec<String> = drain(&mut rx).into_iter().map(|p| p.label).collect();
        assert_eq!(labels, vec!["Tira"]);
    }

    #[tokio::test]
    async fn test_ignores_routine_and_error() {
        let (sender, mut rx) = create_egress_channel(16);
        let sink = MqttSink::new(sender, &[]);
        sink.dispatch(&NotificationEvent::routine()).await.unwrap();
        sink.dispatch(&NotificationEvent::error("boom")).await.unwrap();
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_full_queue_is_reported_not_blocking() {
        let (sender, mut rx) = create_egress_channel(1);
        let sink = MqttSink::new(sender, &[]);
        let err = sink.dispatch(&alert()).await.unwrap_err();
        assert_eq!(err.to_string(), "2 of 3 labels dropped: MQTT egress queue is full");

        let sent = drain(&mut rx);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].label, "Kiryat Ata");
    }

    #[tokio::test]
    async fn test_reversed_display_does_not_affect_filter_or_payload() {
        let catalog: LabelCatalog =
            [("c".to_string(), LabelEntry::default().with(Language::En, "Dan", "Tel Aviv"))]
                .into_iter()
                .collect();
        let grouped = group(&catalog, &["c".to_string()], Language::En, true, None);
        assert_eq!(grouped.areas[0].labels[0].label.text, "vivA leT");

        let (sender, mut rx) = create_egress_channel(4);
        let sink = MqttSink::new(sender, &["tel".to_string()]);
        sink.dispatch(&NotificationEvent::alert(grouped, Some("5".to_string()))).await.unwrap();

        let sent = drain(&mut rx);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].label, "Tel Aviv");
        assert_eq!(sent[0].area, "Dan");
        assert_eq!(sent[0].code, "c");
    }

    #[test]
    fn test_blank_filters_are_ignored() {
        let (sender, _rx) = create_egress_channel(1);
        let sink = MqttSink::new(sender, &["  ".to_string()]);
        assert!(sink.matches("anything", "at all"));
    }
}
