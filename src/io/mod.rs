//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `feed` - Alert feed wire format decoding
//! - `poller` - HTTP client for the upstream alert feed
//! - `sink` - Notification sink interface and the disabled stand-in
//! - `console` - Timestamped terminal output
//! - `desktop` - OS desktop notifications
//! - `egress_channel` - Typed channel for MQTT egress messages
//! - `mqtt_egress` - MQTT bus sink and publisher

pub mod console;
pub mod desktop;
pub mod egress_channel;
pub mod feed;
pub mod mqtt_egress;
pub mod poller;
pub mod sink;

// Re-export commonly used types
pub use console::{ConsoleOptions, ConsoleSink};
pub use desktop::DesktopSink;
pub use egress_channel::{create_egress_channel, EgressSender, LabelPayload};
pub use mqtt_egress::{MqttPublisher, MqttSink};
pub use poller::{AlertFeed, HttpPoller};
pub use sink::{NoopSink, NotificationSink};
