//! Log-based publish adapter.
//!
//! Implements [`PublishPort`] by writing channel advertisements and values
//! to the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! Advertisements are logged as one JSON object each so a host-side tool
//! can pick them up.  A future MQTT adapter would implement the same trait.

use std::collections::HashSet;

use log::{info, warn};

use crate::app::ports::{PublishError, PublishPort};
use crate::sensors::channel::ChannelSpec;

/// Adapter that logs every advertisement and value to the serial console.
pub struct LogPublisher {
    connected: bool,
    /// `node/channel` of every advertised channel.
    advertised: HashSet<String>,
    sent: u64,
}

impl Default for LogPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl LogPublisher {
    /// The console is up from boot, so the adapter starts connected.
    pub fn new() -> Self {
        Self {
            connected: true,
            advertised: HashSet::new(),
            sent: 0,
        }
    }

    pub fn set_connected(&mut self, connected: bool) {
        if connected != self.connected {
            info!("PUB   | {}", if connected { "connected" } else { "disconnected" });
        }
        self.connected = connected;
    }

    pub fn advertised_count(&self) -> usize {
        self.advertised.len()
    }

    pub fn sent_count(&self) -> u64 {
        self.sent
    }

    fn topic(node_id: &str, channel: &str) -> String {
        format!("{}/{}", node_id, channel)
    }
}

impl PublishPort for LogPublisher {
    fn advertise(&mut self, node_id: &str, spec: &ChannelSpec) -> Result<(), PublishError> {
        let topic = Self::topic(node_id, &spec.name);
        if !self.advertised.insert(topic.clone()) {
            warn!("PUB   | {} advertised twice", topic);
            return Err(PublishError::DuplicateChannel);
        }
        match serde_json::to_string(spec) {
            Ok(json) => info!("ADV   | {} {}", topic, json),
            Err(e) => warn!("ADV   | {} (unserialisable: {})", topic, e),
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn send(&mut self, node_id: &str, channel: &str, value: &str) -> Result<(), PublishError> {
        if !self.connected {
            return Err(PublishError::NotConnected);
        }
        self.sent += 1;
        info!("VALUE | {}/{} = {}", node_id, channel, value);
        Ok(())
    }
}
