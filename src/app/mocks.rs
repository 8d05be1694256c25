//! Mock adapters shared by the unit tests.
//!
//! `MockDriver` serves scripted raw values; `RecordingPublisher` records
//! every advertisement and send so tests can assert on the full history.

use crate::app::ports::{PublishError, PublishPort, SensorDriver};
use crate::sensors::channel::{ChannelSpec, SensorAddress};

pub struct MockDriver {
    pub values: Vec<f32>,
    pub addresses: Vec<Option<SensorAddress>>,
    pub conversions: usize,
    pub began: bool,
}

impl MockDriver {
    pub fn with_values(values: &[f32]) -> Self {
        Self {
            values: values.to_vec(),
            addresses: Vec::new(),
            conversions: 0,
            began: false,
        }
    }

    pub fn set(&mut self, index: usize, raw: f32) {
        self.values[index] = raw;
    }
}

impl SensorDriver for MockDriver {
    fn begin(&mut self) {
        self.began = true;
    }

    fn count(&mut self) -> usize {
        self.values.len()
    }

    fn address(&mut self, index: usize) -> Option<SensorAddress> {
        self.addresses.get(index).cloned().flatten()
    }

    fn request_conversion(&mut self) {
        self.conversions += 1;
    }

    fn read_raw(&mut self, index: usize) -> f32 {
        self.values.get(index).copied().unwrap_or(f32::NAN)
    }
}

pub struct RecordingPublisher {
    pub connected: bool,
    pub reject_advertise: bool,
    pub advertised: Vec<(String, ChannelSpec)>,
    /// `(node, channel, value)` in send order.
    pub sent: Vec<(String, String, String)>,
}

#[allow(dead_code)]
impl RecordingPublisher {
    pub fn connected() -> Self {
        Self {
            connected: true,
            reject_advertise: false,
            advertised: Vec::new(),
            sent: Vec::new(),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            connected: false,
            ..Self::connected()
        }
    }

    pub fn advertised_names(&self) -> Vec<&str> {
        self.advertised.iter().map(|(_, s)| s.name.as_str()).collect()
    }

    /// Every value sent to `channel`, oldest first.
    pub fn values_for(&self, channel: &str) -> Vec<&str> {
        self.sent
            .iter()
            .filter(|(_, c, _)| c == channel)
            .map(|(_, _, v)| v.as_str())
            .collect()
    }

    pub fn last_value(&self, channel: &str) -> Option<&str> {
        self.values_for(channel).last().copied()
    }
}

impl PublishPort for RecordingPublisher {
    fn advertise(&mut self, node_id: &str, spec: &ChannelSpec) -> Result<(), PublishError> {
        if self.reject_advertise {
            return Err(PublishError::Rejected);
        }
        self.advertised.push((node_id.to_string(), spec.clone()));
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn send(&mut self, node_id: &str, channel: &str, value: &str) -> Result<(), PublishError> {
        if !self.connected {
            return Err(PublishError::NotConnected);
        }
        self.sent
            .push((node_id.to_string(), channel.to_string(), value.to_string()));
        Ok(())
    }
}
