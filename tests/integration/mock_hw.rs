//! Mock adapters for integration tests.
//!
//! `ScriptedDriver` serves raw values the test can change between ticks;
//! `BusRecorder` keeps every advertisement and send so tests can assert on
//! the full publish history without a real telemetry bus.

use std::cell::RefCell;
use std::rc::Rc;

use telenode::app::ports::{ClockPort, PublishError, PublishPort, SensorDriver, Tick};
use telenode::sensors::channel::{ChannelSpec, SensorAddress};

// ── Driver ────────────────────────────────────────────────────

/// Raw values shared with the test after the driver moves into a node.
pub type Script = Rc<RefCell<Vec<f32>>>;

pub struct ScriptedDriver {
    script: Script,
    pub addresses: Vec<&'static str>,
}

#[allow(dead_code)]
impl ScriptedDriver {
    pub fn new(values: &[f32]) -> (Self, Script) {
        let script = Rc::new(RefCell::new(values.to_vec()));
        let driver = Self {
            script: Rc::clone(&script),
            addresses: Vec::new(),
        };
        (driver, script)
    }

    pub fn with_addresses(mut self, addresses: &[&'static str]) -> Self {
        self.addresses = addresses.to_vec();
        self
    }
}

impl SensorDriver for ScriptedDriver {
    fn count(&mut self) -> usize {
        self.script.borrow().len()
    }

    fn address(&mut self, index: usize) -> Option<SensorAddress> {
        let addr = self.addresses.get(index)?;
        let mut out = SensorAddress::new();
        out.push_str(addr).ok()?;
        Some(out)
    }

    fn read_raw(&mut self, index: usize) -> f32 {
        self.script.borrow().get(index).copied().unwrap_or(f32::NAN)
    }
}

// ── Publisher ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Sent {
    pub node: String,
    pub channel: String,
    pub value: String,
}

pub struct BusRecorder {
    pub connected: bool,
    pub advertised: Vec<(String, ChannelSpec)>,
    pub sent: Vec<Sent>,
}

#[allow(dead_code)]
impl BusRecorder {
    pub fn new(connected: bool) -> Self {
        Self {
            connected,
            advertised: Vec::new(),
            sent: Vec::new(),
        }
    }

    pub fn advertised_names(&self) -> Vec<&str> {
        self.advertised.iter().map(|(_, s)| s.name.as_str()).collect()
    }

    pub fn values_for(&self, channel: &str) -> Vec<&str> {
        self.sent
            .iter()
            .filter(|s| s.channel == channel)
            .map(|s| s.value.as_str())
            .collect()
    }

    pub fn clear_sent(&mut self) {
        self.sent.clear();
    }
}

impl PublishPort for BusRecorder {
    fn advertise(&mut self, node_id: &str, spec: &ChannelSpec) -> Result<(), PublishError> {
        if self
            .advertised
            .iter()
            .any(|(n, s)| n == node_id && s.name == spec.name)
        {
            return Err(PublishError::DuplicateChannel);
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
        self.sent.push(Sent {
            node: node_id.to_string(),
            channel: channel.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }
}

// ── Clock ─────────────────────────────────────────────────────

pub struct ManualClock {
    now: std::cell::Cell<Tick>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn at(now: Tick) -> Self {
        Self {
            now: std::cell::Cell::new(now),
        }
    }

    pub fn set(&self, now: Tick) {
        self.now.set(now);
    }
}

impl ClockPort for ManualClock {
    fn now_ms(&self) -> Tick {
        self.now.get()
    }
}
