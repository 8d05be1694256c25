//! Node lifecycle: the three hooks every sensor node exposes.
//!
//! ```text
//!  Constructed ──setup()──▶ Configured ──tick()──▶ Operating
//!                              │                      │
//!                              └──on_ready_to_operate()┴──▶ Ready
//! ```
//!
//! `Ready` keeps operating; there is no terminal state.  [`NodeCore`] holds
//! the state every family shares (id, lifecycle, scheduler, instances) and
//! implements error escalation, so the family nodes only add what they read
//! and what they publish.
//!
//! Every send goes through [`send_text`], which checks `is_connected()`
//! first and drops the value when the bus is offline.

use core::fmt::Write;

use log::{debug, info, warn};

use crate::app::ports::{PublishPort, SensorDriver, Tick};
use crate::error::{Error, Result, SensorFault};
use crate::scheduler::{SamplingScheduler, TickOutcome};
use crate::sensors::SensorInstance;
use crate::sensors::channel::{STATUS_ERROR, STATUS_OK};
use crate::sensors::enumerate::{ChannelLayout, enumerate};

/// Decimals used when a float is published as text.
pub const VALUE_DECIMALS: usize = 2;

/// Fits any finite `f32` at [`VALUE_DECIMALS`]: 39 integer digits, sign,
/// point and decimals.
const VALUE_TEXT_LEN: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Constructed,
    Configured,
    Operating,
    /// Operating, and the environment has signalled that publishing works.
    Ready,
}

/// Capability interface implemented once per sensor family.
///
/// The publish adapter is passed into every hook; nodes never hold it.
pub trait SensorNode<P: PublishPort> {
    fn id(&self) -> &str;

    fn lifecycle(&self) -> LifecycleState;

    /// Called exactly once before any `tick`.  Discovers instances and
    /// registers their channels.  Performs no sends.
    fn setup(&mut self, publisher: &mut P) -> Result<()>;

    /// The loop hook.  Bounded by one hardware round-trip per instance.
    fn tick(&mut self, now: Tick, publisher: &mut P) -> TickOutcome;

    /// Called at most once when publishing becomes possible.  Flushes an
    /// `error` status for every instance without a valid reading.
    fn on_ready_to_operate(&mut self, publisher: &mut P);
}

/// Shared per-node state.
pub struct NodeCore {
    id: String,
    name: String,
    state: LifecycleState,
    scheduler: SamplingScheduler,
    instances: Box<[SensorInstance]>,
}

impl NodeCore {
    pub fn new(id: &str, name: &str, scheduler: SamplingScheduler) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            state: LifecycleState::Constructed,
            scheduler,
            instances: Box::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn scheduler(&self) -> &SamplingScheduler {
        &self.scheduler
    }

    pub fn instances(&self) -> &[SensorInstance] {
        &self.instances
    }

    pub fn any_valid(&self) -> bool {
        self.instances.iter().any(SensorInstance::is_valid)
    }

    /// Setup hook body: bring the driver up and enumerate.
    pub fn setup<D, P>(
        &mut self,
        layout: &ChannelLayout<'_>,
        driver: &mut D,
        publisher: &mut P,
    ) -> Result<()>
    where
        D: SensorDriver + ?Sized,
        P: PublishPort + ?Sized,
    {
        if self.state != LifecycleState::Constructed {
            return Err(Error::Lifecycle("setup called twice"));
        }
        info!("• {} ({}):", self.name, self.id);
        driver.begin();
        self.instances = enumerate(&self.id, layout, driver, publisher)?;
        self.scheduler.log_intervals(&self.id);
        self.state = LifecycleState::Configured;
        Ok(())
    }

    /// Gate for the loop hook.  Returns `false` before setup.
    pub fn begin_tick(&mut self) -> bool {
        match self.state {
            LifecycleState::Constructed => {
                debug!("{}: tick before setup ignored", self.id);
                false
            }
            LifecycleState::Configured => {
                self.state = LifecycleState::Operating;
                true
            }
            LifecycleState::Operating | LifecycleState::Ready => true,
        }
    }

    /// Split borrows for building a node's sampling delegate.
    pub fn parts(&mut self) -> (&str, &mut SamplingScheduler, &mut [SensorInstance]) {
        (&self.id, &mut self.scheduler, &mut self.instances)
    }

    /// Ready hook body: out-of-cadence `error` for every instance that is
    /// not valid, exactly once.  Returns the number of statuses sent.
    pub fn on_ready<P: PublishPort + ?Sized>(&mut self, publisher: &mut P) -> usize {
        match self.state {
            LifecycleState::Ready => {
                debug!("{}: ready already signalled", self.id);
                return 0;
            }
            LifecycleState::Constructed => {
                warn!("{}: ready signalled before setup", self.id);
                return 0;
            }
            LifecycleState::Configured | LifecycleState::Operating => {}
        }
        self.state = LifecycleState::Ready;

        let mut flushed = 0;
        for instance in self.instances.iter().filter(|i| !i.is_valid()) {
            let fault = if instance.is_present() {
                SensorFault::Disconnected
            } else {
                SensorFault::Absent
            };
            info!(
                "{}: ready, reporting '{}' as error ({:?}, {})",
                self.id, instance.status_channel, instance.validity, fault
            );
            if send_text(publisher, &self.id, &instance.status_channel, STATUS_ERROR) {
                flushed += 1;
            }
        }
        flushed
    }
}

/// Send one value if the bus is connected.  Returns whether it was sent.
pub fn send_text<P: PublishPort + ?Sized>(
    publisher: &mut P,
    node_id: &str,
    channel: &str,
    value: &str,
) -> bool {
    if !publisher.is_connected() {
        debug!("{}/{}: {} ({})", node_id, channel, SensorFault::PublishSkipped, value);
        return false;
    }
    match publisher.send(node_id, channel, value) {
        Ok(()) => true,
        Err(e) => {
            warn!("{}/{}: send failed: {}", node_id, channel, e);
            false
        }
    }
}

/// Send a float with [`VALUE_DECIMALS`] decimals.
pub fn send_float<P: PublishPort + ?Sized>(
    publisher: &mut P,
    node_id: &str,
    channel: &str,
    value: f32,
) -> bool {
    let mut text: heapless::String<VALUE_TEXT_LEN> = heapless::String::new();
    if write!(text, "{:.*}", VALUE_DECIMALS, value).is_err() {
        warn!("{}/{}: value {} does not fit", node_id, channel, value);
        return false;
    }
    send_text(publisher, node_id, channel, &text)
}

pub fn send_bool<P: PublishPort + ?Sized>(
    publisher: &mut P,
    node_id: &str,
    channel: &str,
    value: bool,
) -> bool {
    send_text(publisher, node_id, channel, if value { "true" } else { "false" })
}

/// `ok` for a valid instance, `error` otherwise.
pub fn send_status<P: PublishPort + ?Sized>(
    publisher: &mut P,
    node_id: &str,
    instance: &SensorInstance,
) -> bool {
    let status = if instance.is_valid() { STATUS_OK } else { STATUS_ERROR };
    send_text(publisher, node_id, &instance.status_channel, status)
}
