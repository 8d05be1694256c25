//! Node host: the single driver loop.
//!
//! [`NodeHost`] owns the publish adapter and every registered sensor node.
//! It calls each node's lifecycle hooks in registration order, and it is
//! the only place that decides when the environment is "ready to operate".
//! All I/O flows through the port traits, so the host runs unchanged
//! against mock adapters.
//!
//! ```text
//!  ClockPort ──▶ ┌──────────────────────────┐ ──▶ PublishPort
//!                │         NodeHost         │
//!                │  node · node · node ...  │
//!                └──────────────────────────┘
//! ```

use embedded_hal::delay::DelayNs;
use log::{error, info};

use crate::error::{Error, Result};
use crate::sensors::node::SensorNode;

use super::ports::{ClockPort, PublishPort, Tick};

// ───────────────────────────────────────────────────────────────
// Host
// ───────────────────────────────────────────────────────────────

struct Slot<P> {
    node: Box<dyn SensorNode<P>>,
    /// Set once setup succeeded; failed nodes never tick.
    active: bool,
}

/// What one host tick did across all nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HostTick {
    pub measured: usize,
    pub published: usize,
    /// The ready signal went out on this tick.
    pub became_ready: bool,
}

/// Drives a fixed set of sensor nodes from one loop.
pub struct NodeHost<P: PublishPort> {
    publisher: P,
    slots: Vec<Slot<P>>,
    set_up: bool,
    ready: bool,
}

impl<P: PublishPort> NodeHost<P> {
    pub fn new(publisher: P) -> Self {
        Self {
            publisher,
            slots: Vec::new(),
            set_up: false,
            ready: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Add a node.  Only allowed before [`setup`](Self::setup).
    pub fn register(&mut self, node: impl SensorNode<P> + 'static) -> Result<()> {
        if self.set_up {
            return Err(Error::Lifecycle("register after setup"));
        }
        info!("NodeHost: registered '{}'", node.id());
        self.slots.push(Slot {
            node: Box::new(node),
            active: false,
        });
        Ok(())
    }

    /// Run every node's setup hook once.  A node whose setup fails is
    /// logged and left out of the loop; the others carry on.
    ///
    /// Returns the number of active nodes.
    pub fn setup(&mut self) -> Result<usize> {
        if self.set_up {
            return Err(Error::Lifecycle("host setup called twice"));
        }
        self.set_up = true;

        for slot in &mut self.slots {
            match slot.node.setup(&mut self.publisher) {
                Ok(()) => slot.active = true,
                Err(e) => error!("NodeHost: '{}' setup failed: {}", slot.node.id(), e),
            }
        }

        let active = self.active_count();
        info!("NodeHost: {}/{} node(s) active", active, self.slots.len());
        Ok(active)
    }

    /// Call every active node's loop hook with the same tick.
    pub fn tick(&mut self, now: Tick) -> HostTick {
        let mut summary = HostTick::default();
        for slot in self.slots.iter_mut().filter(|s| s.active) {
            let outcome = slot.node.tick(now, &mut self.publisher);
            summary.measured += usize::from(outcome.measured);
            summary.published += usize::from(outcome.published);
        }
        summary
    }

    /// Tell every active node that publishing is now possible.  Only the
    /// first call has any effect; returns whether this was it.
    pub fn signal_ready(&mut self) -> bool {
        if self.ready {
            return false;
        }
        if !self.set_up {
            // Nodes cannot flush anything before their channels exist.
            return false;
        }
        self.ready = true;
        info!("NodeHost: ready to operate");
        for slot in self.slots.iter_mut().filter(|s| s.active) {
            slot.node.on_ready_to_operate(&mut self.publisher);
        }
        true
    }

    // ── Loop ──────────────────────────────────────────────────

    /// One loop iteration: tick every node, then signal readiness if this
    /// is the first tick with the bus connected.  The ready flush thus sees
    /// this tick's measurements.
    pub fn run_once(&mut self, clock: &impl ClockPort) -> HostTick {
        let mut summary = self.tick(clock.now_ms());
        summary.became_ready =
            !self.ready && self.publisher.is_connected() && self.signal_ready();
        summary
    }

    /// Loop forever with `interval_ms` between iterations.
    pub fn run_forever(
        &mut self,
        clock: &impl ClockPort,
        delay: &mut impl DelayNs,
        interval_ms: u32,
    ) -> ! {
        info!("NodeHost: entering loop, {} ms per tick", interval_ms);
        loop {
            self.run_once(clock);
            delay.delay_ms(interval_ms);
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn publisher_mut(&mut self) -> &mut P {
        &mut self.publisher
    }

    pub fn node_count(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.active).count()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Node ids in registration order.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.node.id())
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
