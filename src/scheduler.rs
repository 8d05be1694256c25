//! Sampling scheduler: two independent cadences on one tick source.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        loop() tick                           │
//! │                             │                                │
//! │              ┌──────────────┴──────────────┐                 │
//! │              ▼                             ▼                 │
//! │   elapsed >= measurement?        elapsed >= publish?         │
//! │   (or never measured)            (or never published)        │
//! │              │                    AND any instance valid     │
//! │              ▼                             │                 │
//! │   delegate.measure(now)                    ▼                 │
//! │   last_measurement = now         delegate.publish(now)       │
//! │                                  last_publish = now          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The scheduler notifies a [`SamplingDelegate`] when a cadence fires; it
//! knows nothing about instances or channels.  The measurement pass always
//! completes before the publish pass of the same tick starts, and a publish
//! tick is only consumed once something valid was published.

use crate::app::ports::{SamplingDelegate, Tick};
use log::{debug, info, warn};

/// Wraparound-safe `now - since` on the free-running tick counter.
pub fn elapsed(now: Tick, since: Tick) -> u32 {
    now.wrapping_sub(since)
}

/// Timing state of one node.  `None` means "never yet run".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleState {
    pub last_measurement: Option<Tick>,
    pub last_publish: Option<Tick>,
    pub measurement_interval_ms: u32,
    pub publish_interval_ms: u32,
}

/// What happened during one [`SamplingScheduler::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    pub measured: bool,
    pub published: bool,
}

/// Drives the measurement and publish cadences of one node.
pub struct SamplingScheduler {
    state: ScheduleState,
}

impl SamplingScheduler {
    /// A publish interval shorter than the measurement interval is allowed;
    /// the publish pass then fires on its own threshold and republishes the
    /// latest measured values.
    pub fn new(measurement_interval_ms: u32, publish_interval_ms: u32) -> Self {
        if publish_interval_ms < measurement_interval_ms {
            warn!(
                "Scheduler: publish interval {}ms shorter than measurement interval {}ms",
                publish_interval_ms, measurement_interval_ms
            );
        }
        Self {
            state: ScheduleState {
                last_measurement: None,
                last_publish: None,
                measurement_interval_ms,
                publish_interval_ms,
            },
        }
    }

    /// Run one tick.  Call once per `loop()` with the current tick.
    pub fn tick(&mut self, now: Tick, delegate: &mut impl SamplingDelegate) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        if self.measurement_due(now) {
            delegate.measure(now);
            // Advance even when every reading was invalid.
            self.state.last_measurement = Some(now);
            outcome.measured = true;
        }

        if self.publish_due(now) {
            if delegate.has_valid_reading() {
                delegate.publish(now);
                self.state.last_publish = Some(now);
                outcome.published = true;
            } else {
                debug!("Scheduler: publish due at {} but no valid reading, retrying", now);
            }
        }

        outcome
    }

    pub fn measurement_due(&self, now: Tick) -> bool {
        match self.state.last_measurement {
            None => true,
            Some(last) => elapsed(now, last) >= self.state.measurement_interval_ms,
        }
    }

    pub fn publish_due(&self, now: Tick) -> bool {
        match self.state.last_publish {
            None => true,
            Some(last) => elapsed(now, last) >= self.state.publish_interval_ms,
        }
    }

    pub fn state(&self) -> &ScheduleState {
        &self.state
    }

    /// Log the configured cadences (node setup caption).
    pub fn log_intervals(&self, node_id: &str) {
        info!(
            "{}: reading interval {} ms, publish interval {} ms",
            node_id, self.state.measurement_interval_ms, self.state.publish_interval_ms
        );
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
