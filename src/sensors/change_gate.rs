//! Threshold gate deciding whether a new value counts as "changed".
//!
//! Every comparison is against the last *accepted* value, so a slow drift
//! made of sub-threshold steps still trips the gate once the total move
//! exceeds the threshold.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeGate {
    last_accepted: f32,
    min_change: f32,
}

impl ChangeGate {
    /// Negative thresholds are treated as 0.
    pub fn new(min_change: f32) -> Self {
        Self {
            last_accepted: 0.0,
            min_change: min_change.max(0.0),
        }
    }

    /// `true` iff `|new - last_accepted| > min_change`.  Accepts `new` on change.
    pub fn evaluate(&mut self, new: f32) -> bool {
        let changed = (new - self.last_accepted).abs() > self.min_change;
        if changed {
            self.last_accepted = new;
        }
        changed
    }

    pub fn last_accepted(&self) -> f32 {
        self.last_accepted
    }

    pub fn threshold(&self) -> f32 {
        self.min_change
    }

    pub fn set_threshold(&mut self, min_change: f32) {
        self.min_change = min_change.max(0.0);
    }
}
