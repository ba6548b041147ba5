//! Publish-rate gate with deferred commit.
//!
//! Two-phase so that a frame which fails mid-processing does not consume
//! publish budget: `ready` only checks the elapsed interval, `commit` is
//! called after the frame was fully processed. Frames arriving while the
//! gate is closed are dropped, never queued.

#[derive(Debug)]
pub struct RateGate {
    min_interval_s: f64,
    last_commit: Option<f64>,
}

impl RateGate {
    pub fn new(min_interval_s: f64) -> Self {
        Self {
            min_interval_s: min_interval_s.max(0.0),
            last_commit: None,
        }
    }

    /// Whether a frame arriving at `now_s` may be processed.
    pub fn ready(&self, now_s: f64) -> bool {
        match self.last_commit {
            Some(last) => now_s - last >= self.min_interval_s,
            None => true,
        }
    }

    /// Mark a frame as processed at `now_s`, closing the gate for the
    /// configured interval.
    pub fn commit(&mut self, now_s: f64) {
        self.last_commit = Some(now_s);
    }
}
