//! Latest-wins depth frame slot.
//!
//! A single-slot overwrite cache: depth frames are never queued, the newest
//! write unconditionally replaces the previous one. The version counter is
//! monotonic so readers can tell which write they observed. Association
//! with color frames is best-effort by design — the staleness bound equals
//! the depth channel's own delivery latency.

use contracts::RawFrame;

#[derive(Debug, Default)]
pub struct DepthSlot {
    frame: Option<RawFrame>,
    version: u64,
    replaced: u64,
}

impl DepthSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored frame. Returns the new version.
    pub fn update(&mut self, frame: RawFrame) -> u64 {
        if self.frame.is_some() {
            self.replaced += 1;
        }
        self.frame = Some(frame);
        self.version += 1;
        self.version
    }

    /// Currently stored frame, if any depth has arrived yet.
    pub fn get(&self) -> Option<&RawFrame> {
        self.frame.as_ref()
    }

    /// Owned copy of the stored frame. Cheap: the depth plane is shared,
    /// not duplicated, so in-flight fusion keeps its snapshot even if a
    /// newer depth frame lands mid-cycle.
    pub fn snapshot(&self) -> Option<RawFrame> {
        self.frame.clone()
    }

    /// Monotonic write counter; 0 means never written.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// How many stored frames were overwritten before being consumed.
    pub fn replaced_count(&self) -> u64 {
        self.replaced
    }
}
