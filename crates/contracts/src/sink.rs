//! OutputSink - async destination for fusion output
//!
//! Sinks receive every published `FrameOutput` and forward whatever subset
//! they care about. Defined with `trait_variant` so the dispatcher can hold
//! sinks behind a `Send` bound while single-threaded tests use the local
//! variant directly.

use crate::error::PerceptionError;
use crate::output::FrameOutput;

/// Async sink for published frame output.
///
/// `OutputSink` is the `Send` variant used by the dispatcher's worker
/// tasks; `LocalOutputSink` exists for single-threaded use.
#[trait_variant::make(OutputSink: Send)]
pub trait LocalOutputSink {
    /// Sink name for logs and metrics.
    fn name(&self) -> &str;

    /// Publish one frame's output.
    async fn publish(&mut self, output: &FrameOutput) -> Result<(), PerceptionError>;

    /// Flush any buffered writes.
    async fn flush(&mut self) -> Result<(), PerceptionError>;

    /// Close the sink, flushing first. The sink must not be used after.
    async fn close(&mut self) -> Result<(), PerceptionError>;
}
