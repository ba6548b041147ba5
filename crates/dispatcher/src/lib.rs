//! # Dispatcher
//!
//! Fans published fusion output out to configured sinks. Each sink runs
//! on its own worker task behind a bounded queue, so a slow or failing
//! sink drops its own output instead of stalling the pipeline.

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{FrameOutput, OutputSink};
pub use dispatcher::{create_dispatcher, Dispatcher, DispatcherBuilder, DispatcherConfig};
pub use error::DispatcherError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{FileSink, LogSink, NetworkSink};
