//! Stream intake
//!
//! Bridges stream sources to the fusion pipeline. A [`TopicSource`] of any
//! origin (live bus client, mock rig, replay recording) is wrapped by a
//! [`GenericStreamAdapter`] and registered with an [`IntakePipeline`],
//! which fans every packet into one bounded channel. When the channel is
//! full the newest packet is dropped so a slow consumer never stalls the
//! sources.
//!
//! [`TopicSource`]: contracts::TopicSource

pub mod adapter;
pub mod config;
pub mod error;
pub mod generic_adapter;
pub mod mock;
pub mod pipeline;
pub mod replay;

pub use adapter::StreamAdapter;
pub use config::{BackpressureConfig, IntakeMetrics, IntakeSnapshot};
pub use error::{IntakeError, Result};
pub use generic_adapter::GenericStreamAdapter;
pub use mock::{MockStreamConfig, MockTopicSource};
pub use pipeline::IntakePipeline;
pub use replay::{ReplayConfig, ReplayTopicSource};
