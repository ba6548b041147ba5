//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Bus messages carry a `Stamp` (secs + nsecs since the Unix epoch)
//! - Published clouds are stamped with wall-clock time at encode time

mod blueprint;
mod cloud;
mod detection;
mod error;
mod frame;
mod fusion_config;
mod message;
mod output;
mod sink;
mod source;
mod topic;

pub use blueprint::*;
pub use cloud::*;
pub use detection::*;
pub use error::*;
pub use frame::*;
pub use fusion_config::*;
pub use message::*;
pub use output::*;
pub use sink::*;
pub use source::{StreamCallback, TopicSource};
pub use topic::TopicName;
