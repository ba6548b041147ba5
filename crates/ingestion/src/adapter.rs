//! Stream adapter trait

use std::sync::Arc;

use async_channel::Sender;
use contracts::{StreamKind, StreamPacket, TopicName};

use crate::config::IntakeMetrics;

/// Adapter between a packet source and the intake channel.
///
/// One adapter per subscribed topic, responsible for:
/// 1. registering the source callback
/// 2. forwarding packets into the shared bounded channel
/// 3. dropping on a full channel and counting the drop
pub trait StreamAdapter: Send + Sync {
    /// Topic this adapter feeds from.
    fn topic(&self) -> TopicName;

    /// Logical stream the topic carries.
    fn kind(&self) -> StreamKind;

    /// Start forwarding packets.
    ///
    /// # Arguments
    /// * `tx` - shared intake channel sender
    /// * `metrics` - shared intake metrics
    fn start(&self, tx: Sender<StreamPacket>, metrics: Arc<IntakeMetrics>);

    /// Stop forwarding packets.
    fn stop(&self);

    /// Whether the adapter is currently forwarding.
    fn is_listening(&self) -> bool;
}
