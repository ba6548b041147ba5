//! TopicSource - abstraction over anything that produces stream packets
//!
//! A source is subscribed with a callback; implementations (websocket bus
//! subscription, mock camera rig, recording replay) invoke the callback from
//! their own task whenever a packet arrives. `stop` must be idempotent.

use std::sync::Arc;

use crate::message::{StreamKind, StreamPacket};
use crate::topic::TopicName;

/// Packet delivery callback. Shared so a source task can hold it across
/// awaits while the caller keeps its own handle.
pub type StreamCallback = Arc<dyn Fn(StreamPacket) + Send + Sync>;

/// A subscribable stream of packets for one topic.
pub trait TopicSource: Send + Sync {
    /// Topic this source delivers.
    fn topic(&self) -> TopicName;

    /// Which logical stream the topic carries.
    fn kind(&self) -> StreamKind;

    /// Begin delivering packets to `callback`. Calling `listen` on an
    /// already-listening source replaces the callback.
    fn listen(&self, callback: StreamCallback);

    /// Stop delivering packets. Idempotent.
    fn stop(&self);

    /// Whether the source is currently delivering.
    fn is_listening(&self) -> bool;
}
