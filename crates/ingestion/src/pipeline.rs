//! Intake pipeline main entry

use std::collections::HashMap;
use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender};
use contracts::{StreamPacket, TopicName, TopicSource};
use tracing::{debug, info, instrument};

use crate::adapter::StreamAdapter;
use crate::config::{BackpressureConfig, IntakeMetrics};
use crate::generic_adapter::GenericStreamAdapter;

/// Intake pipeline
///
/// Owns one adapter per subscribed topic; all adapters share a single
/// bounded channel so the consumer sees one interleaved packet stream.
pub struct IntakePipeline {
    /// Registered adapters by topic
    adapters: HashMap<TopicName, Box<dyn StreamAdapter>>,

    /// Shared metrics
    metrics: Arc<IntakeMetrics>,

    /// Packet sender, cloned into every adapter
    tx: Sender<StreamPacket>,

    /// Packet receiver
    rx: Option<Receiver<StreamPacket>>,
}

impl IntakePipeline {
    /// Create a pipeline with the given channel capacity.
    pub fn new(channel_capacity: usize) -> Self {
        Self::with_config(BackpressureConfig::new(channel_capacity))
    }

    pub fn with_config(config: BackpressureConfig) -> Self {
        let (tx, rx) = bounded(config.channel_capacity);

        Self {
            adapters: HashMap::new(),
            metrics: Arc::new(IntakeMetrics::new()),
            tx,
            rx: Some(rx),
        }
    }

    /// Register a packet source.
    ///
    /// A second registration for the same topic replaces the first.
    #[instrument(name = "intake_register_source", skip(self, source))]
    pub fn register_source(&mut self, source: Box<dyn TopicSource>) {
        let topic = source.topic();
        debug!(topic = %topic, kind = source.kind().as_str(), "registered stream source");
        self.adapters
            .insert(topic, Box::new(GenericStreamAdapter::new(source)));
    }

    /// Start all registered sources.
    #[instrument(name = "intake_start_all", skip(self))]
    pub fn start_all(&self) {
        info!(count = self.adapters.len(), "starting all stream adapters");
        for (topic, adapter) in &self.adapters {
            if !adapter.is_listening() {
                debug!(topic = %topic, "starting adapter");
                adapter.start(self.tx.clone(), self.metrics.clone());
            }
        }
    }

    /// Stop all sources. Idempotent.
    #[instrument(name = "intake_stop_all", skip(self))]
    pub fn stop_all(&self) {
        info!(count = self.adapters.len(), "stopping all stream adapters");
        for (topic, adapter) in &self.adapters {
            if adapter.is_listening() {
                debug!(topic = %topic, "stopping adapter");
                adapter.stop();
            }
        }
    }

    /// Take the packet receiver.
    ///
    /// Note: can only be called once; subsequent calls return None.
    pub fn take_receiver(&mut self) -> Option<Receiver<StreamPacket>> {
        self.rx.take()
    }

    /// Shared metrics handle.
    pub fn metrics(&self) -> Arc<IntakeMetrics> {
        self.metrics.clone()
    }

    /// Number of registered topics.
    pub fn source_count(&self) -> usize {
        self.adapters.len()
    }

    /// Whether the given topic's adapter is forwarding.
    pub fn is_topic_listening(&self, topic: &str) -> bool {
        self.adapters
            .get(topic)
            .map(|a| a.is_listening())
            .unwrap_or(false)
    }
}

impl Drop for IntakePipeline {
    fn drop(&mut self) {
        self.stop_all();
    }
}
