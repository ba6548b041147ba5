//! Generic stream adapter
//!
//! Adapts any `TopicSource` to the intake channel. Bus subscriptions,
//! the mock camera rig and replay sources all arrive here.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_channel::{Sender, TrySendError};
use contracts::{StreamCallback, StreamKind, StreamPacket, TopicName, TopicSource};
use tracing::{debug, trace, warn};

use crate::adapter::StreamAdapter;
use crate::config::IntakeMetrics;

/// Forward one packet, dropping on a full channel.
#[inline]
pub(crate) fn send_packet(
    tx: &Sender<StreamPacket>,
    packet: StreamPacket,
    metrics: &Arc<IntakeMetrics>,
    topic: &TopicName,
) {
    match tx.try_send(packet) {
        Ok(_) => {
            metrics.update_queue_len(tx.len());
            trace!(topic = %topic, "packet forwarded");
        }
        Err(TrySendError::Full(_)) => {
            metrics.record_dropped();
            metrics::counter!("rgbd_fuser_intake_dropped", "topic" => topic.to_string())
                .increment(1);
            trace!(topic = %topic, "packet dropped, channel full");
        }
        Err(TrySendError::Closed(_)) => {
            warn!(topic = %topic, "intake channel closed");
        }
    }
}

/// Generic stream adapter over a `TopicSource`.
pub struct GenericStreamAdapter {
    source: Box<dyn TopicSource>,
    listening: Arc<AtomicBool>,
}

impl GenericStreamAdapter {
    pub fn new(source: Box<dyn TopicSource>) -> Self {
        Self {
            source,
            listening: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl StreamAdapter for GenericStreamAdapter {
    fn topic(&self) -> TopicName {
        self.source.topic()
    }

    fn kind(&self) -> StreamKind {
        self.source.kind()
    }

    fn start(&self, tx: Sender<StreamPacket>, metrics: Arc<IntakeMetrics>) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let topic = self.topic();
        let listening = self.listening.clone();

        debug!(topic = %topic, "starting stream adapter");

        let callback: StreamCallback = Arc::new(move |packet| {
            if !listening.load(Ordering::Relaxed) {
                return;
            }

            metrics.record_received();
            send_packet(&tx, packet, &metrics, &topic);
        });

        self.source.listen(callback);
    }

    fn stop(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            debug!(topic = %self.topic(), "stopping stream adapter");
            self.source.stop();
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_channel::bounded;
    use contracts::{ImageMessage, MessageHeader, PayloadBytes, Stamp};
    use std::sync::Mutex;

    /// Source that delivers packets only when poked from the test.
    struct ManualSource {
        topic: TopicName,
        callback: Mutex<Option<StreamCallback>>,
        listening: AtomicBool,
    }

    impl ManualSource {
        fn new(topic: &str) -> Self {
            Self {
                topic: TopicName::from(topic),
                callback: Mutex::new(None),
                listening: AtomicBool::new(false),
            }
        }
    }

    impl TopicSource for ManualSource {
        fn topic(&self) -> TopicName {
            self.topic.clone()
        }

        fn kind(&self) -> StreamKind {
            StreamKind::Color
        }

        fn listen(&self, callback: StreamCallback) {
            self.listening.store(true, Ordering::SeqCst);
            *self.callback.lock().unwrap() = Some(callback);
        }

        fn stop(&self) {
            self.listening.store(false, Ordering::SeqCst);
        }

        fn is_listening(&self) -> bool {
            self.listening.load(Ordering::Relaxed)
        }
    }

    fn make_packet(topic: &str) -> StreamPacket {
        StreamPacket::image(
            TopicName::from(topic),
            StreamKind::Color,
            ImageMessage {
                header: MessageHeader {
                    stamp: Stamp::new(1, 0),
                    ..Default::default()
                },
                height: 1,
                width: 1,
                encoding: "bgr8".into(),
                data: PayloadBytes::from(vec![0u8, 0, 0]),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_forwarding_and_drop_on_full() {
        let source = Arc::new(ManualSource::new("/camera/rgb/image_raw"));
        let adapter = GenericStreamAdapter::new(Box::new(SharedSource(source.clone())));

        let (tx, rx) = bounded(2);
        let metrics = Arc::new(IntakeMetrics::new());
        adapter.start(tx, metrics.clone());
        assert!(adapter.is_listening());

        let callback = source.callback.lock().unwrap().clone().unwrap();
        for _ in 0..3 {
            callback(make_packet("/camera/rgb/image_raw"));
        }

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.packets_received, 3);
        assert_eq!(snapshot.packets_dropped, 1);
        assert_eq!(rx.len(), 2);
    }

    #[test]
    fn test_stop_mutes_callback() {
        let source = Arc::new(ManualSource::new("/camera/rgb/image_raw"));
        let adapter = GenericStreamAdapter::new(Box::new(SharedSource(source.clone())));

        let (tx, rx) = bounded(10);
        let metrics = Arc::new(IntakeMetrics::new());
        adapter.start(tx, metrics.clone());

        let callback = source.callback.lock().unwrap().clone().unwrap();
        adapter.stop();
        assert!(!adapter.is_listening());

        // A late delivery after stop is ignored
        callback(make_packet("/camera/rgb/image_raw"));
        assert_eq!(rx.len(), 0);
        assert_eq!(metrics.snapshot().packets_received, 0);
    }

    /// Box-able wrapper so the test keeps a handle to the source.
    struct SharedSource(Arc<ManualSource>);

    impl TopicSource for SharedSource {
        fn topic(&self) -> TopicName {
            self.0.topic()
        }
        fn kind(&self) -> StreamKind {
            self.0.kind()
        }
        fn listen(&self, callback: StreamCallback) {
            self.0.listen(callback)
        }
        fn stop(&self) {
            self.0.stop()
        }
        fn is_listening(&self) -> bool {
            self.0.is_listening()
        }
    }
}
