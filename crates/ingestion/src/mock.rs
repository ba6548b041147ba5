//! Mock camera rig
//!
//! Synthetic color/depth/camera-info sources for running the pipeline
//! without a bus. Each source is a background thread publishing at its
//! configured rate; the three constructors share one config so a rig is
//! geometrically consistent across streams.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use contracts::{
    CameraInfoMessage, ImageMessage, MessageHeader, PayloadBytes, Stamp, StreamCallback,
    StreamKind, StreamPacket, TopicName, TopicSource,
};
use tracing::{debug, trace};

/// Mock stream configuration
#[derive(Debug, Clone)]
pub struct MockStreamConfig {
    /// Publish rate (Hz)
    pub frequency_hz: f64,

    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Uniform scene depth in meters
    pub depth_m: f32,

    /// Pinhole intrinsics fx, fy, cx, cy
    pub intrinsics: [f64; 4],
}

impl Default for MockStreamConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 10.0,
            width: 64,
            height: 48,
            depth_m: 2.0,
            intrinsics: [525.0, 525.0, 32.0, 24.0],
        }
    }
}

/// Which payload a mock source publishes.
#[derive(Debug, Clone, Copy)]
enum MockStream {
    Color,
    Depth,
    CameraInfo,
}

/// Mock topic source
///
/// Generates synthetic packets at a fixed rate until stopped.
pub struct MockTopicSource {
    topic: TopicName,
    stream: MockStream,
    config: MockStreamConfig,
    listening: Arc<AtomicBool>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl MockTopicSource {
    /// Color stream: BGR8 gradient frames on the default color topic.
    pub fn color(config: MockStreamConfig) -> Self {
        Self::with_topic("/camera/rgb/image_raw", MockStream::Color, config)
    }

    /// Depth stream: flat 32FC1 planes on the default depth topic.
    pub fn depth(config: MockStreamConfig) -> Self {
        Self::with_topic("/camera/depth/image_raw", MockStream::Depth, config)
    }

    /// Calibration stream on the default camera-info topic.
    pub fn camera_info(config: MockStreamConfig) -> Self {
        Self::with_topic("/camera/rgb/camera_info", MockStream::CameraInfo, config)
    }

    fn with_topic(topic: &str, stream: MockStream, config: MockStreamConfig) -> Self {
        Self {
            topic: TopicName::from(topic),
            stream,
            config,
            listening: Arc::new(AtomicBool::new(false)),
            thread_handle: Mutex::new(None),
        }
    }

    /// Same source on a non-default topic.
    pub fn on_topic(mut self, topic: &str) -> Self {
        self.topic = TopicName::from(topic);
        self
    }

    fn build_packet(
        topic: &TopicName,
        stream: MockStream,
        config: &MockStreamConfig,
        seq: u32,
    ) -> StreamPacket {
        let header = MessageHeader {
            seq,
            stamp: Stamp::now(),
            frame_id: "camera_rgb_optical_frame".to_string(),
        };

        match stream {
            MockStream::Color => StreamPacket::image(
                topic.clone(),
                StreamKind::Color,
                ImageMessage {
                    header,
                    height: config.height,
                    width: config.width,
                    encoding: "bgr8".into(),
                    is_bigendian: 0,
                    step: config.width * 3,
                    data: PayloadBytes::from(gradient_bgr(config.width, config.height, seq)),
                },
            ),
            MockStream::Depth => StreamPacket::image(
                topic.clone(),
                StreamKind::Depth,
                ImageMessage {
                    header,
                    height: config.height,
                    width: config.width,
                    encoding: "32FC1".into(),
                    is_bigendian: 0,
                    step: config.width * 4,
                    data: PayloadBytes::from(flat_depth(config.width, config.height, config.depth_m)),
                },
            ),
            MockStream::CameraInfo => {
                let [fx, fy, cx, cy] = config.intrinsics;
                StreamPacket::camera_info(
                    topic.clone(),
                    CameraInfoMessage {
                        header,
                        height: config.height,
                        width: config.width,
                        k: [fx, 0.0, cx, 0.0, fy, cy, 0.0, 0.0, 1.0],
                    },
                )
            }
        }
    }
}

impl TopicSource for MockTopicSource {
    fn topic(&self) -> TopicName {
        self.topic.clone()
    }

    fn kind(&self) -> StreamKind {
        match self.stream {
            MockStream::Color => StreamKind::Color,
            MockStream::Depth => StreamKind::Depth,
            MockStream::CameraInfo => StreamKind::CameraInfo,
        }
    }

    fn listen(&self, callback: StreamCallback) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let topic = self.topic.clone();
        let stream = self.stream;
        let config = self.config.clone();
        let listening = self.listening.clone();
        let interval = Duration::from_secs_f64(1.0 / config.frequency_hz.max(0.001));

        let handle = thread::spawn(move || {
            debug!(topic = %topic, frequency_hz = config.frequency_hz, "mock source started");

            let mut seq = 0u32;
            while listening.load(Ordering::Relaxed) {
                seq += 1;
                callback(Self::build_packet(&topic, stream, &config, seq));
                trace!(topic = %topic, seq, "mock packet published");
                thread::sleep(interval);
            }

            debug!(topic = %topic, "mock source stopped");
        });

        *self.thread_handle.lock().unwrap() = Some(handle);
    }

    fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.lock().unwrap().take() {
            let _ = handle.join();
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}

/// BGR gradient frame: blue rises along x, green along y, red with seq.
fn gradient_bgr(width: u32, height: u32, seq: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for v in 0..height {
        for u in 0..width {
            data.push((u * 255 / width.max(1)) as u8);
            data.push((v * 255 / height.max(1)) as u8);
            data.push((seq % 256) as u8);
        }
    }
    data
}

/// Flat little-endian 32FC1 plane.
fn flat_depth(width: u32, height: u32, depth_m: f32) -> Vec<u8> {
    std::iter::repeat_n(depth_m, (width * height) as usize)
        .flat_map(|v| v.to_le_bytes())
        .collect()
}
