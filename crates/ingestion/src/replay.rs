//! Replay source
//!
//! Replays recorded stream packets from a JSONL file, one serialized
//! `StreamPacket` per line. Packets are grouped by topic; each group
//! becomes its own source and is replayed on a background thread paced
//! by the recorded stamps.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use contracts::{StreamCallback, StreamKind, StreamPacket, TopicName, TopicSource};
use tracing::{debug, info, warn};

use crate::error::{IntakeError, Result};

/// Replay configuration
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Recording file (JSONL, one packet per line)
    pub path: PathBuf,

    /// Playback speed multiplier (1.0 = recorded speed)
    pub speed_multiplier: f64,

    /// Restart from the first packet after the last one
    pub loop_playback: bool,
}

impl ReplayConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            speed_multiplier: 1.0,
            loop_playback: false,
        }
    }
}

/// Replay topic source
///
/// Holds the packets recorded for a single topic, sorted by stamp.
#[derive(Debug)]
pub struct ReplayTopicSource {
    topic: TopicName,
    kind: StreamKind,
    packets: Arc<Vec<StreamPacket>>,
    config: ReplayConfig,
    listening: Arc<AtomicBool>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl ReplayTopicSource {
    /// Load a recording and split it into one source per topic.
    pub fn load_all(config: &ReplayConfig) -> Result<Vec<ReplayTopicSource>> {
        let packets = read_recording(&config.path)?;

        // BTreeMap keeps source ordering stable across runs
        let mut by_topic: BTreeMap<String, Vec<StreamPacket>> = BTreeMap::new();
        for packet in packets {
            by_topic
                .entry(packet.topic.to_string())
                .or_default()
                .push(packet);
        }

        let mut sources = Vec::with_capacity(by_topic.len());
        for (topic, mut packets) in by_topic {
            packets.sort_by(|a, b| a.stamp.as_secs_f64().total_cmp(&b.stamp.as_secs_f64()));

            let kind = packets[0].kind;
            info!(
                topic = %topic,
                kind = kind.as_str(),
                packets = packets.len(),
                "loaded replay topic"
            );

            sources.push(ReplayTopicSource {
                topic: TopicName::from(topic),
                kind,
                packets: Arc::new(packets),
                config: config.clone(),
                listening: Arc::new(AtomicBool::new(false)),
                thread_handle: Mutex::new(None),
            });
        }

        Ok(sources)
    }

    /// Packets recorded for this topic.
    pub fn packet_count(&self) -> usize {
        self.packets.len()
    }
}

fn read_recording(path: &Path) -> Result<Vec<StreamPacket>> {
    let shown = path.display().to_string();
    let file = File::open(path)
        .map_err(|e| IntakeError::replay_load(&shown, format!("cannot open recording: {e}")))?;
    let reader = BufReader::new(file);

    let mut packets = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line =
            line.map_err(|e| IntakeError::replay_load(&shown, format!("read error: {e}")))?;
        if line.trim().is_empty() {
            continue;
        }

        let packet: StreamPacket = serde_json::from_str(&line)
            .map_err(|e| IntakeError::replay_load(&shown, format!("line {}: {e}", line_no + 1)))?;
        packets.push(packet);
    }

    if packets.is_empty() {
        return Err(IntakeError::replay_load(&shown, "recording is empty"));
    }

    Ok(packets)
}

impl TopicSource for ReplayTopicSource {
    fn topic(&self) -> TopicName {
        self.topic.clone()
    }

    fn kind(&self) -> StreamKind {
        self.kind
    }

    fn listen(&self, callback: StreamCallback) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let listening = self.listening.clone();
        let topic = self.topic.clone();
        let packets = self.packets.clone();
        let speed = self.config.speed_multiplier.max(0.1);
        let loop_playback = self.config.loop_playback;

        let handle = thread::spawn(move || {
            debug!(topic = %topic, "replay thread started");

            loop {
                if packets.is_empty() {
                    warn!(topic = %topic, "no packets to replay");
                    break;
                }

                let start_time = Instant::now();
                let first_stamp = packets[0].stamp.as_secs_f64();

                for packet in packets.iter() {
                    if !listening.load(Ordering::Relaxed) {
                        debug!(topic = %topic, "replay stopped");
                        return;
                    }

                    let offset = packet.stamp.as_secs_f64() - first_stamp;
                    let target_elapsed = Duration::from_secs_f64(offset.max(0.0) / speed);
                    let actual_elapsed = start_time.elapsed();

                    if target_elapsed > actual_elapsed {
                        thread::sleep(target_elapsed - actual_elapsed);
                    }

                    callback(packet.clone());
                }

                if !loop_playback {
                    info!(topic = %topic, "replay completed");
                    break;
                }

                debug!(topic = %topic, "looping replay");
            }

            listening.store(false, Ordering::SeqCst);
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
