//! # Integration Tests
//!
//! Contract and end-to-end tests for the fusion pipeline.
//!
//! Responsibilities:
//! - Wire-format contract tests (payload encodings, null semantics,
//!   cloud layout)
//! - End-to-end runs over the mock camera rig, no bus required
//! - Configuration-to-engine plumbing checks

#[cfg(test)]
mod contract_tests {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use contracts::{
        cloud_fields, DetectionRecord, ImageMessage, PayloadBytes, PixelFormat, StreamKind,
        StreamPacket, TopicName,
    };
    use fusion::{decode_message, CloudEncoder};
    use nalgebra::Point3;

    fn bgr_message(data: PayloadBytes) -> ImageMessage {
        ImageMessage {
            height: 2,
            width: 2,
            encoding: "bgr8".into(),
            data,
            ..Default::default()
        }
    }

    /// A base64 text payload and the equivalent raw byte payload must
    /// decode to identical frames.
    #[test]
    fn test_payload_encodings_decode_identically() {
        let pixels: Vec<u8> = (0u8..12).collect();

        let raw = decode_message(&bgr_message(PayloadBytes::from(pixels.clone()))).unwrap();
        let text =
            decode_message(&bgr_message(PayloadBytes::from(STANDARD.encode(&pixels)))).unwrap();

        assert_eq!(raw.format, PixelFormat::Bgr8);
        assert_eq!(raw.as_bgr(), text.as_bgr());
    }

    /// Unavailable distance and position serialize as JSON null, and the
    /// internal channel statistic never reaches the wire.
    #[test]
    fn test_detection_record_null_semantics() {
        let record = DetectionRecord {
            label: "cup".into(),
            confidence: 0.9,
            bbox: [0, 0, 3, 3],
            center: [1, 1],
            distance_m: None,
            position_camera: None,
            mask_3d_points: 0,
            avg_bgr: Some([1.0, 2.0, 3.0]),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert!(value["distance_m"].is_null());
        assert!(value["position_camera"].is_null());
        assert!(value.get("avg_bgr").is_none());
        assert_eq!(value["mask_3d_points"], 0);
    }

    /// The published cloud always carries the fixed 16-byte point layout.
    #[test]
    fn test_cloud_wire_layout() {
        let encoder = CloudEncoder::new("camera_rgb_optical_frame");
        let points = vec![Point3::new(1.0, 2.0, 3.0), Point3::new(-1.0, 0.5, 4.0)];
        let cloud = encoder.encode(&points, &[7, 7]).unwrap();

        assert_eq!(cloud.point_step, 16);
        assert_eq!(cloud.height, 1);
        assert_eq!(cloud.width, 2);
        assert_eq!(cloud.row_step, 32);
        assert_eq!(cloud.data.len(), 32);
        assert_eq!(cloud.fields, cloud_fields());
        assert_eq!(cloud.fields[3].name, "label");
        assert_eq!(cloud.fields[3].offset, 12);

        // In JSON form the blob is a base64 string
        let value = serde_json::to_value(&cloud).unwrap();
        assert!(value["data"].is_string());
    }

    /// Replay recordings are JSONL of serialized packets; a packet must
    /// survive the round trip with its routing intact.
    #[test]
    fn test_packet_json_round_trip() {
        let packet = StreamPacket::image(
            TopicName::from("/camera/depth/image_raw"),
            StreamKind::Depth,
            ImageMessage {
                height: 1,
                width: 2,
                encoding: "32FC1".into(),
                data: PayloadBytes::from(
                    [1.5f32, 2.5]
                        .iter()
                        .flat_map(|v| v.to_le_bytes())
                        .collect::<Vec<u8>>(),
                ),
                ..Default::default()
            },
        );

        let line = serde_json::to_string(&packet).unwrap();
        let back: StreamPacket = serde_json::from_str(&line).unwrap();

        assert_eq!(back.topic, packet.topic);
        assert_eq!(back.kind, StreamKind::Depth);
        let frame = decode_message(back.as_image().unwrap()).unwrap();
        assert_eq!(frame.depth_at(1, 0), Some(2.5));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::time::Instant;

    use contracts::{
        CameraInfoMessage, FusionConfig, ImageMessage, MaskRaster, PayloadBytes, RawDetection,
        SinkConfig, SinkType, StreamKind, StreamPacket, TopicName,
    };
    use detector::{Detector, MockDetector, MockDetectorConfig, ScriptedDetector};
    use dispatcher::create_dispatcher;
    use fusion::{decode_cloud, EngineState, FusionEngine};
    use ingestion::{IntakePipeline, MockStreamConfig, MockTopicSource};
    use observability::FusionRunAggregator;
    use tokio::sync::mpsc;

    fn color_packet(width: u32, height: u32, bgr: [u8; 3]) -> StreamPacket {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&bgr);
        }
        StreamPacket::image(
            TopicName::from("/camera/rgb/image_raw"),
            StreamKind::Color,
            ImageMessage {
                height,
                width,
                encoding: "bgr8".into(),
                data: PayloadBytes::from(data),
                ..Default::default()
            },
        )
    }

    fn depth_packet(width: u32, height: u32, meters: f32) -> StreamPacket {
        let data: Vec<u8> = std::iter::repeat_n(meters, (width * height) as usize)
            .flat_map(|v| v.to_le_bytes())
            .collect();
        StreamPacket::image(
            TopicName::from("/camera/depth/image_raw"),
            StreamKind::Depth,
            ImageMessage {
                height,
                width,
                encoding: "32FC1".into(),
                data: PayloadBytes::from(data),
                ..Default::default()
            },
        )
    }

    fn camera_info_packet(fx: f64, fy: f64, cx: f64, cy: f64) -> StreamPacket {
        StreamPacket::camera_info(
            TopicName::from("/camera/rgb/camera_info"),
            CameraInfoMessage {
                header: Default::default(),
                height: 4,
                width: 4,
                k: [fx, 0.0, cx, 0.0, fy, cy, 0.0, 0.0, 1.0],
            },
        )
    }

    fn log_sink_config(name: &str) -> SinkConfig {
        SinkConfig {
            name: name.to_string(),
            sink_type: SinkType::Log,
            queue_capacity: 50,
            params: HashMap::new(),
        }
    }

    /// End-to-end: mock camera rig -> intake -> engine -> detector ->
    /// dispatcher.
    ///
    /// Verifies the full data flow:
    /// 1. MockTopicSource threads publish color, depth and calibration
    /// 2. FusionEngine calibrates and admits color frames
    /// 3. Fused outputs reach the dispatcher and its log sink
    #[tokio::test]
    async fn test_e2e_mock_pipeline() {
        let rig = MockStreamConfig::default();
        let mut intake = IntakePipeline::new(100);
        intake.register_source(Box::new(MockTopicSource::color(rig.clone())));
        intake.register_source(Box::new(MockTopicSource::depth(rig.clone())));
        intake.register_source(Box::new(MockTopicSource::camera_info(rig)));
        let intake_rx = intake.take_receiver().unwrap();
        intake.start_all();

        // No rate gating: every decoded color frame becomes a job
        let mut engine = FusionEngine::new(FusionConfig {
            min_publish_interval_s: 0.0,
            ..Default::default()
        });
        let mut det = MockDetector::with_config_and_seed(MockDetectorConfig::default(), 7);

        let (output_tx, output_rx) = mpsc::channel(100);
        let dispatcher = create_dispatcher(vec![log_sink_config("test_log")], output_rx)
            .await
            .unwrap();
        let dispatcher_handle = dispatcher.spawn();

        let target_frames = 3u64;
        let started = Instant::now();
        let mut aggregator = FusionRunAggregator::new();

        let pipeline = async {
            let mut published = 0u64;
            while published < target_frames {
                let packet = intake_rx.recv().await.unwrap();
                let now_s = started.elapsed().as_secs_f64();
                let Some(job) = engine.ingest(&packet, now_s) else {
                    continue;
                };
                let detections = det.detect(&job.color).await.unwrap();
                let output = engine.fuse(&job, &detections, 1.0);
                aggregator.update(&output.meta);
                if output.is_empty() {
                    continue;
                }
                output_tx.send(output).await.unwrap();
                published += 1;
            }
            published
        };

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), pipeline).await;

        intake.stop_all();
        drop(output_tx);
        let _ = tokio::time::timeout(std::time::Duration::from_secs(2), dispatcher_handle).await;

        assert_eq!(result.expect("pipeline timed out"), target_frames);
        assert!(engine.is_calibrated(), "camera info should have latched");
        let summary = aggregator.summary();
        assert!(summary.total_frames >= target_frames);
    }

    /// Full cycle over hand-built packets with pinned geometry.
    ///
    /// A 4x4 frame, a flat 2 m depth plane and unit focal lengths with the
    /// principal point at (2, 2): the box covering the whole frame centers
    /// at pixel (1, 1) and back-projects to (-2, -2, 2) in camera space.
    #[tokio::test]
    async fn test_full_cycle_geometry() {
        let mut engine = FusionEngine::new(FusionConfig::default());
        assert_eq!(engine.state(), EngineState::Idle);

        engine.ingest(&depth_packet(4, 4, 2.0), 0.0);
        engine.ingest(&camera_info_packet(1.0, 1.0, 2.0, 2.0), 0.0);
        assert_eq!(engine.state(), EngineState::Ready);

        let job = engine
            .ingest(&color_packet(4, 4, [10, 20, 30]), 1.0)
            .unwrap();
        assert!(job.depth.is_some());

        let mut det = ScriptedDetector::new();
        det.push_detections(vec![RawDetection::new(
            "cup",
            41,
            0.9,
            [0.0, 0.0, 3.0, 3.0],
        )
        .with_mask(MaskRaster::filled(4, 4, 1.0))]);

        let detections = det.detect(&job.color).await.unwrap();
        let output = engine.fuse(&job, &detections, 4.2);

        assert_eq!(output.seq, 1);
        assert_eq!(output.detections.len(), 1);
        let record = &output.detections[0];
        assert_eq!(record.center, [1, 1]);
        assert_eq!(record.distance_m, Some(2.0));
        assert_eq!(record.position_camera, Some([-2.0, -2.0, 2.0]));
        assert_eq!(record.mask_3d_points, 16);

        let cloud = output.cloud.as_ref().unwrap();
        assert_eq!(cloud.point_count(), 16);
        let (points, labels) = decode_cloud(&cloud.data).unwrap();
        assert!(points.iter().all(|p| (p.z - 2.0).abs() < 1e-6));
        assert!(labels.iter().all(|&l| l == 41));

        assert!(output.meta.depth_available);
        assert!(output.meta.intrinsics_available);
        assert_eq!(output.meta.instances_in, 1);
        assert_eq!(output.meta.instances_kept, 1);
        assert_eq!(output.meta.points_emitted, 16);
    }

    /// A detector failure skips the frame; the engine keeps running and
    /// the next admitted frame fuses normally.
    #[tokio::test]
    async fn test_detector_failure_is_frame_local() {
        let mut engine = FusionEngine::new(FusionConfig::default());
        engine.ingest(&depth_packet(4, 4, 2.0), 0.0);
        engine.ingest(&camera_info_packet(1.0, 1.0, 2.0, 2.0), 0.0);

        let mut det = ScriptedDetector::new();
        det.push_failure("model crashed")
            .push_detections(vec![RawDetection::new("cup", 41, 0.9, [0.0, 0.0, 3.0, 3.0])]);

        let first = engine.ingest(&color_packet(4, 4, [0, 0, 0]), 1.0).unwrap();
        assert!(det.detect(&first.color).await.is_err());

        let second = engine.ingest(&color_packet(4, 4, [0, 0, 0]), 2.0).unwrap();
        let detections = det.detect(&second.color).await.unwrap();
        let output = engine.fuse(&second, &detections, 1.0);

        assert_eq!(output.seq, 2);
        assert_eq!(output.detections.len(), 1);
    }

    /// An answer with no instances produces a hollow output that callers
    /// are expected not to publish.
    #[tokio::test]
    async fn test_empty_answer_yields_hollow_output() {
        let mut engine = FusionEngine::new(FusionConfig::default());
        engine.ingest(&depth_packet(4, 4, 2.0), 0.0);
        engine.ingest(&camera_info_packet(1.0, 1.0, 2.0, 2.0), 0.0);

        let job = engine.ingest(&color_packet(4, 4, [0, 0, 0]), 1.0).unwrap();
        let output = engine.fuse(&job, &[], 1.0);

        assert!(output.is_empty());
        assert!(output.cloud.is_none());
        assert_eq!(output.meta.instances_in, 0);
    }
}

#[cfg(test)]
mod config_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{FusionConfig, StreamKind, StreamPacket};
    use fusion::FusionEngine;

    const PIPELINE_TOML: &str = r#"
[bus]
host = "127.0.0.1"
port = 9090

[streams]
color = "/camera/rgb/image_raw"
depth = "/camera/depth/image_raw"
camera_info = "/camera/rgb/camera_info"

[detector]
model_path = "/workspace/weights/yolo/yolo26m-seg.pt"
confidence_threshold = 0.5
backend = "scripted"

[fusion]
min_publish_interval_s = 0.5
max_points_per_instance = 100
depth_max_m = 8.0

[outputs]
detections = "/perception/detections"
cloud = "/perception/cloud"

[[sinks]]
name = "console"
type = "log"
"#;

    /// Blueprint values flow through to the engine's fusion config and
    /// drive the publish-rate gate.
    #[test]
    fn test_blueprint_drives_engine() {
        let blueprint = ConfigLoader::load_from_str(PIPELINE_TOML, ConfigFormat::Toml).unwrap();
        let config: FusionConfig = blueprint.to_fusion_config();
        assert_eq!(config.min_publish_interval_s, 0.5);
        assert_eq!(config.max_points_per_instance, 100);
        assert_eq!(config.depth_max_m, 8.0);

        let mut engine = FusionEngine::new(config);

        let color = color_packet();
        assert!(engine.ingest(&color, 1.0).is_some());
        // Inside the 0.5 s interval the gate drops the frame
        assert!(engine.ingest(&color, 1.2).is_none());
        assert_eq!(engine.gated_count(), 1);
        assert!(engine.ingest(&color, 1.6).is_some());
    }

    fn color_packet() -> StreamPacket {
        use contracts::{ImageMessage, PayloadBytes, TopicName};
        StreamPacket::image(
            TopicName::from("/camera/rgb/image_raw"),
            StreamKind::Color,
            ImageMessage {
                height: 2,
                width: 2,
                encoding: "bgr8".into(),
                data: PayloadBytes::from(vec![0u8; 12]),
                ..Default::default()
            },
        )
    }
}
