//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    bus: BusInfo,
    streams: StreamInfo,
    detector: DetectorInfo,
    fusion: FusionInfo,
    outputs: OutputInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct BusInfo {
    host: String,
    port: u16,
    url: String,
}

#[derive(Serialize)]
struct StreamInfo {
    color: String,
    depth: String,
    camera_info: String,
}

#[derive(Serialize)]
struct DetectorInfo {
    backend: String,
    model_path: String,
    confidence_threshold: f32,
    timeout_ms: u64,
}

#[derive(Serialize)]
struct FusionInfo {
    min_publish_interval_s: f64,
    max_points_per_instance: usize,
    depth_min_m: f32,
    depth_max_m: f32,
    capture_enabled: bool,
}

#[derive(Serialize)]
struct OutputInfo {
    detections: String,
    cloud: String,
    cloud_frame_id: String,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &contracts::PipelineBlueprint, args: &InfoArgs) -> ConfigInfo {
    let sinks = if args.sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: s.sink_type.as_str().to_string(),
                queue_capacity: s.queue_capacity,
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: blueprint.version.clone(),
        bus: BusInfo {
            host: blueprint.bus.host.clone(),
            port: blueprint.bus.port,
            url: blueprint.bus.url(),
        },
        streams: StreamInfo {
            color: blueprint.streams.color.clone(),
            depth: blueprint.streams.depth.clone(),
            camera_info: blueprint.streams.camera_info.clone(),
        },
        detector: DetectorInfo {
            backend: blueprint.detector.backend.as_str().to_string(),
            model_path: blueprint.detector.model_path.clone(),
            confidence_threshold: blueprint.detector.confidence_threshold,
            timeout_ms: blueprint.detector.timeout_ms,
        },
        fusion: FusionInfo {
            min_publish_interval_s: blueprint.fusion.min_publish_interval_s,
            max_points_per_instance: blueprint.fusion.max_points_per_instance,
            depth_min_m: blueprint.fusion.depth_min_m,
            depth_max_m: blueprint.fusion.depth_max_m,
            capture_enabled: blueprint.fusion.capture.enabled,
        },
        outputs: OutputInfo {
            detections: blueprint.outputs.detections.clone(),
            cloud: blueprint.outputs.cloud.clone(),
            cloud_frame_id: blueprint.outputs.cloud_frame_id.clone(),
        },
        sinks,
    }
}

fn print_config_info(blueprint: &contracts::PipelineBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               RGB-D Fuser Configuration                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📡 Bus");
    println!("   ├─ Version: {}", blueprint.version);
    println!("   └─ Endpoint: {}", blueprint.bus.url());

    println!("\n🎥 Streams");
    println!("   ├─ Color: {}", blueprint.streams.color);
    println!("   ├─ Depth: {}", blueprint.streams.depth);
    println!("   └─ Camera info: {}", blueprint.streams.camera_info);

    println!("\n🔍 Detector");
    println!("   ├─ Backend: {}", blueprint.detector.backend.as_str());
    println!("   ├─ Model: {}", blueprint.detector.model_path);
    println!(
        "   ├─ Confidence threshold: {:.2}",
        blueprint.detector.confidence_threshold
    );
    println!("   └─ Timeout: {}ms", blueprint.detector.timeout_ms);

    println!("\n⚙️  Fusion");
    println!(
        "   ├─ Publish interval: {:.2}s",
        blueprint.fusion.min_publish_interval_s
    );
    println!(
        "   ├─ Max points per instance: {}",
        blueprint.fusion.max_points_per_instance
    );
    println!(
        "   ├─ Depth range: ({}, {}) m",
        blueprint.fusion.depth_min_m, blueprint.fusion.depth_max_m
    );
    if blueprint.fusion.capture.enabled {
        println!(
            "   └─ Capture: enabled ({})",
            blueprint.fusion.capture.directory
        );
    } else {
        println!("   └─ Capture: disabled");
    }

    println!("\n📤 Outputs");
    println!("   ├─ Detections: {}", blueprint.outputs.detections);
    println!("   ├─ Cloud: {}", blueprint.outputs.cloud);
    println!("   └─ Frame: {}", blueprint.outputs.cloud_frame_id);

    if !blueprint.sinks.is_empty() {
        println!("\n💾 Sinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let is_last = i == blueprint.sinks.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            if args.sinks {
                println!(
                    "   {} {} ({}, queue {})",
                    prefix,
                    sink.name,
                    sink.sink_type.as_str(),
                    sink.queue_capacity
                );
            } else {
                println!("   {} {} ({})", prefix, sink.name, sink.sink_type.as_str());
            }
        }
    }

    println!();
}
