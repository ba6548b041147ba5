//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig, RunMode};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Load configuration; the default path may legitimately be absent,
    // in which case built-in defaults drive a mock run.
    let mut blueprint = if args.config.exists() {
        config_loader::ConfigLoader::load_from_path(&args.config)
            .with_context(|| format!("Failed to load config from {}", args.config.display()))?
    } else if args.config.as_os_str() == "pipeline.toml" {
        info!("No configuration file found, using built-in defaults");
        config_loader::ConfigLoader::load_defaults().context("Failed to build default config")?
    } else {
        return Err(crate::error::CliError::config_not_found(&args.config).into());
    };

    // Apply CLI overrides
    if let Some(ref host) = args.host {
        info!(host = %host, "Overriding bus host from CLI");
        blueprint.bus.host = host.clone();
    }
    if let Some(port) = args.port {
        info!(port = %port, "Overriding bus port from CLI");
        blueprint.bus.port = port;
    }
    if args.capture {
        info!("Frame capture enabled from CLI");
        blueprint.fusion.capture.enabled = true;
    }

    info!(
        bus = %blueprint.bus.url(),
        color = %blueprint.streams.color,
        depth = %blueprint.streams.depth,
        detector = blueprint.detector.backend.as_str(),
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    // Pick the stream source mode
    let mode = match &args.replay {
        Some(path) => {
            let mut replay = ingestion::ReplayConfig::new(path.clone());
            replay.speed_multiplier = args.replay_speed;
            replay.loop_playback = args.replay_loop;
            RunMode::Replay(replay)
        }
        None => {
            if !args.mock {
                warn!("No replay recording given, falling back to the mock camera rig");
            }
            RunMode::Mock
        }
    };

    // Build pipeline configuration
    let pipeline_config = PipelineConfig {
        blueprint,
        mode,
        max_frames: if args.max_frames == 0 {
            None
        } else {
            Some(args.max_frames)
        },
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        buffer_size: args.buffer_size,
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    // Create and run pipeline
    let pipeline = Pipeline::new(pipeline_config);

    // Setup graceful shutdown handler
    let shutdown_signal = setup_shutdown_signal();

    info!("Starting pipeline...");

    // Run pipeline with shutdown signal
    tokio::select! {
        result = pipeline.run() => {
            match result {
                Ok(stats) => {
                    info!(
                        frames_published = stats.frames_published,
                        packets_received = stats.packets_received,
                        duration_secs = stats.duration.as_secs_f64(),
                        fps = format!("{:.2}", stats.fps()),
                        "Pipeline completed successfully"
                    );

                    // Print detailed statistics
                    stats.print_summary();
                }
                Err(e) => {
                    return Err(e).context("Pipeline execution failed");
                }
            }
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping pipeline...");
        }
    }

    info!("RGB-D Fuser finished");
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::PipelineBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Bus: {}", blueprint.bus.url());
    println!("\nStreams:");
    println!("  Color: {}", blueprint.streams.color);
    println!("  Depth: {}", blueprint.streams.depth);
    println!("  Camera info: {}", blueprint.streams.camera_info);

    println!("\nDetector:");
    println!("  Backend: {}", blueprint.detector.backend.as_str());
    println!(
        "  Confidence threshold: {:.2}",
        blueprint.detector.confidence_threshold
    );
    println!("  Timeout: {}ms", blueprint.detector.timeout_ms);

    println!("\nFusion:");
    println!(
        "  Publish interval: {:.2}s",
        blueprint.fusion.min_publish_interval_s
    );
    println!(
        "  Max points per instance: {}",
        blueprint.fusion.max_points_per_instance
    );
    println!(
        "  Depth range: ({}, {}) m",
        blueprint.fusion.depth_min_m, blueprint.fusion.depth_max_m
    );

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {} ({})", sink.name, sink.sink_type.as_str());
        }
    }

    println!();
}
