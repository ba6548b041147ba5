//! FileSink - persists fusion output to disk

use contracts::{FrameOutput, OutputSink, PerceptionError, SnapshotImage};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, error, info, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Base output directory; each run gets a timestamped subdirectory
    pub directory: PathBuf,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let directory = params
            .get("directory")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));

        Self { directory }
    }
}

/// Sink that writes detections, clouds and snapshots to disk.
///
/// Layout under the run directory:
/// - `detections.jsonl`: one line per published frame with records
/// - `clouds/<seq>.ply`:  binary little-endian labeled cloud
/// - `snapshots/<seq>.png`: captured color frame, when present
pub struct FileSink {
    name: String,
    run_dir: PathBuf,
    detections_file: File,
    created_dirs: HashSet<PathBuf>,
}

impl FileSink {
    /// Create a new FileSink
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        let name = name.into();
        let run_dir = config
            .directory
            .join(chrono::Local::now().format("run_%Y%m%d_%H%M%S").to_string());
        fs::create_dir_all(&run_dir)?;

        let detections_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(run_dir.join("detections.jsonl"))?;

        info!(sink = %name, dir = %run_dir.display(), "FileSink run directory created");

        Ok(Self {
            name,
            run_dir,
            detections_file,
            created_dirs: HashSet::new(),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        Self::new(name, FileSinkConfig::from_params(params))
    }

    /// Run directory this sink writes into.
    pub fn run_dir(&self) -> &PathBuf {
        &self.run_dir
    }

    fn subdir(&mut self, name: &str) -> std::io::Result<PathBuf> {
        let dir = self.run_dir.join(name);
        if !self.created_dirs.contains(&dir) {
            fs::create_dir_all(&dir)?;
            self.created_dirs.insert(dir.clone());
        }
        Ok(dir)
    }

    fn write_output_to_disk(&mut self, output: &FrameOutput) -> std::io::Result<()> {
        if !output.detections.is_empty() {
            let line = json!({
                "seq": output.seq,
                "stamp": output.stamp.as_secs_f64(),
                "detections": output.detections,
            });
            writeln!(self.detections_file, "{line}")?;
        }

        if let Some(cloud) = &output.cloud {
            let dir = self.subdir("clouds")?;
            let path = dir.join(format!("{:06}.ply", output.seq));
            save_cloud_ply(path, cloud)?;
        }

        if let Some(snapshot) = &output.snapshot {
            let dir = self.subdir("snapshots")?;
            let path = dir.join(format!("{:06}.png", output.seq));
            save_snapshot_png(path, snapshot)?;
        }

        Ok(())
    }

    fn persist_output(&mut self, output: &FrameOutput) -> Result<(), PerceptionError> {
        self.write_output_to_disk(output).map_err(|e| {
            error!(sink = %self.name, seq = output.seq, error = %e, "Write failed");
            PerceptionError::publish_failed(&self.name, e.to_string())
        })
    }
}

/// Write a labeled cloud as binary little-endian PLY.
///
/// The packed record layout (three f32 coordinates plus a u32 label) is
/// exactly the PLY vertex layout declared in the header, so the message
/// data is written as is.
fn save_cloud_ply(path: PathBuf, cloud: &contracts::CloudMessage) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    writeln!(file, "ply")?;
    writeln!(file, "format binary_little_endian 1.0")?;
    writeln!(file, "element vertex {}", cloud.point_count())?;
    writeln!(file, "property float x")?;
    writeln!(file, "property float y")?;
    writeln!(file, "property float z")?;
    writeln!(file, "property uint label")?;
    writeln!(file, "end_header")?;
    file.write_all(&cloud.data)?;
    Ok(())
}

/// Save a BGR snapshot as PNG, swapping to RGB for the encoder.
fn save_snapshot_png(path: PathBuf, snapshot: &SnapshotImage) -> std::io::Result<()> {
    let mut rgb = snapshot.data.to_vec();
    for chunk in rgb.chunks_exact_mut(3) {
        chunk.swap(0, 2);
    }
    image::save_buffer(
        path,
        &rgb,
        snapshot.width,
        snapshot.height,
        image::ColorType::Rgb8,
    )
    .map_err(std::io::Error::other)
}

impl OutputSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_publish",
        skip(self, output),
        fields(sink = %self.name, seq = output.seq)
    )]
    async fn publish(&mut self, output: &FrameOutput) -> Result<(), PerceptionError> {
        self.persist_output(output)?;
        Ok(())
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), PerceptionError> {
        self.detections_file.flush()?;
        Ok(())
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), PerceptionError> {
        self.detections_file.flush()?;
        debug!(sink = %self.name, "FileSink closed");
        Ok(())
    }
}
