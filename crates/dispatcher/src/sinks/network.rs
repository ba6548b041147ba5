//! NetworkSink - UDP fire-and-forget publishing

use contracts::{FrameOutput, OutputSink, PerceptionError};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{debug, error, instrument, warn};

/// Configuration for NetworkSink
#[derive(Debug, Clone)]
pub struct NetworkSinkConfig {
    /// Target address
    pub addr: SocketAddr,
    /// Max datagram size (UDP typically 65507 for IPv4)
    pub max_packet_size: usize,
}

impl NetworkSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let addr_str = params
            .get("addr")
            .ok_or_else(|| "missing 'addr' parameter".to_string())?;

        let addr: SocketAddr = addr_str
            .parse()
            .map_err(|e| format!("invalid address '{addr_str}': {e}"))?;

        let max_packet_size = params
            .get("max_packet_size")
            .and_then(|s| s.parse().ok())
            .unwrap_or(65000);

        Ok(Self {
            addr,
            max_packet_size,
        })
    }
}

/// Sink that publishes fusion output over UDP.
///
/// Detections go out as a JSON array datagram, the cloud as a bincode
/// datagram. Either is skipped when empty, matching the bus convention
/// that subscribers never see hollow messages.
pub struct NetworkSink {
    name: String,
    config: NetworkSinkConfig,
    socket: Option<UdpSocket>,
}

impl NetworkSink {
    /// Create a new NetworkSink
    #[instrument(name = "network_sink_new", skip(name, config))]
    pub async fn new(name: impl Into<String>, config: NetworkSinkConfig) -> std::io::Result<Self> {
        let name = name.into();
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(&config.addr).await?;

        debug!(
            sink = %name,
            target = %config.addr,
            "NetworkSink connected"
        );

        Ok(Self {
            name,
            config,
            socket: Some(socket),
        })
    }

    /// Create from params (for factory)
    #[instrument(name = "network_sink_from_params", skip(name, params))]
    pub async fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, PerceptionError> {
        let name = name.into();
        let config = NetworkSinkConfig::from_params(params)
            .map_err(|e| PerceptionError::publish_failed(&name, e))?;

        Self::new(&name, config)
            .await
            .map_err(|e| PerceptionError::SinkConnection {
                sink_name: name,
                message: e.to_string(),
            })
    }

    fn socket(&self) -> Result<&UdpSocket, PerceptionError> {
        self.socket
            .as_ref()
            .ok_or_else(|| PerceptionError::publish_failed(&self.name, "socket not connected"))
    }

    fn check_size(&self, what: &str, data: &[u8]) {
        if data.len() > self.config.max_packet_size {
            warn!(
                sink = %self.name,
                what,
                size = data.len(),
                max = self.config.max_packet_size,
                "Datagram exceeds max size, delivery not guaranteed"
            );
        }
    }

    async fn transmit(&self, socket: &UdpSocket, data: &[u8], seq: u32, what: &str) {
        match socket.send(data).await {
            Ok(sent) => {
                debug!(sink = %self.name, seq, what, bytes = sent, "Sent");
            }
            Err(e) => {
                // Log but don't fail, UDP is best-effort
                error!(sink = %self.name, what, error = %e, "UDP send failed");
            }
        }
    }
}

impl OutputSink for NetworkSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "network_sink_publish",
        skip(self, output),
        fields(sink = %self.name, seq = output.seq)
    )]
    async fn publish(&mut self, output: &FrameOutput) -> Result<(), PerceptionError> {
        let socket = self.socket()?;

        if !output.detections.is_empty() {
            let data = serde_json::to_vec(&output.detections)
                .map_err(|e| PerceptionError::publish_failed(&self.name, e.to_string()))?;
            self.check_size("detections", &data);
            self.transmit(socket, &data, output.seq, "detections").await;
        }

        if let Some(cloud) = &output.cloud {
            let data = bincode::serialize(cloud)
                .map_err(|e| PerceptionError::publish_failed(&self.name, e.to_string()))?;
            self.check_size("cloud", &data);
            self.transmit(socket, &data, output.seq, "cloud").await;
        }

        Ok(())
    }

    #[instrument(name = "network_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), PerceptionError> {
        // UDP doesn't buffer
        Ok(())
    }

    #[instrument(name = "network_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), PerceptionError> {
        self.socket = None;
        debug!(sink = %self.name, "NetworkSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DetectionRecord, FusionMeta, Stamp};

    fn make_output() -> FrameOutput {
        FrameOutput {
            seq: 1,
            stamp: Stamp::new(100, 0),
            frame_id: "camera_rgb_optical_frame".into(),
            detections: vec![DetectionRecord {
                label: "person".into(),
                confidence: 0.9,
                bbox: [0, 0, 3, 3],
                center: [1, 1],
                distance_m: None,
                position_camera: None,
                mask_3d_points: 0,
                avg_bgr: None,
            }],
            cloud: None,
            snapshot: None,
            meta: FusionMeta::default(),
        }
    }

    #[tokio::test]
    async fn test_network_sink_config_parsing() {
        let mut params = HashMap::new();
        params.insert("addr".to_string(), "127.0.0.1:9999".to_string());

        let config = NetworkSinkConfig::from_params(&params).unwrap();
        assert_eq!(config.addr.port(), 9999);
        assert_eq!(config.max_packet_size, 65000);
    }

    #[tokio::test]
    async fn test_network_sink_missing_addr() {
        let params = HashMap::new();
        assert!(NetworkSinkConfig::from_params(&params).is_err());
    }

    #[tokio::test]
    async fn test_network_sink_publish() {
        let config = NetworkSinkConfig {
            addr: "127.0.0.1:19998".parse().unwrap(),
            max_packet_size: 65000,
        };

        let mut sink = NetworkSink::new("udp", config).await.unwrap();

        // Should not fail even with no receiver
        assert!(sink.publish(&make_output()).await.is_ok());
        sink.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_datagram_is_received() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = receiver.local_addr().unwrap();

        let mut sink = NetworkSink::new("udp", NetworkSinkConfig {
            addr,
            max_packet_size: 65000,
        })
        .await
        .unwrap();

        sink.publish(&make_output()).await.unwrap();

        let mut buf = vec![0u8; 65000];
        let n = receiver.recv(&mut buf).await.unwrap();
        let records: Vec<DetectionRecord> = serde_json::from_slice(&buf[..n]).unwrap();
        assert_eq!(records[0].label, "person");
    }
}
