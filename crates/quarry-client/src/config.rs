use quarry_protocol_core::DEFAULT_MAX_PACKET_SIZE;
use quarry_types::ServerAddress;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_username")]
    pub username: String,
    /// `"auto"`, a release label such as `"1.14.4"`, or a protocol number.
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default = "default_max_packet_size")]
    pub max_packet_size: usize,
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,
    #[serde(default = "default_brand")]
    pub brand: String,
}

fn default_address() -> String {
    "127.0.0.1:25565".into()
}

fn default_username() -> String {
    "quarry".into()
}

fn default_version() -> String {
    "auto".into()
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_read_timeout_ms() -> u64 {
    30_000
}

fn default_max_packet_size() -> usize {
    DEFAULT_MAX_PACKET_SIZE
}

fn default_outbound_queue() -> usize {
    256
}

fn default_brand() -> String {
    "quarry".into()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            username: default_username(),
            version: default_version(),
            connect_timeout_ms: default_connect_timeout_ms(),
            read_timeout_ms: default_read_timeout_ms(),
            max_packet_size: default_max_packet_size(),
            outbound_queue: default_outbound_queue(),
            brand: default_brand(),
        }
    }
}

impl ClientConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: ClientConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::info!("No config file found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn server_address(&self) -> anyhow::Result<ServerAddress> {
        self.address
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
    }

    pub fn network(&self) -> NetworkSettings {
        NetworkSettings {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            max_packet_size: self.max_packet_size,
            outbound_queue: self.outbound_queue.max(1),
        }
    }
}

/// Transport limits handed to a `Connection`.
#[derive(Debug, Clone)]
pub struct NetworkSettings {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub max_packet_size: usize,
    pub outbound_queue: usize,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        ClientConfig::default().network()
    }
}
