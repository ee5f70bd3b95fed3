use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub source: SourceConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address for the HTTP server to listen on
    pub http_addr: SocketAddr,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    Memory,
    Sqlite { path: PathBuf },
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    Mock {
        /// Milliseconds between rounds of frames
        frame_interval_ms: u64,
        /// Number of simulated devices, ids start at 1
        device_count: u8,
        /// Chance, in percent, that a frame's CRC is damaged
        corrupt_percent: u32,
        /// Chance, in percent, that line noise precedes a frame
        noise_percent: u32,
    },
    Tcp {
        addr: SocketAddr,
    },
    Serial {
        /// Device path, e.g. `/dev/ttyACM0` or `COM3`
        path: String,
        baud_rate: u32,
    },
}

impl Config {
    pub fn load(path: &Path) -> color_eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                http_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8081)),
            },
            storage: StorageConfig::Memory,
            source: SourceConfig::Mock {
                frame_interval_ms: 1000,
                device_count: 3,
                corrupt_percent: 5,
                noise_percent: 10,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sqlite_and_serial() {
        let config: Config = toml::from_str(
            r#"
            [server]
            http_addr = "127.0.0.1:8081"

            [storage]
            type = "sqlite"
            path = "sensorlink.db"

            [source]
            type = "serial"
            path = "/dev/ttyACM0"
            baud_rate = 9600
            "#,
        )
        .unwrap();

        assert_eq!(
            config.storage,
            StorageConfig::Sqlite {
                path: PathBuf::from("sensorlink.db")
            }
        );
        assert_eq!(
            config.source,
            SourceConfig::Serial {
                path: "/dev/ttyACM0".to_string(),
                baud_rate: 9600
            }
        );
    }

    #[test]
    fn parses_memory_and_tcp() {
        let config: Config = toml::from_str(
            r#"
            [server]
            http_addr = "0.0.0.0:8081"

            [storage]
            type = "memory"

            [source]
            type = "tcp"
            addr = "0.0.0.0:9100"
            "#,
        )
        .unwrap();

        assert_eq!(config.storage, StorageConfig::Memory);
        assert_eq!(
            config.source,
            SourceConfig::Tcp {
                addr: "0.0.0.0:9100".parse().unwrap()
            }
        );
    }

    #[test]
    fn unknown_source_type_is_rejected() {
        let result: Result<Config, _> = toml::from_str(
            r#"
            [server]
            http_addr = "0.0.0.0:8081"

            [storage]
            type = "memory"

            [source]
            type = "carrier-pigeon"
            "#,
        );
        assert!(result.is_err());
    }
}
