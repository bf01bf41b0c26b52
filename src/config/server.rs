use std::net::SocketAddr;
use std::path::PathBuf;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use super::validate_directory;
use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// gRPC listen address
    #[serde(default = "default_listen_addr")]
    pub listen_address: SocketAddr,

    /// Root directory of the embedded document store
    #[serde(default = "default_db_dir")]
    pub db_root_dir: PathBuf,

    /// Directory receiving the service log file
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_addr(),
            db_root_dir: default_db_dir(),
            log_dir: default_log_dir(),
        }
    }
}

impl ServerConfig {
    /// Validates listener and storage locations
    pub fn validate(&self) -> Result<()> {
        if self.listen_address.port() == 0 {
            return Err(Error::Config(ConfigError::Message(
                "listen_address must specify a non-zero port".into(),
            )));
        }

        validate_directory(&self.db_root_dir, "db_root_dir")?;
        validate_directory(&self.log_dir, "log_dir")?;

        Ok(())
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5566))
}
fn default_db_dir() -> PathBuf {
    PathBuf::from("/tmp/user-management/db")
}
fn default_log_dir() -> PathBuf {
    PathBuf::from("/tmp/user-management/logs")
}
