//! CLI 错误类型

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config file {} does not exist", path.display())]
    ConfigNotFound { path: PathBuf },

    /// CARLA 服务器不可达
    #[error("cannot reach CARLA at {host}:{port}: {reason}")]
    CarlaUnreachable {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("ingestion subscribers were already handed out")]
    SubscribersTaken,
}

impl CliError {
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn carla_unreachable(host: &str, port: u16, reason: impl ToString) -> Self {
        Self::CarlaUnreachable {
            host: host.to_string(),
            port,
            reason: reason.to_string(),
        }
    }
}
