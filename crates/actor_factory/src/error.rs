//! Actor Factory 错误类型

use contracts::{ActorId, ContractError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActorFactoryError {
    /// 尚未调用 `connect`
    #[error("not connected to a CARLA server")]
    NotConnected,

    /// 地图上没有这个推荐出生点
    #[error("spawn point {index} out of range ({available} available)")]
    SpawnPointOutOfRange { index: usize, available: usize },

    #[error("failed to spawn vehicle '{vehicle_id}': {message}")]
    VehicleSpawnFailed { vehicle_id: String, message: String },

    #[error("failed to enable autopilot on actor {actor_id}: {message}")]
    AutopilotFailed { actor_id: ActorId, message: String },

    #[error("failed to attach sensor '{sensor_id}' to '{vehicle_id}': {message}")]
    SensorSpawnFailed {
        sensor_id: String,
        vehicle_id: String,
        message: String,
    },

    /// sensor actor 已生成，但客户端拿不到它的数据流
    #[error("no data source for sensor '{sensor_id}' (actor {actor_id})")]
    SourceUnavailable { sensor_id: String, actor_id: ActorId },

    /// 观察者无法跟随 (车辆不存在等)
    #[error("failed to move spectator to vehicle {actor_id}: {message}")]
    SpectatorFailed { actor_id: ActorId, message: String },

    #[error("failed to destroy actor {actor_id}: {message}")]
    DestroyFailed { actor_id: ActorId, message: String },

    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl ActorFactoryError {
    pub fn vehicle_spawn(vehicle_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::VehicleSpawnFailed {
            vehicle_id: vehicle_id.into(),
            message: message.into(),
        }
    }

    pub fn sensor_spawn(
        sensor_id: impl Into<String>,
        vehicle_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::SensorSpawnFailed {
            sensor_id: sensor_id.into(),
            vehicle_id: vehicle_id.into(),
            message: message.into(),
        }
    }

    pub fn autopilot(actor_id: ActorId, message: impl Into<String>) -> Self {
        Self::AutopilotFailed {
            actor_id,
            message: message.into(),
        }
    }

    pub fn spectator(actor_id: ActorId, message: impl Into<String>) -> Self {
        Self::SpectatorFailed {
            actor_id,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ActorFactoryError>;
