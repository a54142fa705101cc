//! Ingestion 错误类型

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 同一传感器 ID 重复注册
    #[error("sensor {sensor_id} is already registered")]
    DuplicateSensor {
        /// 传感器 ID
        sensor_id: String,
    },

    /// 数据源类型与配置不一致
    #[error("sensor {sensor_id}: source is {actual}, config says {expected}")]
    SensorTypeMismatch {
        /// 传感器 ID
        sensor_id: String,
        expected: String,
        actual: String,
    },

    /// 订阅端已被取走
    #[error("subscribers already taken")]
    SubscribersTaken,
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
