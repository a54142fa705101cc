//! ContractError - 跨 crate 共享的错误
//!
//! 配置 / 点云帧 / 渲染器 三类。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContractError {
    /// TOML / JSON 语法或结构错误
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// 字段取值不合法
    #[error("invalid config at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// positions 与 colors 长度不一致
    #[error("frame from '{sensor_id}' has {positions} positions but {colors} colors")]
    FrameShape {
        sensor_id: String,
        positions: usize,
        colors: usize,
    },

    /// 渲染器无法启动 (参数错误、viewer 无法 spawn)
    #[error("renderer '{renderer_name}' failed to start: {message}")]
    RendererStartup {
        renderer_name: String,
        message: String,
    },

    /// 单次 render / flush 失败
    #[error("renderer '{renderer_name}' failed to write: {message}")]
    RendererWrite {
        renderer_name: String,
        message: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn renderer_startup(renderer_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RendererStartup {
            renderer_name: renderer_name.into(),
            message: message.into(),
        }
    }

    pub fn renderer_write(renderer_name: impl Into<String>, message: impl ToString) -> Self {
        Self::RendererWrite {
            renderer_name: renderer_name.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_field() {
        let err = ContractError::config_validation("sensors[1].frequency_hz", "must be > 0");
        assert_eq!(
            err.to_string(),
            "invalid config at 'sensors[1].frequency_hz': must be > 0"
        );
    }

    #[test]
    fn test_io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: ContractError = io.into();
        assert!(matches!(err, ContractError::Io(_)));
    }
}
