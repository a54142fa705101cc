//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! 负责：
//! - 解析 TOML/JSON 会话配置，得到 `ViewerBlueprint`
//! - 没有配置文件时给出内置 LIDAR + RADAR 会话
//! - 应用命令行 / 环境变量覆盖，然后统一校验
//!
//! # Example
//!
//! ```no_run
//! use config_loader::{ConfigLoader, SessionOverrides};
//! use std::path::Path;
//!
//! let overrides = SessionOverrides {
//!     carla_host: Some("10.0.0.2".into()),
//!     ..Default::default()
//! };
//! let blueprint =
//!     ConfigLoader::load_session(Some(Path::new("lidar_radar.toml")), &overrides).unwrap();
//! println!("Sensors: {}", blueprint.sensors.len());
//! ```

mod parser;
mod validator;

pub use contracts::ViewerBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// 加载之后、校验之前应用的会话覆盖
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionOverrides {
    pub carla_host: Option<String>,
    pub carla_port: Option<u16>,
    pub tick_interval_ms: Option<u64>,
    /// `Some(false)` 关闭跟车观察者
    pub chase_camera: Option<bool>,
}

impl SessionOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// 写入 blueprint，返回被覆盖的字段名
    pub fn apply(&self, blueprint: &mut ViewerBlueprint) -> Vec<&'static str> {
        let mut applied = Vec::new();
        if let Some(host) = &self.carla_host {
            blueprint.world.carla_host = host.clone();
            applied.push("world.carla_host");
        }
        if let Some(port) = self.carla_port {
            blueprint.world.carla_port = port;
            applied.push("world.carla_port");
        }
        if let Some(tick) = self.tick_interval_ms {
            blueprint.viewer.tick_interval_ms = tick;
            applied.push("viewer.tick_interval_ms");
        }
        if let Some(chase) = self.chase_camera {
            blueprint.viewer.chase_camera = chase;
            applied.push("viewer.chase_camera");
        }
        applied
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// 会话配置：`path` 为 None 时使用 `ViewerBlueprint::lidar_radar_default()`
    ///
    /// 覆盖在解析之后应用，校验在覆盖之后进行，所以非法覆盖 (如 tick 0) 同样被拒绝。
    pub fn load_session(
        path: Option<&Path>,
        overrides: &SessionOverrides,
    ) -> Result<ViewerBlueprint, ContractError> {
        let mut blueprint = match path {
            Some(path) => {
                let format = Self::detect_format(path)?;
                parser::parse(&Self::read_file(path)?, format)?
            }
            None => ViewerBlueprint::lidar_radar_default(),
        };

        let applied = overrides.apply(&mut blueprint);
        if !applied.is_empty() {
            tracing::debug!(fields = ?applied, "session overrides applied");
        }

        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<ViewerBlueprint, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ViewerBlueprint, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Validate an already constructed blueprint
    pub fn validate(blueprint: &ViewerBlueprint) -> Result<(), ContractError> {
        validator::validate(blueprint)
    }

    /// Serialize ViewerBlueprint to TOML string
    pub fn to_toml(blueprint: &ViewerBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize ViewerBlueprint to JSON string
    pub fn to_json(blueprint: &ViewerBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ViewerBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }
}
