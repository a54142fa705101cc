//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{ContractError, ViewerBlueprint};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<ViewerBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<ViewerBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<ViewerBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ColormapKind, RendererType, SensorType};

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[[sensors]]
id = "lidar"
sensor_type = "lidar"
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.world.carla_port, 2000);
        assert_eq!(bp.vehicle.spawn_point_index, 10);
        assert_eq!(bp.sensors.len(), 1);
        assert_eq!(bp.sensors[0].frequency_hz, 20.0);
        assert_eq!(bp.sensors[0].transform.location.z, 2.0);
        assert_eq!(bp.viewer.tick_interval_ms, 5);
        assert!(bp.renderers.is_empty());
    }

    #[test]
    fn test_parse_toml_full() {
        let content = r#"
[world]
carla_host = "10.0.0.2"
carla_port = 3000
map = "Town01"

[vehicle]
blueprint = "vehicle.tesla.model3"
spawn_point_index = 3
autopilot = false

[[sensors]]
id = "radar"
sensor_type = "radar"
frequency_hz = 10.0
colormap = "plasma"
[sensors.attributes]
horizontal_fov = "45.0"
[sensors.attenuation]
coefficient = 0.01

[viewer]
point_size = 2.0
show_axes = false

[[renderers]]
name = "ply"
renderer_type = "ply"
[renderers.params]
output_dir = "/tmp/clouds"
"#;
        let bp = parse_toml(content).unwrap();
        assert_eq!(bp.world.carla_host, "10.0.0.2");
        assert_eq!(bp.world.map.as_deref(), Some("Town01"));
        assert!(!bp.vehicle.autopilot);

        let radar = &bp.sensors[0];
        assert_eq!(radar.sensor_type, SensorType::Radar);
        assert_eq!(radar.effective_colormap(), ColormapKind::Plasma);
        assert_eq!(radar.attenuation.coefficient, 0.01);
        assert_eq!(radar.attenuation.reference_range, 100.0);
        assert_eq!(
            radar.effective_attributes().get("horizontal_fov").map(String::as_str),
            Some("45.0")
        );

        assert_eq!(bp.renderers[0].renderer_type, RendererType::Ply);
        assert_eq!(bp.renderers[0].queue_capacity, 4);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "world": { "carla_host": "localhost" },
            "sensors": [
                { "id": "lidar", "sensor_type": "lidar" },
                { "id": "radar", "sensor_type": "radar", "frequency_hz": 10.0 }
            ],
            "renderers": [{ "name": "log", "renderer_type": "log" }]
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        assert_eq!(result.unwrap().sensors.len(), 2);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let result = parse_toml("invalid toml [[[");
        assert!(matches!(result, Err(ContractError::ConfigParse { .. })));
    }

    #[test]
    fn test_parse_unknown_sensor_type() {
        let content = r#"
[[sensors]]
id = "cam"
sensor_type = "camera"
"#;
        assert!(matches!(
            parse_toml(content),
            Err(ContractError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
