//! 配置校验模块
//!
//! 校验规则：
//! - 至少一个传感器，sensor_id 非空且唯一
//! - frequency_hz > 0
//! - 衰减参数 coefficient / reference_range / min_value > 0
//! - 视窗：tick_interval_ms > 0，背景色各通道在 [0, 1]，point_size > 0，chase_offset 有限
//! - 渲染器名称非空且唯一，ply 渲染器需要 output_dir

use std::collections::HashSet;

use contracts::{ContractError, RendererType, SensorConfig, ViewerBlueprint};

/// 校验 ViewerBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &ViewerBlueprint) -> Result<(), ContractError> {
    validate_vehicle(blueprint)?;
    validate_sensor_ids(blueprint)?;
    for sensor in &blueprint.sensors {
        validate_sensor_frequency(sensor)?;
        validate_attenuation(sensor)?;
    }
    validate_viewer(blueprint)?;
    validate_renderers(blueprint)?;
    Ok(())
}

fn validate_vehicle(blueprint: &ViewerBlueprint) -> Result<(), ContractError> {
    if blueprint.vehicle.blueprint.trim().is_empty() {
        return Err(ContractError::config_validation(
            "vehicle.blueprint",
            "vehicle blueprint cannot be empty",
        ));
    }
    Ok(())
}

/// 校验 sensor_id 唯一性
fn validate_sensor_ids(blueprint: &ViewerBlueprint) -> Result<(), ContractError> {
    if blueprint.sensors.is_empty() {
        return Err(ContractError::config_validation(
            "sensors",
            "at least one sensor is required",
        ));
    }

    let mut seen = HashSet::new();
    for (idx, sensor) in blueprint.sensors.iter().enumerate() {
        if sensor.id.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("sensors[{}].id", idx),
                "sensor id cannot be empty",
            ));
        }
        if !seen.insert(sensor.id.as_str()) {
            return Err(ContractError::config_validation(
                format!("sensors[id={}]", sensor.id),
                "duplicate sensor_id",
            ));
        }
    }
    Ok(())
}

/// 校验传感器采样率
fn validate_sensor_frequency(sensor: &SensorConfig) -> Result<(), ContractError> {
    // NaN 也不合法
    if !(sensor.frequency_hz > 0.0) || !sensor.frequency_hz.is_finite() {
        return Err(ContractError::config_validation(
            format!("sensors[{}].frequency_hz", sensor.id),
            format!("frequency_hz must be > 0, got {}", sensor.frequency_hz),
        ));
    }
    Ok(())
}

/// 校验衰减参数
fn validate_attenuation(sensor: &SensorConfig) -> Result<(), ContractError> {
    let attenuation = &sensor.attenuation;
    let params = [
        ("coefficient", attenuation.coefficient),
        ("reference_range", attenuation.reference_range),
        ("min_value", attenuation.min_value),
    ];

    for (name, value) in params {
        if !(value > 0.0) || !value.is_finite() {
            return Err(ContractError::config_validation(
                format!("sensors[{}].attenuation.{}", sensor.id, name),
                format!("{} must be > 0, got {}", name, value),
            ));
        }
    }
    Ok(())
}

/// 校验视窗配置
fn validate_viewer(blueprint: &ViewerBlueprint) -> Result<(), ContractError> {
    let viewer = &blueprint.viewer;

    if viewer.tick_interval_ms == 0 {
        return Err(ContractError::config_validation(
            "viewer.tick_interval_ms",
            "tick_interval_ms must be > 0",
        ));
    }

    if viewer
        .background_color
        .iter()
        .any(|c| !(0.0..=1.0).contains(c))
    {
        return Err(ContractError::config_validation(
            "viewer.background_color",
            format!(
                "background_color channels must be in [0, 1], got {:?}",
                viewer.background_color
            ),
        ));
    }

    if !(viewer.point_size > 0.0) {
        return Err(ContractError::config_validation(
            "viewer.point_size",
            format!("point_size must be > 0, got {}", viewer.point_size),
        ));
    }

    let offset = viewer.chase_offset;
    if ![offset.x, offset.y, offset.z].iter().all(|v| v.is_finite()) {
        return Err(ContractError::config_validation(
            "viewer.chase_offset",
            format!("chase_offset must be finite, got {:?}", offset),
        ));
    }

    Ok(())
}

/// 校验渲染器配置
fn validate_renderers(blueprint: &ViewerBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, renderer) in blueprint.renderers.iter().enumerate() {
        if renderer.name.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("renderers[{}].name", idx),
                "renderer name cannot be empty",
            ));
        }
        if !seen.insert(renderer.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("renderers[name={}]", renderer.name),
                "duplicate renderer name",
            ));
        }
        if renderer.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("renderers[{}].queue_capacity", renderer.name),
                "queue_capacity must be > 0",
            ));
        }
        if renderer.renderer_type == RendererType::Ply
            && renderer
                .params
                .get("output_dir")
                .is_none_or(|dir| dir.trim().is_empty())
        {
            return Err(ContractError::config_validation(
                format!("renderers[{}].params.output_dir", renderer.name),
                "ply renderer requires an 'output_dir' param",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{RendererConfig, SensorType};
    use std::collections::HashMap;

    fn minimal_blueprint() -> ViewerBlueprint {
        ViewerBlueprint::lidar_radar_default()
    }

    fn error_text(bp: &ViewerBlueprint) -> String {
        match validate(bp) {
            Ok(()) => panic!("expected validation error"),
            Err(e) => e.to_string(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&minimal_blueprint()).is_ok());
    }

    #[test]
    fn test_no_sensors() {
        let mut bp = minimal_blueprint();
        bp.sensors.clear();
        let err = error_text(&bp);
        assert!(err.contains("at least one sensor"), "got: {err}");
    }

    #[test]
    fn test_duplicate_sensor_id() {
        let mut bp = minimal_blueprint();
        bp.sensors
            .push(SensorConfig::with_defaults("lidar", SensorType::Radar));
        let err = error_text(&bp);
        assert!(err.contains("duplicate sensor_id"), "got: {err}");
    }

    #[test]
    fn test_invalid_frequency() {
        let mut bp = minimal_blueprint();
        bp.sensors[0].frequency_hz = -5.0;
        let err = error_text(&bp);
        assert!(err.contains("frequency_hz must be > 0"), "got: {err}");

        bp.sensors[0].frequency_hz = f64::NAN;
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_invalid_attenuation() {
        let mut bp = minimal_blueprint();
        bp.sensors[1].attenuation.reference_range = 0.0;
        let err = error_text(&bp);
        assert!(err.contains("reference_range"), "got: {err}");
    }

    #[test]
    fn test_invalid_background_color() {
        let mut bp = minimal_blueprint();
        bp.viewer.background_color = [0.0, 1.5, 0.0];
        let err = error_text(&bp);
        assert!(err.contains("background_color"), "got: {err}");
    }

    #[test]
    fn test_non_finite_chase_offset() {
        let mut bp = minimal_blueprint();
        bp.viewer.chase_offset.z = f64::INFINITY;
        let err = error_text(&bp);
        assert!(err.contains("chase_offset"), "got: {err}");
    }

    #[test]
    fn test_zero_tick_interval() {
        let mut bp = minimal_blueprint();
        bp.viewer.tick_interval_ms = 0;
        let err = error_text(&bp);
        assert!(err.contains("tick_interval_ms"), "got: {err}");
    }

    #[test]
    fn test_renderer_names() {
        let mut bp = minimal_blueprint();
        bp.renderers[0].name = String::new();
        let err = error_text(&bp);
        assert!(err.contains("cannot be empty"), "got: {err}");

        let mut bp = minimal_blueprint();
        bp.renderers.push(bp.renderers[0].clone());
        let err = error_text(&bp);
        assert!(err.contains("duplicate renderer name"), "got: {err}");
    }

    #[test]
    fn test_ply_requires_output_dir() {
        let mut bp = minimal_blueprint();
        let mut ply = RendererConfig {
            name: "ply".into(),
            renderer_type: RendererType::Ply,
            queue_capacity: 4,
            params: HashMap::new(),
        };
        bp.renderers.push(ply.clone());
        let err = error_text(&bp);
        assert!(err.contains("output_dir"), "got: {err}");

        ply.params.insert("output_dir".into(), "/tmp/out".into());
        bp.renderers[1] = ply;
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_rerun_type_accepted() {
        let mut bp = minimal_blueprint();
        bp.renderers.push(RendererConfig {
            name: "rerun".into(),
            renderer_type: RendererType::Rerun,
            queue_capacity: 4,
            params: HashMap::new(),
        });
        assert!(validate(&bp).is_ok());
    }
}
