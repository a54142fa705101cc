//! ViewerBlueprint - Config Loader 输出
//!
//! 描述完整的可视化会话配置：CARLA 连接、自车、传感器、着色、视窗、渲染输出。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的会话配置蓝图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 世界设置
    #[serde(default)]
    pub world: WorldConfig,

    /// 自车
    #[serde(default)]
    pub vehicle: VehicleConfig,

    /// 挂载在自车上的传感器
    pub sensors: Vec<SensorConfig>,

    /// 视窗设置
    #[serde(default)]
    pub viewer: ViewerConfig,

    /// 渲染输出
    #[serde(default)]
    pub renderers: Vec<RendererConfig>,
}

impl ViewerBlueprint {
    /// 按 ID 查找传感器
    pub fn sensor(&self, id: &str) -> Option<&SensorConfig> {
        self.sensors.iter().find(|sensor| sensor.id == id)
    }

    /// 默认会话：一个 LiDAR + 一个 Radar，均挂载在车顶 z=2m
    pub fn lidar_radar_default() -> Self {
        Self {
            version: ConfigVersion::V1,
            world: WorldConfig::default(),
            vehicle: VehicleConfig::default(),
            sensors: vec![
                SensorConfig::with_defaults("lidar", SensorType::Lidar),
                SensorConfig::with_defaults("radar", SensorType::Radar),
            ],
            viewer: ViewerConfig::default(),
            renderers: vec![RendererConfig {
                name: "log".into(),
                renderer_type: RendererType::Log,
                queue_capacity: default_queue_capacity(),
                params: HashMap::new(),
            }],
        }
    }
}

/// 世界配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// CARLA 服务器地址
    #[serde(default = "default_carla_host")]
    pub carla_host: String,

    /// CARLA 服务器端口
    #[serde(default = "default_carla_port")]
    pub carla_port: u16,

    /// 地图名称 (仅用于日志)
    #[serde(default)]
    pub map: Option<String>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            carla_host: default_carla_host(),
            carla_port: default_carla_port(),
            map: None,
        }
    }
}

fn default_carla_host() -> String {
    "localhost".to_string()
}

fn default_carla_port() -> u16 {
    2000
}

/// 自车配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleConfig {
    /// 唯一标识符
    #[serde(default = "default_vehicle_id")]
    pub id: String,

    /// 蓝图名称
    #[serde(default = "default_vehicle_blueprint")]
    pub blueprint: String,

    /// 地图出生点序号
    #[serde(default = "default_spawn_point_index")]
    pub spawn_point_index: usize,

    /// 是否开启 CARLA autopilot
    #[serde(default = "default_true")]
    pub autopilot: bool,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            id: default_vehicle_id(),
            blueprint: default_vehicle_blueprint(),
            spawn_point_index: default_spawn_point_index(),
            autopilot: true,
        }
    }
}

fn default_vehicle_id() -> String {
    "ego".to_string()
}

fn default_vehicle_blueprint() -> String {
    "vehicle.lincoln.mkz_2020".to_string()
}

fn default_spawn_point_index() -> usize {
    10
}

fn default_true() -> bool {
    true
}

/// 3D 变换：位置 + 旋转
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// 位置 (x, y, z) 单位：米
    #[serde(default)]
    pub location: Location,

    /// 旋转 (pitch, yaw, roll) 单位：度
    #[serde(default)]
    pub rotation: Rotation,
}

impl Transform {
    /// 车顶默认挂载位置 (z = 2m)
    pub fn roof() -> Self {
        Self {
            location: Location {
                x: 0.0,
                y: 0.0,
                z: 2.0,
            },
            rotation: Rotation::default(),
        }
    }

    /// 局部坐标点变换到世界坐标 (先按 pitch/yaw/roll 旋转，再平移)
    pub fn transform_point(&self, local: Location) -> Location {
        let (sp, cp) = self.rotation.pitch.to_radians().sin_cos();
        let (sy, cy) = self.rotation.yaw.to_radians().sin_cos();
        let (sr, cr) = self.rotation.roll.to_radians().sin_cos();
        let Location { x, y, z } = local;

        Location {
            x: self.location.x
                + x * (cp * cy)
                + y * (cy * sp * sr - sy * cr)
                + z * (-cy * sp * cr - sy * sr),
            y: self.location.y
                + x * (cp * sy)
                + y * (sy * sp * sr + cy * cr)
                + z * (-sy * sp * cr + cy * sr),
            z: self.location.z + x * sp + y * (-cp * sr) + z * (cp * cr),
        }
    }

    /// 跟车视角：相对本变换偏移 `offset`，朝向不变
    pub fn chase_pose(&self, offset: Location) -> Transform {
        Transform {
            location: self.transform_point(offset),
            rotation: self.rotation,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub yaw: f64,
    #[serde(default)]
    pub roll: f64,
}

/// 传感器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    Lidar,
    Radar,
}

impl SensorType {
    /// CARLA 蓝图 ID
    pub fn blueprint_id(self) -> &'static str {
        match self {
            Self::Lidar => "sensor.lidar.ray_cast",
            Self::Radar => "sensor.other.radar",
        }
    }

    /// 该类型的默认色表
    pub fn default_colormap(self) -> ColormapKind {
        match self {
            Self::Lidar => ColormapKind::Plasma,
            Self::Radar => ColormapKind::Winter,
        }
    }

    /// 该类型的默认蓝图属性
    pub fn default_attributes(self) -> HashMap<String, String> {
        let pairs: &[(&str, &str)] = match self {
            Self::Lidar => &[
                ("range", "100.0"),
                ("noise_stddev", "0.1"),
                ("upper_fov", "15.0"),
                ("lower_fov", "-25.0"),
                ("channels", "64.0"),
                ("rotation_frequency", "20.0"),
                ("points_per_second", "500000"),
            ],
            Self::Radar => &[
                ("horizontal_fov", "30.0"),
                ("vertical_fov", "30.0"),
                ("points_per_second", "10000"),
            ],
        };
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

impl std::fmt::Display for SensorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lidar => f.write_str("lidar"),
            Self::Radar => f.write_str("radar"),
        }
    }
}

/// 色表名称
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColormapKind {
    /// matplotlib "plasma"
    Plasma,
    /// matplotlib "winter"
    Winter,
}

/// 对数衰减映射参数
///
/// `p = 1 - ln(max(v, min_value)) / ln(exp(-coefficient * reference_range))`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttenuationConfig {
    #[serde(default = "default_coefficient")]
    pub coefficient: f64,

    #[serde(default = "default_reference_range")]
    pub reference_range: f64,

    /// log 前的下限钳位
    #[serde(default = "default_min_value")]
    pub min_value: f64,
}

impl Default for AttenuationConfig {
    fn default() -> Self {
        Self {
            coefficient: default_coefficient(),
            reference_range: default_reference_range(),
            min_value: default_min_value(),
        }
    }
}

fn default_coefficient() -> f64 {
    0.004
}

fn default_reference_range() -> f64 {
    100.0
}

fn default_min_value() -> f64 {
    1e-6
}

/// 传感器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    /// 唯一标识符
    pub id: String,

    /// 传感器类型
    pub sensor_type: SensorType,

    /// 相对于自车的挂载位姿
    #[serde(default = "Transform::roof")]
    pub transform: Transform,

    /// 采样频率 (Hz)，必须 > 0
    #[serde(default = "default_frequency_hz")]
    pub frequency_hz: f64,

    /// 色表 (缺省时按传感器类型选择)
    #[serde(default)]
    pub colormap: Option<ColormapKind>,

    /// 覆盖默认值的蓝图属性
    #[serde(default)]
    pub attributes: HashMap<String, String>,

    /// 衰减映射参数
    #[serde(default)]
    pub attenuation: AttenuationConfig,
}

fn default_frequency_hz() -> f64 {
    20.0
}

impl SensorConfig {
    /// 使用类型默认值构造
    pub fn with_defaults(id: impl Into<String>, sensor_type: SensorType) -> Self {
        Self {
            id: id.into(),
            sensor_type,
            transform: Transform::roof(),
            frequency_hz: default_frequency_hz(),
            colormap: None,
            attributes: HashMap::new(),
            attenuation: AttenuationConfig::default(),
        }
    }

    /// 实际使用的色表
    pub fn effective_colormap(&self) -> ColormapKind {
        self.colormap
            .unwrap_or_else(|| self.sensor_type.default_colormap())
    }

    /// 默认属性与用户属性合并 (用户优先)
    pub fn effective_attributes(&self) -> HashMap<String, String> {
        let mut merged = self.sensor_type.default_attributes();
        merged.extend(
            self.attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        merged
    }
}

/// 视窗配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// 渲染周期 (毫秒)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    #[serde(default = "default_window_name")]
    pub window_name: String,

    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_left")]
    pub left: u32,

    #[serde(default = "default_top")]
    pub top: u32,

    /// 背景色 RGB，各通道 [0, 1]
    #[serde(default = "default_background_color")]
    pub background_color: [f32; 3],

    #[serde(default = "default_point_size")]
    pub point_size: f32,

    /// 是否绘制坐标轴
    #[serde(default = "default_true")]
    pub show_axes: bool,

    /// 模拟器观察者 (spectator) 每个 tick 跟随自车
    #[serde(default = "default_true")]
    pub chase_camera: bool,

    /// 观察者相对自车的位置 (车体坐标系，米)
    #[serde(default = "default_chase_offset")]
    pub chase_offset: Location,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            window_name: default_window_name(),
            width: default_width(),
            height: default_height(),
            left: default_left(),
            top: default_top(),
            background_color: default_background_color(),
            point_size: default_point_size(),
            show_axes: true,
            chase_camera: true,
            chase_offset: default_chase_offset(),
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    5
}

fn default_window_name() -> String {
    "Carla Lidar".to_string()
}

fn default_width() -> u32 {
    960
}

fn default_height() -> u32 {
    540
}

fn default_left() -> u32 {
    480
}

fn default_top() -> u32 {
    270
}

fn default_background_color() -> [f32; 3] {
    [0.05, 0.05, 0.05]
}

fn default_point_size() -> f32 {
    1.0
}

fn default_chase_offset() -> Location {
    Location {
        x: -4.0,
        y: 0.0,
        z: 2.5,
    }
}

/// 渲染输出配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RendererConfig {
    /// 渲染器名称
    pub name: String,

    /// 渲染器类型
    pub renderer_type: RendererType,

    /// 队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// 类型特定参数
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    4
}

/// 渲染器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererType {
    /// 日志摘要
    Log,
    /// PLY 快照文件
    Ply,
    /// Rerun 可视化
    Rerun,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensor_defaults_follow_type() {
        let lidar = SensorConfig::with_defaults("lidar", SensorType::Lidar);
        assert_eq!(lidar.effective_colormap(), ColormapKind::Plasma);
        assert_eq!(lidar.transform.location.z, 2.0);
        assert_eq!(
            lidar.effective_attributes().get("channels").map(String::as_str),
            Some("64.0")
        );

        let radar = SensorConfig::with_defaults("radar", SensorType::Radar);
        assert_eq!(radar.effective_colormap(), ColormapKind::Winter);
        assert_eq!(radar.sensor_type.blueprint_id(), "sensor.other.radar");
    }

    fn assert_close(actual: Location, expected: [f64; 3]) {
        let diff = [actual.x - expected[0], actual.y - expected[1], actual.z - expected[2]];
        assert!(diff.iter().all(|d| d.abs() < 1e-9), "{:?} != {:?}", actual, expected);
    }

    #[test]
    fn chase_pose_sits_behind_and_above() {
        let offset = ViewerConfig::default().chase_offset;
        let heading_east = Transform {
            location: Location { x: 10.0, y: 5.0, z: 0.5 },
            rotation: Rotation::default(),
        };
        let pose = heading_east.chase_pose(offset);
        assert_close(pose.location, [6.0, 5.0, 3.0]);
        assert_eq!(pose.rotation, heading_east.rotation);

        // yaw 90°: 车头朝 +y，观察者在 -y 方向
        let heading_north = Transform {
            rotation: Rotation { yaw: 90.0, ..Default::default() },
            ..heading_east
        };
        assert_close(heading_north.chase_pose(offset).location, [10.0, 1.0, 3.0]);
    }

    #[test]
    fn pitch_tilts_offset() {
        let nose_up = Transform {
            rotation: Rotation { pitch: 90.0, ..Default::default() },
            ..Default::default()
        };
        assert_close(nose_up.transform_point(Location { x: 1.0, y: 0.0, z: 0.0 }), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn user_attributes_override_defaults() {
        let mut lidar = SensorConfig::with_defaults("lidar", SensorType::Lidar);
        lidar.attributes.insert("range".into(), "50.0".into());
        lidar.colormap = Some(ColormapKind::Winter);

        let attrs = lidar.effective_attributes();
        assert_eq!(attrs.get("range").map(String::as_str), Some("50.0"));
        assert_eq!(attrs.get("upper_fov").map(String::as_str), Some("15.0"));
        assert_eq!(lidar.effective_colormap(), ColormapKind::Winter);
    }

    #[test]
    fn minimal_json_uses_defaults() {
        let json = r#"{ "sensors": [ { "id": "lidar", "sensor_type": "lidar" } ] }"#;
        let blueprint: ViewerBlueprint = serde_json::from_str(json).unwrap();

        assert_eq!(blueprint.world.carla_port, 2000);
        assert_eq!(blueprint.vehicle.spawn_point_index, 10);
        assert!(blueprint.vehicle.autopilot);
        assert_eq!(blueprint.viewer.tick_interval_ms, 5);
        assert_eq!(blueprint.viewer.window_name, "Carla Lidar");
        assert_eq!(blueprint.sensors[0].attenuation, AttenuationConfig::default());
        assert!(blueprint.renderers.is_empty());
    }

    #[test]
    fn lidar_radar_default_has_both_sensors() {
        let blueprint = ViewerBlueprint::lidar_radar_default();
        assert!(blueprint.sensor("lidar").is_some());
        assert!(blueprint.sensor("radar").is_some());
        assert_eq!(blueprint.renderers.len(), 1);
    }
}
