//! SensorPacket - Ingestion 输入
//!
//! 原始传感器数据包结构，以及 LiDAR / Radar 的逐点 POD 布局。

use bytemuck::{Pod, Zeroable};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{SensorId, SensorType};

/// LiDAR 每点字节数 (x, y, z, intensity: f32)
pub const LIDAR_POINT_STRIDE: u32 = 16;

/// Radar 每个检测字节数 (velocity, azimuth, altitude, depth: f32)
pub const RADAR_DETECTION_STRIDE: u32 = 16;

/// 传感器数据包
///
/// 从 CARLA 传感器回调接收的原始数据。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorPacket {
    /// 传感器 ID
    pub sensor_id: SensorId,

    /// 传感器类型
    pub sensor_type: SensorType,

    /// CARLA 仿真时间戳 (seconds, f64)
    pub timestamp: f64,

    /// 可选的帧序号 (用于排序/诊断)
    pub frame_id: Option<u64>,

    /// 数据载荷 (零拷贝)
    pub payload: SensorPayload,
}

/// 传感器数据载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SensorPayload {
    /// LiDAR 点云
    PointCloud(PointCloudData),

    /// Radar 检测列表
    Radar(RadarData),

    /// 原始字节 (fallback)
    Raw(Bytes),
}

impl SensorPayload {
    /// 载荷类型名称 (用于日志/错误)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PointCloud(_) => "point_cloud",
            Self::Radar(_) => "radar",
            Self::Raw(_) => "raw",
        }
    }
}

/// LiDAR 点云数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointCloudData {
    /// 点数量
    pub num_points: u32,

    /// 每点字节数 (必须为 16: x,y,z,intensity)
    pub point_stride: u32,

    /// 点云数据 (小端 f32 交错排列)
    pub data: Bytes,
}

impl PointCloudData {
    /// 从点切片构造 (拷贝)
    pub fn from_points(points: &[LidarPoint]) -> Self {
        Self {
            num_points: points.len() as u32,
            point_stride: LIDAR_POINT_STRIDE,
            data: Bytes::copy_from_slice(bytemuck::cast_slice(points)),
        }
    }
}

/// Radar 数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadarData {
    /// 检测点数量
    pub num_detections: u32,

    /// 检测数据 (小端 f32，CARLA RadarDetection 布局)
    pub data: Bytes,
}

impl RadarData {
    /// 从检测切片构造 (拷贝)
    pub fn from_detections(detections: &[RadarDetection]) -> Self {
        Self {
            num_detections: detections.len() as u32,
            data: Bytes::copy_from_slice(bytemuck::cast_slice(detections)),
        }
    }
}

/// 单个 LiDAR 采样点
///
/// 与 CARLA `LidarDetection` 二进制布局一致。
/// `intensity` 为衰减归一化后的强度，取值 [0, 1]。
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct LidarPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub intensity: f32,
}

/// 单个 Radar 检测
///
/// 与 CARLA `RadarDetection` 二进制布局一致：
/// velocity (m/s, 朝向传感器为负), azimuth / altitude (rad), depth (m)。
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct RadarDetection {
    pub velocity: f32,
    pub azimuth: f32,
    pub altitude: f32,
    pub depth: f32,
}
