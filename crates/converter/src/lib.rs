//! # Converter
//!
//! LiDAR / Radar 帧到彩色点云的转换。
//!
//! 负责：
//! - 对数衰减映射 (强度 / 速度 -> 色表位置)
//! - plasma / winter 色表 (进程内只构建一次)
//! - 原始字节校验与逐点解码
//! - 输出 `PointCloudFrame` (x 取反，进入视窗坐标系)
//!
//! ## 使用示例
//!
//! ```ignore
//! use converter::converter_for;
//!
//! let converter = converter_for(&sensor_config);
//! match converter.convert(&packet) {
//!     Ok(frame) => publisher.publish(frame),
//!     Err(e) => tracing::warn!(error = %e, "frame rejected"),
//! }
//! ```

mod attenuation;
mod colormap;
mod error;
mod frame;
mod lidar;
mod radar;

pub use attenuation::AttenuationModel;
pub use colormap::{colormap, ColormapTable, DEFAULT_RESOLUTION, MIN_RESOLUTION};
pub use error::{ConvertError, Result};
pub use frame::{converter_for, FrameConverter};
pub use lidar::LidarConverter;
pub use radar::RadarConverter;
