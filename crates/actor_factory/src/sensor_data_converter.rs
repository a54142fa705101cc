//! CARLA measurement → `SensorPacket`
//!
//! 只在 `real-carla` feature 下编译。CARLA 的缓冲区在回调返回后失效，
//! 所以这里总是拷贝一份到 `Bytes`，转换在 ingestion 侧完成。

use bytes::Bytes;
use carla::sensor::data::{LidarMeasurement, RadarMeasurement};
use carla::sensor::{SensorData, SensorDataBase};
use contracts::{
    PointCloudData, RadarData, SensorPacket, SensorPayload, SensorType, LIDAR_POINT_STRIDE,
    RADAR_DETECTION_STRIDE,
};

/// 按原始内存布局拷贝一段检测记录
///
/// # Safety
/// `T` 必须是无填充的纯 f32 记录 (CARLA `LidarDetection` / `RadarDetection`)。
unsafe fn copy_rows<T>(rows: &[T]) -> Bytes {
    let bytes = std::slice::from_raw_parts(rows.as_ptr().cast::<u8>(), std::mem::size_of_val(rows));
    Bytes::copy_from_slice(bytes)
}

fn measurement_payload(sensor_type: SensorType, data: &SensorData) -> Option<SensorPayload> {
    match sensor_type {
        SensorType::Lidar => {
            let measurement = LidarMeasurement::try_from(data.clone()).ok()?;
            let rows = measurement.as_slice();
            debug_assert_eq!(std::mem::size_of_val(rows), rows.len() * LIDAR_POINT_STRIDE as usize);
            // SAFETY: LidarDetection = (x, y, z, intensity) 四个 f32
            let data = unsafe { copy_rows(rows) };
            Some(SensorPayload::PointCloud(PointCloudData {
                num_points: rows.len() as u32,
                point_stride: LIDAR_POINT_STRIDE,
                data,
            }))
        }
        SensorType::Radar => {
            let measurement = RadarMeasurement::try_from(data.clone()).ok()?;
            let rows = measurement.as_slice();
            debug_assert_eq!(
                std::mem::size_of_val(rows),
                rows.len() * RADAR_DETECTION_STRIDE as usize
            );
            // SAFETY: RadarDetection = (velocity, azimuth, altitude, depth) 四个 f32
            let data = unsafe { copy_rows(rows) };
            Some(SensorPayload::Radar(RadarData {
                num_detections: rows.len() as u32,
                data,
            }))
        }
    }
}

/// 测量类型与传感器类型不符时返回 `None`
pub fn convert_sensor_data(
    sensor_id: &str,
    sensor_type: SensorType,
    data: &SensorData,
) -> Option<SensorPacket> {
    let payload = measurement_payload(sensor_type, data)?;

    Some(SensorPacket {
        sensor_id: sensor_id.into(),
        sensor_type,
        timestamp: data.timestamp(),
        frame_id: Some(data.frame() as u64),
        payload,
    })
}
