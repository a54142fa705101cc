//! FrameConverter trait and shared row decoding

use bytemuck::Pod;
use contracts::{PointCloudFrame, SensorConfig, SensorPacket, SensorType};

use crate::{colormap, AttenuationModel, ConvertError, LidarConverter, RadarConverter, Result};

/// Converts one raw sensor packet into a colored point cloud
///
/// Implementations are synchronous, do no I/O and never panic on bad input.
pub trait FrameConverter: Send + Sync {
    /// Sensor type this converter accepts
    fn sensor_type(&self) -> SensorType;

    /// Convert a packet
    ///
    /// # Errors
    /// Returns `ConvertError` if the payload is malformed; the frame should be dropped.
    fn convert(&self, packet: &SensorPacket) -> Result<PointCloudFrame>;
}

/// Build the converter for a sensor config
pub fn converter_for(config: &SensorConfig) -> Box<dyn FrameConverter> {
    let attenuation = AttenuationModel::from(&config.attenuation);
    let table = colormap(config.effective_colormap());

    match config.sensor_type {
        SensorType::Lidar => Box::new(LidarConverter::new(attenuation, table)),
        SensorType::Radar => Box::new(RadarConverter::new(attenuation, table)),
    }
}

/// Validate a packed buffer and decode it row by row.
///
/// Rows are read unaligned since `Bytes` gives no alignment guarantee.
pub(crate) fn decode_rows<'a, T: Pod>(
    sensor_id: &str,
    data: &'a [u8],
    declared_rows: u32,
    declared_stride: u32,
) -> Result<impl ExactSizeIterator<Item = T> + 'a> {
    let stride = std::mem::size_of::<T>();

    if declared_stride as usize != stride {
        return Err(ConvertError::StrideMismatch {
            sensor_id: sensor_id.to_string(),
            expected: stride as u32,
            actual: declared_stride,
        });
    }

    if data.len() % stride != 0 {
        return Err(ConvertError::MalformedBuffer {
            sensor_id: sensor_id.to_string(),
            len: data.len(),
            stride,
        });
    }

    let actual_rows = data.len() / stride;
    if actual_rows != declared_rows as usize {
        return Err(ConvertError::PointCountMismatch {
            sensor_id: sensor_id.to_string(),
            declared: declared_rows,
            actual: actual_rows,
        });
    }

    Ok(data
        .chunks_exact(stride)
        .map(bytemuck::pod_read_unaligned::<T>))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{LidarPoint, SensorType};

    #[test]
    fn decode_rejects_partial_row() {
        let data = [0u8; 20];
        let result = decode_rows::<LidarPoint>("lidar", &data, 1, 16);
        assert!(matches!(result, Err(ConvertError::MalformedBuffer { len: 20, .. })));
    }

    #[test]
    fn decode_rejects_wrong_stride() {
        let data = [0u8; 32];
        let result = decode_rows::<LidarPoint>("lidar", &data, 2, 12);
        assert!(matches!(
            result,
            Err(ConvertError::StrideMismatch {
                expected: 16,
                actual: 12,
                ..
            })
        ));
    }

    #[test]
    fn decode_rejects_count_mismatch() {
        let data = [0u8; 32];
        let result = decode_rows::<LidarPoint>("lidar", &data, 3, 16);
        assert!(matches!(
            result,
            Err(ConvertError::PointCountMismatch {
                declared: 3,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn decode_reads_unaligned_rows() {
        let point = LidarPoint {
            x: 1.0,
            y: -2.0,
            z: 3.5,
            intensity: 0.25,
        };
        // Offset by one byte so the slice start is misaligned for f32
        let mut buffer = vec![0u8];
        buffer.extend_from_slice(bytemuck::bytes_of(&point));
        let rows: Vec<LidarPoint> = decode_rows("lidar", &buffer[1..], 1, 16).unwrap().collect();
        assert_eq!(rows, vec![point]);
    }

    #[test]
    fn converter_for_picks_by_type() {
        let lidar = SensorConfig::with_defaults("lidar", SensorType::Lidar);
        let radar = SensorConfig::with_defaults("radar", SensorType::Radar);
        assert_eq!(converter_for(&lidar).sensor_type(), SensorType::Lidar);
        assert_eq!(converter_for(&radar).sensor_type(), SensorType::Radar);
    }
}
