//! LiDAR frame converter
//!
//! `(x, y, z, intensity)` rows -> colored points at `(-x, y, z)`, colored by the
//! attenuation position of the intensity.

use contracts::{
    ColoredPoint, LidarPoint, PointCloudFrame, SensorPacket, SensorPayload, SensorType,
};
use tracing::trace;

use crate::frame::decode_rows;
use crate::{AttenuationModel, ColormapTable, ConvertError, FrameConverter, Result};

/// LiDAR converter
#[derive(Debug, Clone)]
pub struct LidarConverter {
    attenuation: AttenuationModel,
    table: &'static ColormapTable,
}

impl LidarConverter {
    pub fn new(attenuation: AttenuationModel, table: &'static ColormapTable) -> Self {
        Self { attenuation, table }
    }

    /// Color and mirror a single point
    #[inline]
    pub fn convert_point(&self, point: &LidarPoint) -> ColoredPoint {
        let position = self.attenuation.position(point.intensity as f64);
        ColoredPoint {
            position: [-point.x, point.y, point.z],
            color: self.table.sample(position),
        }
    }
}

impl FrameConverter for LidarConverter {
    fn sensor_type(&self) -> SensorType {
        SensorType::Lidar
    }

    fn convert(&self, packet: &SensorPacket) -> Result<PointCloudFrame> {
        let SensorPayload::PointCloud(cloud) = &packet.payload else {
            return Err(ConvertError::UnexpectedPayload {
                sensor_id: packet.sensor_id.to_string(),
                expected: "point_cloud",
                actual: packet.payload.kind(),
            });
        };

        let rows = decode_rows::<LidarPoint>(
            &packet.sensor_id,
            &cloud.data,
            cloud.num_points,
            cloud.point_stride,
        )?;

        let frame = PointCloudFrame::from_points(
            packet.sensor_id.clone(),
            SensorType::Lidar,
            packet.timestamp,
            packet.frame_id,
            rows.map(|point| self.convert_point(&point)),
        );

        trace!(
            sensor_id = %packet.sensor_id,
            points = frame.len(),
            "lidar frame converted"
        );
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap;
    use bytes::Bytes;
    use contracts::{ColormapKind, PointCloudData, RadarData};

    fn converter() -> LidarConverter {
        LidarConverter::new(
            AttenuationModel::default(),
            colormap(ColormapKind::Plasma),
        )
    }

    fn packet(payload: SensorPayload) -> SensorPacket {
        SensorPacket {
            sensor_id: "lidar".into(),
            sensor_type: SensorType::Lidar,
            timestamp: 12.5,
            frame_id: Some(3),
            payload,
        }
    }

    #[test]
    fn single_point_is_mirrored_and_colored_at_one() {
        let points = [LidarPoint {
            x: 1.0,
            y: 2.0,
            z: 3.0,
            intensity: 1.0,
        }];
        let frame = converter()
            .convert(&packet(SensorPayload::PointCloud(PointCloudData::from_points(
                &points,
            ))))
            .unwrap();

        assert_eq!(frame.len(), 1);
        assert_eq!(frame.positions()[0], [-1.0, 2.0, 3.0]);
        assert_eq!(frame.colors()[0], colormap(ColormapKind::Plasma).sample(1.0));
        assert_eq!(frame.timestamp(), 12.5);
        assert_eq!(frame.frame_id(), Some(3));
        assert_eq!(frame.sensor_type(), SensorType::Lidar);
    }

    #[test]
    fn zero_intensity_takes_first_color() {
        let points = [LidarPoint {
            x: 4.0,
            y: 0.0,
            z: 0.0,
            intensity: 0.0,
        }];
        let frame = converter()
            .convert(&packet(SensorPayload::PointCloud(PointCloudData::from_points(
                &points,
            ))))
            .unwrap();

        assert_eq!(frame.colors()[0], colormap(ColormapKind::Plasma).first());
    }

    #[test]
    fn empty_frame_is_valid() {
        let frame = converter()
            .convert(&packet(SensorPayload::PointCloud(PointCloudData::from_points(&[]))))
            .unwrap();
        assert!(frame.is_empty());
    }

    #[test]
    fn many_points_stay_aligned() {
        let points: Vec<LidarPoint> = (0..1000)
            .map(|i| LidarPoint {
                x: i as f32,
                y: -(i as f32),
                z: 0.5,
                intensity: (i % 100) as f32 / 100.0,
            })
            .collect();
        let frame = converter()
            .convert(&packet(SensorPayload::PointCloud(PointCloudData::from_points(
                &points,
            ))))
            .unwrap();

        assert_eq!(frame.positions().len(), 1000);
        assert_eq!(frame.colors().len(), 1000);
        assert_eq!(frame.positions()[999], [-999.0, -999.0, 0.5]);
    }

    #[test]
    fn truncated_buffer_is_rejected() {
        let payload = SensorPayload::PointCloud(PointCloudData {
            num_points: 1,
            point_stride: 16,
            data: Bytes::from_static(&[0u8; 15]),
        });
        let err = converter().convert(&packet(payload)).unwrap_err();
        assert_eq!(err.reason(), "malformed_buffer");
    }

    #[test]
    fn radar_payload_is_rejected() {
        let payload = SensorPayload::Radar(RadarData::from_detections(&[]));
        let err = converter().convert(&packet(payload)).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::UnexpectedPayload {
                expected: "point_cloud",
                actual: "radar",
                ..
            }
        ));
    }
}
