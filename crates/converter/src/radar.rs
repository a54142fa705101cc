//! Radar frame converter
//!
//! Polar detections -> Cartesian colored points:
//!
//! ```text
//! x = depth * cos(altitude) * cos(azimuth)
//! y = depth * cos(altitude) * sin(azimuth)
//! z = depth * sin(altitude)
//! ```
//!
//! x is then negated. Color comes from the attenuation position of `|velocity|`.

use contracts::{
    ColoredPoint, PointCloudFrame, RadarDetection, SensorPacket, SensorPayload, SensorType,
    RADAR_DETECTION_STRIDE,
};
use tracing::trace;

use crate::frame::decode_rows;
use crate::{AttenuationModel, ColormapTable, ConvertError, FrameConverter, Result};

/// Radar converter
#[derive(Debug, Clone)]
pub struct RadarConverter {
    attenuation: AttenuationModel,
    table: &'static ColormapTable,
}

impl RadarConverter {
    pub fn new(attenuation: AttenuationModel, table: &'static ColormapTable) -> Self {
        Self { attenuation, table }
    }

    #[inline]
    pub fn convert_detection(&self, detection: &RadarDetection) -> ColoredPoint {
        let depth = detection.depth as f64;
        let (sin_alt, cos_alt) = (detection.altitude as f64).sin_cos();
        let (sin_az, cos_az) = (detection.azimuth as f64).sin_cos();

        let x = depth * cos_alt * cos_az;
        let y = depth * cos_alt * sin_az;
        let z = depth * sin_alt;

        let position = self.attenuation.position((detection.velocity as f64).abs());
        ColoredPoint {
            position: [-x as f32, y as f32, z as f32],
            color: self.table.sample(position),
        }
    }
}

impl FrameConverter for RadarConverter {
    fn sensor_type(&self) -> SensorType {
        SensorType::Radar
    }

    fn convert(&self, packet: &SensorPacket) -> Result<PointCloudFrame> {
        let SensorPayload::Radar(radar) = &packet.payload else {
            return Err(ConvertError::UnexpectedPayload {
                sensor_id: packet.sensor_id.to_string(),
                expected: "radar",
                actual: packet.payload.kind(),
            });
        };

        let rows = decode_rows::<RadarDetection>(
            &packet.sensor_id,
            &radar.data,
            radar.num_detections,
            RADAR_DETECTION_STRIDE,
        )?;

        let frame = PointCloudFrame::from_points(
            packet.sensor_id.clone(),
            SensorType::Radar,
            packet.timestamp,
            packet.frame_id,
            rows.map(|detection| self.convert_detection(&detection)),
        );

        trace!(
            sensor_id = %packet.sensor_id,
            detections = frame.len(),
            "radar frame converted"
        );
        Ok(frame)
    }
}
