//! PointCloudFrame - Converter output
//!
//! Colored point cloud ready for rendering. Positions and colors are kept in two
//! index-aligned arrays so renderers can hand them to a GPU or viewer without
//! re-packing; every constructor guarantees both arrays have the same length.

use serde::{Deserialize, Serialize};

use crate::{ContractError, SensorId, SensorType};

/// RGB color, each channel in [0, 1]
pub type Rgb = [f32; 3];

/// Position in the viewer frame (meters)
pub type Position = [f32; 3];

/// A single colored point
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColoredPoint {
    pub position: Position,
    pub color: Rgb,
}

/// One converted sensor frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloudFrame {
    sensor_id: SensorId,
    sensor_type: SensorType,
    timestamp: f64,
    frame_id: Option<u64>,
    positions: Vec<Position>,
    colors: Vec<Rgb>,
}

impl PointCloudFrame {
    /// Build a frame from separate position and color arrays.
    ///
    /// # Errors
    /// Returns `ContractError::FrameShape` if the arrays differ in length.
    pub fn new(
        sensor_id: SensorId,
        sensor_type: SensorType,
        timestamp: f64,
        frame_id: Option<u64>,
        positions: Vec<Position>,
        colors: Vec<Rgb>,
    ) -> Result<Self, ContractError> {
        if positions.len() != colors.len() {
            return Err(ContractError::FrameShape {
                sensor_id: sensor_id.to_string(),
                positions: positions.len(),
                colors: colors.len(),
            });
        }

        Ok(Self {
            sensor_id,
            sensor_type,
            timestamp,
            frame_id,
            positions,
            colors,
        })
    }

    /// Build a frame from colored points.
    pub fn from_points(
        sensor_id: SensorId,
        sensor_type: SensorType,
        timestamp: f64,
        frame_id: Option<u64>,
        points: impl IntoIterator<Item = ColoredPoint>,
    ) -> Self {
        let (positions, colors) = points
            .into_iter()
            .map(|point| (point.position, point.color))
            .unzip();

        Self {
            sensor_id,
            sensor_type,
            timestamp,
            frame_id,
            positions,
            colors,
        }
    }

    /// Empty frame, used as the initial sink content
    pub fn empty(sensor_id: SensorId, sensor_type: SensorType) -> Self {
        Self {
            sensor_id,
            sensor_type,
            timestamp: 0.0,
            frame_id: None,
            positions: Vec::new(),
            colors: Vec::new(),
        }
    }

    pub fn sensor_id(&self) -> &SensorId {
        &self.sensor_id
    }

    pub fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn frame_id(&self) -> Option<u64> {
        self.frame_id
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Iterate points as `ColoredPoint`
    pub fn points(&self) -> impl Iterator<Item = ColoredPoint> + '_ {
        self.positions
            .iter()
            .zip(&self.colors)
            .map(|(&position, &color)| ColoredPoint { position, color })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_misaligned_arrays() {
        let result = PointCloudFrame::new(
            "lidar".into(),
            SensorType::Lidar,
            0.0,
            None,
            vec![[0.0; 3]; 2],
            vec![[0.0; 3]; 1],
        );
        assert!(matches!(
            result,
            Err(ContractError::FrameShape { positions: 2, colors: 1, .. })
        ));
    }

    #[test]
    fn test_from_points_keeps_alignment() {
        let points = (0..5).map(|i| ColoredPoint {
            position: [i as f32, 0.0, 0.0],
            color: [0.0, i as f32 / 4.0, 0.0],
        });
        let frame =
            PointCloudFrame::from_points("radar".into(), SensorType::Radar, 1.5, Some(7), points);

        assert_eq!(frame.len(), 5);
        assert_eq!(frame.positions().len(), frame.colors().len());
        assert_eq!(frame.positions()[3], [3.0, 0.0, 0.0]);
        assert_eq!(frame.colors()[4], [0.0, 1.0, 0.0]);
        assert_eq!(frame.frame_id(), Some(7));
    }

    #[test]
    fn test_empty_frame() {
        let frame = PointCloudFrame::empty("lidar".into(), SensorType::Lidar);
        assert!(frame.is_empty());
        assert_eq!(frame.points().count(), 0);
    }
}
