//! PointCloudSink - per-sensor display buffer
//!
//! Holds the most recent converted frame for one sensor. Positions and colors travel
//! together inside one immutable `Arc<PointCloudFrame>`, so replacing the frame is a
//! single pointer swap and a reader gets both arrays from the same frame.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use contracts::{PointCloudFrame, SensorId, SensorType};

/// Display buffer for one sensor
#[derive(Debug)]
pub struct PointCloudSink {
    sensor_id: SensorId,
    sensor_type: SensorType,
    frame: RwLock<Arc<PointCloudFrame>>,
    /// Number of replacements so far
    version: AtomicU64,
}

impl PointCloudSink {
    /// Create an empty sink
    pub fn new(sensor_id: impl Into<SensorId>, sensor_type: SensorType) -> Self {
        let sensor_id = sensor_id.into();
        let empty = PointCloudFrame::empty(sensor_id.clone(), sensor_type);
        Self {
            sensor_id,
            sensor_type,
            frame: RwLock::new(Arc::new(empty)),
            version: AtomicU64::new(0),
        }
    }

    pub fn sensor_id(&self) -> &SensorId {
        &self.sensor_id
    }

    pub fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    /// Swap in a new frame, returning the previous one
    pub fn replace(&self, frame: Arc<PointCloudFrame>) -> Arc<PointCloudFrame> {
        debug_assert_eq!(frame.sensor_id(), &self.sensor_id);
        let mut guard = self.frame.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *guard, frame);
        self.version.fetch_add(1, Ordering::Release);
        previous
    }

    /// Current frame
    pub fn snapshot(&self) -> Arc<PointCloudFrame> {
        self.frame
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of points currently held
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ColoredPoint;

    fn frame(n: usize, frame_id: u64) -> Arc<PointCloudFrame> {
        Arc::new(PointCloudFrame::from_points(
            "lidar".into(),
            SensorType::Lidar,
            frame_id as f64,
            Some(frame_id),
            vec![ColoredPoint::default(); n],
        ))
    }

    #[test]
    fn test_new_sink_is_empty() {
        let sink = PointCloudSink::new("lidar", SensorType::Lidar);
        assert!(sink.is_empty());
        assert_eq!(sink.version(), 0);
        assert_eq!(sink.snapshot().sensor_id().as_str(), "lidar");
    }

    #[test]
    fn test_replace_returns_previous() {
        let sink = PointCloudSink::new("lidar", SensorType::Lidar);
        sink.replace(frame(3, 1));
        let previous = sink.replace(frame(5, 2));

        assert_eq!(previous.frame_id(), Some(1));
        assert_eq!(sink.len(), 5);
        assert_eq!(sink.version(), 2);
    }

    #[test]
    fn test_snapshot_outlives_replace() {
        let sink = PointCloudSink::new("lidar", SensorType::Lidar);
        sink.replace(frame(4, 1));
        let held = sink.snapshot();
        sink.replace(frame(1, 2));

        assert_eq!(held.len(), 4);
        assert_eq!(held.positions().len(), held.colors().len());
    }
}
