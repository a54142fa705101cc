//! FrameRenderer trait - Viewer output interface
//!
//! Concrete viewers (log, PLY snapshot, Rerun) consume scene snapshots through this trait.

use std::sync::Arc;

use crate::{ContractError, PointCloudFrame};

/// Everything a renderer needs to draw one display tick
///
/// Frames are shared immutable `Arc`s taken from the sinks, so a snapshot never
/// observes a half-written cloud.
#[derive(Debug, Clone, Default)]
pub struct SceneSnapshot {
    /// Render tick counter (starts at 0)
    pub tick: u64,

    /// One frame per sensor, in sink registration order
    pub clouds: Vec<Arc<PointCloudFrame>>,
}

impl SceneSnapshot {
    /// Total number of points across all clouds
    pub fn total_points(&self) -> usize {
        self.clouds.iter().map(|cloud| cloud.len()).sum()
    }

    /// Look up a cloud by sensor id
    pub fn cloud(&self, sensor_id: &str) -> Option<&Arc<PointCloudFrame>> {
        self.clouds
            .iter()
            .find(|cloud| cloud.sensor_id().as_str() == sensor_id)
    }
}

/// Point-cloud renderer
///
/// All renderer implementations must implement this trait.
#[trait_variant::make(FrameRenderer: Send)]
pub trait LocalFrameRenderer {
    /// Renderer name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Draw one snapshot
    ///
    /// # Errors
    /// Returns render error (should include context)
    async fn render(&mut self, snapshot: &SceneSnapshot) -> Result<(), ContractError>;

    /// Flush buffered output (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close renderer
    async fn close(&mut self) -> Result<(), ContractError>;
}
