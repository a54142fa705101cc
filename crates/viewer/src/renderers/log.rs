//! LogRenderer - logs a per-tick scene summary via tracing

use std::collections::HashMap;

use contracts::{ContractError, FrameRenderer, SceneSnapshot};
use tracing::{debug, info, instrument};

use super::every_n_ticks;

/// Renderer that logs scene summaries for debugging
pub struct LogRenderer {
    name: String,
    every_n_ticks: u64,
    rendered: u64,
}

impl LogRenderer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            every_n_ticks: super::DEFAULT_EVERY_N_TICKS,
            rendered: 0,
        }
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let every_n_ticks = every_n_ticks(&name, params)?;
        Ok(Self {
            every_n_ticks,
            ..Self::new(name)
        })
    }

    /// Snapshots seen so far
    pub fn rendered(&self) -> u64 {
        self.rendered
    }

    fn log_scene_summary(&self, snapshot: &SceneSnapshot) {
        for cloud in &snapshot.clouds {
            debug!(
                renderer = %self.name,
                tick = snapshot.tick,
                sensor_id = %cloud.sensor_id(),
                sensor_type = %cloud.sensor_type(),
                frame_id = ?cloud.frame_id(),
                points = cloud.len(),
                "Cloud"
            );
        }

        info!(
            renderer = %self.name,
            tick = snapshot.tick,
            sensors = snapshot.clouds.len(),
            points = snapshot.total_points(),
            "Scene rendered"
        );
    }
}

impl FrameRenderer for LogRenderer {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_renderer_render",
        skip(self, snapshot),
        fields(renderer = %self.name, tick = snapshot.tick)
    )]
    async fn render(&mut self, snapshot: &SceneSnapshot) -> Result<(), ContractError> {
        if snapshot.tick % self.every_n_ticks == 0 {
            self.log_scene_summary(snapshot);
        }
        self.rendered += 1;
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_renderer_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(renderer = %self.name, rendered = self.rendered, "LogRenderer closed");
        Ok(())
    }
}
