//! RerunRenderer - streams clouds to a spawned Rerun viewer

use contracts::{ContractError, FrameRenderer, SceneSnapshot, ViewerConfig};
use rerun::{Color, LineStrips3D, Points3D, Radius, RecordingStream, RecordingStreamBuilder};
use tracing::{info, instrument};

use super::channel_to_u8;

/// Timeline name for render ticks
const TICK_TIMELINE: &str = "tick";

pub struct RerunRenderer {
    name: String,
    rec: RecordingStream,
    point_radius: Radius,
}

impl RerunRenderer {
    /// Spawn the viewer process and log static scene setup
    pub fn new(name: impl Into<String>, viewer: &ViewerConfig) -> Result<Self, ContractError> {
        let name = name.into();
        let rec = RecordingStreamBuilder::new(viewer.window_name.as_str())
            .spawn()
            .map_err(|e| ContractError::renderer_startup(&name, e.to_string()))?;

        if viewer.show_axes {
            rec.log_static(
                "world/axes",
                &LineStrips3D::new([
                    [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
                    [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                    [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
                ])
                .with_colors([
                    Color::from_rgb(255, 0, 0),
                    Color::from_rgb(0, 255, 0),
                    Color::from_rgb(0, 0, 255),
                ]),
            )
            .map_err(|e| ContractError::renderer_startup(&name, e.to_string()))?;
        }

        info!(renderer = %name, app = %viewer.window_name, "Rerun viewer spawned");

        Ok(Self {
            name,
            rec,
            // point_size 按 UI 像素直径解释
            point_radius: Radius::new_ui_points(viewer.point_size.max(0.1) * 0.5),
        })
    }
}

impl FrameRenderer for RerunRenderer {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "rerun_renderer_render",
        skip(self, snapshot),
        fields(renderer = %self.name, tick = snapshot.tick)
    )]
    async fn render(&mut self, snapshot: &SceneSnapshot) -> Result<(), ContractError> {
        self.rec.set_time_sequence(TICK_TIMELINE, snapshot.tick as i64);

        for cloud in &snapshot.clouds {
            let colors = cloud.colors().iter().map(|c| {
                Color::from_rgb(channel_to_u8(c[0]), channel_to_u8(c[1]), channel_to_u8(c[2]))
            });
            let points = Points3D::new(cloud.positions().iter().copied())
                .with_colors(colors)
                .with_radii([self.point_radius]);

            self.rec
                .log(format!("world/{}", cloud.sensor_id()), &points)
                .map_err(|e| ContractError::renderer_write(&self.name, e.to_string()))?;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        self.rec.flush_blocking();
        Ok(())
    }

    #[instrument(name = "rerun_renderer_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(renderer = %self.name, "RerunRenderer closed");
        Ok(())
    }
}
