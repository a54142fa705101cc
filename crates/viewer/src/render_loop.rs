//! RenderLoop - fixed-cadence update + fan-out to renderers

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, trace};

use contracts::{RendererConfig, RendererType, SceneSnapshot, ViewerConfig};
use ingestion::FrameSubscriber;

use crate::error::{Result, ViewerError};
use crate::handle::RendererHandle;
use crate::metrics::RendererMetricsSnapshot;
use crate::renderers::{LogRenderer, PlyRenderer};
use crate::sink::PointCloudSink;

/// Render loop configuration
#[derive(Debug, Clone)]
pub struct RenderLoopConfig {
    /// Tick period
    pub tick_interval: Duration,
    /// Stop after this many ticks (None = until shutdown)
    pub max_ticks: Option<u64>,
}

impl RenderLoopConfig {
    pub fn from_viewer(viewer: &ViewerConfig) -> Self {
        Self {
            tick_interval: Duration::from_millis(viewer.tick_interval_ms.max(1)),
            max_ticks: None,
        }
    }

    pub fn with_max_ticks(mut self, max_ticks: Option<u64>) -> Self {
        self.max_ticks = max_ticks;
        self
    }
}

impl Default for RenderLoopConfig {
    fn default() -> Self {
        Self::from_viewer(&ViewerConfig::default())
    }
}

/// Summary returned when the loop stops
#[derive(Debug, Clone, Default)]
pub struct RenderReport {
    /// Ticks executed
    pub ticks: u64,
    /// New frames moved from the slots into the sinks
    pub frames_pulled: u64,
    /// Frames replaced in a slot before the loop read them
    pub frames_overwritten: u64,
    /// Per-renderer counters at shutdown
    pub renderers: Vec<(String, RendererMetricsSnapshot)>,
}

/// One sensor: its slot subscriber and the sink it feeds
struct SensorChannel {
    subscriber: FrameSubscriber,
    sink: Arc<PointCloudSink>,
}

/// Builder for creating a RenderLoop
pub struct RenderLoopBuilder {
    config: RenderLoopConfig,
    viewer: ViewerConfig,
    renderer_configs: Vec<RendererConfig>,
    handles: Vec<RendererHandle>,
    subscribers: Vec<FrameSubscriber>,
}

impl RenderLoopBuilder {
    pub fn new(viewer: ViewerConfig, subscribers: Vec<FrameSubscriber>) -> Self {
        Self {
            config: RenderLoopConfig::from_viewer(&viewer),
            viewer,
            renderer_configs: Vec::new(),
            handles: Vec::new(),
            subscribers,
        }
    }

    pub fn max_ticks(mut self, max_ticks: Option<u64>) -> Self {
        self.config.max_ticks = max_ticks;
        self
    }

    /// Renderers created from configuration at build time
    pub fn renderers(mut self, configs: impl IntoIterator<Item = RendererConfig>) -> Self {
        self.renderer_configs.extend(configs);
        self
    }

    /// Add an already running renderer
    pub fn renderer_handle(mut self, handle: RendererHandle) -> Self {
        self.handles.push(handle);
        self
    }

    /// Build the loop and start all renderer workers
    #[instrument(
        name = "render_loop_builder_build",
        skip(self),
        fields(
            sensors = self.subscribers.len(),
            renderers = self.renderer_configs.len() + self.handles.len()
        )
    )]
    pub async fn build(self) -> Result<RenderLoop> {
        if self.subscribers.is_empty() {
            return Err(ViewerError::NoSensors);
        }

        let mut handles = self.handles;
        for config in &self.renderer_configs {
            match create_renderer_handle(config, &self.viewer).await {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // 已启动的 worker 需要先回收
                    for handle in handles {
                        handle.shutdown().await;
                    }
                    return Err(e);
                }
            }
        }

        Ok(RenderLoop::new(self.subscribers, handles, self.config))
    }
}

/// Create a RendererHandle from configuration
#[instrument(
    name = "render_loop_create_renderer_handle",
    skip(config, viewer),
    fields(renderer = %config.name, renderer_type = ?config.renderer_type)
)]
pub async fn create_renderer_handle(
    config: &RendererConfig,
    viewer: &ViewerConfig,
) -> Result<RendererHandle> {
    match config.renderer_type {
        RendererType::Log => {
            let renderer = LogRenderer::from_params(&config.name, &config.params)
                .map_err(|e| ViewerError::renderer_creation(&config.name, e.to_string()))?;
            Ok(RendererHandle::spawn(renderer, config.queue_capacity))
        }
        RendererType::Ply => {
            let renderer = PlyRenderer::from_params(&config.name, &config.params, viewer)
                .map_err(|e| ViewerError::renderer_creation(&config.name, e.to_string()))?;
            Ok(RendererHandle::spawn(renderer, config.queue_capacity))
        }
        #[cfg(feature = "rerun-viewer")]
        RendererType::Rerun => {
            let renderer = crate::renderers::RerunRenderer::new(&config.name, viewer)
                .map_err(|e| ViewerError::renderer_creation(&config.name, e.to_string()))?;
            Ok(RendererHandle::spawn(renderer, config.queue_capacity))
        }
        #[cfg(not(feature = "rerun-viewer"))]
        RendererType::Rerun => Err(ViewerError::FeatureDisabled {
            name: config.name.clone(),
            feature: "rerun-viewer",
        }),
    }
}

/// Owns the sinks and drives the renderers
pub struct RenderLoop {
    channels: Vec<SensorChannel>,
    handles: Vec<RendererHandle>,
    config: RenderLoopConfig,
    tick: u64,
    frames_pulled: u64,
}

impl RenderLoop {
    /// One sink per subscriber, in subscriber order
    pub fn new(
        subscribers: Vec<FrameSubscriber>,
        handles: Vec<RendererHandle>,
        config: RenderLoopConfig,
    ) -> Self {
        let channels = subscribers
            .into_iter()
            .map(|subscriber| {
                let sink = Arc::new(PointCloudSink::new(
                    subscriber.sensor_id().clone(),
                    subscriber.sensor_type(),
                ));
                SensorChannel { subscriber, sink }
            })
            .collect();

        Self {
            channels,
            handles,
            config,
            tick: 0,
            frames_pulled: 0,
        }
    }

    /// Read-only handles to the sinks
    pub fn sinks(&self) -> Vec<Arc<PointCloudSink>> {
        self.channels.iter().map(|c| Arc::clone(&c.sink)).collect()
    }

    pub fn sink(&self, sensor_id: &str) -> Option<&Arc<PointCloudSink>> {
        self.channels
            .iter()
            .find(|c| c.sink.sensor_id() == sensor_id)
            .map(|c| &c.sink)
    }

    /// Ticks executed so far
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    pub fn renderer_metrics(&self) -> Vec<(String, RendererMetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Pull the latest frame of every sensor into its sink
    ///
    /// Returns the number of sinks that received a new frame.
    pub fn update(&mut self) -> usize {
        let mut updated = 0;
        for channel in &mut self.channels {
            if let Some(frame) = channel.subscriber.take_latest() {
                trace!(
                    sensor_id = %channel.sink.sensor_id(),
                    frame_id = ?frame.frame_id(),
                    points = frame.len(),
                    "Sink updated"
                );
                observability::record_sink_points(channel.sink.sensor_id(), frame.len());
                channel.sink.replace(frame);
                updated += 1;
            }
        }
        self.frames_pulled += updated as u64;
        updated
    }

    /// Snapshot of all sinks for the current tick
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            tick: self.tick,
            clouds: self.channels.iter().map(|c| c.sink.snapshot()).collect(),
        }
    }

    /// One display tick: update, snapshot, fan-out
    ///
    /// A tick without new frames still redraws the current sink contents.
    pub fn tick(&mut self) -> SceneSnapshot {
        self.update();
        let snapshot = self.snapshot();
        observability::record_render_tick(snapshot.total_points());

        for handle in &self.handles {
            handle.try_send(snapshot.clone());
        }

        self.tick += 1;
        snapshot
    }

    /// Run until `shutdown` resolves or `max_ticks` is reached
    #[instrument(name = "render_loop_run", skip(self, shutdown))]
    pub async fn run<F>(mut self, shutdown: F) -> RenderReport
    where
        F: Future<Output = ()> + Send,
    {
        info!(
            sensors = self.channels.len(),
            renderers = self.handles.len(),
            tick_ms = self.config.tick_interval.as_millis() as u64,
            max_ticks = ?self.config.max_ticks,
            "Render loop started"
        );

        let mut interval = tokio::time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            if self.config.max_ticks.is_some_and(|max| self.tick >= max) {
                info!(ticks = self.tick, "Max ticks reached");
                break;
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!(ticks = self.tick, "Shutdown requested");
                    break;
                }
                _ = interval.tick() => {
                    self.tick();
                }
            }

            if self.tick % 1000 == 0 {
                debug!(ticks = self.tick, frames = self.frames_pulled, "Render loop progress");
            }
        }

        self.shutdown().await
    }

    /// Spawn the loop as a background task
    pub fn spawn<F>(self, shutdown: F) -> JoinHandle<RenderReport>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(self.run(shutdown))
    }

    async fn shutdown(self) -> RenderReport {
        let renderers = self.renderer_metrics();
        let frames_overwritten = self
            .channels
            .iter()
            .map(|c| c.subscriber.overwritten())
            .sum();

        for handle in self.handles {
            handle.shutdown().await;
        }

        info!(
            ticks = self.tick,
            frames = self.frames_pulled,
            "Render loop shutdown complete"
        );

        RenderReport {
            ticks: self.tick,
            frames_pulled: self.frames_pulled,
            frames_overwritten,
            renderers,
        }
    }
}

/// Convenience function to create a render loop from configuration
#[instrument(name = "render_loop_create", skip_all)]
pub async fn create_render_loop(
    viewer: &ViewerConfig,
    renderer_configs: &[RendererConfig],
    subscribers: Vec<FrameSubscriber>,
    max_ticks: Option<u64>,
) -> Result<RenderLoop> {
    RenderLoopBuilder::new(viewer.clone(), subscribers)
        .renderers(renderer_configs.iter().cloned())
        .max_ticks(max_ticks)
        .build()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ColoredPoint, PointCloudFrame, SensorType};
    use ingestion::frame_slot;
    use std::collections::HashMap;

    fn frame(sensor_id: &str, sensor_type: SensorType, n: usize, frame_id: u64) -> PointCloudFrame {
        PointCloudFrame::from_points(
            sensor_id.into(),
            sensor_type,
            frame_id as f64,
            Some(frame_id),
            vec![ColoredPoint::default(); n],
        )
    }

    #[test]
    fn test_update_moves_latest_frame_into_sink() {
        let (lidar_tx, lidar_rx) = frame_slot("lidar", SensorType::Lidar);
        let (_radar_tx, radar_rx) = frame_slot("radar", SensorType::Radar);
        let mut render_loop = RenderLoop::new(
            vec![lidar_rx, radar_rx],
            Vec::new(),
            RenderLoopConfig::default(),
        );

        lidar_tx.publish(frame("lidar", SensorType::Lidar, 3, 1));
        lidar_tx.publish(frame("lidar", SensorType::Lidar, 7, 2));

        assert_eq!(render_loop.update(), 1);
        let lidar = render_loop.sink("lidar").map(|s| s.snapshot());
        assert_eq!(lidar.map(|f| f.len()), Some(7));
        assert!(render_loop.sink("radar").is_some_and(|s| s.is_empty()));

        // 没有新帧
        assert_eq!(render_loop.update(), 0);
    }

    #[test]
    fn test_tick_redraws_without_new_frames() {
        let (lidar_tx, lidar_rx) = frame_slot("lidar", SensorType::Lidar);
        let mut render_loop =
            RenderLoop::new(vec![lidar_rx], Vec::new(), RenderLoopConfig::default());

        lidar_tx.publish(frame("lidar", SensorType::Lidar, 4, 1));
        let first = render_loop.tick();
        let second = render_loop.tick();

        assert_eq!(first.tick, 0);
        assert_eq!(second.tick, 1);
        assert_eq!(second.total_points(), 4);
        assert!(Arc::ptr_eq(&first.clouds[0], &second.clouds[0]));
    }

    #[tokio::test]
    async fn test_run_stops_at_max_ticks() {
        let (_tx, rx) = frame_slot("lidar", SensorType::Lidar);
        let config = RenderLoopConfig {
            tick_interval: Duration::from_millis(1),
            max_ticks: Some(5),
        };
        let render_loop = RenderLoop::new(vec![rx], Vec::new(), config);

        let report = render_loop.run(std::future::pending()).await;
        assert_eq!(report.ticks, 5);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (_tx, rx) = frame_slot("lidar", SensorType::Lidar);
        let render_loop = RenderLoop::new(vec![rx], Vec::new(), RenderLoopConfig::default());

        let report = render_loop.run(async {}).await;
        assert_eq!(report.ticks, 0);
    }

    #[tokio::test]
    async fn test_builder_rejects_empty_sensor_list() {
        let result = RenderLoopBuilder::new(ViewerConfig::default(), Vec::new())
            .build()
            .await;
        assert!(matches!(result, Err(ViewerError::NoSensors)));
    }

    #[tokio::test]
    async fn test_create_render_loop_from_config() {
        let (tx, rx) = frame_slot("lidar", SensorType::Lidar);
        let configs = vec![RendererConfig {
            name: "log".to_string(),
            renderer_type: RendererType::Log,
            queue_capacity: 4,
            params: HashMap::new(),
        }];

        let render_loop = create_render_loop(&ViewerConfig::default(), &configs, vec![rx], Some(3))
            .await
            .unwrap();
        tx.publish(frame("lidar", SensorType::Lidar, 2, 1));

        let report = render_loop.run(std::future::pending()).await;
        assert_eq!(report.ticks, 3);
        assert_eq!(report.renderers.len(), 1);
        assert_eq!(report.renderers[0].0, "log");
    }

    #[cfg(not(feature = "rerun-viewer"))]
    #[tokio::test]
    async fn test_rerun_requires_feature() {
        let config = RendererConfig {
            name: "rerun".to_string(),
            renderer_type: RendererType::Rerun,
            queue_capacity: 4,
            params: HashMap::new(),
        };
        let result = create_renderer_handle(&config, &ViewerConfig::default()).await;
        assert!(matches!(result, Err(ViewerError::FeatureDisabled { .. })));
    }

    #[tokio::test]
    async fn test_ply_without_output_dir_fails() {
        let config = RendererConfig {
            name: "ply".to_string(),
            renderer_type: RendererType::Ply,
            queue_capacity: 4,
            params: HashMap::new(),
        };
        let result = create_renderer_handle(&config, &ViewerConfig::default()).await;
        assert!(matches!(result, Err(ViewerError::RendererCreation { .. })));
    }
}
