//! Session orchestrator - coordinates all components.
//!
//! connect → spawn vehicle + sensors → ingestion → render loop (+ chase camera) → stop → teardown.
//! Runs against the real CARLA client when the `real-carla` feature is enabled and
//! `--mock` is not set, otherwise against the mock client.

use std::convert::Infallible;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use actor_factory::{ActorFactory, CarlaClient, MockCarlaClient};
use anyhow::{Context, Result};
use contracts::{RuntimeGraph, ViewerBlueprint, ViewerConfig};
use ingestion::IngestionPipeline;
use observability::{IngestionTotals, ViewerMetricsAggregator};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};
use viewer::{RenderLoopBuilder, RendererHandle};

use super::{SessionStats, StatsRenderer};
use crate::error::CliError;

/// Queue depth of the internal statistics renderer
const STATS_QUEUE_CAPACITY: usize = 256;

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// The viewer blueprint
    pub blueprint: ViewerBlueprint,

    /// Maximum number of render ticks (None = unlimited)
    pub max_ticks: Option<u64>,

    /// Session timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Use the mock client even when real CARLA support is compiled in
    pub mock: bool,
}

/// Main session orchestrator
pub struct Session {
    config: SessionConfig,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Run the session until `shutdown` resolves, the timeout expires or
    /// `max_ticks` is reached; actors are always torn down afterwards.
    pub async fn run<F>(self, shutdown: F) -> Result<SessionStats>
    where
        F: Future<Output = ()> + Send,
    {
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        #[cfg(feature = "real-carla")]
        if !self.config.mock {
            let client = actor_factory::RealCarlaClient::new();
            return self.run_with_client(client, shutdown).await;
        }

        #[cfg(not(feature = "real-carla"))]
        if !self.config.mock {
            warn!("real CARLA support not compiled in, falling back to MOCK mode");
        }

        info!("Running in MOCK mode (no CARLA server required)");
        self.run_with_client(MockCarlaClient::new(), shutdown).await
    }

    #[instrument(name = "session_run", skip_all)]
    async fn run_with_client<C, F>(&self, mut client: C, shutdown: F) -> Result<SessionStats>
    where
        C: CarlaClient,
        F: Future<Output = ()> + Send,
    {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;
        let host = &blueprint.world.carla_host;
        let port = blueprint.world.carla_port;

        info!(host = %host, port, map = ?blueprint.world.map, "Connecting to CARLA server...");
        client
            .connect(host, port)
            .await
            .map_err(|e| CliError::carla_unreachable(host, port, e))?;
        info!("Connected to CARLA server");

        let factory = ActorFactory::new(client);
        let graph = factory
            .spawn_session(blueprint)
            .await
            .context("Failed to spawn vehicle and sensors")?;

        info!(
            vehicle = ?graph.vehicle_actor(),
            sensors = graph.sensors.len(),
            "Actors spawned successfully"
        );

        let result = self.view(&factory, &graph, shutdown, start_time).await;

        // 无论显示是否成功都要销毁 actors
        if let Err(e) = factory.teardown(&graph).await {
            warn!(error = %e, "Error during actor teardown");
        }

        result
    }

    /// Ingestion + render loop; returns after the render loop stops
    async fn view<C, F>(
        &self,
        factory: &ActorFactory<C>,
        graph: &RuntimeGraph,
        shutdown: F,
        start_time: Instant,
    ) -> Result<SessionStats>
    where
        C: CarlaClient,
        F: Future<Output = ()> + Send,
    {
        let blueprint = &self.config.blueprint;

        info!("Setting up ingestion pipeline...");
        let sources = factory
            .sensor_sources(graph, blueprint)
            .context("Failed to get sensor sources")?;

        let mut ingestion = IngestionPipeline::new();
        for (sensor, source) in blueprint.sensors.iter().zip(sources) {
            ingestion
                .register_sensor_source(sensor, source)
                .with_context(|| format!("Failed to register sensor '{}'", sensor.id))?;
        }
        let subscribers = ingestion
            .take_subscribers()
            .ok_or(CliError::SubscribersTaken)?;

        if blueprint.renderers.is_empty() {
            warn!("No renderers configured - clouds are only counted");
        }

        let aggregator = Arc::new(Mutex::new(ViewerMetricsAggregator::new()));
        let stats_handle = RendererHandle::spawn(
            StatsRenderer::new(Arc::clone(&aggregator)),
            STATS_QUEUE_CAPACITY,
        );

        let render_loop = RenderLoopBuilder::new(blueprint.viewer.clone(), subscribers)
            .renderers(blueprint.renderers.iter().cloned())
            .renderer_handle(stats_handle)
            .max_ticks(self.config.max_ticks)
            .build()
            .await
            .context("Failed to create render loop")?;

        info!(
            sensors = ingestion.sensor_count(),
            renderers = blueprint.renderers.len(),
            max_ticks = ?self.config.max_ticks,
            "Starting sensor data ingestion..."
        );
        ingestion.start_all();

        let timeout = self.config.timeout;
        let stop = async move {
            match timeout {
                Some(timeout) => {
                    tokio::select! {
                        _ = shutdown => {}
                        _ = tokio::time::sleep(timeout) => {
                            warn!(timeout_secs = timeout.as_secs(), "Session timed out");
                        }
                    }
                }
                None => shutdown.await,
            }
        };

        let chase = chase_vehicle(factory, graph, &blueprint.viewer);
        let report = tokio::select! {
            biased;
            report = render_loop.run(stop) => report,
            never = chase => match never {},
        };

        info!("Stopping sensors...");
        ingestion.stop_all();

        let ingestion_metrics = ingestion.metrics().snapshot();
        let mut aggregator = aggregator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        aggregator.set_ingestion(IngestionTotals {
            packets_received: ingestion_metrics.packets_received,
            frames_converted: ingestion_metrics.frames_converted,
            frames_rejected: ingestion_metrics.frames_rejected,
            frames_overwritten: report.frames_overwritten,
        });

        let stats = SessionStats {
            duration: start_time.elapsed(),
            ticks: report.ticks,
            frames_pulled: report.frames_pulled,
            active_sensors: ingestion.sensor_count(),
            renderers: report.renderers,
            aggregator,
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            ticks = stats.ticks,
            tick_rate = format!("{:.2}", stats.tick_rate()),
            "Session shutdown complete"
        );

        Ok(stats)
    }
}

/// 按渲染周期把观察者移到自车后上方，直到被 drop
///
/// 单次失败只记录日志；关闭 chase_camera 时永远挂起。
async fn chase_vehicle<C: CarlaClient>(
    factory: &ActorFactory<C>,
    graph: &RuntimeGraph,
    viewer: &ViewerConfig,
) -> Infallible {
    if !viewer.chase_camera || graph.vehicle_actor().is_none() {
        return std::future::pending().await;
    }

    let mut interval = tokio::time::interval(Duration::from_millis(viewer.tick_interval_ms.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut failures = 0u64;

    loop {
        interval.tick().await;
        if let Err(e) = factory.follow_vehicle(graph, viewer.chase_offset).await {
            failures += 1;
            if failures == 1 {
                warn!(error = %e, "Failed to move spectator");
            } else {
                debug!(error = %e, failures, "Failed to move spectator");
            }
        }
    }
}
