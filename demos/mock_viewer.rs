//! Mock Viewer Demo
//!
//! Reads a configuration file, drives every configured sensor with a mock
//! source and renders the colored clouds through the configured renderers.
//!
//! Run with: cargo run -p viewer_demos --bin mock_viewer [config_path]

use std::path::PathBuf;
use std::time::Duration;

use actor_factory::{MockSensor, MockSensorConfig};
use config_loader::ConfigLoader;
use contracts::ViewerBlueprint;
use ingestion::IngestionPipeline;
use observability::{LogFormat, ObservabilityConfig};
use tracing::info;
use viewer::create_render_loop;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init_with_config(ObservabilityConfig {
        log_format: LogFormat::Pretty,
        metrics_port: None,
        ..Default::default()
    })?;

    info!("Starting Mock Viewer Demo");

    let blueprint = load_blueprint()?;
    info!(
        sensors = blueprint.sensors.len(),
        renderers = blueprint.renderers.len(),
        "Blueprint loaded"
    );

    // ==== Stage 1: Mock sources, one per configured sensor ====
    let mut ingestion = IngestionPipeline::new();
    for sensor in &blueprint.sensors {
        let config = MockSensorConfig {
            frequency_hz: sensor.frequency_hz,
            ..Default::default()
        };
        let source = MockSensor::new(sensor.id.clone(), sensor.sensor_type, config);
        ingestion.register_sensor_source(sensor, Box::new(source))?;
    }

    // ==== Stage 2: Render loop with the configured renderers ====
    let subscribers = ingestion
        .take_subscribers()
        .ok_or_else(|| anyhow::anyhow!("subscribers already taken"))?;
    let render_loop = create_render_loop(
        &blueprint.viewer,
        &blueprint.renderers,
        subscribers,
        None,
    )
    .await?;

    // ==== Stage 3: Run for a few seconds ====
    ingestion.start_all();
    let report = render_loop
        .run(tokio::time::sleep(Duration::from_secs(5)))
        .await;
    ingestion.stop_all();

    let ingested = ingestion.metrics().snapshot();
    info!(
        ticks = report.ticks,
        frames_pulled = report.frames_pulled,
        frames_overwritten = report.frames_overwritten,
        frames_converted = ingested.frames_converted,
        frames_rejected = ingested.frames_rejected,
        "Mock Viewer Demo finished"
    );
    for (name, metrics) in &report.renderers {
        info!(
            renderer = %name,
            rendered = metrics.rendered_count,
            failed = metrics.failure_count,
            dropped = metrics.dropped_count,
            "Renderer summary"
        );
    }

    Ok(())
}

fn load_blueprint() -> anyhow::Result<ViewerBlueprint> {
    match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => {
            info!(path = %path.display(), "Loading config file");
            Ok(ConfigLoader::load_from_path(&path)?)
        }
        None => Ok(ViewerBlueprint::lidar_radar_default()),
    }
}
