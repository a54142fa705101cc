//! Real CARLA Viewer Demo
//!
//! Connects to a CARLA server, spawns the ego vehicle with its LiDAR and Radar,
//! and renders the colored clouds until Ctrl+C.
//!
//! Run with: cargo run -p viewer_demos --bin real_carla_viewer --features real-carla [config_path]

use std::path::PathBuf;

use actor_factory::{ActorFactory, CarlaClient, RealCarlaClient};
use config_loader::{ConfigLoader, SessionOverrides};
use contracts::ViewerBlueprint;
use ingestion::IngestionPipeline;
use tracing::{error, info};
use viewer::create_render_loop;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Tracing + Prometheus
    observability::init()?;

    info!("Starting Real CARLA Viewer Demo");

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let blueprint = ConfigLoader::load_session(config_path.as_deref(), &SessionOverrides::default())?;

    // ==== Stage 1: Connect and spawn ====
    info!(
        host = %blueprint.world.carla_host,
        port = blueprint.world.carla_port,
        "Connecting to CARLA..."
    );
    let mut client = RealCarlaClient::new();
    client
        .connect(&blueprint.world.carla_host, blueprint.world.carla_port)
        .await?;
    let factory = ActorFactory::new(client);

    let graph = factory.spawn_session(&blueprint).await?;
    info!(sensors = graph.sensors.len(), "Actors spawned");

    // 只在开始时摆一次观察者；lidar-viewer run 会每个 tick 跟随
    if blueprint.viewer.chase_camera {
        if let Err(e) = factory
            .follow_vehicle(&graph, blueprint.viewer.chase_offset)
            .await
        {
            error!(error = %e, "Failed to move spectator");
        }
    }

    // ==== Stage 2: View ====
    let result = view(&factory, &graph, &blueprint).await;
    if let Err(e) = &result {
        error!(error = %e, "Viewer failed");
    }

    // ==== Stage 3: Teardown, always ====
    factory.teardown(&graph).await?;
    info!("Real CARLA Viewer Demo finished");
    result
}

async fn view(
    factory: &ActorFactory<RealCarlaClient>,
    graph: &contracts::RuntimeGraph,
    blueprint: &ViewerBlueprint,
) -> anyhow::Result<()> {
    let mut ingestion = IngestionPipeline::new();
    let sources = factory.sensor_sources(graph, blueprint)?;
    for (sensor, source) in blueprint.sensors.iter().zip(sources) {
        ingestion.register_sensor_source(sensor, source)?;
    }

    let subscribers = ingestion
        .take_subscribers()
        .ok_or_else(|| anyhow::anyhow!("subscribers already taken"))?;
    let render_loop =
        create_render_loop(&blueprint.viewer, &blueprint.renderers, subscribers, None).await?;

    ingestion.start_all();
    let report = render_loop
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await;
    ingestion.stop_all();

    info!(
        ticks = report.ticks,
        frames_pulled = report.frames_pulled,
        "Render loop stopped"
    );
    Ok(())
}
