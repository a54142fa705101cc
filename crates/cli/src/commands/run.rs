//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::ViewerBlueprint;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Session, SessionConfig};

/// Execute the `run` command
pub async fn run_session(args: &RunArgs) -> Result<()> {
    let blueprint = load_blueprint(args)?;

    info!(
        host = %blueprint.world.carla_host,
        port = blueprint.world.carla_port,
        sensors = blueprint.sensors.len(),
        renderers = blueprint.renderers.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let session = Session::new(SessionConfig {
        blueprint,
        max_ticks: (args.max_ticks > 0).then_some(args.max_ticks),
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
        mock: args.mock,
    });

    info!("Starting viewer session...");
    let stats = session
        .run(shutdown_signal())
        .await
        .context("Viewer session failed")?;

    stats.print_summary();
    info!("LIDAR viewer finished");
    Ok(())
}

/// Config file if given, otherwise the built-in LIDAR + RADAR session; CLI overrides on top
fn load_blueprint(args: &RunArgs) -> Result<ViewerBlueprint> {
    let overrides = args.overrides();
    if !overrides.is_empty() {
        info!(?overrides, "Applying CLI overrides");
    }

    let Some(ref path) = args.config else {
        info!("No configuration file given, using built-in LIDAR + RADAR session");
        return config_loader::ConfigLoader::load_session(None, &overrides)
            .context("Invalid CLI overrides for the built-in session");
    };

    info!(config = %path.display(), "Loading configuration");
    if !path.exists() {
        return Err(CliError::config_not_found(path).into());
    }

    config_loader::ConfigLoader::load_session(Some(path), &overrides)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Received shutdown signal, stopping viewer...");
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &ViewerBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("World:");
    if let Some(ref map) = blueprint.world.map {
        println!("  Map: {}", map);
    }
    println!(
        "  CARLA: {}:{}",
        blueprint.world.carla_host, blueprint.world.carla_port
    );
    println!(
        "\nVehicle: {} ({}), spawn point {}, autopilot {}",
        blueprint.vehicle.id,
        blueprint.vehicle.blueprint,
        blueprint.vehicle.spawn_point_index,
        blueprint.vehicle.autopilot
    );

    println!("\nSensors ({}):", blueprint.sensors.len());
    for sensor in &blueprint.sensors {
        println!(
            "  - {} ({}, {} Hz, {:?})",
            sensor.id,
            sensor.sensor_type,
            sensor.frequency_hz,
            sensor.effective_colormap()
        );
    }

    if !blueprint.renderers.is_empty() {
        println!("\nRenderers ({}):", blueprint.renderers.len());
        for renderer in &blueprint.renderers {
            println!("  - {} ({:?})", renderer.name, renderer.renderer_type);
        }
    }

    println!(
        "\nViewer: '{}' {}x{}, tick {} ms",
        blueprint.viewer.window_name,
        blueprint.viewer.width,
        blueprint.viewer.height,
        blueprint.viewer.tick_interval_ms
    );
    if blueprint.viewer.chase_camera {
        let offset = blueprint.viewer.chase_offset;
        println!(
            "Chase camera: offset ({}, {}, {})",
            offset.x, offset.y, offset.z
        );
    }
    println!();
}
