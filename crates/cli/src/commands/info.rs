//! `info` command implementation.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use contracts::ViewerBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    world: WorldInfo,
    vehicle: VehicleInfo,
    sensors: Vec<SensorInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    renderers: Vec<RendererInfo>,
    viewer: ViewerInfo,
}

#[derive(Serialize)]
struct WorldInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    map: Option<String>,
    carla_host: String,
    carla_port: u16,
}

#[derive(Serialize)]
struct VehicleInfo {
    id: String,
    blueprint: String,
    spawn_point_index: usize,
    autopilot: bool,
}

#[derive(Serialize)]
struct SensorInfo {
    id: String,
    sensor_type: String,
    blueprint: String,
    frequency_hz: f64,
    colormap: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct RendererInfo {
    name: String,
    renderer_type: String,
    queue_capacity: usize,
}

#[derive(Serialize)]
struct ViewerInfo {
    window_name: String,
    width: u32,
    height: u32,
    tick_interval_ms: u64,
    point_size: f32,
    show_axes: bool,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &ViewerBlueprint, args: &InfoArgs) -> ConfigInfo {
    let sensors = blueprint
        .sensors
        .iter()
        .map(|s| SensorInfo {
            id: s.id.clone(),
            sensor_type: s.sensor_type.to_string(),
            blueprint: s.sensor_type.blueprint_id().to_string(),
            frequency_hz: s.frequency_hz,
            colormap: format!("{:?}", s.effective_colormap()),
            // 详细模式下输出合并后的属性
            attributes: if args.sensors {
                s.effective_attributes().into_iter().collect()
            } else {
                BTreeMap::new()
            },
        })
        .collect();

    let renderers = if args.renderers {
        blueprint
            .renderers
            .iter()
            .map(|r| RendererInfo {
                name: r.name.clone(),
                renderer_type: format!("{:?}", r.renderer_type),
                queue_capacity: r.queue_capacity,
            })
            .collect()
    } else {
        Vec::new()
    };

    let viewer = &blueprint.viewer;
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        world: WorldInfo {
            map: blueprint.world.map.clone(),
            carla_host: blueprint.world.carla_host.clone(),
            carla_port: blueprint.world.carla_port,
        },
        vehicle: VehicleInfo {
            id: blueprint.vehicle.id.clone(),
            blueprint: blueprint.vehicle.blueprint.clone(),
            spawn_point_index: blueprint.vehicle.spawn_point_index,
            autopilot: blueprint.vehicle.autopilot,
        },
        sensors,
        renderers,
        viewer: ViewerInfo {
            window_name: viewer.window_name.clone(),
            width: viewer.width,
            height: viewer.height,
            tick_interval_ms: viewer.tick_interval_ms,
            point_size: viewer.point_size,
            show_axes: viewer.show_axes,
        },
    }
}

fn print_config_info(blueprint: &ViewerBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               LIDAR Viewer Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📍 World");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!(
        "   ├─ Map: {}",
        blueprint.world.map.as_deref().unwrap_or("(current)")
    );
    println!(
        "   └─ CARLA Server: {}:{}",
        blueprint.world.carla_host, blueprint.world.carla_port
    );

    let vehicle = &blueprint.vehicle;
    println!("\n🚗 Vehicle");
    println!("   ├─ {} ({})", vehicle.id, vehicle.blueprint);
    println!("   ├─ Spawn point: {}", vehicle.spawn_point_index);
    println!("   └─ Autopilot: {}", vehicle.autopilot);

    println!("\n📡 Sensors ({})", blueprint.sensors.len());
    for (i, sensor) in blueprint.sensors.iter().enumerate() {
        let is_last = i == blueprint.sensors.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!(
            "   {} {} ({}, {} Hz, {:?})",
            prefix,
            sensor.id,
            sensor.sensor_type,
            sensor.frequency_hz,
            sensor.effective_colormap()
        );

        if args.sensors {
            let attributes: BTreeMap<_, _> = sensor.effective_attributes().into_iter().collect();
            for (j, (key, value)) in attributes.iter().enumerate() {
                let attr_prefix = if j == attributes.len() - 1 { "└─" } else { "├─" };
                println!("   {}  {} {} = {}", child_prefix, attr_prefix, key, value);
            }
        }
    }

    let viewer = &blueprint.viewer;
    println!("\n🖥  Viewer");
    println!("   ├─ Window: '{}' {}x{}", viewer.window_name, viewer.width, viewer.height);
    println!("   ├─ Tick: {} ms", viewer.tick_interval_ms);
    println!("   └─ Point size: {}, axes: {}", viewer.point_size, viewer.show_axes);

    if args.renderers && !blueprint.renderers.is_empty() {
        println!("\n📤 Renderers ({})", blueprint.renderers.len());
        for (i, renderer) in blueprint.renderers.iter().enumerate() {
            let is_last = i == blueprint.renderers.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            println!(
                "   {} {} ({:?}, queue {})",
                prefix, renderer.name, renderer.renderer_type, renderer.queue_capacity
            );
        }
    }

    println!();
}
