//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{RendererType, ViewerBlueprint};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    map: Option<String>,
    vehicle: String,
    sensor_count: usize,
    renderer_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    map: blueprint.world.map.clone(),
                    vehicle: blueprint.vehicle.blueprint.clone(),
                    sensor_count: blueprint.sensors.len(),
                    renderer_count: blueprint.renderers.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &ViewerBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.renderers.is_empty() {
        warnings.push("No renderers configured - clouds will only be counted".to_string());
    }

    if cfg!(not(feature = "rerun-viewer"))
        && blueprint
            .renderers
            .iter()
            .any(|r| r.renderer_type == RendererType::Rerun)
    {
        warnings.push(
            "rerun renderer configured but this build lacks the 'rerun-viewer' feature"
                .to_string(),
        );
    }

    for sensor in &blueprint.sensors {
        let max_hz = 1000.0 / blueprint.viewer.tick_interval_ms as f64;
        if sensor.frequency_hz > max_hz {
            warnings.push(format!(
                "Sensor '{}' runs at {} Hz, faster than the {} ms render tick; frames will be overwritten",
                sensor.id, sensor.frequency_hz, blueprint.viewer.tick_interval_ms
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            if let Some(ref map) = summary.map {
                println!("  Map: {}", map);
            }
            println!("  Vehicle: {}", summary.vehicle);
            println!("  Sensors: {}", summary.sensor_count);
            println!("  Renderers: {}", summary.renderer_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
