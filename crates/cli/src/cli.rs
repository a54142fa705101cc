//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// LIDAR Viewer - colored LIDAR/RADAR point clouds from the CARLA simulator
#[derive(Parser, Debug)]
#[command(
    name = "lidar-viewer",
    author,
    version,
    about = "CARLA LIDAR/RADAR point-cloud viewer",
    long_about = "Spawns an ego vehicle with LIDAR and RADAR sensors in CARLA, converts every\n\
                  sensor frame into a colored point cloud and streams the clouds to the\n\
                  configured renderers at a fixed tick rate."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "LIDAR_VIEWER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "LIDAR_VIEWER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log level from -v / -q
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the viewer session
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); built-in LIDAR + RADAR session if omitted
    #[arg(short, long, env = "LIDAR_VIEWER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override CARLA server host from configuration
    #[arg(long, env = "CARLA_HOST")]
    pub host: Option<String>,

    /// Override CARLA server port from configuration
    #[arg(long, env = "CARLA_PORT")]
    pub port: Option<u16>,

    /// Stop after this many render ticks (0 = unlimited)
    #[arg(long, default_value = "0", env = "LIDAR_VIEWER_MAX_TICKS")]
    pub max_ticks: u64,

    /// Session timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "LIDAR_VIEWER_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without connecting
    #[arg(long)]
    pub dry_run: bool,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "LIDAR_VIEWER_METRICS_PORT")]
    pub metrics_port: u16,

    /// Use the mock CARLA client and synthetic sensors
    #[arg(long, env = "LIDAR_VIEWER_MOCK")]
    pub mock: bool,

    /// Override the render tick interval in milliseconds
    #[arg(long, env = "LIDAR_VIEWER_TICK_MS")]
    pub tick_ms: Option<u64>,

    /// Leave the simulator spectator where it is instead of following the ego vehicle
    #[arg(long)]
    pub no_chase_camera: bool,
}

impl RunArgs {
    /// Flags that override the loaded configuration
    pub fn overrides(&self) -> config_loader::SessionOverrides {
        config_loader::SessionOverrides {
            carla_host: self.host.clone(),
            carla_port: self.port,
            tick_interval_ms: self.tick_ms,
            chase_camera: self.no_chase_camera.then_some(false),
        }
    }
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "lidar_radar.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "lidar_radar.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show detailed sensor information
    #[arg(long)]
    pub sensors: bool,

    /// Show renderer configuration
    #[arg(long)]
    pub renderers: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args_defaults() {
        let cli = Cli::try_parse_from(["lidar-viewer", "run", "--mock"]).unwrap();
        let Commands::Run(ref args) = cli.command else {
            panic!("expected run command");
        };
        assert!(args.mock);
        assert!(args.config.is_none());
        assert_eq!(args.max_ticks, 0);
        assert_eq!(cli.log_level(), "info");
    }

    #[test]
    fn test_run_args_overrides() {
        let cli = Cli::try_parse_from([
            "lidar-viewer",
            "run",
            "--port",
            "3000",
            "--tick-ms",
            "20",
            "--no-chase-camera",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };

        let overrides = args.overrides();
        assert_eq!(overrides.carla_port, Some(3000));
        assert_eq!(overrides.tick_interval_ms, Some(20));
        assert_eq!(overrides.chase_camera, Some(false));
    }

    #[test]
    fn test_verbosity_levels() {
        let cli = Cli::try_parse_from(["lidar-viewer", "-vv", "info"]).unwrap();
        assert_eq!(cli.log_level(), "trace");

        let cli = Cli::try_parse_from(["lidar-viewer", "-q", "info"]).unwrap();
        assert_eq!(cli.log_level(), "warn");

        assert!(Cli::try_parse_from(["lidar-viewer", "-q", "-v", "info"]).is_err());
    }
}
