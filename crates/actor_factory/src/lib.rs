//! # Actor Factory
//!
//! CARLA asset factory module.
//!
//! Responsibilities:
//! - Spawn the ego vehicle (autopilot) and its LiDAR / Radar sensors from `ViewerBlueprint`
//! - Manage actor lifecycle
//! - Keep the simulator spectator on a chase pose behind the ego vehicle
//! - Provide teardown and rollback
//! - Provide unified `SensorSource` abstraction
//!
//! ## Feature Flags
//!
//! - `real-carla`: Enable real CARLA client (requires carla crate)

pub mod client;
pub mod error;
pub mod factory;
pub mod mock_client;
pub mod mock_sensor;

#[cfg(feature = "real-carla")]
pub mod carla_client;
#[cfg(feature = "real-carla")]
pub mod carla_sensor_source;
#[cfg(feature = "real-carla")]
pub mod sensor_data_converter;

pub use client::CarlaClient;
pub use contracts::{ActorId, RuntimeGraph, SensorSource, ViewerBlueprint};
pub use error::{ActorFactoryError, Result};
pub use factory::ActorFactory;
pub use mock_client::{mock_spawn_point, MockCarlaClient, MockConfig};
pub use mock_sensor::{lidar_sweep, radar_scan, MockSensor, MockSensorConfig};

#[cfg(feature = "real-carla")]
pub use carla_client::RealCarlaClient;
#[cfg(feature = "real-carla")]
pub use carla_sensor_source::CarlaSensorSource;
