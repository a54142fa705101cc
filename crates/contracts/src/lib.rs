//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Coordinate Model
//! - Raw LIDAR/RADAR samples are in CARLA's sensor frame (left-handed, x forward)
//! - `PointCloudFrame` positions are in the viewer frame (right-handed, x negated)
//! - Timestamps are CARLA simulation seconds (f64); `frame_id` is optional

mod blueprint;
mod error;
mod point_cloud;
mod renderer;
mod runtime;
mod sensor;
mod sensor_id;
mod sensor_source;

pub use blueprint::*;
pub use error::*;
pub use point_cloud::*;
pub use renderer::*;
pub use runtime::*;
pub use sensor::*;
pub use sensor_id::SensorId;
pub use sensor_source::{SensorDataCallback, SensorSource};
