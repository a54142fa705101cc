//! # Ingestion Pipeline
//!
//! Sensor data ingestion module.
//!
//! Responsibilities:
//! - Register sensor data sources (supports Mock and Real)
//! - Convert each LiDAR / Radar packet into a colored `PointCloudFrame` on the callback thread
//! - Publish into a per-sensor single-slot channel (newest frame wins)
//! - Count received / converted / rejected / overwritten frames
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::IngestionPipeline;
//!
//! let mut pipeline = IngestionPipeline::new();
//! for (config, source) in blueprint.sensors.iter().zip(sources) {
//!     pipeline.register_sensor_source(config, source)?;
//! }
//!
//! let subscribers = pipeline.take_subscribers().unwrap();
//! pipeline.start_all();
//! // hand `subscribers` to the render loop
//! ```

mod adapter;
mod error;
mod generic_adapter;
mod metrics;
mod pipeline;
mod slot;

// Re-exports
pub use adapter::SensorAdapter;
pub use error::{IngestionError, Result};
pub use generic_adapter::GenericSensorAdapter;
pub use metrics::{IngestionMetrics, MetricsSnapshot};
pub use pipeline::IngestionPipeline;
pub use slot::{frame_slot, FramePublisher, FrameSubscriber};
