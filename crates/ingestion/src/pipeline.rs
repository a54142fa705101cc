//! Ingestion Pipeline main entry

use std::sync::Arc;

use contracts::{SensorConfig, SensorSource};
use converter::converter_for;
use tracing::{debug, info, instrument};

use crate::adapter::SensorAdapter;
use crate::error::{IngestionError, Result};
use crate::generic_adapter::GenericSensorAdapter;
use crate::metrics::IngestionMetrics;
use crate::slot::{frame_slot, FramePublisher, FrameSubscriber};

struct RegisteredSensor {
    adapter: Box<dyn SensorAdapter>,
    /// Moved into the adapter callback on start
    publisher: Option<FramePublisher>,
}

/// Ingestion Pipeline
///
/// Owns one adapter and one single-slot channel per sensor. The render loop takes
/// the subscriber ends; each sensor callback keeps the publisher end.
pub struct IngestionPipeline {
    /// Registered sensors, in registration order
    sensors: Vec<RegisteredSensor>,

    /// Subscriber ends, handed out once
    subscribers: Option<Vec<FrameSubscriber>>,

    /// Shared metrics
    metrics: Arc<IngestionMetrics>,
}

impl IngestionPipeline {
    /// Create new Ingestion Pipeline
    pub fn new() -> Self {
        Self {
            sensors: Vec::new(),
            subscribers: Some(Vec::new()),
            metrics: Arc::new(IngestionMetrics::new()),
        }
    }

    /// Register sensor data source
    ///
    /// Builds the converter from the sensor config (colormap, attenuation) and
    /// creates the sensor's frame slot.
    ///
    /// # Errors
    /// Duplicate sensor ID, source type differing from config, or subscribers
    /// already taken.
    #[instrument(
        name = "ingestion_register_sensor_source",
        skip(self, config, source),
        fields(sensor_id = %config.id, sensor_type = %config.sensor_type)
    )]
    pub fn register_sensor_source(
        &mut self,
        config: &SensorConfig,
        source: Box<dyn SensorSource>,
    ) -> Result<()> {
        if self
            .sensors
            .iter()
            .any(|s| s.adapter.sensor_id() == config.id)
        {
            return Err(IngestionError::DuplicateSensor {
                sensor_id: config.id.clone(),
            });
        }

        if source.sensor_type() != config.sensor_type {
            return Err(IngestionError::SensorTypeMismatch {
                sensor_id: config.id.clone(),
                expected: config.sensor_type.to_string(),
                actual: source.sensor_type().to_string(),
            });
        }

        let subscribers = self
            .subscribers
            .as_mut()
            .ok_or(IngestionError::SubscribersTaken)?;

        let (publisher, subscriber) = frame_slot(config.id.as_str(), config.sensor_type);
        subscribers.push(subscriber);

        let adapter = GenericSensorAdapter::new(
            config.id.as_str(),
            source,
            Arc::from(converter_for(config)),
        );
        self.sensors.push(RegisteredSensor {
            adapter: Box::new(adapter),
            publisher: Some(publisher),
        });

        debug!(colormap = ?config.effective_colormap(), "registered sensor source");
        Ok(())
    }

    /// Start all registered sensors
    #[instrument(name = "ingestion_start_all", skip(self))]
    pub fn start_all(&mut self) {
        info!(count = self.sensors.len(), "starting all sensor adapters");
        for sensor in &mut self.sensors {
            if sensor.adapter.is_listening() {
                continue;
            }
            if let Some(publisher) = sensor.publisher.take() {
                debug!(sensor_id = %sensor.adapter.sensor_id(), "starting adapter");
                sensor.adapter.start(publisher, self.metrics.clone());
            }
        }
    }

    /// Stop all sensors
    #[instrument(name = "ingestion_stop_all", skip(self))]
    pub fn stop_all(&self) {
        info!(count = self.sensors.len(), "stopping all sensor adapters");
        for sensor in &self.sensors {
            if sensor.adapter.is_listening() {
                debug!(sensor_id = %sensor.adapter.sensor_id(), "stopping adapter");
                sensor.adapter.stop();
            }
        }
    }

    /// Take the subscriber ends (registration order)
    ///
    /// Note: Can only be called once, subsequent calls return None
    pub fn take_subscribers(&mut self) -> Option<Vec<FrameSubscriber>> {
        self.subscribers.take()
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    /// Get registered sensor count
    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    /// Check if specified sensor is listening
    pub fn is_sensor_listening(&self, sensor_id: &str) -> bool {
        self.sensors
            .iter()
            .find(|s| s.adapter.sensor_id() == sensor_id)
            .is_some_and(|s| s.adapter.is_listening())
    }
}

impl Default for IngestionPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for IngestionPipeline {
    fn drop(&mut self) {
        self.stop_all();
    }
}
