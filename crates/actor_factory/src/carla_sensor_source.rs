//! CARLA Sensor SensorSource wrapper
//!
//! Only compiled when `real-carla` feature is enabled.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use carla::client::Sensor;
use contracts::{SensorDataCallback, SensorId, SensorSource, SensorType};
use tracing::{debug, trace, warn};

use crate::sensor_data_converter::convert_sensor_data;

/// Real LiDAR / Radar sensor as a `SensorSource`
///
/// The callback runs on CARLA's streaming thread, so it must return quickly;
/// the ingestion callback only converts and overwrites a single slot.
pub struct CarlaSensorSource {
    sensor_id: SensorId,
    sensor_type: SensorType,
    sensor: Sensor,
    listening: Arc<AtomicBool>,
    delivered: Arc<AtomicU64>,
}

impl CarlaSensorSource {
    pub fn new(sensor_id: impl Into<SensorId>, sensor_type: SensorType, sensor: Sensor) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            sensor_type,
            sensor,
            listening: Arc::new(AtomicBool::new(false)),
            delivered: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Packets handed to the callback so far
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }
}

impl SensorSource for CarlaSensorSource {
    fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    fn listen(&self, callback: SensorDataCallback) {
        if self.listening.swap(true, Ordering::SeqCst) {
            warn!(sensor_id = %self.sensor_id, "sensor already listening");
            return;
        }

        let sensor_id = self.sensor_id.clone();
        let sensor_type = self.sensor_type;
        let listening = self.listening.clone();
        let delivered = self.delivered.clone();

        debug!(sensor_id = %sensor_id, sensor_type = %sensor_type, "starting CARLA sensor");

        self.sensor.listen(move |sensor_data| {
            if !listening.load(Ordering::Relaxed) {
                return;
            }

            let Some(packet) = convert_sensor_data(&sensor_id, sensor_type, &sensor_data) else {
                warn!(sensor_id = %sensor_id, "sensor data does not match sensor type");
                return;
            };

            trace!(sensor_id = %sensor_id, frame_id = packet.frame_id, "CARLA frame received");
            delivered.fetch_add(1, Ordering::Relaxed);
            callback(packet);
        });
    }

    fn stop(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            self.sensor.stop();
            debug!(
                sensor_id = %self.sensor_id,
                delivered = self.delivered(),
                "CARLA sensor stopped"
            );
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}
