//! Mock sensor implementation
//!
//! Implements `SensorSource` trait, generates a deterministic synthetic scene.
//! Used for testing and development without CARLA environment.
//!
//! - LiDAR: rotating multi-channel sweep over a flat ground plane and a wavy
//!   wall around the vehicle; intensity follows CARLA's `exp(-0.004 * r)` model.
//! - Radar: a fan of detections inside the field of view with signed velocities.

use std::collections::HashMap;
use std::f64::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use contracts::{
    LidarPoint, PointCloudData, RadarData, RadarDetection, SensorDataCallback, SensorPacket,
    SensorPayload, SensorSource, SensorType,
};
use tracing::{debug, trace, warn};

/// CARLA LiDAR atmospheric attenuation rate (1/m)
const LIDAR_ATTENUATION_RATE: f64 = 0.004;

/// Mock sensor configuration
#[derive(Debug, Clone, PartialEq)]
pub struct MockSensorConfig {
    /// Send frequency (Hz)
    pub frequency_hz: f64,
    /// Maximum detection range (m)
    pub range: f64,
    /// Mount height above ground (m)
    pub mount_height: f64,
    /// Points (LiDAR) or detections (Radar) per frame
    pub points_per_frame: u32,
    /// LiDAR channel count
    pub channels: u32,
    /// LiDAR vertical FOV (degrees)
    pub upper_fov: f64,
    pub lower_fov: f64,
    /// Radar FOV (degrees)
    pub horizontal_fov: f64,
    pub vertical_fov: f64,
}

impl Default for MockSensorConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 20.0,
            range: 100.0,
            mount_height: 2.0,
            points_per_frame: 10000,
            channels: 64,
            upper_fov: 15.0,
            lower_fov: -25.0,
            horizontal_fov: 30.0,
            vertical_fov: 30.0,
        }
    }
}

impl MockSensorConfig {
    /// Derive a mock config from CARLA blueprint attributes
    ///
    /// Unknown or unparsable attributes fall back to the defaults.
    pub fn from_attributes(
        sensor_type: SensorType,
        attributes: &HashMap<String, String>,
        mount_height: f64,
    ) -> Self {
        let defaults = Self::default();
        let get = |key: &str, default: f64| -> f64 {
            match attributes.get(key).map(|v| v.parse::<f64>()) {
                Some(Ok(v)) => v,
                Some(Err(_)) => {
                    warn!(key, "unparsable sensor attribute, using default");
                    default
                }
                None => default,
            }
        };

        let sensor_tick = get("sensor_tick", 0.0);
        let frequency_hz = match sensor_type {
            SensorType::Lidar => get("rotation_frequency", defaults.frequency_hz),
            SensorType::Radar if sensor_tick > 0.0 => 1.0 / sensor_tick,
            SensorType::Radar => defaults.frequency_hz,
        };
        let frequency_hz = if frequency_hz > 0.0 {
            frequency_hz
        } else {
            defaults.frequency_hz
        };

        let points_per_second = get("points_per_second", 0.0);
        let points_per_frame = if points_per_second > 0.0 {
            (points_per_second / frequency_hz).round().max(1.0) as u32
        } else {
            defaults.points_per_frame
        };

        Self {
            frequency_hz,
            range: get("range", defaults.range),
            mount_height,
            points_per_frame,
            channels: get("channels", defaults.channels as f64).max(1.0) as u32,
            upper_fov: get("upper_fov", defaults.upper_fov),
            lower_fov: get("lower_fov", defaults.lower_fov),
            horizontal_fov: get("horizontal_fov", defaults.horizontal_fov),
            vertical_fov: get("vertical_fov", defaults.vertical_fov),
        }
    }
}

/// One LiDAR sweep of the synthetic scene
pub fn lidar_sweep(config: &MockSensorConfig, frame_id: u64) -> Vec<LidarPoint> {
    let channels = config.channels.max(1);
    let columns = (config.points_per_frame / channels).max(1);
    let phase = frame_id as f64 * 0.05;
    let mut points = Vec::with_capacity((columns * channels) as usize);

    for column in 0..columns {
        let azimuth = TAU * column as f64 / columns as f64 + phase;
        for channel in 0..channels {
            let t = if channels > 1 {
                channel as f64 / (channels - 1) as f64
            } else {
                0.5
            };
            let elevation = (config.lower_fov + (config.upper_fov - config.lower_fov) * t).to_radians();

            let distance = if elevation < -1e-3 {
                // ground plane
                config.mount_height / (-elevation).sin()
            } else {
                25.0 + 5.0 * (3.0 * azimuth).sin()
            };
            if distance > config.range {
                continue;
            }

            let (sin_el, cos_el) = elevation.sin_cos();
            let (sin_az, cos_az) = azimuth.sin_cos();
            points.push(LidarPoint {
                x: (distance * cos_el * cos_az) as f32,
                y: (distance * cos_el * sin_az) as f32,
                z: (distance * sin_el) as f32,
                intensity: (-LIDAR_ATTENUATION_RATE * distance).exp() as f32,
            });
        }
    }

    points
}

/// One Radar frame of the synthetic scene
pub fn radar_scan(config: &MockSensorConfig, frame_id: u64) -> Vec<RadarDetection> {
    let count = config.points_per_frame.max(1);
    let hfov = config.horizontal_fov.to_radians();
    let vfov = config.vertical_fov.to_radians();
    let max_depth = config.range.clamp(1.0, 60.0);

    (0..count)
        .map(|j| {
            let j = j as f64;
            let frame = frame_id as f64;
            RadarDetection {
                velocity: (8.0 * (0.1 * frame + 0.5 * j).sin()) as f32,
                azimuth: (hfov * (j / count as f64 - 0.5)) as f32,
                altitude: (vfov * 0.25 * (0.7 * j).sin()) as f32,
                depth: (1.0 + (j * 37.0 + frame) % (max_depth - 1.0).max(1.0)) as f32,
            }
        })
        .collect()
}

/// Mock sensor
///
/// Implements `SensorSource` trait, generates simulated data at specified frequency in background thread.
/// Data is sent through callback function, consistent with real CARLA sensor behavior.
pub struct MockSensor {
    sensor_id: String,
    sensor_type: SensorType,
    config: MockSensorConfig,
    listening: Arc<AtomicBool>,
}

impl MockSensor {
    /// Create new Mock sensor
    pub fn new(sensor_id: String, sensor_type: SensorType, config: MockSensorConfig) -> Self {
        Self {
            sensor_id,
            sensor_type,
            config,
            listening: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create Mock sensor with default configuration
    pub fn with_defaults(sensor_id: String, sensor_type: SensorType) -> Self {
        Self::new(sensor_id, sensor_type, MockSensorConfig::default())
    }

    pub fn config(&self) -> &MockSensorConfig {
        &self.config
    }

    /// Generate simulated data payload
    fn generate_payload(
        config: &MockSensorConfig,
        sensor_type: SensorType,
        frame_id: u64,
    ) -> SensorPayload {
        match sensor_type {
            SensorType::Lidar => {
                SensorPayload::PointCloud(PointCloudData::from_points(&lidar_sweep(config, frame_id)))
            }
            SensorType::Radar => {
                SensorPayload::Radar(RadarData::from_detections(&radar_scan(config, frame_id)))
            }
        }
    }
}

impl SensorSource for MockSensor {
    fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    fn listen(&self, callback: SensorDataCallback) {
        // Idempotent: if already listening, don't start again
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let sensor_id = self.sensor_id.clone();
        let sensor_type = self.sensor_type;
        let config = self.config.clone();
        let listening = self.listening.clone();

        let interval = Duration::from_secs_f64(1.0 / config.frequency_hz);

        thread::spawn(move || {
            let mut frame_id: u64 = 0;
            let start_time = std::time::Instant::now();

            debug!(
                sensor_id = %sensor_id,
                sensor_type = ?sensor_type,
                frequency_hz = config.frequency_hz,
                "mock sensor started"
            );

            while listening.load(Ordering::Relaxed) {
                frame_id += 1;
                let timestamp = start_time.elapsed().as_secs_f64();

                let payload = Self::generate_payload(&config, sensor_type, frame_id);

                let packet = SensorPacket {
                    sensor_id: sensor_id.as_str().into(),
                    sensor_type,
                    timestamp,
                    frame_id: Some(frame_id),
                    payload,
                };

                callback(packet);

                trace!(sensor_id = %sensor_id, frame_id, timestamp, "mock packet sent");

                thread::sleep(interval);
            }

            debug!(sensor_id = %sensor_id, "mock sensor stopped");
        });
    }

    fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    fn fast_config() -> MockSensorConfig {
        MockSensorConfig {
            frequency_hz: 100.0,
            points_per_frame: 256,
            channels: 16,
            ..Default::default()
        }
    }

    #[test]
    fn test_from_attributes_uses_carla_semantics() {
        let lidar = MockSensorConfig::from_attributes(
            SensorType::Lidar,
            &SensorType::Lidar.default_attributes(),
            2.0,
        );
        assert_eq!(lidar.frequency_hz, 20.0);
        assert_eq!(lidar.points_per_frame, 25_000);
        assert_eq!(lidar.channels, 64);
        assert_eq!(lidar.lower_fov, -25.0);

        let mut attrs = SensorType::Radar.default_attributes();
        attrs.insert("sensor_tick".into(), "0.1".into());
        let radar = MockSensorConfig::from_attributes(SensorType::Radar, &attrs, 2.0);
        assert_eq!(radar.frequency_hz, 10.0);
        assert_eq!(radar.points_per_frame, 1000);
    }

    #[test]
    fn test_from_attributes_ignores_garbage() {
        let attrs = HashMap::from([("range".to_string(), "far".to_string())]);
        let config = MockSensorConfig::from_attributes(SensorType::Lidar, &attrs, 1.5);
        assert_eq!(config.range, 100.0);
        assert_eq!(config.mount_height, 1.5);
    }

    #[test]
    fn test_lidar_sweep_is_deterministic_and_in_range() {
        let config = fast_config();
        let a = lidar_sweep(&config, 7);
        let b = lidar_sweep(&config, 7);
        assert_eq!(a, b);
        assert!(!a.is_empty());

        for p in &a {
            let r = (p.x * p.x + p.y * p.y + p.z * p.z).sqrt() as f64;
            assert!(r <= config.range + 1e-3);
            assert!(p.intensity > 0.0 && p.intensity <= 1.0);
            // nothing below the ground plane
            assert!(p.z as f64 >= -config.mount_height - 1e-3);
        }
    }

    #[test]
    fn test_radar_scan_has_signed_velocities() {
        let config = MockSensorConfig {
            points_per_frame: 50,
            ..Default::default()
        };
        let detections = radar_scan(&config, 3);
        assert_eq!(detections.len(), 50);
        assert!(detections.iter().any(|d| d.velocity < 0.0));
        assert!(detections.iter().any(|d| d.velocity > 0.0));

        let half_fov = (config.horizontal_fov / 2.0).to_radians() as f32;
        assert!(detections.iter().all(|d| d.azimuth.abs() <= half_fov + 1e-6));
        assert!(detections.iter().all(|d| d.depth >= 1.0));
    }

    #[test]
    fn test_mock_sensor_lidar_packets() {
        let sensor = MockSensor::new("test_lidar".to_string(), SensorType::Lidar, fast_config());

        let count = Arc::new(AtomicU64::new(0));
        let count_clone = count.clone();

        sensor.listen(Arc::new(move |packet| {
            assert_eq!(packet.sensor_id, "test_lidar");
            assert_eq!(packet.sensor_type, SensorType::Lidar);
            if let SensorPayload::PointCloud(cloud) = &packet.payload {
                assert_eq!(cloud.data.len(), cloud.num_points as usize * 16);
            }
            count_clone.fetch_add(1, Ordering::Relaxed);
        }));

        thread::sleep(Duration::from_millis(50));
        sensor.stop();

        assert!(count.load(Ordering::Relaxed) > 0);
        assert!(!sensor.is_listening());
    }

    #[test]
    fn test_mock_sensor_idempotent_listen() {
        let sensor = MockSensor::with_defaults("test".to_string(), SensorType::Radar);

        let count = Arc::new(AtomicU64::new(0));
        let count1 = count.clone();
        let count2 = count.clone();

        sensor.listen(Arc::new(move |_| {
            count1.fetch_add(1, Ordering::Relaxed);
        }));

        // Second call should be ignored
        sensor.listen(Arc::new(move |_| {
            count2.fetch_add(100, Ordering::Relaxed);
        }));

        thread::sleep(Duration::from_millis(100));
        sensor.stop();

        let final_count = count.load(Ordering::Relaxed);
        assert!(final_count > 0);
        assert!(final_count < 50); // 100ms max ~3 packets at 20Hz
    }
}
