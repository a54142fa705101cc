//! 通用传感器适配器
//!
//! 基于 `SensorSource` trait 的统一适配器实现。
//! 转换在传感器回调线程中同步完成，之后只做一次槽覆盖。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use contracts::{SensorDataCallback, SensorId, SensorSource, SensorType};
use converter::FrameConverter;
use tracing::{debug, trace, warn};

use crate::adapter::SensorAdapter;
use crate::metrics::IngestionMetrics;
use crate::slot::FramePublisher;

/// 通用传感器适配器
///
/// 这是连接 actor_factory (数据源)、converter (转换) 与渲染循环 (单槽订阅端) 的桥梁。
pub struct GenericSensorAdapter {
    sensor_id: SensorId,
    source: Box<dyn SensorSource>,
    converter: Arc<dyn FrameConverter>,
    listening: Arc<AtomicBool>,
}

impl GenericSensorAdapter {
    /// 创建新的通用适配器
    pub fn new(
        sensor_id: impl Into<SensorId>,
        source: Box<dyn SensorSource>,
        converter: Arc<dyn FrameConverter>,
    ) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            source,
            converter,
            listening: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl SensorAdapter for GenericSensorAdapter {
    fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    fn sensor_type(&self) -> SensorType {
        self.source.sensor_type()
    }

    fn start(&self, publisher: FramePublisher, metrics: Arc<IngestionMetrics>) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let sensor_id = self.sensor_id.clone();
        let sensor_type = self.converter.sensor_type().to_string();
        let converter = self.converter.clone();
        let listening = self.listening.clone();

        debug!(sensor_id = %sensor_id, sensor_type = %sensor_type, "starting generic adapter");

        let callback: SensorDataCallback = Arc::new(move |packet| {
            if !listening.load(Ordering::Relaxed) {
                return;
            }
            metrics.record_received();

            let started = Instant::now();
            match converter.convert(&packet) {
                Ok(frame) => {
                    let points = frame.len();
                    let latency_us = started.elapsed().as_secs_f64() * 1e6;
                    metrics.record_converted(points);
                    observability::record_frame_converted(
                        &sensor_id,
                        &sensor_type,
                        points,
                        latency_us,
                    );

                    let overwrote = publisher.publish(frame);
                    trace!(sensor_id = %sensor_id, points, latency_us, overwrote, "frame published");
                }
                Err(e) => {
                    metrics.record_rejected();
                    observability::record_frame_rejected(&sensor_id, e.reason());
                    warn!(sensor_id = %sensor_id, error = %e, "frame rejected");
                }
            }
        });

        self.source.listen(callback);
    }

    fn stop(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            debug!(sensor_id = %self.sensor_id, "stopping generic adapter");
            self.source.stop();
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}
