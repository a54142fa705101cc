//! 点云查看器指标收集模块
//!
//! 转换、渲染循环与渲染器的运行指标 (Prometheus)，以及运行结束时的内存内统计摘要。

use std::collections::BTreeMap;

use contracts::SceneSnapshot;
use metrics::{counter, gauge, histogram};

/// 记录一帧转换成功
///
/// # Example
///
/// ```ignore
/// let frame = converter.convert(&packet)?;
/// observability::record_frame_converted(&packet.sensor_id, "lidar", frame.len(), latency_us);
/// ```
pub fn record_frame_converted(sensor_id: &str, sensor_type: &str, points: usize, latency_us: f64) {
    counter!(
        "lidar_viewer_frames_converted_total",
        "sensor_id" => sensor_id.to_string(),
        "sensor_type" => sensor_type.to_string()
    )
    .increment(1);

    histogram!("lidar_viewer_frame_points", "sensor_id" => sensor_id.to_string())
        .record(points as f64);

    histogram!(
        "lidar_viewer_conversion_latency_us",
        "sensor_id" => sensor_id.to_string()
    )
    .record(latency_us);
}

/// 记录一帧被拒绝 (缓冲区格式错误等)
pub fn record_frame_rejected(sensor_id: &str, reason: &'static str) {
    counter!(
        "lidar_viewer_frames_rejected_total",
        "sensor_id" => sensor_id.to_string(),
        "reason" => reason
    )
    .increment(1);
}

/// 记录一次渲染 tick
pub fn record_render_tick(total_points: usize) {
    counter!("lidar_viewer_render_ticks_total").increment(1);
    gauge!("lidar_viewer_scene_points").set(total_points as f64);
}

/// 记录某个 sink 当前的点数
pub fn record_sink_points(sensor_id: &str, points: usize) {
    gauge!("lidar_viewer_sink_points", "sensor_id" => sensor_id.to_string()).set(points as f64);
}

/// 记录快照分发到渲染器的结果
pub fn record_snapshot_rendered(renderer: &str, status: &'static str) {
    counter!(
        "lidar_viewer_snapshots_rendered_total",
        "renderer" => renderer.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 单个传感器的聚合统计
#[derive(Debug, Clone, Default)]
pub struct SensorAggregate {
    /// 渲染循环看到的新帧数 (frame_id 或时间戳变化)
    pub frames_seen: u64,

    /// 每个 tick 的点数统计
    pub points: RunningStats,

    last_frame: Option<(Option<u64>, u64)>,
}

/// 查看器指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct ViewerMetricsAggregator {
    /// 渲染 tick 数
    pub total_ticks: u64,

    /// 每 tick 总点数统计
    pub scene_points: RunningStats,

    /// 各传感器统计 (按 ID 排序)
    pub sensors: BTreeMap<String, SensorAggregate>,

    /// ingestion 计数 (运行结束时写入)
    pub ingestion: IngestionTotals,
}

/// ingestion 计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionTotals {
    pub packets_received: u64,
    pub frames_converted: u64,
    pub frames_rejected: u64,
    pub frames_overwritten: u64,
}

impl ViewerMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 用一个场景快照更新统计
    pub fn observe(&mut self, snapshot: &SceneSnapshot) {
        self.total_ticks += 1;
        self.scene_points.push(snapshot.total_points() as f64);

        for cloud in &snapshot.clouds {
            let entry = self
                .sensors
                .entry(cloud.sensor_id().to_string())
                .or_default();
            entry.points.push(cloud.len() as f64);

            // 空帧 (尚未收到数据) 不计入
            if cloud.is_empty() && cloud.frame_id().is_none() {
                continue;
            }
            let key = (cloud.frame_id(), cloud.timestamp().to_bits());
            if entry.last_frame != Some(key) {
                entry.frames_seen += 1;
                entry.last_frame = Some(key);
            }
        }
    }

    /// 写入 ingestion 计数
    pub fn set_ingestion(&mut self, totals: IngestionTotals) {
        self.ingestion = totals;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_ticks: self.total_ticks,
            scene_points: StatsSummary::from(&self.scene_points),
            sensors: self
                .sensors
                .iter()
                .map(|(id, agg)| {
                    (
                        id.clone(),
                        SensorSummary {
                            frames_seen: agg.frames_seen,
                            points: StatsSummary::from(&agg.points),
                        },
                    )
                })
                .collect(),
            ingestion: self.ingestion,
            reject_rate: if self.ingestion.packets_received > 0 {
                self.ingestion.frames_rejected as f64 / self.ingestion.packets_received as f64
                    * 100.0
            } else {
                0.0
            },
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 单传感器摘要
#[derive(Debug, Clone, Default)]
pub struct SensorSummary {
    pub frames_seen: u64,
    pub points: StatsSummary,
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_ticks: u64,
    pub scene_points: StatsSummary,
    pub sensors: BTreeMap<String, SensorSummary>,
    pub ingestion: IngestionTotals,
    pub reject_rate: f64,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Viewer Metrics Summary ===")?;
        writeln!(f, "Render ticks: {}", self.total_ticks)?;
        writeln!(f, "Scene points: {}", self.scene_points)?;
        writeln!(
            f,
            "Packets: received={}, converted={}, rejected={} ({:.2}%), overwritten={}",
            self.ingestion.packets_received,
            self.ingestion.frames_converted,
            self.ingestion.frames_rejected,
            self.reject_rate,
            self.ingestion.frames_overwritten
        )?;

        for (sensor, summary) in &self.sensors {
            writeln!(
                f,
                "  {}: frames={}, points {}",
                sensor, summary.frames_seen, summary.points
            )?;
        }

        Ok(())
    }
}

/// `RunningStats` 的只读快照
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        let (min, max) = stats.range.unwrap_or_default();
        Self {
            count: stats.count,
            min,
            max,
            mean: stats.mean,
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            return f.write_str("N/A");
        }
        write!(
            f,
            "{:.0}..{:.0}, mean={:.1} ± {:.1} (n={})",
            self.min, self.max, self.mean, self.std_dev, self.count
        )
    }
}

/// Welford 在线均值 / 方差，外加最小最大值
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    range: Option<(f64, f64)>,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        self.range = Some(match self.range {
            Some((min, max)) => (min.min(value), max.max(value)),
            None => (value, value),
        });
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// 样本方差 (n - 1)
    pub fn variance(&self) -> f64 {
        match self.count {
            0 | 1 => 0.0,
            n => self.m2 / (n - 1) as f64,
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> Option<f64> {
        self.range.map(|(min, _)| min)
    }

    pub fn max(&self) -> Option<f64> {
        self.range.map(|(_, max)| max)
    }
}

impl Extend<f64> for RunningStats {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, values: I) {
        values.into_iter().for_each(|v| self.push(v));
    }
}
