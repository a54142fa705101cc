//! 传感器适配器 trait

use std::sync::Arc;

use contracts::SensorType;

use crate::metrics::IngestionMetrics;
use crate::slot::FramePublisher;

/// 传感器适配器 trait
///
/// 负责：
/// 1. 注册传感器回调
/// 2. 在回调线程中把原始数据转换为彩色点云
/// 3. 发布到该传感器的单槽通道 (覆盖未读帧)
pub trait SensorAdapter: Send + Sync {
    /// 获取传感器 ID
    fn sensor_id(&self) -> &str;

    /// 获取传感器类型
    fn sensor_type(&self) -> SensorType;

    /// 启动传感器数据采集
    ///
    /// # Arguments
    /// * `publisher` - 该传感器的发布端
    /// * `metrics` - 共享的 ingestion 指标
    fn start(&self, publisher: FramePublisher, metrics: Arc<IngestionMetrics>);

    /// 停止传感器数据采集
    fn stop(&self);

    /// 检查传感器是否正在监听
    fn is_listening(&self) -> bool;
}
