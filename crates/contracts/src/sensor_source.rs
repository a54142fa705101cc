//! SensorSource - 传感器数据源
//!
//! 真实 CARLA 传感器与 mock 传感器共用的回调接口。
//! ingestion 注册的回调在传感器线程上执行转换，然后把结果写入单槽通道。

use std::sync::Arc;

use crate::{SensorPacket, SensorType};

/// 每个原始数据包调用一次；可能来自任意线程
pub type SensorDataCallback = Arc<dyn Fn(SensorPacket) + Send + Sync>;

/// LiDAR / Radar 数据源
///
/// ```ignore
/// let source: Box<dyn SensorSource> = factory.sensor_sources(&graph, &blueprint)?.remove(0);
/// source.listen(Arc::new(move |packet| publish(convert(&packet))));
/// // ...
/// source.stop();
/// ```
pub trait SensorSource: Send + Sync {
    fn sensor_id(&self) -> &str;

    fn sensor_type(&self) -> SensorType;

    /// 开始推送数据包。已在监听时再次调用无效，保留第一次注册的回调。
    fn listen(&self, callback: SensorDataCallback);

    /// 停止推送；返回后不再调用回调
    fn stop(&self);

    fn is_listening(&self) -> bool;
}
