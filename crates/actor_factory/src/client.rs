//! CarlaClient trait
//!
//! 会话只需要 CARLA 的一小部分能力：一辆自车、挂在车上的传感器、跟车观察者、销毁。
//! `RealCarlaClient` (feature `real-carla`) 与 `MockCarlaClient` 都实现它。

use std::collections::HashMap;
use std::future::Future;

use contracts::{ActorId, Location, SensorSource, SensorType, Transform};

use crate::error::Result;

pub trait CarlaClient: Send + Sync {
    fn connect(&mut self, host: &str, port: u16) -> impl Future<Output = Result<()>> + Send;

    /// 在地图第 `spawn_point_index` 个推荐出生点生成车辆
    ///
    /// 下标越界时返回 `SpawnPointOutOfRange`。
    fn spawn_vehicle(
        &self,
        blueprint: &str,
        spawn_point_index: usize,
    ) -> impl Future<Output = Result<ActorId>> + Send;

    fn set_autopilot(
        &self,
        vehicle_id: ActorId,
        enabled: bool,
    ) -> impl Future<Output = Result<()>> + Send;

    /// 生成传感器并挂载到 `parent_id`
    ///
    /// `attributes` 已与类型默认值合并；`transform` 相对父 actor。
    fn spawn_sensor(
        &self,
        blueprint: &str,
        transform: Transform,
        parent_id: ActorId,
        attributes: &HashMap<String, String>,
    ) -> impl Future<Output = Result<ActorId>> + Send;

    /// 把观察者移到车辆后上方：车体坐标系下偏移 `offset`，朝向与车辆一致
    fn follow_vehicle(
        &self,
        vehicle_id: ActorId,
        offset: Location,
    ) -> impl Future<Output = Result<()>> + Send;

    /// 幂等：actor 不存在时也返回 Ok
    fn destroy_actor(&self, actor_id: ActorId) -> impl Future<Output = Result<()>> + Send;

    fn actor_exists(&self, actor_id: ActorId) -> impl Future<Output = Result<bool>> + Send;

    /// 已生成传感器的数据源；actor 不存在或不是传感器时返回 `None`
    fn get_sensor_source(
        &self,
        actor_id: ActorId,
        sensor_id: String,
        sensor_type: SensorType,
    ) -> Option<Box<dyn SensorSource>>;
}
