//! Mock CARLA 客户端
//!
//! 用于单元测试和无仿真器运行的 mock 实现，支持注入失败场景。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use contracts::{ActorId, Location, Rotation, SensorSource, SensorType, Transform};
use tracing::instrument;

use crate::client::CarlaClient;
use crate::error::{ActorFactoryError, Result};
use crate::mock_sensor::{MockSensor, MockSensorConfig};

/// Mock 客户端配置
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// 应该失败的车辆蓝图
    pub fail_vehicle_blueprints: Vec<String>,
    /// 应该失败的传感器蓝图
    pub fail_sensor_blueprints: Vec<String>,
    /// autopilot 是否失败
    pub fail_autopilot: bool,
    /// 应该失败的 destroy actor IDs
    pub fail_destroy: Vec<ActorId>,
    /// 地图推荐出生点数量
    pub spawn_point_count: usize,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            fail_vehicle_blueprints: Vec::new(),
            fail_sensor_blueprints: Vec::new(),
            fail_autopilot: false,
            fail_destroy: Vec::new(),
            spawn_point_count: 155,
        }
    }
}

/// 已创建的 mock actor
#[derive(Debug, Clone)]
struct MockActor {
    blueprint: String,
    kind: MockActorKind,
}

#[derive(Debug, Clone)]
enum MockActorKind {
    Vehicle { autopilot: bool, transform: Transform },
    Sensor { config: MockSensorConfig },
}

/// Mock CARLA 客户端
pub struct MockCarlaClient {
    /// 配置（可注入失败场景）
    config: MockConfig,
    /// Actor ID 计数器
    next_actor_id: AtomicU32,
    /// 已创建的 actors
    actors: Mutex<HashMap<ActorId, MockActor>>,
    /// 观察者位姿 (follow_vehicle 之前为 None)
    spectator: Mutex<Option<Transform>>,
    /// 连接状态
    connected: bool,
}

/// 第 `index` 个 mock 出生点：沿 x 轴每 10m 一个，朝向依次旋转 90°
pub fn mock_spawn_point(index: usize) -> Transform {
    Transform {
        location: Location {
            x: index as f64 * 10.0,
            y: 0.0,
            z: 0.5,
        },
        rotation: Rotation {
            yaw: (index % 4) as f64 * 90.0,
            ..Default::default()
        },
    }
}

impl MockCarlaClient {
    /// 创建默认 mock 客户端
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// 使用配置创建 mock 客户端
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            next_actor_id: AtomicU32::new(1000), // 从 1000 开始，便于识别
            actors: Mutex::new(HashMap::new()),
            spectator: Mutex::new(None),
            connected: false,
        }
    }

    /// 获取当前已创建的 actor 数量
    pub fn actor_count(&self) -> usize {
        self.actors().len()
    }

    /// 获取所有已创建的 actor IDs
    pub fn all_actor_ids(&self) -> Vec<ActorId> {
        self.actors().keys().copied().collect()
    }

    /// 车辆是否处于 autopilot
    pub fn autopilot_enabled(&self, vehicle_id: ActorId) -> bool {
        matches!(
            self.actors().get(&vehicle_id),
            Some(MockActor {
                kind: MockActorKind::Vehicle { autopilot: true, .. },
                ..
            })
        )
    }

    /// 最近一次 follow_vehicle 设置的观察者位姿
    pub fn spectator_transform(&self) -> Option<Transform> {
        *self.spectator.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn actors(&self) -> MutexGuard<'_, HashMap<ActorId, MockActor>> {
        self.actors.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn allocate_actor_id(&self) -> ActorId {
        self.next_actor_id.fetch_add(1, Ordering::SeqCst)
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(ActorFactoryError::NotConnected)
        }
    }
}

impl Default for MockCarlaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CarlaClient for MockCarlaClient {
    #[instrument(name = "mock_carla_connect", skip(self), fields(host = %host, port))]
    async fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        let _ = (host, port);
        self.connected = true;
        Ok(())
    }

    #[instrument(name = "mock_carla_spawn_vehicle", skip(self), fields(blueprint = %blueprint))]
    async fn spawn_vehicle(&self, blueprint: &str, spawn_point_index: usize) -> Result<ActorId> {
        self.ensure_connected()?;

        if spawn_point_index >= self.config.spawn_point_count {
            return Err(ActorFactoryError::SpawnPointOutOfRange {
                index: spawn_point_index,
                available: self.config.spawn_point_count,
            });
        }

        if self
            .config
            .fail_vehicle_blueprints
            .iter()
            .any(|b| b == blueprint)
        {
            return Err(ActorFactoryError::vehicle_spawn(blueprint, "mock failure"));
        }

        let actor_id = self.allocate_actor_id();
        self.actors().insert(
            actor_id,
            MockActor {
                blueprint: blueprint.to_string(),
                kind: MockActorKind::Vehicle {
                    autopilot: false,
                    transform: mock_spawn_point(spawn_point_index),
                },
            },
        );
        Ok(actor_id)
    }

    #[instrument(name = "mock_carla_set_autopilot", skip(self), fields(vehicle_id, enabled))]
    async fn set_autopilot(&self, vehicle_id: ActorId, enabled: bool) -> Result<()> {
        if self.config.fail_autopilot {
            return Err(ActorFactoryError::autopilot(vehicle_id, "mock failure"));
        }

        match self.actors().get_mut(&vehicle_id) {
            Some(MockActor {
                kind: MockActorKind::Vehicle { autopilot, .. },
                ..
            }) => {
                *autopilot = enabled;
                Ok(())
            }
            _ => Err(ActorFactoryError::autopilot(vehicle_id, "vehicle not found")),
        }
    }

    #[instrument(
        name = "mock_carla_spawn_sensor",
        skip(self, transform, attributes),
        fields(blueprint = %blueprint, parent_id)
    )]
    async fn spawn_sensor(
        &self,
        blueprint: &str,
        transform: Transform,
        parent_id: ActorId,
        attributes: &HashMap<String, String>,
    ) -> Result<ActorId> {
        self.ensure_connected()?;

        // 验证 parent 存在
        if !self.actors().contains_key(&parent_id) {
            return Err(ActorFactoryError::sensor_spawn(
                blueprint,
                format!("actor_{}", parent_id),
                "parent actor not found",
            ));
        }

        if self
            .config
            .fail_sensor_blueprints
            .iter()
            .any(|b| b == blueprint)
        {
            return Err(ActorFactoryError::sensor_spawn(
                blueprint,
                format!("actor_{}", parent_id),
                "mock failure",
            ));
        }

        let sensor_type = match blueprint {
            "sensor.lidar.ray_cast" => SensorType::Lidar,
            "sensor.other.radar" => SensorType::Radar,
            other => {
                return Err(ActorFactoryError::sensor_spawn(
                    other,
                    format!("actor_{}", parent_id),
                    "blueprint not found",
                ))
            }
        };

        let config =
            MockSensorConfig::from_attributes(sensor_type, attributes, transform.location.z);
        let actor_id = self.allocate_actor_id();
        self.actors().insert(
            actor_id,
            MockActor {
                blueprint: blueprint.to_string(),
                kind: MockActorKind::Sensor { config },
            },
        );
        Ok(actor_id)
    }

    #[instrument(name = "mock_carla_follow_vehicle", skip(self, offset), fields(vehicle_id))]
    async fn follow_vehicle(&self, vehicle_id: ActorId, offset: Location) -> Result<()> {
        self.ensure_connected()?;

        let transform = match self.actors().get(&vehicle_id) {
            Some(MockActor {
                kind: MockActorKind::Vehicle { transform, .. },
                ..
            }) => *transform,
            _ => return Err(ActorFactoryError::spectator(vehicle_id, "vehicle not found")),
        };

        *self.spectator.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(transform.chase_pose(offset));
        Ok(())
    }

    #[instrument(name = "mock_carla_destroy_actor", skip(self), fields(actor_id))]
    async fn destroy_actor(&self, actor_id: ActorId) -> Result<()> {
        if self.config.fail_destroy.contains(&actor_id) {
            return Err(ActorFactoryError::DestroyFailed {
                actor_id,
                message: "mock failure".into(),
            });
        }

        // 幂等：即使不存在也返回 Ok
        self.actors().remove(&actor_id);
        Ok(())
    }

    #[instrument(name = "mock_carla_actor_exists", skip(self), fields(actor_id))]
    async fn actor_exists(&self, actor_id: ActorId) -> Result<bool> {
        Ok(self.actors().contains_key(&actor_id))
    }

    fn get_sensor_source(
        &self,
        actor_id: ActorId,
        sensor_id: String,
        sensor_type: SensorType,
    ) -> Option<Box<dyn SensorSource>> {
        let actors = self.actors();
        let actor = actors.get(&actor_id)?;
        match &actor.kind {
            MockActorKind::Sensor { config } if actor.blueprint == sensor_type.blueprint_id() => {
                Some(Box::new(MockSensor::new(
                    sensor_id,
                    sensor_type,
                    config.clone(),
                )))
            }
            _ => None,
        }
    }
}
