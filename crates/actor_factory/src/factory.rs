//! ActorFactory 核心实现
//!
//! 从 ViewerBlueprint spawn 自车与传感器，管理生命周期。

use std::collections::HashMap;

use contracts::{
    ActorId, Location, RuntimeGraph, SensorConfig, SensorSource, VehicleConfig, ViewerBlueprint,
};
use tracing::{error, info, instrument, warn};

use crate::client::CarlaClient;
use crate::error::{ActorFactoryError, Result};

/// Actor Factory
///
/// 负责 spawn 自车和挂载的传感器，
/// 并提供 teardown 和回滚能力。
pub struct ActorFactory<C: CarlaClient> {
    client: C,
}

impl<C: CarlaClient> ActorFactory<C> {
    /// 创建新的 ActorFactory
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// 底层客户端
    pub fn client(&self) -> &C {
        &self.client
    }

    /// spawn 自车 + 全部传感器
    ///
    /// # 原子性保证
    /// 任何一步失败 (包括 autopilot)，都会回滚销毁所有已创建的 actors。
    #[instrument(
        name = "actor_factory_spawn_session",
        skip(self, blueprint),
        fields(vehicle_id = %blueprint.vehicle.id, sensor_count = blueprint.sensors.len())
    )]
    pub async fn spawn_session(&self, blueprint: &ViewerBlueprint) -> Result<RuntimeGraph> {
        let mut graph = RuntimeGraph::new();

        let vehicle_actor_id = self.spawn_vehicle_actor(&blueprint.vehicle).await?;
        graph.register_vehicle(blueprint.vehicle.id.clone(), vehicle_actor_id);

        if blueprint.vehicle.autopilot {
            if let Err(e) = self.client.set_autopilot(vehicle_actor_id, true).await {
                warn!(error = %e, "autopilot failed, rolling back vehicle");
                self.rollback(&graph).await;
                return Err(e);
            }
            info!(actor_id = vehicle_actor_id, "autopilot enabled for vehicle");
        }

        for sensor_config in &blueprint.sensors {
            match self
                .spawn_sensor_actor(vehicle_actor_id, &blueprint.vehicle, sensor_config)
                .await
            {
                Ok(sensor_actor_id) => {
                    graph.register_sensor(sensor_config.id.clone(), sensor_actor_id);
                }
                Err(e) => {
                    warn!(
                        sensor_id = %sensor_config.id,
                        error = %e,
                        "sensor spawn failed, rolling back all actors"
                    );
                    self.rollback(&graph).await;
                    return Err(e);
                }
            }
        }

        info!(
            sensors = graph.sensors.len(),
            "spawn_session completed successfully"
        );

        Ok(graph)
    }

    /// 为每个已 spawn 的传感器获取数据源 (按配置顺序)
    pub fn sensor_sources(
        &self,
        graph: &RuntimeGraph,
        blueprint: &ViewerBlueprint,
    ) -> Result<Vec<Box<dyn SensorSource>>> {
        blueprint
            .sensors
            .iter()
            .map(|sensor| {
                let actor_id = graph.sensors.get(&sensor.id).copied().ok_or_else(|| {
                    ActorFactoryError::SourceUnavailable {
                        sensor_id: sensor.id.clone(),
                        actor_id: 0,
                    }
                })?;
                self.client
                    .get_sensor_source(actor_id, sensor.id.clone(), sensor.sensor_type)
                    .ok_or_else(|| ActorFactoryError::SourceUnavailable {
                        sensor_id: sensor.id.clone(),
                        actor_id,
                    })
            })
            .collect()
    }

    /// 观察者移到自车后上方；graph 中没有自车时什么也不做
    pub async fn follow_vehicle(&self, graph: &RuntimeGraph, offset: Location) -> Result<()> {
        match graph.vehicle_actor() {
            Some(vehicle_id) => self.client.follow_vehicle(vehicle_id, offset).await,
            None => Ok(()),
        }
    }

    /// 销毁 RuntimeGraph 中的所有 actors
    ///
    /// # 幂等性
    /// 多次调用安全，不存在的 actor 会被忽略。
    #[instrument(
        name = "actor_factory_teardown",
        skip(self, graph),
        fields(sensor_count = graph.sensors.len())
    )]
    pub async fn teardown(&self, graph: &RuntimeGraph) -> Result<()> {
        info!("starting teardown");
        self.destroy_all(graph).await;
        info!("teardown completed");
        Ok(())
    }

    /// 回滚：销毁所有已创建的 actors
    #[instrument(name = "actor_factory_rollback", skip(self, graph))]
    async fn rollback(&self, graph: &RuntimeGraph) {
        warn!("performing rollback");
        self.destroy_all(graph).await;
    }

    /// 先销毁 sensors，再销毁自车
    async fn destroy_all(&self, graph: &RuntimeGraph) {
        for actor_id in graph.teardown_order() {
            let config_id = graph
                .actor_to_id
                .get(&actor_id)
                .map(String::as_str)
                .unwrap_or("unknown");
            self.destroy_actor_safe(actor_id, config_id).await;
        }
    }

    /// 安全销毁 actor（忽略错误，仅记录日志）
    #[instrument(
        name = "actor_factory_destroy_actor",
        skip(self, config_id),
        fields(actor_id, config_id = %config_id)
    )]
    async fn destroy_actor_safe(&self, actor_id: ActorId, config_id: &str) {
        info!(actor_id, config_id, "destroying actor");

        if let Err(e) = self.client.destroy_actor(actor_id).await {
            error!(
                actor_id,
                config_id,
                error = %e,
                "failed to destroy actor"
            );
        }
    }

    #[instrument(
        name = "actor_factory_spawn_vehicle_actor",
        skip(self, config),
        fields(vehicle_id = %config.id)
    )]
    async fn spawn_vehicle_actor(&self, config: &VehicleConfig) -> Result<ActorId> {
        info!(
            blueprint = %config.blueprint,
            spawn_point_index = config.spawn_point_index,
            "spawning vehicle"
        );
        let actor_id = self
            .client
            .spawn_vehicle(&config.blueprint, config.spawn_point_index)
            .await
            .map_err(|e| match e {
                ActorFactoryError::SpawnPointOutOfRange { .. } => e,
                other => ActorFactoryError::vehicle_spawn(&config.id, other.to_string()),
            })?;

        info!(actor_id, "vehicle spawned successfully");
        Ok(actor_id)
    }

    #[instrument(
        name = "actor_factory_spawn_sensor_actor",
        skip(self, vehicle_config, sensor_config),
        fields(sensor_id = %sensor_config.id, vehicle_id = %vehicle_config.id)
    )]
    async fn spawn_sensor_actor(
        &self,
        vehicle_actor_id: ActorId,
        vehicle_config: &VehicleConfig,
        sensor_config: &SensorConfig,
    ) -> Result<ActorId> {
        info!(sensor_type = %sensor_config.sensor_type, "spawning sensor");

        self.client
            .spawn_sensor(
                sensor_config.sensor_type.blueprint_id(),
                sensor_config.transform,
                vehicle_actor_id,
                &sensor_attributes(sensor_config),
            )
            .await
            .map_err(|e| {
                ActorFactoryError::sensor_spawn(&sensor_config.id, &vehicle_config.id, e.to_string())
            })
            .inspect(|&actor_id| {
                info!(actor_id, "sensor spawned and attached successfully");
            })
    }
}

/// 蓝图属性：类型默认值 + 用户覆盖 + 由频率推出的 `sensor_tick`
fn sensor_attributes(config: &SensorConfig) -> HashMap<String, String> {
    let mut attributes = config.effective_attributes();
    if config.frequency_hz > 0.0 {
        attributes
            .entry("sensor_tick".to_string())
            .or_insert_with(|| format!("{}", 1.0 / config.frequency_hz));
    }
    attributes
}
