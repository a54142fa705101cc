//! Real CARLA client implementation
//!
//! Connects to CARLA server using carla-rust crate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use carla::client::{ActorBase, Client, Sensor, Vehicle, World};
use carla::geom::{Location, Rotation, Transform as CarlaTransform};
use contracts::{ActorId, Location as ChaseOffset, SensorSource, SensorType, Transform};
use tracing::{debug, info, instrument, warn};

use crate::carla_sensor_source::CarlaSensorSource;
use crate::client::CarlaClient;
use crate::error::{ActorFactoryError, Result};

/// Real CARLA client
///
/// Wraps carla-rust's Client, implements CarlaClient trait.
/// Uses Mutex for interior mutability, allowing `&self` methods to modify World.
#[derive(Default, Clone)]
pub struct RealCarlaClient {
    /// CARLA client (kept alive for the session)
    client: Arc<Mutex<Option<Client>>>,
    world: Arc<Mutex<Option<World>>>,
    /// Created actors (for autopilot / sources / teardown)
    actors: Arc<Mutex<HashMap<ActorId, ActorType>>>,
}

#[derive(Clone)]
enum ActorType {
    Vehicle(Vehicle),
    Sensor(Sensor),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RealCarlaClient {
    /// Create new client (disconnected state)
    pub fn new() -> Self {
        Self::default()
    }

    /// Access World with mutable reference, ensuring connected
    fn with_world_mut<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut World) -> Result<R>,
    {
        let mut world_guard = lock(&self.world);
        let world = world_guard
            .as_mut()
            .ok_or(ActorFactoryError::NotConnected)?;
        f(world)
    }

    fn store_actor(&self, actor_id: ActorId, actor: ActorType) {
        lock(&self.actors).insert(actor_id, actor);
    }

    fn create_vehicle(world: &mut World, blueprint: &str, spawn_point_index: usize) -> Result<Vehicle> {
        let vehicle_bp = world
            .blueprint_library()
            .find(blueprint)
            .ok_or_else(|| {
                ActorFactoryError::vehicle_spawn(blueprint, format!("blueprint '{}' not found", blueprint))
            })?;

        let spawn_points = world.map().recommended_spawn_points();
        let available = spawn_points.len();
        let spawn_point = spawn_points.get(spawn_point_index).cloned().ok_or(
            ActorFactoryError::SpawnPointOutOfRange {
                index: spawn_point_index,
                available,
            },
        )?;
        debug!(spawn_point_index, point = ?spawn_point.location, "using recommended spawn point");

        let actor = world
            .spawn_actor(&vehicle_bp, &spawn_point)
            .map_err(|e| ActorFactoryError::vehicle_spawn(blueprint, e.to_string()))?;

        Vehicle::try_from(actor)
            .map_err(|_| ActorFactoryError::vehicle_spawn(blueprint, "spawned actor is not a vehicle"))
    }

    fn parent_vehicle(&self, sensor_blueprint: &str, parent_id: ActorId) -> Result<Vehicle> {
        match lock(&self.actors).get(&parent_id) {
            Some(ActorType::Vehicle(v)) => Ok(v.clone()),
            _ => Err(ActorFactoryError::sensor_spawn(
                sensor_blueprint,
                format!("actor_{}", parent_id),
                "parent vehicle not found",
            )),
        }
    }

    fn create_sensor(
        world: &mut World,
        blueprint: &str,
        transform: Transform,
        parent_actor: &Vehicle,
        parent_id: ActorId,
        attributes: &HashMap<String, String>,
    ) -> Result<Sensor> {
        let parent_label = format!("actor_{}", parent_id);
        let mut sensor_bp = world.blueprint_library().find(blueprint).ok_or_else(|| {
            ActorFactoryError::sensor_spawn(
                blueprint,
                &parent_label,
                format!("blueprint '{}' not found", blueprint),
            )
        })?;

        for (key, value) in attributes {
            if !sensor_bp.set_attribute(key, value) {
                warn!(key, value, "failed to set sensor attribute");
            }
        }

        let actor = world
            .spawn_actor_attached(&sensor_bp, &to_carla_transform(transform), parent_actor, None)
            .map_err(|e| ActorFactoryError::sensor_spawn(blueprint, &parent_label, e.to_string()))?;

        Sensor::try_from(actor).map_err(|_| {
            ActorFactoryError::sensor_spawn(blueprint, &parent_label, "spawned actor is not a sensor")
        })
    }

    fn destroy(actor: ActorType, actor_id: ActorId) {
        let destroyed = match actor {
            ActorType::Vehicle(vehicle) => vehicle.destroy(),
            ActorType::Sensor(sensor) => {
                if sensor.is_listening() {
                    sensor.stop();
                }
                sensor.destroy()
            }
        };
        if !destroyed {
            warn!(actor_id, "destroy returned false");
        }
    }

    /// Underlying CARLA Sensor object
    pub fn get_sensor(&self, actor_id: ActorId) -> Option<Sensor> {
        match lock(&self.actors).get(&actor_id) {
            Some(ActorType::Sensor(sensor)) => Some(sensor.clone()),
            _ => None,
        }
    }
}

fn to_carla_transform(transform: Transform) -> CarlaTransform {
    CarlaTransform {
        location: Location {
            x: transform.location.x as f32,
            y: transform.location.y as f32,
            z: transform.location.z as f32,
        },
        rotation: Rotation {
            pitch: transform.rotation.pitch as f32,
            yaw: transform.rotation.yaw as f32,
            roll: transform.rotation.roll as f32,
        },
    }
}

fn from_carla_transform(transform: &CarlaTransform) -> Transform {
    Transform {
        location: contracts::Location {
            x: transform.location.x as f64,
            y: transform.location.y as f64,
            z: transform.location.z as f64,
        },
        rotation: contracts::Rotation {
            pitch: transform.rotation.pitch as f64,
            yaw: transform.rotation.yaw as f64,
            roll: transform.rotation.roll as f64,
        },
    }
}

impl CarlaClient for RealCarlaClient {
    #[instrument(name = "real_carla_connect", skip(self), fields(host = %host, port))]
    async fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        let client = Client::connect(host, port, None);
        let world = client.world();

        info!(map = %world.map().name(), "connected to CARLA server");

        *lock(&self.client) = Some(client);
        *lock(&self.world) = Some(world);

        Ok(())
    }

    #[instrument(name = "real_carla_spawn_vehicle", skip(self), fields(blueprint = %blueprint))]
    async fn spawn_vehicle(&self, blueprint: &str, spawn_point_index: usize) -> Result<ActorId> {
        let vehicle =
            self.with_world_mut(|world| Self::create_vehicle(world, blueprint, spawn_point_index))?;
        let actor_id = vehicle.id();

        debug!(actor_id, blueprint, "vehicle spawned");
        self.store_actor(actor_id, ActorType::Vehicle(vehicle));

        Ok(actor_id)
    }

    #[instrument(name = "real_carla_set_autopilot", skip(self), fields(vehicle_id, enabled))]
    async fn set_autopilot(&self, vehicle_id: ActorId, enabled: bool) -> Result<()> {
        match lock(&self.actors).get(&vehicle_id) {
            Some(ActorType::Vehicle(vehicle)) => {
                vehicle.set_autopilot(enabled);
                Ok(())
            }
            _ => Err(ActorFactoryError::autopilot(vehicle_id, "vehicle not found")),
        }
    }

    #[instrument(
        name = "real_carla_spawn_sensor",
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
        let parent_actor = self.parent_vehicle(blueprint, parent_id)?;
        let sensor = self.with_world_mut(|world| {
            Self::create_sensor(world, blueprint, transform, &parent_actor, parent_id, attributes)
        })?;

        let actor_id = sensor.id();
        debug!(actor_id, blueprint, parent_id, "sensor spawned and attached");
        self.store_actor(actor_id, ActorType::Sensor(sensor));

        Ok(actor_id)
    }

    #[instrument(name = "real_carla_follow_vehicle", skip(self, offset), fields(vehicle_id))]
    async fn follow_vehicle(&self, vehicle_id: ActorId, offset: ChaseOffset) -> Result<()> {
        let vehicle = match lock(&self.actors).get(&vehicle_id) {
            Some(ActorType::Vehicle(vehicle)) => vehicle.clone(),
            _ => return Err(ActorFactoryError::spectator(vehicle_id, "vehicle not found")),
        };

        let pose = from_carla_transform(&vehicle.transform()).chase_pose(offset);
        self.with_world_mut(|world| {
            world.spectator().set_transform(&to_carla_transform(pose));
            Ok(())
        })
    }

    #[instrument(name = "real_carla_destroy_actor", skip(self), fields(actor_id))]
    async fn destroy_actor(&self, actor_id: ActorId) -> Result<()> {
        let removed = lock(&self.actors).remove(&actor_id);
        if let Some(actor) = removed {
            Self::destroy(actor, actor_id);
            debug!(actor_id, "actor destroyed");
        }

        // Idempotent: return Ok even if not exists
        Ok(())
    }

    #[instrument(name = "real_carla_actor_exists", skip(self), fields(actor_id))]
    async fn actor_exists(&self, actor_id: ActorId) -> Result<bool> {
        Ok(lock(&self.actors).contains_key(&actor_id))
    }

    fn get_sensor_source(
        &self,
        actor_id: ActorId,
        sensor_id: String,
        sensor_type: SensorType,
    ) -> Option<Box<dyn SensorSource>> {
        let sensor = self.get_sensor(actor_id)?;
        Some(Box::new(CarlaSensorSource::new(sensor_id, sensor_type, sensor)))
    }
}
