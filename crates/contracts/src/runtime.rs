//! RuntimeGraph - Actor Factory output
//!
//! Handles of the ego vehicle and the sensors attached to it.

use std::collections::HashMap;

/// CARLA actor handle type
pub type ActorId = u32;

/// Runtime actor graph
///
/// One ego vehicle plus its sensors. Teardown order is sensors first, vehicle last.
#[derive(Debug, Clone, Default)]
pub struct RuntimeGraph {
    /// Ego vehicle (config id, actor handle)
    pub vehicle: Option<(String, ActorId)>,

    /// Sensor ID -> Actor handle
    pub sensors: HashMap<String, ActorId>,

    /// Actor handle -> Config ID (reverse lookup)
    pub actor_to_id: HashMap<ActorId, String>,
}

impl RuntimeGraph {
    /// Create empty RuntimeGraph
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the ego vehicle
    pub fn register_vehicle(&mut self, id: String, actor_id: ActorId) {
        self.actor_to_id.insert(actor_id, id.clone());
        self.vehicle = Some((id, actor_id));
    }

    /// Register sensor
    pub fn register_sensor(&mut self, sensor_id: String, actor_id: ActorId) {
        self.actor_to_id.insert(actor_id, sensor_id.clone());
        self.sensors.insert(sensor_id, actor_id);
    }

    /// Ego vehicle actor handle
    pub fn vehicle_actor(&self) -> Option<ActorId> {
        self.vehicle.as_ref().map(|(_, actor)| *actor)
    }

    /// Actor handles in teardown order: sensors, then the vehicle
    pub fn teardown_order(&self) -> Vec<ActorId> {
        let mut sensors: Vec<ActorId> = self.sensors.values().copied().collect();
        sensors.sort_unstable();
        sensors.extend(self.vehicle_actor());
        sensors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teardown_puts_vehicle_last() {
        let mut graph = RuntimeGraph::new();
        graph.register_vehicle("ego".into(), 1);
        graph.register_sensor("lidar".into(), 2);
        graph.register_sensor("radar".into(), 3);

        let order = graph.teardown_order();
        assert_eq!(order.len(), 3);
        assert_eq!(order.last(), Some(&1));
        assert_eq!(graph.actor_to_id.get(&3).map(String::as_str), Some("radar"));
    }
}
