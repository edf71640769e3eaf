//! Sensor zones
//!
//! A zone is a named subset of sensors that gets its own boundary and route.
//! Zones come either from a static assignment or from proximity clustering.

use crate::geo::haversine_distance;
use crate::sensor::{Sensor, SensorId};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Zone identifier, the zone's index in the assembled list
pub type ZoneId = usize;

/// Static zone assignment entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneDefinition {
    /// Display name, kept as the zone's name
    pub name: String,
    /// Members in zone order; unknown ids are dropped on assembly
    pub sensor_ids: Vec<SensorId>,
}

impl ZoneDefinition {
    /// Definition over raw sensor numbers
    pub fn new(name: impl Into<String>, sensor_ids: impl IntoIterator<Item = u32>) -> Self {
        Self {
            name: name.into(),
            sensor_ids: sensor_ids.into_iter().map(SensorId).collect(),
        }
    }
}

/// How sensors are grouped into zones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ZoneStrategy {
    /// Fixed, named assignment
    Static(Vec<ZoneDefinition>),
    /// Single-link clustering: sensors chained within `radius_miles` share a zone
    Proximity { radius_miles: f64 },
}

impl Default for ZoneStrategy {
    fn default() -> Self {
        Self::Proximity { radius_miles: 5.0 }
    }
}

/// Assembled zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Position in the assembled list
    pub id: ZoneId,
    /// Static name, or `Zone N` for proximity clusters
    pub name: String,
    /// Member sensors in zone order
    pub sensor_ids: Vec<SensorId>,
}

impl Zone {
    /// This zone's sensors, in zone order
    ///
    /// Ids missing from `sensors` are skipped.
    pub fn select(&self, sensors: &[Sensor]) -> Vec<Sensor> {
        let by_id: FxHashMap<SensorId, &Sensor> = sensors.iter().map(|s| (s.id, s)).collect();
        self.sensor_ids
            .iter()
            .filter_map(|id| by_id.get(id).map(|s| (*s).clone()))
            .collect()
    }

    /// Number of member sensors
    pub fn len(&self) -> usize {
        self.sensor_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensor_ids.is_empty()
    }
}

/// Group `sensors` into zones
///
/// Never returns an empty zone. Zone ids are positions in the returned list.
pub fn assemble_zones(sensors: &[Sensor], strategy: &ZoneStrategy) -> Vec<Zone> {
    let zones = match strategy {
        ZoneStrategy::Static(definitions) => static_zones(sensors, definitions),
        ZoneStrategy::Proximity { radius_miles } => proximity_zones(sensors, *radius_miles),
    };
    debug!("Assembled {} zone(s) from {} sensor(s)", zones.len(), sensors.len());
    zones
}

fn static_zones(sensors: &[Sensor], definitions: &[ZoneDefinition]) -> Vec<Zone> {
    let known: FxHashSet<SensorId> = sensors.iter().map(|s| s.id).collect();

    let mut zones = Vec::with_capacity(definitions.len());
    for definition in definitions {
        let mut sensor_ids = Vec::with_capacity(definition.sensor_ids.len());
        for &id in &definition.sensor_ids {
            if known.contains(&id) {
                sensor_ids.push(id);
            } else {
                warn!("Zone '{}' lists unknown sensor {}", definition.name, id);
            }
        }
        if sensor_ids.is_empty() {
            warn!("Dropping empty zone '{}'", definition.name);
            continue;
        }
        zones.push(Zone {
            id: zones.len(),
            name: definition.name.clone(),
            sensor_ids,
        });
    }
    zones
}

/// Union-find root with path halving
fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn proximity_zones(sensors: &[Sensor], radius_miles: f64) -> Vec<Zone> {
    let n = sensors.len();
    let mut parent: Vec<usize> = (0..n).collect();

    for i in 0..n {
        for j in (i + 1)..n {
            if haversine_distance(sensors[i].position, sensors[j].position) <= radius_miles {
                let (a, b) = (find(&mut parent, i), find(&mut parent, j));
                if a != b {
                    // Keep the lower index as root so zones sort by first member
                    parent[a.max(b)] = a.min(b);
                }
            }
        }
    }

    let mut slot_of_root: FxHashMap<usize, usize> = FxHashMap::default();
    let mut zones: Vec<Zone> = Vec::new();
    for (i, sensor) in sensors.iter().enumerate() {
        let root = find(&mut parent, i);
        let slot = *slot_of_root.entry(root).or_insert_with(|| {
            zones.push(Zone {
                id: zones.len(),
                name: format!("Zone {}", zones.len() + 1),
                sensor_ids: Vec::new(),
            });
            zones.len() - 1
        });
        zones[slot].sensor_ids.push(sensor.id);
    }
    zones
}
