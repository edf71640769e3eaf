//! Sensor records shared by the boundary and route engines
//!
//! Sensors are owned by the caller; the engines only read them.

use crate::geo::Position;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fire probability at or above which a reading is critical
pub const CRITICAL_PROBABILITY: f64 = 70.0;

/// Fire probability at or above which a reading is a warning
pub const WARNING_PROBABILITY: f64 = 40.0;

/// Stable sensor identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct SensorId(pub u32);

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

/// Sensor priority class, also used as the environment status label
///
/// Ordered so that `Critical > Warning > Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PriorityClass {
    /// Routine monitoring
    Active,
    /// Elevated fire probability
    Warning,
    /// Fire probability high enough to demand immediate attention
    Critical,
}

impl PriorityClass {
    /// Classify a fire probability (0-100)
    pub fn from_probability(probability: f64) -> Self {
        if probability >= CRITICAL_PROBABILITY {
            Self::Critical
        } else if probability >= WARNING_PROBABILITY {
            Self::Warning
        } else {
            Self::Active
        }
    }

    /// Dashboard label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::Warning => "Warning",
            Self::Active => "Active",
        }
    }
}

impl fmt::Display for PriorityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Point sensor carrying a fire-risk value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    /// Identifier, unique within a sensor set
    pub id: SensorId,
    /// Location of the sensor
    pub position: Position,
    /// Fire risk (0-100) as reported by the upstream classifier
    pub risk_value: f64,
    /// Priority class used for route ordering and patrol loop sizing
    pub priority: PriorityClass,
}

impl Sensor {
    /// Create a sensor, deriving its priority class from the risk value
    #[must_use]
    pub fn new(id: u32, position: Position, risk_value: f64) -> Self {
        Self {
            id: SensorId(id),
            position,
            risk_value,
            priority: PriorityClass::from_probability(risk_value),
        }
    }

    /// Override the priority class
    pub fn with_priority(mut self, priority: PriorityClass) -> Self {
        self.priority = priority;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_thresholds() {
        assert_eq!(PriorityClass::from_probability(95.0), PriorityClass::Critical);
        assert_eq!(PriorityClass::from_probability(70.0), PriorityClass::Critical);
        assert_eq!(PriorityClass::from_probability(69.9), PriorityClass::Warning);
        assert_eq!(PriorityClass::from_probability(40.0), PriorityClass::Warning);
        assert_eq!(PriorityClass::from_probability(39.9), PriorityClass::Active);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(PriorityClass::Critical > PriorityClass::Warning);
        assert!(PriorityClass::Warning > PriorityClass::Active);
    }

    #[test]
    fn test_sensor_new_derives_priority() {
        let s = Sensor::new(7, Position::new(34.0, -118.0), 55.0);
        assert_eq!(s.id, SensorId(7));
        assert_eq!(s.priority, PriorityClass::Warning);
        assert_eq!(s.id.to_string(), "S-7");

        let s = s.with_priority(PriorityClass::Critical);
        assert_eq!(s.priority, PriorityClass::Critical);
    }
}
