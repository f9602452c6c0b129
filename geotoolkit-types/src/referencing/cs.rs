use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GeotoolkitTypesError;

/// Direction of a coordinate system axis.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisDirection {
    /// Towards north.
    North,
    /// Towards south.
    South,
    /// Towards east.
    East,
    /// Towards west.
    West,
    /// Up (height).
    Up,
    /// Down (depth).
    Down,
    /// Any other direction, e.g. the X axis of a geocentric system.
    Other,
}

impl AxisDirection {
    /// Returns true for east and west directions.
    pub fn is_east_west(&self) -> bool {
        matches!(self, AxisDirection::East | AxisDirection::West)
    }

    /// Returns true for north and south directions.
    pub fn is_north_south(&self) -> bool {
        matches!(self, AxisDirection::North | AxisDirection::South)
    }

    fn as_str(&self) -> &'static str {
        match self {
            AxisDirection::North => "NORTH",
            AxisDirection::South => "SOUTH",
            AxisDirection::East => "EAST",
            AxisDirection::West => "WEST",
            AxisDirection::Up => "UP",
            AxisDirection::Down => "DOWN",
            AxisDirection::Other => "OTHER",
        }
    }
}

impl Display for AxisDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AxisDirection {
    type Err = GeotoolkitTypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let direction = match s.trim().to_ascii_uppercase().as_str() {
            "NORTH" => AxisDirection::North,
            "SOUTH" => AxisDirection::South,
            "EAST" => AxisDirection::East,
            "WEST" => AxisDirection::West,
            "UP" => AxisDirection::Up,
            "DOWN" => AxisDirection::Down,
            "OTHER" => AxisDirection::Other,
            _ => return Err(GeotoolkitTypesError::AxisDirection(s.to_string())),
        };

        Ok(direction)
    }
}

/// Coordinate system axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    /// Name of the axis.
    pub name: String,
    /// Direction of the axis.
    pub direction: AxisDirection,
}

impl Axis {
    /// Creates a new axis.
    pub fn new(name: impl Into<String>, direction: AxisDirection) -> Self {
        Self {
            name: name.into(),
            direction,
        }
    }
}

/// Unit of measure with its conversion factor to the base unit (metre or radian).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Name of the unit.
    pub name: String,
    /// Multiplier converting values in this unit to the base unit.
    pub factor: f64,
}

impl Unit {
    /// Creates a new unit.
    pub fn new(name: impl Into<String>, factor: f64) -> Self {
        Self {
            name: name.into(),
            factor,
        }
    }

    /// Degree of arc.
    pub fn degree() -> Self {
        Self::new("degree", std::f64::consts::PI / 180.0)
    }

    /// Metre.
    pub fn metre() -> Self {
        Self::new("metre", 1.0)
    }
}
