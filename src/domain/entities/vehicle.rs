use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Owner of a vehicle (the chat platform's user id)
pub type OwnerId = i64;

/// Surrogate key of a vehicle row
pub type VehicleId = i64;

pub const DEFAULT_FUEL_KM: i64 = 100;
pub const DEFAULT_OIL_KM: i64 = 1000;
pub const DEFAULT_TYRE_PCT: i64 = 100;
pub const MAX_TYRE_PCT: i64 = 100;

/// A tracked vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub owner_id: OwnerId,
    pub name: String,
    pub fuel_km_left: i64,
    pub oil_km_left: i64,
    pub tyre_pct: i64,
}

impl Vehicle {
    pub fn levels(&self) -> Levels {
        Levels {
            fuel_km_left: self.fuel_km_left,
            oil_km_left: self.oil_km_left,
            tyre_pct: self.tyre_pct,
        }
    }
}

/// Input for creating a vehicle. `None` levels take the schema defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVehicle {
    pub owner_id: OwnerId,
    pub name: String,
    pub fuel_km_left: Option<i64>,
    pub oil_km_left: Option<i64>,
}

impl NewVehicle {
    pub fn new(owner_id: OwnerId, name: impl Into<String>) -> Self {
        Self {
            owner_id,
            name: name.into(),
            fuel_km_left: None,
            oil_km_left: None,
        }
    }

    pub fn with_fuel(mut self, km: i64) -> Self {
        self.fuel_km_left = Some(km);
        self
    }

    pub fn with_oil(mut self, km: i64) -> Self {
        self.oil_km_left = Some(km);
        self
    }

    /// Starting levels after defaults and clamping
    pub fn initial_levels(&self) -> Levels {
        Levels {
            fuel_km_left: self.fuel_km_left.unwrap_or(DEFAULT_FUEL_KM),
            oil_km_left: self.oil_km_left.unwrap_or(DEFAULT_OIL_KM),
            tyre_pct: DEFAULT_TYRE_PCT,
        }
        .clamped()
    }
}

/// The three depleting values of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Levels {
    pub fuel_km_left: i64,
    pub oil_km_left: i64,
    pub tyre_pct: i64,
}

impl Levels {
    /// Force the values back into their valid ranges
    pub fn clamped(self) -> Self {
        Self {
            fuel_km_left: self.fuel_km_left.max(0),
            oil_km_left: self.oil_km_left.max(0),
            tyre_pct: self.tyre_pct.clamp(0, MAX_TYRE_PCT),
        }
    }
}

/// A level that the `update` command may set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelField {
    Fuel,
    Oil,
}

impl LevelField {
    pub fn as_str(&self) -> &'static str {
        match self {
            LevelField::Fuel => "fuel",
            LevelField::Oil => "oil",
        }
    }

    /// Clamp a value for this field
    pub fn clamp(&self, value: i64) -> i64 {
        value.max(0)
    }
}

impl FromStr for LevelField {
    type Err = String;

    /// Case-sensitive, no trimming
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fuel" => Ok(LevelField::Fuel),
            "oil" => Ok(LevelField::Oil),
            other => Err(format!("unknown field: {}", other)),
        }
    }
}

impl fmt::Display for LevelField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a keyed mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matched {
    Found(usize),
    NotFound,
}

impl Matched {
    pub fn from_rows(rows: usize) -> Self {
        if rows == 0 {
            Matched::NotFound
        } else {
            Matched::Found(rows)
        }
    }

    pub fn rows(&self) -> usize {
        match self {
            Matched::Found(n) => *n,
            Matched::NotFound => 0,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Matched::Found(_))
    }
}
