//! Business rules - pure threshold logic over vehicle levels

use std::fmt;

use crate::domain::entities::Levels;

pub const FUEL_CRITICAL_KM: i64 = 20;
pub const FUEL_LOW_KM: i64 = 50;
pub const OIL_CRITICAL_KM: i64 = 300;
pub const OIL_SOON_KM: i64 = 500;

/// Per-pass decrements applied by the decay job
pub const FUEL_DECAY_KM: i64 = 5;
pub const OIL_DECAY_KM: i64 = 10;
pub const TYRE_DECAY_PCT: i64 = 1;

/// Thresholds used for the notification advice (strict comparisons)
pub const ADVICE_FUEL_KM: i64 = 20;
pub const ADVICE_OIL_KM: i64 = 200;
pub const ADVICE_TYRE_PCT: i64 = 50;

/// A single health alert for a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    CriticalFuel,
    LowFuel,
    CriticalOil,
    OilSoon,
}

impl Alert {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alert::CriticalFuel => "critical fuel",
            Alert::LowFuel => "low fuel",
            Alert::CriticalOil => "critical oil",
            Alert::OilSoon => "oil soon",
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify fuel and oil into zero or more alerts.
///
/// Fuel and oil are checked independently, so one vehicle can carry one alert of each.
pub fn classify_alerts(fuel_km_left: i64, oil_km_left: i64) -> Vec<Alert> {
    let mut alerts = Vec::with_capacity(2);

    if fuel_km_left <= FUEL_CRITICAL_KM {
        alerts.push(Alert::CriticalFuel);
    } else if fuel_km_left <= FUEL_LOW_KM {
        alerts.push(Alert::LowFuel);
    }

    if oil_km_left <= OIL_CRITICAL_KM {
        alerts.push(Alert::CriticalOil);
    } else if oil_km_left <= OIL_SOON_KM {
        alerts.push(Alert::OilSoon);
    }

    alerts
}

/// Alerts of one vehicle, rendered for the suggest command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub alerts: Vec<Alert>,
}

impl HealthReport {
    pub fn new(fuel_km_left: i64, oil_km_left: i64) -> Self {
        Self { alerts: classify_alerts(fuel_km_left, oil_km_left) }
    }

    pub fn is_healthy(&self) -> bool {
        self.alerts.is_empty()
    }
}

impl fmt::Display for HealthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_healthy() {
            return f.write_str("healthy");
        }
        let parts: Vec<&str> = self.alerts.iter().map(Alert::as_str).collect();
        f.write_str(&parts.join(" | "))
    }
}

/// Apply one decay pass, never going below zero
pub fn decay(levels: Levels) -> Levels {
    Levels {
        fuel_km_left: (levels.fuel_km_left - FUEL_DECAY_KM).max(0),
        oil_km_left: (levels.oil_km_left - OIL_DECAY_KM).max(0),
        tyre_pct: (levels.tyre_pct - TYRE_DECAY_PCT).max(0),
    }
}

/// The single piece of advice attached to a status notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageAdvice {
    Refuel,
    Maintenance,
    TyreCheck,
    AllGood,
}

impl UsageAdvice {
    /// First matching rule wins: fuel, then oil, then tyre.
    pub fn for_levels(levels: &Levels) -> Self {
        if levels.fuel_km_left < ADVICE_FUEL_KM {
            UsageAdvice::Refuel
        } else if levels.oil_km_left < ADVICE_OIL_KM {
            UsageAdvice::Maintenance
        } else if levels.tyre_pct < ADVICE_TYRE_PCT {
            UsageAdvice::TyreCheck
        } else {
            UsageAdvice::AllGood
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            UsageAdvice::Refuel => "Low fuel! Please refuel soon.",
            UsageAdvice::Maintenance => "Oil running low! Schedule maintenance.",
            UsageAdvice::TyreCheck => "Tyre health is low, check pressure/replace.",
            UsageAdvice::AllGood => "All good! You can drive safely.",
        }
    }
}

impl fmt::Display for UsageAdvice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}
