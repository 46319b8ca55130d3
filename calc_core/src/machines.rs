//! # Machine Inventory
//!
//! CNC machines available in the shop. A machine carries the limits the
//! calculators check against (spindle speed range, spindle power) and the
//! hourly rate used by cost estimation.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::machines::{Machine, MachineType};
//!
//! let lathe = Machine::new("T-01", "Puma 2600", MachineType::Lathe, 18.5, 50.0, 4000.0);
//! assert_eq!(lathe.clamp_rpm(6000.0), 4000.0);
//! assert!(lathe.can_deliver(12.0));
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{CalcError, CalcResult};

/// Machine kind (turning/milling axes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MachineType {
    Lathe,
    Mill3Axis,
    Mill4Axis,
    Mill5Axis,
    /// Lathe with driven tools / Y axis
    TurnMill,
    Grinder,
    Drill,
}

impl MachineType {
    pub const ALL: [MachineType; 7] = [
        MachineType::Lathe,
        MachineType::Mill3Axis,
        MachineType::Mill4Axis,
        MachineType::Mill5Axis,
        MachineType::TurnMill,
        MachineType::Grinder,
        MachineType::Drill,
    ];

    /// Parse from common string representations
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.to_uppercase().replace([' ', '-', '_'], "").as_str() {
            "LATHE" | "TURNING" => Ok(MachineType::Lathe),
            "MILL" | "MILL3AXIS" | "3AXIS" | "VMC" => Ok(MachineType::Mill3Axis),
            "MILL4AXIS" | "4AXIS" => Ok(MachineType::Mill4Axis),
            "MILL5AXIS" | "5AXIS" => Ok(MachineType::Mill5Axis),
            "TURNMILL" | "MILLTURN" => Ok(MachineType::TurnMill),
            "GRINDER" | "GRINDING" => Ok(MachineType::Grinder),
            "DRILL" | "DRILLING" => Ok(MachineType::Drill),
            _ => Err(CalcError::invalid_input("machine_type", s, "Unknown machine type")),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MachineType::Lathe => "Lathe",
            MachineType::Mill3Axis => "3-Axis Mill",
            MachineType::Mill4Axis => "4-Axis Mill",
            MachineType::Mill5Axis => "5-Axis Mill",
            MachineType::TurnMill => "Turn-Mill",
            MachineType::Grinder => "Grinder",
            MachineType::Drill => "Drill",
        }
    }

    /// Whether the machine rotates the workpiece
    pub fn is_turning(&self) -> bool {
        matches!(self, MachineType::Lathe | MachineType::TurnMill)
    }
}

impl std::fmt::Display for MachineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Axis travel envelope in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Travel {
    pub x_mm: f64,
    pub y_mm: f64,
    pub z_mm: f64,
}

/// A machine in the inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub id: Uuid,
    /// Shop floor code, unique within the shop (e.g. "T-01")
    pub code: String,
    pub name: String,
    pub machine_type: MachineType,
    /// Spindle power (kW)
    pub power_kw: f64,
    pub min_rpm: f64,
    pub max_rpm: f64,
    #[serde(default)]
    pub travel: Travel,
    /// Machine hourly rate in the shop currency
    #[serde(default)]
    pub hourly_rate: f64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Machine {
    /// Create an active machine with a fresh id.
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        machine_type: MachineType,
        power_kw: f64,
        min_rpm: f64,
        max_rpm: f64,
    ) -> Self {
        Machine {
            id: Uuid::new_v4(),
            code: code.into(),
            name: name.into(),
            machine_type,
            power_kw,
            min_rpm,
            max_rpm,
            travel: Travel::default(),
            hourly_rate: 0.0,
            active: true,
        }
    }

    pub fn with_travel(mut self, x_mm: f64, y_mm: f64, z_mm: f64) -> Self {
        self.travel = Travel { x_mm, y_mm, z_mm };
        self
    }

    pub fn with_hourly_rate(mut self, rate: f64) -> Self {
        self.hourly_rate = rate;
        self
    }

    pub fn validate(&self) -> CalcResult<()> {
        if self.code.trim().is_empty() {
            return Err(CalcError::missing_field("code"));
        }
        if self.power_kw <= 0.0 {
            return Err(CalcError::invalid_input(
                "power_kw",
                self.power_kw.to_string(),
                "Spindle power must be positive",
            ));
        }
        if self.min_rpm < 0.0 || self.max_rpm <= 0.0 || self.min_rpm > self.max_rpm {
            return Err(CalcError::invalid_input(
                "rpm",
                format!("{}..{}", self.min_rpm, self.max_rpm),
                "RPM range must be positive and ordered",
            ));
        }
        if self.hourly_rate < 0.0 {
            return Err(CalcError::invalid_input(
                "hourly_rate",
                self.hourly_rate.to_string(),
                "Hourly rate cannot be negative",
            ));
        }
        Ok(())
    }

    /// Limit a requested spindle speed to what the machine can run.
    pub fn clamp_rpm(&self, rpm: f64) -> f64 {
        rpm.max(self.min_rpm).min(self.max_rpm)
    }

    /// Whether the spindle can deliver the given cutting power.
    pub fn can_deliver(&self, power_kw: f64) -> bool {
        power_kw <= self.power_kw
    }
}
