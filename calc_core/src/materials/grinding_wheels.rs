//! Grinding wheel specifications
//!
//! Wheels are described by the ISO 525 marking: abrasive, grit, grade,
//! structure and bond, e.g. `A 60 K 5 V`. The maximum operating speed comes
//! from the wheel label and is checked by the grinding calculator.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Abrasive {
    /// Aluminium oxide (A)
    AluminiumOxide,
    /// Silicon carbide (C)
    SiliconCarbide,
    /// Cubic boron nitride (B)
    Cbn,
    /// Diamond (D)
    Diamond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WheelBond {
    /// Vitrified (V)
    Vitrified,
    /// Resinoid (B)
    Resinoid,
    /// Metal (M)
    Metal,
}

/// A stocked grinding wheel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrindingWheel {
    pub code: &'static str,
    pub abrasive: Abrasive,
    pub grit: u16,
    /// Hardness grade letter (A soft .. Z hard)
    pub grade: char,
    pub structure: u8,
    pub bond: WheelBond,
    /// Maximum peripheral speed printed on the wheel (m/s)
    pub max_speed_mps: f64,
    /// Typical application
    pub application: &'static str,
}

pub const GRINDING_WHEELS: &[GrindingWheel] = &[
    GrindingWheel {
        code: "A46K5V",
        abrasive: Abrasive::AluminiumOxide,
        grit: 46,
        grade: 'K',
        structure: 5,
        bond: WheelBond::Vitrified,
        max_speed_mps: 35.0,
        application: "Surface grinding of unhardened steel",
    },
    GrindingWheel {
        code: "A60K5V",
        abrasive: Abrasive::AluminiumOxide,
        grit: 60,
        grade: 'K',
        structure: 5,
        bond: WheelBond::Vitrified,
        max_speed_mps: 35.0,
        application: "General cylindrical grinding of steel",
    },
    GrindingWheel {
        code: "A80J6V",
        abrasive: Abrasive::AluminiumOxide,
        grit: 80,
        grade: 'J',
        structure: 6,
        bond: WheelBond::Vitrified,
        max_speed_mps: 50.0,
        application: "Finish grinding of hardened steel",
    },
    GrindingWheel {
        code: "C60J5V",
        abrasive: Abrasive::SiliconCarbide,
        grit: 60,
        grade: 'J',
        structure: 5,
        bond: WheelBond::Vitrified,
        max_speed_mps: 35.0,
        application: "Cast iron and non-ferrous metals",
    },
    GrindingWheel {
        code: "C80H7V",
        abrasive: Abrasive::SiliconCarbide,
        grit: 80,
        grade: 'H',
        structure: 7,
        bond: WheelBond::Vitrified,
        max_speed_mps: 35.0,
        application: "Carbide tool roughing",
    },
    GrindingWheel {
        code: "B126R75B",
        abrasive: Abrasive::Cbn,
        grit: 126,
        grade: 'R',
        structure: 7,
        bond: WheelBond::Resinoid,
        max_speed_mps: 63.0,
        application: "HSS and hardened tool steel",
    },
    GrindingWheel {
        code: "D91C75M",
        abrasive: Abrasive::Diamond,
        grit: 91,
        grade: 'C',
        structure: 7,
        bond: WheelBond::Metal,
        max_speed_mps: 80.0,
        application: "Carbide and ceramic finishing",
    },
];

/// Find a wheel by its code (case-insensitive).
pub fn find_wheel(code: &str) -> CalcResult<&'static GrindingWheel> {
    let wanted = code.trim().replace(' ', "");
    GRINDING_WHEELS
        .iter()
        .find(|w| w.code.eq_ignore_ascii_case(&wanted))
        .ok_or_else(|| CalcError::not_found("Grinding wheel", code))
}
