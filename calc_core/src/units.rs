//! # Unit Types
//!
//! Type-safe wrappers for machining units. These are plain `f64` newtypes
//! that serialize as bare numbers, so JSON stays clean while the formula
//! helpers cannot mix up a diameter with a cutting speed.
//!
//! ## Metric Units (Primary)
//!
//! Shopfloor works in the units printed on ISO tooling catalogs:
//! - Length: millimeters (mm), meters (m)
//! - Cutting speed: meters per minute (m/min), wheel speed in m/s
//! - Spindle speed: revolutions per minute (rpm)
//! - Feed: mm per revolution (mm/rev), table feed in mm/min
//! - Power: kilowatts (kW); torque: newton-meters (N·m)
//!
//! Inch and SFM values from imperial drawings convert on the way in.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::units::{Inches, Millimeters, MetersPerMinute, SurfaceFeetPerMinute};
//!
//! let dia: Millimeters = Inches(0.5).into();
//! assert!((dia.0 - 12.7).abs() < 1e-9);
//!
//! let vc: MetersPerMinute = SurfaceFeetPerMinute(500.0).into();
//! assert!((vc.0 - 152.4).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

// ============================================================================
// Length Units
// ============================================================================

/// Length in millimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

/// Length in meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

/// Length in inches
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inches(pub f64);

impl From<Inches> for Millimeters {
    fn from(inches: Inches) -> Self {
        Millimeters(inches.0 * 25.4)
    }
}

impl From<Millimeters> for Inches {
    fn from(mm: Millimeters) -> Self {
        Inches(mm.0 / 25.4)
    }
}

impl From<Meters> for Millimeters {
    fn from(m: Meters) -> Self {
        Millimeters(m.0 * 1000.0)
    }
}

impl From<Millimeters> for Meters {
    fn from(mm: Millimeters) -> Self {
        Meters(mm.0 / 1000.0)
    }
}

// ============================================================================
// Speed Units
// ============================================================================

/// Cutting speed in meters per minute
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetersPerMinute(pub f64);

/// Peripheral speed in meters per second (grinding wheels)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetersPerSecond(pub f64);

/// Cutting speed in surface feet per minute
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceFeetPerMinute(pub f64);

/// Spindle speed in revolutions per minute
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rpm(pub f64);

impl From<SurfaceFeetPerMinute> for MetersPerMinute {
    fn from(sfm: SurfaceFeetPerMinute) -> Self {
        MetersPerMinute(sfm.0 * 0.3048)
    }
}

impl From<MetersPerMinute> for SurfaceFeetPerMinute {
    fn from(vc: MetersPerMinute) -> Self {
        SurfaceFeetPerMinute(vc.0 / 0.3048)
    }
}

impl From<MetersPerSecond> for MetersPerMinute {
    fn from(v: MetersPerSecond) -> Self {
        MetersPerMinute(v.0 * 60.0)
    }
}

impl From<MetersPerMinute> for MetersPerSecond {
    fn from(v: MetersPerMinute) -> Self {
        MetersPerSecond(v.0 / 60.0)
    }
}

// ============================================================================
// Feed Units
// ============================================================================

/// Feed per revolution in millimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MmPerRev(pub f64);

/// Table feed in millimeters per minute
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MmPerMin(pub f64);

// ============================================================================
// Power / Torque / Time
// ============================================================================

/// Power in kilowatts
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kilowatts(pub f64);

/// Power in mechanical horsepower
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Horsepower(pub f64);

impl From<Kilowatts> for Horsepower {
    fn from(kw: Kilowatts) -> Self {
        Horsepower(kw.0 / 0.745_699_872)
    }
}

impl From<Horsepower> for Kilowatts {
    fn from(hp: Horsepower) -> Self {
        Kilowatts(hp.0 * 0.745_699_872)
    }
}

/// Torque in newton-meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NewtonMeters(pub f64);

/// Duration in minutes
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Minutes(pub f64);

// ============================================================================
// Core machining relations
// ============================================================================

/// Spindle speed for a cutting speed at a diameter: n = 1000·Vc / (π·D).
///
/// Returns 0 rpm for a non-positive diameter.
pub fn spindle_speed(vc: MetersPerMinute, diameter: Millimeters) -> Rpm {
    if diameter.0 <= 0.0 {
        return Rpm(0.0);
    }
    Rpm(1000.0 * vc.0 / (std::f64::consts::PI * diameter.0))
}

/// Cutting speed produced by a spindle speed at a diameter: Vc = π·D·n / 1000.
pub fn cutting_speed(n: Rpm, diameter: Millimeters) -> MetersPerMinute {
    MetersPerMinute(std::f64::consts::PI * diameter.0 * n.0 / 1000.0)
}

/// Table feed from feed per revolution: Vf = f·n.
pub fn table_feed(f: MmPerRev, n: Rpm) -> MmPerMin {
    MmPerMin(f.0 * n.0)
}

/// Time to traverse a length at a table feed. Zero feed gives zero time.
pub fn traverse_time(length: Millimeters, vf: MmPerMin) -> Minutes {
    if vf.0 <= 0.0 {
        return Minutes(0.0);
    }
    Minutes(length.0 / vf.0)
}

/// Spindle torque from power and speed: M = 9549·P / n.
pub fn spindle_torque(power: Kilowatts, n: Rpm) -> NewtonMeters {
    if n.0 <= 0.0 {
        return NewtonMeters(0.0);
    }
    NewtonMeters(9549.296_6 * power.0 / n.0)
}

// ============================================================================
// Numeric input coercion
// ============================================================================

/// Parse a numeric form field, treating anything unusable as zero.
///
/// Accepts surrounding whitespace and a comma decimal separator
/// (`"12,5"` → 12.5). Empty, non-numeric, NaN and infinite input all give 0.
///
/// ```rust
/// use calc_core::units::coerce_number;
///
/// assert_eq!(coerce_number(" 180 "), 180.0);
/// assert_eq!(coerce_number("0,25"), 0.25);
/// assert_eq!(coerce_number("abc"), 0.0);
/// ```
pub fn coerce_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    let normalized = if trimmed.contains(',') && !trimmed.contains('.') {
        trimmed.replace(',', ".")
    } else {
        trimmed.replace(',', "")
    };
    match normalized.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }

            /// Create from raw f64 value
            pub fn new(value: f64) -> Self {
                Self(value)
            }
        }
    };
}

impl_arithmetic!(Millimeters);
impl_arithmetic!(Meters);
impl_arithmetic!(Inches);
impl_arithmetic!(MetersPerMinute);
impl_arithmetic!(MetersPerSecond);
impl_arithmetic!(SurfaceFeetPerMinute);
impl_arithmetic!(Rpm);
impl_arithmetic!(MmPerRev);
impl_arithmetic!(MmPerMin);
impl_arithmetic!(Kilowatts);
impl_arithmetic!(Horsepower);
impl_arithmetic!(NewtonMeters);
impl_arithmetic!(Minutes);
