//! # ISO 286 Standard Tolerances
//!
//! Computes the IT grade tolerance for a nominal size from the standard
//! tolerance factor of its size step:
//!
//! - D ≤ 500 mm: i = 0.45·∛D + 0.001·D (µm)
//! - D > 500 mm: I = 0.004·D + 2.1 (µm)
//!
//! where D is the geometric mean of the size step limits. Values are the
//! unrounded formula results; the printed ISO 286-1 table rounds them.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// ISO 286 size steps (upper limits in mm, first step starts at 0).
const SIZE_STEPS: [f64; 21] = [
    3.0, 6.0, 10.0, 18.0, 30.0, 50.0, 80.0, 120.0, 180.0, 250.0, 315.0, 400.0, 500.0, 630.0, 800.0, 1000.0,
    1250.0, 1600.0, 2000.0, 2500.0, 3150.0,
];

/// IT grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItGrade {
    IT01,
    IT0,
    IT1,
    IT2,
    IT3,
    IT4,
    IT5,
    IT6,
    IT7,
    IT8,
    IT9,
    IT10,
    IT11,
    IT12,
    IT13,
    IT14,
    IT15,
    IT16,
    IT17,
    IT18,
}

impl ItGrade {
    /// Parse "IT7", "it 7", "7", "01".
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        let cleaned = s.to_uppercase().replace(' ', "");
        let number = cleaned.trim_start_matches("IT");
        let grade = match number {
            "01" => ItGrade::IT01,
            "0" => ItGrade::IT0,
            "1" => ItGrade::IT1,
            "2" => ItGrade::IT2,
            "3" => ItGrade::IT3,
            "4" => ItGrade::IT4,
            "5" => ItGrade::IT5,
            "6" => ItGrade::IT6,
            "7" => ItGrade::IT7,
            "8" => ItGrade::IT8,
            "9" => ItGrade::IT9,
            "10" => ItGrade::IT10,
            "11" => ItGrade::IT11,
            "12" => ItGrade::IT12,
            "13" => ItGrade::IT13,
            "14" => ItGrade::IT14,
            "15" => ItGrade::IT15,
            "16" => ItGrade::IT16,
            "17" => ItGrade::IT17,
            "18" => ItGrade::IT18,
            _ => return Err(CalcError::invalid_input("grade", s, "Unknown IT grade")),
        };
        Ok(grade)
    }

    /// Multiplier of the tolerance factor for IT5..IT18.
    fn multiplier(&self) -> Option<f64> {
        let m = match self {
            ItGrade::IT5 => 7.0,
            ItGrade::IT6 => 10.0,
            ItGrade::IT7 => 16.0,
            ItGrade::IT8 => 25.0,
            ItGrade::IT9 => 40.0,
            ItGrade::IT10 => 64.0,
            ItGrade::IT11 => 100.0,
            ItGrade::IT12 => 160.0,
            ItGrade::IT13 => 250.0,
            ItGrade::IT14 => 400.0,
            ItGrade::IT15 => 640.0,
            ItGrade::IT16 => 1000.0,
            ItGrade::IT17 => 1600.0,
            ItGrade::IT18 => 2500.0,
            _ => return None,
        };
        Some(m)
    }
}

impl std::fmt::Display for ItGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Input for a tolerance lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToleranceInput {
    pub label: String,
    pub nominal_size_mm: f64,
    pub grade: ItGrade,
}

/// Tolerance band and basic-hole/basic-shaft limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToleranceResult {
    /// Size step the nominal size falls into (lower exclusive, upper inclusive)
    pub size_step_mm: (f64, f64),
    /// Geometric mean D of the step
    pub geometric_mean_mm: f64,
    /// Standard tolerance factor i (or I above 500 mm), µm
    pub tolerance_factor_um: f64,
    pub tolerance_um: f64,
    /// Hole H: lower deviation 0, upper +IT
    pub hole_h_max_mm: f64,
    pub hole_h_min_mm: f64,
    /// Shaft h: upper deviation 0, lower −IT
    pub shaft_h_max_mm: f64,
    pub shaft_h_min_mm: f64,
}

/// Size step (lower, upper) containing a nominal size.
pub fn size_step(nominal_mm: f64) -> CalcResult<(f64, f64)> {
    if nominal_mm <= 0.0 || nominal_mm > 3150.0 {
        return Err(CalcError::invalid_input(
            "nominal_size_mm",
            nominal_mm.to_string(),
            "ISO 286 covers sizes above 0 up to 3150 mm",
        ));
    }
    let mut lower = 0.0;
    for upper in SIZE_STEPS {
        if nominal_mm <= upper {
            return Ok((lower, upper));
        }
        lower = upper;
    }
    Err(CalcError::Internal {
        message: format!("no ISO 286 size step for {} mm", nominal_mm),
    })
}

/// Standard tolerance in µm for a geometric mean size and grade.
pub fn standard_tolerance_um(d: f64, grade: ItGrade) -> CalcResult<f64> {
    if d <= 500.0 {
        let i = 0.45 * d.cbrt() + 0.001 * d;
        let it1 = 0.8 + 0.020 * d;
        let value = match grade {
            ItGrade::IT01 => 0.3 + 0.008 * d,
            ItGrade::IT0 => 0.5 + 0.012 * d,
            ItGrade::IT1 => it1,
            ItGrade::IT2 | ItGrade::IT3 | ItGrade::IT4 => {
                // Geometric series between IT1 and IT5
                let step = match grade {
                    ItGrade::IT2 => 1.0,
                    ItGrade::IT3 => 2.0,
                    _ => 3.0,
                };
                it1 * (7.0 * i / it1).powf(step / 4.0)
            }
            other => other.multiplier().unwrap_or(0.0) * i,
        };
        Ok(value)
    } else {
        let big_i = 0.004 * d + 2.1;
        let factor = match grade {
            ItGrade::IT01 | ItGrade::IT0 => {
                return Err(CalcError::invalid_input(
                    "grade",
                    grade.to_string(),
                    "IT01 and IT0 are not defined above 500 mm",
                ))
            }
            ItGrade::IT1 => 2.0,
            ItGrade::IT2 => 2.7,
            ItGrade::IT3 => 3.7,
            ItGrade::IT4 => 5.0,
            other => other.multiplier().unwrap_or(0.0),
        };
        Ok(factor * big_i)
    }
}

/// Calculate the IT tolerance band for a nominal size.
pub fn calculate(input: &ToleranceInput) -> CalcResult<ToleranceResult> {
    let (lower, upper) = size_step(input.nominal_size_mm)?;
    // The first step uses 1 mm as its lower bound for the mean.
    let d = (lower.max(1.0) * upper).sqrt();
    let factor = if d <= 500.0 {
        0.45 * d.cbrt() + 0.001 * d
    } else {
        0.004 * d + 2.1
    };
    let tolerance_um = standard_tolerance_um(d, input.grade)?;
    let tolerance_mm = tolerance_um / 1000.0;
    let nominal = input.nominal_size_mm;

    Ok(ToleranceResult {
        size_step_mm: (lower, upper),
        geometric_mean_mm: d,
        tolerance_factor_um: factor,
        tolerance_um,
        hole_h_max_mm: nominal + tolerance_mm,
        hole_h_min_mm: nominal,
        shaft_h_max_mm: nominal,
        shaft_h_min_mm: nominal - tolerance_mm,
    })
}
