//! # Grinding
//!
//! Surface/cylindrical plunge grinding kinematics.
//!
//! - Wheel peripheral speed: vs = π·ds·ns / 60000 (m/s)
//! - Speed ratio: q = vs·60 / vw
//! - Removal rate: Q = ae·vw·1000·b (mm³/min)
//! - Specific removal rate: Q′w = ae·vw·1000 / 60 (mm³/(mm·s))
//! - Equivalent chip thickness: heq = ae·vw / (vs·60) (mm)

use serde::{Deserialize, Serialize};

use super::require_positive;
use crate::errors::CalcResult;
use crate::materials::grinding_wheels::find_wheel;
use crate::units::{MetersPerMinute, MetersPerSecond};

/// Input parameters for a grinding pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrindingInput {
    pub label: String,
    pub wheel_diameter_mm: f64,
    pub wheel_rpm: f64,
    /// Workpiece (or table) speed vw
    pub workpiece_speed_m_min: f64,
    /// Depth of cut ae
    pub depth_of_cut_mm: f64,
    /// Contact width b
    pub grinding_width_mm: f64,
    /// Stocked wheel code, used for the overspeed check
    #[serde(default)]
    pub wheel_code: Option<String>,
    /// Explicit wheel speed limit when no code is given (m/s)
    #[serde(default)]
    pub max_wheel_speed_mps: Option<f64>,
}

impl GrindingInput {
    pub fn validate(&self) -> CalcResult<()> {
        require_positive("wheel_diameter_mm", self.wheel_diameter_mm)?;
        require_positive("wheel_rpm", self.wheel_rpm)?;
        require_positive("workpiece_speed_m_min", self.workpiece_speed_m_min)?;
        require_positive("depth_of_cut_mm", self.depth_of_cut_mm)?;
        require_positive("grinding_width_mm", self.grinding_width_mm)?;
        Ok(())
    }

    fn speed_limit(&self) -> CalcResult<Option<f64>> {
        match self.wheel_code.as_deref().filter(|c| !c.trim().is_empty()) {
            Some(code) => Ok(Some(find_wheel(code)?.max_speed_mps)),
            None => Ok(self.max_wheel_speed_mps),
        }
    }
}

/// Results for a grinding pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrindingResult {
    pub wheel_speed_mps: f64,
    pub speed_ratio_q: f64,
    pub mrr_mm3_min: f64,
    pub specific_mrr_mm3_mm_s: f64,
    pub equivalent_chip_thickness_um: f64,
    pub max_wheel_speed_mps: Option<f64>,
    /// Highest spindle speed allowed by the wheel limit
    pub max_wheel_rpm: Option<f64>,
    pub overspeed: bool,
}

impl GrindingResult {
    pub fn passes(&self) -> bool {
        !self.overspeed
    }
}

/// Calculate grinding kinematics.
pub fn calculate(input: &GrindingInput) -> CalcResult<GrindingResult> {
    input.validate()?;

    let vs = MetersPerSecond(std::f64::consts::PI * input.wheel_diameter_mm * input.wheel_rpm / 60_000.0);
    let vs_per_min: MetersPerMinute = vs.into();
    let vw = input.workpiece_speed_m_min;
    let ae = input.depth_of_cut_mm;

    let limit = input.speed_limit()?;
    let max_rpm = limit.map(|v| v * 60_000.0 / (std::f64::consts::PI * input.wheel_diameter_mm));

    Ok(GrindingResult {
        wheel_speed_mps: vs.0,
        speed_ratio_q: vs_per_min.0 / vw,
        mrr_mm3_min: ae * vw * 1000.0 * input.grinding_width_mm,
        specific_mrr_mm3_mm_s: ae * vw * 1000.0 / 60.0,
        equivalent_chip_thickness_um: ae * vw / vs_per_min.0 * 1000.0,
        max_wheel_speed_mps: limit,
        max_wheel_rpm: max_rpm,
        overspeed: limit.is_some_and(|v| vs.0 > v),
    })
}
