//! # Drilling
//!
//! Spindle speed, feed, power, torque and thrust for twist drilling, plus
//! cycle time including the drill point and peck count for deep holes.
//!
//! ## Formulas
//!
//! - n = 1000·Vc / (π·D), Vf = f·n
//! - MRR = π·D²/4 · Vf / 1000 (cm³/min)
//! - Chip thickness hₘ = f/2·sin(κ), κ = σ/2; kc = kc1·hₘ^(-0.25)
//! - Net power Pc = f·Vc·D·kc / 240000 (kW)
//! - Torque M = Pc·30000 / (π·n) (N·m)
//! - Thrust F ≈ 0.5·kc·(D/2)·f·sin(κ) (N)
//! - Point length = D / (2·tan(σ/2))

use serde::{Deserialize, Serialize};

use super::require_positive;
use crate::errors::{CalcError, CalcResult};
use crate::materials::Material;
use crate::units::{self, Millimeters, MetersPerMinute, MmPerRev};

/// Holes deeper than this many diameters count as deep holes
const DEEP_HOLE_RATIO: f64 = 5.0;

/// Input parameters for a drilling operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrillingInput {
    pub label: String,
    pub material: String,
    pub diameter_mm: f64,
    /// Full-diameter hole depth
    pub depth_mm: f64,
    /// Cutting speed; `None` uses 80 % of the material's recommended turning speed
    #[serde(default)]
    pub cutting_speed_m_min: Option<f64>,
    pub feed_mm_rev: f64,
    /// Drill point angle σ in degrees
    #[serde(default = "default_point_angle")]
    pub point_angle_deg: f64,
    #[serde(default = "default_holes")]
    pub holes: u32,
    /// Peck step for deep holes; `None` drills in one go
    #[serde(default)]
    pub peck_depth_mm: Option<f64>,
}

fn default_point_angle() -> f64 {
    118.0
}

fn default_holes() -> u32 {
    1
}

impl DrillingInput {
    pub fn new(label: impl Into<String>, material: impl Into<String>, diameter_mm: f64, depth_mm: f64, feed_mm_rev: f64) -> Self {
        DrillingInput {
            label: label.into(),
            material: material.into(),
            diameter_mm,
            depth_mm,
            cutting_speed_m_min: None,
            feed_mm_rev,
            point_angle_deg: default_point_angle(),
            holes: 1,
            peck_depth_mm: None,
        }
    }

    pub fn validate(&self) -> CalcResult<()> {
        require_positive("diameter_mm", self.diameter_mm)?;
        require_positive("depth_mm", self.depth_mm)?;
        require_positive("feed_mm_rev", self.feed_mm_rev)?;
        if let Some(vc) = self.cutting_speed_m_min {
            require_positive("cutting_speed_m_min", vc)?;
        }
        if let Some(peck) = self.peck_depth_mm {
            require_positive("peck_depth_mm", peck)?;
        }
        if self.point_angle_deg <= 60.0 || self.point_angle_deg >= 180.0 {
            return Err(CalcError::invalid_input(
                "point_angle_deg",
                self.point_angle_deg.to_string(),
                "Point angle must be between 60° and 180°",
            ));
        }
        if self.holes == 0 {
            return Err(CalcError::invalid_input("holes", "0", "At least one hole is required"));
        }
        Ok(())
    }

    /// Axial length of the drill point cone.
    pub fn point_length_mm(&self) -> f64 {
        self.diameter_mm / (2.0 * (self.point_angle_deg.to_radians() / 2.0).tan())
    }
}

/// Results for a drilling operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrillingResult {
    pub cutting_speed_m_min: f64,
    pub spindle_speed_rpm: f64,
    pub feed_rate_mm_min: f64,
    pub mrr_cm3_min: f64,
    pub specific_cutting_force: f64,
    pub power_kw: f64,
    pub torque_nm: f64,
    pub thrust_force_n: f64,
    pub point_length_mm: f64,
    /// Depth-to-diameter ratio
    pub depth_ratio: f64,
    pub deep_hole: bool,
    /// Number of pecks per hole (1 without pecking)
    pub pecks: u32,
    /// Time in cut for all holes (min)
    pub drilling_time_min: f64,
}

/// Calculate drilling parameters.
pub fn calculate(input: &DrillingInput, material: &Material) -> CalcResult<DrillingResult> {
    input.validate()?;

    let d = input.diameter_mm;
    let f = input.feed_mm_rev;
    let vc = input
        .cutting_speed_m_min
        .unwrap_or_else(|| 0.8 * material.recommended_cutting_speed(Default::default()));
    let n = units::spindle_speed(MetersPerMinute(vc), Millimeters(d));
    let vf = units::table_feed(MmPerRev(f), n);

    let kappa = (input.point_angle_deg / 2.0).to_radians();
    let chip_thickness = f / 2.0 * kappa.sin();
    let kc = material.kc1 * chip_thickness.powf(-0.25);
    let power = f * vc * d * kc / 240_000.0;
    let torque = if n.0 > 0.0 { power * 30_000.0 / (std::f64::consts::PI * n.0) } else { 0.0 };
    let thrust = 0.5 * kc * (d / 2.0) * f * kappa.sin();

    let point = input.point_length_mm();
    let pecks = match input.peck_depth_mm {
        Some(step) => (input.depth_mm / step).ceil().max(1.0) as u32,
        None => 1,
    };
    let per_hole = units::traverse_time(Millimeters(input.depth_mm + point), vf);
    let depth_ratio = input.depth_mm / d;

    Ok(DrillingResult {
        cutting_speed_m_min: vc,
        spindle_speed_rpm: n.0,
        feed_rate_mm_min: vf.0,
        mrr_cm3_min: std::f64::consts::PI * d * d / 4.0 * vf.0 / 1000.0,
        specific_cutting_force: kc,
        power_kw: power,
        torque_nm: torque,
        thrust_force_n: thrust,
        point_length_mm: point,
        depth_ratio,
        deep_hole: depth_ratio > DEEP_HOLE_RATIO,
        pecks,
        drilling_time_min: per_hole.0 * input.holes as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::MaterialLibrary;

    fn c45() -> Material {
        MaterialLibrary::default().find("C45").unwrap()
    }

    fn ten_mm_hole() -> DrillingInput {
        let mut input = DrillingInput::new("Ø10 through", "C45", 10.0, 30.0, 0.2);
        input.cutting_speed_m_min = Some(80.0);
        input
    }

    #[test]
    fn test_speed_and_feed() {
        let r = calculate(&ten_mm_hole(), &c45()).unwrap();
        // n = 80000 / (π·10) = 2546.5, Vf = 509.3
        assert!((r.spindle_speed_rpm - 2546.48).abs() < 0.05);
        assert!((r.feed_rate_mm_min - 509.30).abs() < 0.05);
        // MRR = π·100/4 · 509.3 / 1000 = 40.0 cm³/min
        assert!((r.mrr_cm3_min - 40.0).abs() < 0.01);
    }

    #[test]
    fn test_power_torque_consistent() {
        let r = calculate(&ten_mm_hole(), &c45()).unwrap();
        // P = 2π·n·M / 60000 must reproduce the power
        let from_torque = 2.0 * std::f64::consts::PI * r.spindle_speed_rpm * r.torque_nm / 60_000.0;
        assert!((from_torque - r.power_kw).abs() < 1e-9);
        assert!(r.power_kw > 0.5 && r.power_kw < 3.0);
        assert!(r.thrust_force_n > 0.0);
    }

    #[test]
    fn test_point_length_and_time() {
        let r = calculate(&ten_mm_hole(), &c45()).unwrap();
        // 10 / (2·tan 59°) = 3.004 mm
        assert!((r.point_length_mm - 3.004).abs() < 0.001);
        let expected = (30.0 + r.point_length_mm) / r.feed_rate_mm_min;
        assert!((r.drilling_time_min - expected).abs() < 1e-12);
        assert!(!r.deep_hole);
        assert_eq!(r.pecks, 1);
    }

    #[test]
    fn test_deep_hole_pecking() {
        let mut input = ten_mm_hole();
        input.depth_mm = 80.0;
        input.peck_depth_mm = Some(15.0);
        input.holes = 4;
        let r = calculate(&input, &c45()).unwrap();
        assert!(r.deep_hole);
        assert_eq!(r.pecks, 6);
        let single = (80.0 + r.point_length_mm) / r.feed_rate_mm_min;
        assert!((r.drilling_time_min - 4.0 * single).abs() < 1e-9);
    }

    #[test]
    fn test_default_speed_from_material() {
        let mut input = ten_mm_hole();
        input.cutting_speed_m_min = None;
        let r = calculate(&input, &c45()).unwrap();
        assert!((r.cutting_speed_m_min - 160.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_point_angle() {
        let mut input = ten_mm_hole();
        input.point_angle_deg = 200.0;
        assert!(calculate(&input, &c45()).is_err());
    }
}
