//! # Cutting Parameters (Turning and Milling)
//!
//! Derives spindle speed, table feed, material removal rate, cutting power,
//! spindle torque, cutting time and (for turning) theoretical surface
//! roughness from a material, a tool and the chosen cut.
//!
//! ## Formulas
//!
//! - Spindle speed: n = 1000·Vc / (π·D)
//! - Table feed: Vf = f·n (turning), Vf = fz·z·n (milling)
//! - MRR: Q = Vc·ap·f (turning), Q = ap·ae·Vf / 1000 (milling), cm³/min
//! - Specific cutting force: kc = kc1·h^(-mc), mc = 0.25
//! - Net power: Pc = Q·kc / 60000 kW; spindle power = Pc / η
//! - Theoretical roughness: Ra = f² / (32·rε) · 1000 µm
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::cutting::{calculate, CuttingInput, Operation};
//! use calc_core::materials::MaterialLibrary;
//!
//! let material = MaterialLibrary::default().find("C45").unwrap();
//! let mut input = CuttingInput::milling("Face mill", "C45", 20.0, 0.1, 4);
//! input.cutting_speed_m_min = Some(180.0);
//! input.depth_of_cut_mm = 2.0;
//! input.width_of_cut_mm = 10.0;
//!
//! let result = calculate(&input, &material).unwrap();
//! assert_eq!(result.spindle_speed_rpm.round(), 2865.0);
//! ```

use serde::{Deserialize, Serialize};

use super::require_positive;
use crate::errors::{CalcError, CalcResult};
use crate::machines::Machine;
use crate::materials::{Material, ToolMaterial};
use crate::units::{self, Kilowatts, Millimeters, MetersPerMinute, MmPerMin, Rpm};

/// Chip thickness exponent for the kc correction
const KC_EXPONENT: f64 = 0.25;

/// Default spindle efficiency
const DEFAULT_EFFICIENCY: f64 = 0.8;

/// Machining operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Operation {
    #[default]
    Turning,
    Milling,
}

/// Input parameters for a turning or milling cut.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CuttingInput {
    pub label: String,
    pub operation: Operation,
    /// Workpiece material name (catalog or custom)
    pub material: String,
    #[serde(default)]
    pub tool_material: ToolMaterial,
    /// Workpiece diameter (turning) or cutter diameter (milling)
    pub diameter_mm: f64,
    /// Cutting speed; `None` uses the material recommendation
    #[serde(default)]
    pub cutting_speed_m_min: Option<f64>,
    /// mm/rev for turning, mm/tooth for milling
    pub feed: f64,
    /// Number of cutting edges (milling)
    #[serde(default = "default_teeth")]
    pub teeth: u32,
    /// Axial depth of cut ap
    #[serde(default)]
    pub depth_of_cut_mm: f64,
    /// Radial width of cut ae (milling)
    #[serde(default)]
    pub width_of_cut_mm: f64,
    /// Length of the cut along the feed direction
    #[serde(default)]
    pub cut_length_mm: f64,
    /// Insert nose radius (turning)
    #[serde(default)]
    pub nose_radius_mm: f64,
    /// Spindle drive efficiency (0..1]
    #[serde(default = "default_efficiency")]
    pub efficiency: f64,
    /// Machine code to check spindle limits against
    #[serde(default)]
    pub machine: Option<String>,
}

fn default_teeth() -> u32 {
    1
}

fn default_efficiency() -> f64 {
    DEFAULT_EFFICIENCY
}

impl CuttingInput {
    /// A turning pass with default efficiency and no depth/length set.
    pub fn turning(label: impl Into<String>, material: impl Into<String>, diameter_mm: f64, feed_mm_rev: f64) -> Self {
        CuttingInput {
            label: label.into(),
            operation: Operation::Turning,
            material: material.into(),
            tool_material: ToolMaterial::default(),
            diameter_mm,
            cutting_speed_m_min: None,
            feed: feed_mm_rev,
            teeth: 1,
            depth_of_cut_mm: 0.0,
            width_of_cut_mm: 0.0,
            cut_length_mm: 0.0,
            nose_radius_mm: 0.8,
            efficiency: DEFAULT_EFFICIENCY,
            machine: None,
        }
    }

    /// A milling pass with default efficiency and no depth/length set.
    pub fn milling(
        label: impl Into<String>,
        material: impl Into<String>,
        cutter_diameter_mm: f64,
        feed_per_tooth_mm: f64,
        teeth: u32,
    ) -> Self {
        CuttingInput {
            operation: Operation::Milling,
            teeth,
            nose_radius_mm: 0.0,
            ..CuttingInput::turning(label, material, cutter_diameter_mm, feed_per_tooth_mm)
        }
    }

    pub fn validate(&self) -> CalcResult<()> {
        require_positive("diameter_mm", self.diameter_mm)?;
        require_positive("feed", self.feed)?;
        if let Some(vc) = self.cutting_speed_m_min {
            require_positive("cutting_speed_m_min", vc)?;
        }
        if self.operation == Operation::Milling && self.teeth == 0 {
            return Err(CalcError::invalid_input("teeth", "0", "A milling cutter needs at least one tooth"));
        }
        if self.depth_of_cut_mm < 0.0 || self.width_of_cut_mm < 0.0 || self.cut_length_mm < 0.0 {
            return Err(CalcError::invalid_input(
                "depth_of_cut_mm",
                format!("ap={} ae={} L={}", self.depth_of_cut_mm, self.width_of_cut_mm, self.cut_length_mm),
                "Cut dimensions cannot be negative",
            ));
        }
        if self.width_of_cut_mm > self.diameter_mm && self.operation == Operation::Milling {
            return Err(CalcError::invalid_input(
                "width_of_cut_mm",
                self.width_of_cut_mm.to_string(),
                "Width of cut exceeds cutter diameter",
            ));
        }
        if self.efficiency <= 0.0 || self.efficiency > 1.0 {
            return Err(CalcError::invalid_input(
                "efficiency",
                self.efficiency.to_string(),
                "Efficiency must be in (0, 1]",
            ));
        }
        Ok(())
    }
}

/// Results for a turning or milling cut.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CuttingResult {
    /// Cutting speed actually used (m/min)
    pub cutting_speed_m_min: f64,
    /// Whether that speed lies in the material's recommended range
    pub speed_in_range: bool,
    pub spindle_speed_rpm: f64,
    /// Table feed Vf (mm/min)
    pub feed_rate_mm_min: f64,
    /// Material removal rate (cm³/min)
    pub mrr_cm3_min: f64,
    /// Corrected specific cutting force (N/mm²)
    pub specific_cutting_force: f64,
    /// Net cutting power (kW)
    pub cutting_power_kw: f64,
    /// Power drawn at the spindle motor (kW)
    pub spindle_power_kw: f64,
    pub torque_nm: f64,
    /// Time for `cut_length_mm` at Vf (min)
    pub cutting_time_min: f64,
    /// Theoretical Ra for turning with a nose radius (µm)
    pub surface_roughness_ra_um: Option<f64>,
}

/// Calculate cutting parameters for a material.
pub fn calculate(input: &CuttingInput, material: &Material) -> CalcResult<CuttingResult> {
    input.validate()?;

    let vc = input
        .cutting_speed_m_min
        .unwrap_or_else(|| material.recommended_cutting_speed(input.tool_material));
    let diameter = Millimeters(input.diameter_mm);
    let n = units::spindle_speed(MetersPerMinute(vc), diameter);

    let (vf, mrr, chip_thickness) = match input.operation {
        Operation::Turning => {
            let vf = units::table_feed(units::MmPerRev(input.feed), n);
            (vf, vc * input.depth_of_cut_mm * input.feed, input.feed)
        }
        Operation::Milling => {
            let vf = MmPerMin(input.feed * input.teeth as f64 * n.0);
            let mrr = input.depth_of_cut_mm * input.width_of_cut_mm * vf.0 / 1000.0;
            (vf, mrr, input.feed)
        }
    };

    let kc = material.kc1 * chip_thickness.powf(-KC_EXPONENT);
    let cutting_power = Kilowatts(mrr * kc / 60_000.0);
    let torque = units::spindle_torque(cutting_power, n);
    let time = units::traverse_time(Millimeters(input.cut_length_mm), vf);

    let ra = match input.operation {
        Operation::Turning if input.nose_radius_mm > 0.0 => {
            Some(input.feed.powi(2) / (32.0 * input.nose_radius_mm) * 1000.0)
        }
        _ => None,
    };

    Ok(CuttingResult {
        cutting_speed_m_min: vc,
        speed_in_range: material.speed_in_range(vc, input.tool_material),
        spindle_speed_rpm: n.0,
        feed_rate_mm_min: vf.0,
        mrr_cm3_min: mrr,
        specific_cutting_force: kc,
        cutting_power_kw: cutting_power.0,
        spindle_power_kw: cutting_power.0 / input.efficiency,
        torque_nm: torque.0,
        cutting_time_min: time.0,
        surface_roughness_ra_um: ra,
    })
}

/// How a cut fits on a specific machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineCheck {
    pub machine_code: String,
    pub requested_rpm: f64,
    /// Spindle speed after clamping to the machine's range
    pub effective_rpm: f64,
    pub rpm_limited: bool,
    /// Cutting speed at the effective spindle speed (m/min)
    pub effective_cutting_speed_m_min: f64,
    pub required_power_kw: f64,
    pub available_power_kw: f64,
    pub overloaded: bool,
}

impl MachineCheck {
    pub fn passes(&self) -> bool {
        !self.overloaded && self.effective_rpm > 0.0
    }
}

/// Check a cutting result against a machine's spindle limits.
///
/// When the spindle speed has to be reduced, power scales with the reduced
/// cutting speed at constant feed per revolution.
pub fn check_machine(input: &CuttingInput, result: &CuttingResult, machine: &Machine) -> MachineCheck {
    let effective = machine.clamp_rpm(result.spindle_speed_rpm);
    let ratio = if result.spindle_speed_rpm > 0.0 {
        effective / result.spindle_speed_rpm
    } else {
        0.0
    };
    let required = result.spindle_power_kw * ratio;
    MachineCheck {
        machine_code: machine.code.clone(),
        requested_rpm: result.spindle_speed_rpm,
        effective_rpm: effective,
        rpm_limited: (effective - result.spindle_speed_rpm).abs() > f64::EPSILON,
        effective_cutting_speed_m_min: units::cutting_speed(Rpm(effective), Millimeters(input.diameter_mm)).0,
        required_power_kw: required,
        available_power_kw: machine.power_kw,
        overloaded: !machine.can_deliver(required),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machines::MachineType;
    use crate::materials::MaterialLibrary;

    fn c45() -> Material {
        MaterialLibrary::default().find("C45").unwrap()
    }

    fn turning_pass() -> CuttingInput {
        let mut input = CuttingInput::turning("OD rough", "C45", 50.0, 0.25);
        input.cutting_speed_m_min = Some(200.0);
        input.depth_of_cut_mm = 2.0;
        input.cut_length_mm = 100.0;
        input
    }

    #[test]
    fn test_reference_spindle_speed() {
        let mut input = CuttingInput::milling("Slot", "C45", 20.0, 0.05, 4);
        input.cutting_speed_m_min = Some(180.0);
        let result = calculate(&input, &c45()).unwrap();
        assert!((result.spindle_speed_rpm - 2864.79).abs() < 0.1);
    }

    #[test]
    fn test_turning_mrr_and_power() {
        let result = calculate(&turning_pass(), &c45()).unwrap();
        // Q = 200 * 2 * 0.25 = 100 cm³/min
        assert!((result.mrr_cm3_min - 100.0).abs() < 1e-9);
        // kc = 1700 * 0.25^-0.25 = 2404.2
        assert!((result.specific_cutting_force - 2404.16).abs() < 0.1);
        // Pc = 100 * 2404.16 / 60000 = 4.007 kW
        assert!((result.cutting_power_kw - 4.007).abs() < 0.01);
        assert!((result.spindle_power_kw - 4.007 / 0.8).abs() < 0.01);
        // n = 1273.2, Vf = 318.3, t = 100/318.3
        assert!((result.feed_rate_mm_min - 318.31).abs() < 0.05);
        assert!((result.cutting_time_min - 0.3142).abs() < 0.001);
        // Ra = 0.0625 / 25.6 * 1000 = 2.44 µm
        assert!((result.surface_roughness_ra_um.unwrap() - 2.441).abs() < 0.01);
        assert!(result.speed_in_range);
    }

    #[test]
    fn test_milling_feed_rate() {
        let mut input = CuttingInput::milling("Pocket", "Al 6061-T6", 10.0, 0.05, 3);
        input.cutting_speed_m_min = Some(314.159_265);
        input.depth_of_cut_mm = 5.0;
        input.width_of_cut_mm = 5.0;
        let result = calculate(&input, &MaterialLibrary::default().find("Al 6061-T6").unwrap()).unwrap();
        // n = 10000 rpm, Vf = 0.05 * 3 * 10000 = 1500 mm/min
        assert!((result.spindle_speed_rpm - 10_000.0).abs() < 0.01);
        assert!((result.feed_rate_mm_min - 1500.0).abs() < 0.01);
        // Q = 5 * 5 * 1500 / 1000 = 37.5 cm³/min
        assert!((result.mrr_cm3_min - 37.5).abs() < 0.01);
        assert!(result.surface_roughness_ra_um.is_none());
    }

    #[test]
    fn test_recommended_speed_used_when_missing() {
        let mut input = turning_pass();
        input.cutting_speed_m_min = None;
        let result = calculate(&input, &c45()).unwrap();
        assert_eq!(result.cutting_speed_m_min, 200.0);
    }

    #[test]
    fn test_invalid_inputs() {
        let mut input = turning_pass();
        input.diameter_mm = 0.0;
        assert!(calculate(&input, &c45()).is_err());

        let mut input = CuttingInput::milling("Bad", "C45", 10.0, 0.05, 0);
        input.cutting_speed_m_min = Some(100.0);
        assert!(calculate(&input, &c45()).is_err());

        let mut input = turning_pass();
        input.efficiency = 0.0;
        assert!(calculate(&input, &c45()).is_err());
    }

    #[test]
    fn test_machine_check_clamps_rpm() {
        let mut input = CuttingInput::milling("Finish", "Al 6061-T6", 6.0, 0.03, 2);
        input.cutting_speed_m_min = Some(600.0);
        input.depth_of_cut_mm = 1.0;
        input.width_of_cut_mm = 3.0;
        let material = MaterialLibrary::default().find("Al 6061-T6").unwrap();
        let result = calculate(&input, &material).unwrap();
        let machine = Machine::new("M-01", "Mill", MachineType::Mill3Axis, 7.5, 100.0, 12_000.0);

        let check = check_machine(&input, &result, &machine);
        assert!(result.spindle_speed_rpm > 30_000.0);
        assert!(check.rpm_limited);
        assert_eq!(check.effective_rpm, 12_000.0);
        assert!(check.effective_cutting_speed_m_min < 600.0);
        assert!(check.passes());
    }

    #[test]
    fn test_machine_check_flags_overload() {
        let mut input = turning_pass();
        input.depth_of_cut_mm = 6.0;
        let result = calculate(&input, &c45()).unwrap();
        let machine = Machine::new("T-09", "Small lathe", MachineType::Lathe, 5.5, 50.0, 4000.0);
        let check = check_machine(&input, &result, &machine);
        assert!(!check.rpm_limited);
        assert!(check.overloaded);
        assert!(!check.passes());
    }

    #[test]
    fn test_input_serialization_defaults() {
        let json = r#"{"label":"x","operation":"Turning","material":"C45","diameter_mm":40.0,"feed":0.2}"#;
        let input: CuttingInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.teeth, 1);
        assert_eq!(input.efficiency, 0.8);
        assert!(input.cutting_speed_m_min.is_none());
    }
}
