//! # Tool Life (Taylor Equation)
//!
//! Taylor's empirical wear model V·Tⁿ = C relates cutting speed V (m/min)
//! to tool life T (min). From it follow:
//!
//! - Tool life at a speed: T = (C/V)^(1/n)
//! - Speed for a target life: V = C / Tⁿ
//! - Minimum-cost tool life: Tₑ = (1/n − 1)·(t_ct + C_t/C_m)
//! - Maximum-production tool life: Tₚ = (1/n − 1)·t_ct
//!
//! where t_ct is the tool change time, C_t the cost of one cutting edge and
//! C_m the machine-and-operator cost per minute.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::tool_life::taylor_tool_life;
//!
//! let minutes = taylor_tool_life(300.0, 0.25, 150.0);
//! assert!((minutes - 16.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};

use super::require_positive;
use crate::errors::{CalcError, CalcResult};
use crate::materials::{Material, ToolMaterial};

/// Tool life T = (C/V)^(1/n) in minutes. Returns 0 for non-positive inputs.
pub fn taylor_tool_life(c: f64, n: f64, v: f64) -> f64 {
    if c <= 0.0 || n <= 0.0 || v <= 0.0 {
        return 0.0;
    }
    (c / v).powf(1.0 / n)
}

/// Cutting speed V = C / Tⁿ that yields a tool life of `t` minutes.
pub fn taylor_speed_for_life(c: f64, n: f64, t: f64) -> f64 {
    if c <= 0.0 || n <= 0.0 || t <= 0.0 {
        return 0.0;
    }
    c / t.powf(n)
}

/// Input parameters for a tool life estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolLifeInput {
    pub label: String,
    /// Material name for history (constants are given explicitly)
    #[serde(default)]
    pub material: Option<String>,
    pub taylor_c: f64,
    pub taylor_n: f64,
    pub cutting_speed_m_min: f64,
    /// Desired tool life for the inverse calculation (min)
    #[serde(default)]
    pub target_life_min: Option<f64>,
    /// Time in cut per part (min), for parts-per-edge
    #[serde(default)]
    pub cutting_time_per_part_min: Option<f64>,
    /// Time to change an edge (min)
    #[serde(default)]
    pub tool_change_time_min: f64,
    /// Cost of one cutting edge
    #[serde(default)]
    pub tool_cost_per_edge: f64,
    /// Machine plus operator cost per minute
    #[serde(default)]
    pub machine_cost_per_min: f64,
}

impl ToolLifeInput {
    /// Build an input from a catalog material and tool material.
    pub fn from_material(label: impl Into<String>, material: &Material, tool: ToolMaterial, cutting_speed_m_min: f64) -> Self {
        ToolLifeInput {
            label: label.into(),
            material: Some(material.name.clone()),
            taylor_c: material.taylor_c_for(tool),
            taylor_n: material.taylor_n,
            cutting_speed_m_min,
            target_life_min: None,
            cutting_time_per_part_min: None,
            tool_change_time_min: 0.0,
            tool_cost_per_edge: 0.0,
            machine_cost_per_min: 0.0,
        }
    }

    pub fn validate(&self) -> CalcResult<()> {
        require_positive("taylor_c", self.taylor_c)?;
        require_positive("cutting_speed_m_min", self.cutting_speed_m_min)?;
        if self.taylor_n <= 0.0 || self.taylor_n >= 1.0 {
            return Err(CalcError::invalid_input(
                "taylor_n",
                self.taylor_n.to_string(),
                "Taylor exponent must be between 0 and 1",
            ));
        }
        if let Some(t) = self.target_life_min {
            require_positive("target_life_min", t)?;
        }
        if let Some(t) = self.cutting_time_per_part_min {
            require_positive("cutting_time_per_part_min", t)?;
        }
        if self.tool_change_time_min < 0.0 || self.tool_cost_per_edge < 0.0 || self.machine_cost_per_min < 0.0 {
            return Err(CalcError::invalid_input(
                "tool_change_time_min",
                format!(
                    "t_ct={} C_t={} C_m={}",
                    self.tool_change_time_min, self.tool_cost_per_edge, self.machine_cost_per_min
                ),
                "Times and costs cannot be negative",
            ));
        }
        Ok(())
    }
}

/// Results of a tool life estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolLifeResult {
    pub tool_life_min: f64,
    /// Parts machined before the edge is worn
    pub parts_per_edge: Option<f64>,
    /// Speed that gives `target_life_min`
    pub speed_for_target_life_m_min: Option<f64>,
    /// Tool life minimising cost per part
    pub economic_tool_life_min: Option<f64>,
    pub economic_cutting_speed_m_min: Option<f64>,
    /// Tool life maximising output
    pub max_production_tool_life_min: Option<f64>,
    pub max_production_speed_m_min: Option<f64>,
}

/// Calculate tool life and the derived optimum speeds.
pub fn calculate(input: &ToolLifeInput) -> CalcResult<ToolLifeResult> {
    input.validate()?;

    let c = input.taylor_c;
    let n = input.taylor_n;
    let life = taylor_tool_life(c, n, input.cutting_speed_m_min);
    let life_factor = 1.0 / n - 1.0;

    let economic_life = (input.machine_cost_per_min > 0.0)
        .then(|| life_factor * (input.tool_change_time_min + input.tool_cost_per_edge / input.machine_cost_per_min))
        .filter(|t| *t > 0.0);
    let max_production_life = (input.tool_change_time_min > 0.0).then(|| life_factor * input.tool_change_time_min);

    Ok(ToolLifeResult {
        tool_life_min: life,
        parts_per_edge: input.cutting_time_per_part_min.map(|t| (life / t).floor()),
        speed_for_target_life_m_min: input.target_life_min.map(|t| taylor_speed_for_life(c, n, t)),
        economic_tool_life_min: economic_life,
        economic_cutting_speed_m_min: economic_life.map(|t| taylor_speed_for_life(c, n, t)),
        max_production_tool_life_min: max_production_life,
        max_production_speed_m_min: max_production_life.map(|t| taylor_speed_for_life(c, n, t)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::MaterialLibrary;

    fn reference_input() -> ToolLifeInput {
        ToolLifeInput {
            label: "Insert life".to_string(),
            material: None,
            taylor_c: 300.0,
            taylor_n: 0.25,
            cutting_speed_m_min: 150.0,
            target_life_min: None,
            cutting_time_per_part_min: None,
            tool_change_time_min: 0.0,
            tool_cost_per_edge: 0.0,
            machine_cost_per_min: 0.0,
        }
    }

    #[test]
    fn test_reference_tool_life() {
        // (300/150)^(1/0.25) = 2^4 = 16 min
        let result = calculate(&reference_input()).unwrap();
        assert!((result.tool_life_min - 16.0).abs() < 1e-9);
        assert!(result.economic_tool_life_min.is_none());
        assert!(result.max_production_tool_life_min.is_none());
    }

    #[test]
    fn test_speed_for_target_life_inverts_life() {
        let mut input = reference_input();
        input.target_life_min = Some(16.0);
        let result = calculate(&input).unwrap();
        assert!((result.speed_for_target_life_m_min.unwrap() - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_higher_speed_shortens_life() {
        let slow = taylor_tool_life(300.0, 0.25, 120.0);
        let fast = taylor_tool_life(300.0, 0.25, 180.0);
        assert!(fast < slow);
    }

    #[test]
    fn test_parts_per_edge() {
        let mut input = reference_input();
        input.cutting_time_per_part_min = Some(1.5);
        let result = calculate(&input).unwrap();
        // 16 / 1.5 = 10.67 -> 10 full parts
        assert_eq!(result.parts_per_edge, Some(10.0));
    }

    #[test]
    fn test_economic_and_max_production_life() {
        let mut input = reference_input();
        input.tool_change_time_min = 2.0;
        input.tool_cost_per_edge = 60.0;
        input.machine_cost_per_min = 10.0;
        let result = calculate(&input).unwrap();
        // (1/0.25 - 1) * (2 + 6) = 24 min
        assert!((result.economic_tool_life_min.unwrap() - 24.0).abs() < 1e-9);
        // (1/0.25 - 1) * 2 = 6 min
        assert!((result.max_production_tool_life_min.unwrap() - 6.0).abs() < 1e-9);
        // faster speed for shorter life
        assert!(result.max_production_speed_m_min.unwrap() > result.economic_cutting_speed_m_min.unwrap());
    }

    #[test]
    fn test_from_material() {
        let material = MaterialLibrary::default().find("42CrMo4").unwrap();
        let input = ToolLifeInput::from_material("42CrMo4 rough", &material, ToolMaterial::Carbide, 150.0);
        let result = calculate(&input).unwrap();
        assert!((result.tool_life_min - 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_exponent() {
        let mut input = reference_input();
        input.taylor_n = 1.0;
        assert!(calculate(&input).is_err());
        assert_eq!(taylor_tool_life(300.0, 0.25, 0.0), 0.0);
    }
}
