//! # Cost Estimation
//!
//! Quotes a batch of machined parts from the raw blank, machine time,
//! tooling, overhead and margin.
//!
//! ```text
//! material  = blank volume × density × price/kg        (per part)
//! machine   = (setup + cycle × qty) / 60 × hourly rate  (batch)
//! tooling   = tooling per part × qty                    (batch)
//! cost      = (material × qty + machine + tooling) × (1 + overhead %)
//! price     = cost × (1 + margin %)
//! ```

use serde::{Deserialize, Serialize};

use super::require_positive;
use crate::errors::{CalcError, CalcResult};
use crate::machines::Machine;
use crate::materials::Material;

/// Raw stock shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape")]
pub enum Blank {
    RoundBar { diameter_mm: f64, length_mm: f64 },
    Block { length_mm: f64, width_mm: f64, height_mm: f64 },
}

impl Blank {
    /// Volume in cm³
    pub fn volume_cm3(&self) -> f64 {
        let mm3 = match *self {
            Blank::RoundBar { diameter_mm, length_mm } => std::f64::consts::PI * diameter_mm.powi(2) / 4.0 * length_mm,
            Blank::Block {
                length_mm,
                width_mm,
                height_mm,
            } => length_mm * width_mm * height_mm,
        };
        mm3 / 1000.0
    }

    fn validate(&self) -> CalcResult<()> {
        match *self {
            Blank::RoundBar { diameter_mm, length_mm } => {
                require_positive("diameter_mm", diameter_mm)?;
                require_positive("length_mm", length_mm)
            }
            Blank::Block {
                length_mm,
                width_mm,
                height_mm,
            } => {
                require_positive("length_mm", length_mm)?;
                require_positive("width_mm", width_mm)?;
                require_positive("height_mm", height_mm)
            }
        }
    }
}

/// Input parameters for a batch quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostInput {
    pub label: String,
    pub material: String,
    pub blank: Blank,
    pub quantity: u32,
    #[serde(default)]
    pub setup_time_min: f64,
    pub cycle_time_min: f64,
    /// Machine hourly rate; overridden by the machine when one is given
    #[serde(default)]
    pub hourly_rate: f64,
    /// Machine code for history and rate lookup
    #[serde(default)]
    pub machine: Option<String>,
    #[serde(default)]
    pub tooling_cost_per_part: f64,
    #[serde(default)]
    pub overhead_percent: f64,
    #[serde(default)]
    pub margin_percent: f64,
}

impl CostInput {
    pub fn validate(&self) -> CalcResult<()> {
        self.blank.validate()?;
        if self.quantity == 0 {
            return Err(CalcError::invalid_input("quantity", "0", "Quantity must be at least 1"));
        }
        require_positive("cycle_time_min", self.cycle_time_min)?;
        for (field, value) in [
            ("setup_time_min", self.setup_time_min),
            ("hourly_rate", self.hourly_rate),
            ("tooling_cost_per_part", self.tooling_cost_per_part),
            ("overhead_percent", self.overhead_percent),
            ("margin_percent", self.margin_percent),
        ] {
            if value < 0.0 {
                return Err(CalcError::invalid_input(field, value.to_string(), "Value cannot be negative"));
            }
        }
        Ok(())
    }
}

/// Batch quote breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostResult {
    pub blank_volume_cm3: f64,
    pub blank_mass_kg: f64,
    pub material_cost_per_part: f64,
    pub hourly_rate: f64,
    pub machine_time_min: f64,
    pub machine_cost: f64,
    pub tooling_cost: f64,
    pub overhead_cost: f64,
    pub total_cost: f64,
    pub cost_per_part: f64,
    pub total_price: f64,
    pub price_per_part: f64,
    pub profit: f64,
}

/// Calculate a batch quote. A given machine supplies the hourly rate.
pub fn calculate(input: &CostInput, material: &Material, machine: Option<&Machine>) -> CalcResult<CostResult> {
    input.validate()?;

    let qty = input.quantity as f64;
    let volume = input.blank.volume_cm3();
    let mass = volume * material.density / 1000.0;
    let material_per_part = mass * material.price_per_kg;

    let rate = machine.map(|m| m.hourly_rate).filter(|r| *r > 0.0).unwrap_or(input.hourly_rate);
    let machine_time = input.setup_time_min + input.cycle_time_min * qty;
    let machine_cost = machine_time / 60.0 * rate;
    let tooling = input.tooling_cost_per_part * qty;

    let subtotal = material_per_part * qty + machine_cost + tooling;
    let overhead = subtotal * input.overhead_percent / 100.0;
    let total_cost = subtotal + overhead;
    let total_price = total_cost * (1.0 + input.margin_percent / 100.0);

    Ok(CostResult {
        blank_volume_cm3: volume,
        blank_mass_kg: mass,
        material_cost_per_part: material_per_part,
        hourly_rate: rate,
        machine_time_min: machine_time,
        machine_cost,
        tooling_cost: tooling,
        overhead_cost: overhead,
        total_cost,
        cost_per_part: total_cost / qty,
        total_price,
        price_per_part: total_price / qty,
        profit: total_price - total_cost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machines::MachineType;
    use crate::materials::MaterialLibrary;

    fn quote() -> CostInput {
        CostInput {
            label: "Flange x50".to_string(),
            material: "Al 6061-T6".to_string(),
            blank: Blank::Block {
                length_mm: 100.0,
                width_mm: 50.0,
                height_mm: 20.0,
            },
            quantity: 50,
            setup_time_min: 60.0,
            cycle_time_min: 6.0,
            hourly_rate: 900.0,
            machine: None,
            tooling_cost_per_part: 4.0,
            overhead_percent: 10.0,
            margin_percent: 25.0,
        }
    }

    fn aluminium() -> Material {
        MaterialLibrary::default().find("Al 6061-T6").unwrap()
    }

    #[test]
    fn test_quote_breakdown() {
        let r = calculate(&quote(), &aluminium(), None).unwrap();
        // 100 cm³ × 2.70 g/cm³ = 0.27 kg × 150 = 40.5 per part
        assert!((r.blank_volume_cm3 - 100.0).abs() < 1e-9);
        assert!((r.blank_mass_kg - 0.27).abs() < 1e-9);
        assert!((r.material_cost_per_part - 40.5).abs() < 1e-9);
        // (60 + 300) / 60 × 900 = 5400
        assert!((r.machine_cost - 5400.0).abs() < 1e-9);
        assert!((r.tooling_cost - 200.0).abs() < 1e-9);
        // subtotal = 2025 + 5400 + 200 = 7625, +10 % = 8387.5
        assert!((r.total_cost - 8387.5).abs() < 1e-9);
        assert!((r.total_price - 10484.375).abs() < 1e-9);
        assert!((r.price_per_part - 209.6875).abs() < 1e-9);
        assert!((r.profit - 2096.875).abs() < 1e-9);
    }

    #[test]
    fn test_machine_rate_overrides_input() {
        let machine = Machine::new("M-01", "VMC", MachineType::Mill3Axis, 15.0, 100.0, 10_000.0).with_hourly_rate(1200.0);
        let r = calculate(&quote(), &aluminium(), Some(&machine)).unwrap();
        assert_eq!(r.hourly_rate, 1200.0);
        assert!((r.machine_cost - 7200.0).abs() < 1e-9);
    }

    #[test]
    fn test_round_bar_volume() {
        let bar = Blank::RoundBar {
            diameter_mm: 20.0,
            length_mm: 100.0,
        };
        assert!((bar.volume_cm3() - 31.4159).abs() < 1e-4);
    }

    #[test]
    fn test_validation() {
        let mut input = quote();
        input.quantity = 0;
        assert!(calculate(&input, &aluminium(), None).is_err());

        let mut input = quote();
        input.margin_percent = -5.0;
        assert!(calculate(&input, &aluminium(), None).is_err());
    }

    #[test]
    fn test_blank_json_shape_tag() {
        let json = r#"{"shape":"RoundBar","diameter_mm":30.0,"length_mm":50.0}"#;
        let blank: Blank = serde_json::from_str(json).unwrap();
        assert!(matches!(blank, Blank::RoundBar { .. }));
    }
}
