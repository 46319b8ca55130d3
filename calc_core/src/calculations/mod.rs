//! # Machining Calculations
//!
//! Every calculator follows the same pattern:
//!
//! - `*Input` - Input parameters (JSON-serializable), with `validate()`
//! - `*Result` - Calculation results (JSON-serializable)
//! - `calculate(&input, ..) -> CalcResult<*Result>` - Pure calculation function
//!
//! ## Available Calculations
//!
//! - [`cutting`] - Turning and milling speeds, feeds, power
//! - [`tool_life`] - Taylor tool life and economic cutting speed
//! - [`threading`] - Thread geometry and infeed schedule
//! - [`drilling`] - Drilling speeds, power, thrust and cycle time
//! - [`grinding`] - Grinding kinematics and wheel overspeed check
//! - [`cost`] - Batch cost and price quote
//! - [`salary`] - Turkish payroll gross/net
//! - [`currency`] - Exchange rate conversion and forecast
//! - [`tolerance`] - ISO 286 IT tolerances

pub mod cost;
pub mod currency;
pub mod cutting;
pub mod drilling;
pub mod grinding;
pub mod salary;
pub mod threading;
pub mod tolerance;
pub mod tool_life;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{CalcError, CalcResult};
use crate::machines::Machine;
use crate::materials::MaterialLibrary;

pub use cost::{CostInput, CostResult};
pub use currency::{CurrencyInput, CurrencyResult};
pub use cutting::{CuttingInput, CuttingResult};
pub use drilling::{DrillingInput, DrillingResult};
pub use grinding::{GrindingInput, GrindingResult};
pub use salary::{SalaryInput, SalaryResult};
pub use threading::{ThreadingInput, ThreadingResult};
pub use tolerance::{ToleranceInput, ToleranceResult};
pub use tool_life::{ToolLifeInput, ToolLifeResult};

/// Reject zero, negative and non-finite values.
pub(crate) fn require_positive(field: &str, value: f64) -> CalcResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(CalcError::invalid_input(field, value.to_string(), "Must be greater than zero"))
    }
}

/// Enum wrapper for all calculation types.
///
/// This allows storing heterogeneous calculations in history while keeping
/// type safety and clean serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CalculationItem {
    Cutting(CuttingInput),
    ToolLife(ToolLifeInput),
    Threading(ThreadingInput),
    Drilling(DrillingInput),
    Grinding(GrindingInput),
    Cost(CostInput),
    Salary(SalaryInput),
    Currency(CurrencyInput),
    Tolerance(ToleranceInput),
}

impl CalculationItem {
    /// Get the user-provided label for this calculation
    pub fn label(&self) -> &str {
        match self {
            CalculationItem::Cutting(c) => &c.label,
            CalculationItem::ToolLife(c) => &c.label,
            CalculationItem::Threading(c) => &c.label,
            CalculationItem::Drilling(c) => &c.label,
            CalculationItem::Grinding(c) => &c.label,
            CalculationItem::Cost(c) => &c.label,
            CalculationItem::Salary(c) => &c.label,
            CalculationItem::Currency(c) => &c.label,
            CalculationItem::Tolerance(c) => &c.label,
        }
    }

    /// Get the calculation type as a string
    pub fn calc_type(&self) -> &'static str {
        match self {
            CalculationItem::Cutting(_) => "Cutting",
            CalculationItem::ToolLife(_) => "ToolLife",
            CalculationItem::Threading(_) => "Threading",
            CalculationItem::Drilling(_) => "Drilling",
            CalculationItem::Grinding(_) => "Grinding",
            CalculationItem::Cost(_) => "Cost",
            CalculationItem::Salary(_) => "Salary",
            CalculationItem::Currency(_) => "Currency",
            CalculationItem::Tolerance(_) => "Tolerance",
        }
    }

    /// Workpiece material named by the input, if any.
    pub fn material_label(&self) -> Option<&str> {
        match self {
            CalculationItem::Cutting(c) => Some(&c.material),
            CalculationItem::Drilling(c) => Some(&c.material),
            CalculationItem::Cost(c) => Some(&c.material),
            CalculationItem::ToolLife(c) => c.material.as_deref(),
            _ => None,
        }
    }

    /// Tool named by the input, if any.
    pub fn tool_label(&self) -> Option<String> {
        match self {
            CalculationItem::Cutting(c) => Some(c.tool_material.display_name().to_string()),
            CalculationItem::Drilling(c) => Some(format!("Twist drill Ø{} {}°", c.diameter_mm, c.point_angle_deg)),
            CalculationItem::Grinding(c) => c.wheel_code.clone(),
            _ => None,
        }
    }

    /// Machine code the input refers to, if any.
    pub fn machine_code(&self) -> Option<&str> {
        let code = match self {
            CalculationItem::Cutting(c) => c.machine.as_deref(),
            CalculationItem::Cost(c) => c.machine.as_deref(),
            _ => None,
        };
        code.filter(|code| !code.trim().is_empty())
    }

    /// Input fields as a flat key/value map (without the type tag).
    pub fn parameters(&self) -> CalcResult<BTreeMap<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map.into_iter().filter(|(key, _)| key != "type").collect()),
            other => Err(CalcError::serialization(format!("expected an object, got {}", other))),
        }
    }

    /// Run the calculation and return its result as JSON.
    ///
    /// Materials are resolved through `library`; a machine code on the input
    /// is resolved against `machines` by case-insensitive code.
    pub fn evaluate<'a>(
        &self,
        library: &MaterialLibrary,
        machines: impl IntoIterator<Item = &'a Machine>,
    ) -> CalcResult<Value> {
        let machine = match self.machine_code() {
            Some(code) => Some(
                machines
                    .into_iter()
                    .find(|m| m.code.eq_ignore_ascii_case(code.trim()))
                    .ok_or_else(|| CalcError::not_found("machine", code))?,
            ),
            None => None,
        };

        let value = match self {
            CalculationItem::Cutting(input) => {
                let material = library.find(&input.material)?;
                let result = cutting::calculate(input, &material)?;
                let mut value = serde_json::to_value(&result)?;
                if let (Some(machine), Value::Object(map)) = (machine, &mut value) {
                    let check = cutting::check_machine(input, &result, machine);
                    map.insert("machine_check".to_string(), serde_json::to_value(check)?);
                }
                value
            }
            CalculationItem::ToolLife(input) => serde_json::to_value(tool_life::calculate(input)?)?,
            CalculationItem::Threading(input) => serde_json::to_value(threading::calculate(input)?)?,
            CalculationItem::Drilling(input) => {
                let material = library.find(&input.material)?;
                serde_json::to_value(drilling::calculate(input, &material)?)?
            }
            CalculationItem::Grinding(input) => serde_json::to_value(grinding::calculate(input)?)?,
            CalculationItem::Cost(input) => {
                let material = library.find(&input.material)?;
                serde_json::to_value(cost::calculate(input, &material, machine)?)?
            }
            CalculationItem::Salary(input) => serde_json::to_value(salary::calculate(input)?)?,
            CalculationItem::Currency(input) => serde_json::to_value(currency::calculate(input)?)?,
            CalculationItem::Tolerance(input) => serde_json::to_value(tolerance::calculate(input)?)?,
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machines::MachineType;

    #[test]
    fn test_require_positive() {
        assert!(require_positive("d", 1.0).is_ok());
        assert!(require_positive("d", 0.0).is_err());
        assert!(require_positive("d", -3.0).is_err());
        assert!(require_positive("d", f64::NAN).is_err());
    }

    #[test]
    fn test_item_json_tag() {
        let item = CalculationItem::Cutting(CuttingInput::turning("OD", "C45", 40.0, 0.2));
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains(r#""type":"Cutting""#));
        let back: CalculationItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back.calc_type(), "Cutting");
        assert_eq!(back.label(), "OD");
        assert_eq!(back.material_label(), Some("C45"));
    }

    #[test]
    fn test_parameters_drop_type_tag() {
        let item = CalculationItem::Cutting(CuttingInput::turning("OD", "C45", 40.0, 0.2));
        let params = item.parameters().unwrap();
        assert!(!params.contains_key("type"));
        assert_eq!(params["diameter_mm"], serde_json::json!(40.0));
    }

    #[test]
    fn test_evaluate_with_machine_check() {
        let library = MaterialLibrary::default();
        let lathe = Machine::new("L-01", "CNC Lathe", MachineType::Lathe, 11.0, 50.0, 4000.0);
        let mut input = CuttingInput::turning("OD", "C45", 40.0, 0.2);
        input.depth_of_cut_mm = 2.0;
        input.machine = Some("l-01".to_string());
        let value = CalculationItem::Cutting(input).evaluate(&library, [&lathe]).unwrap();
        assert!(value["spindle_speed_rpm"].as_f64().unwrap() > 0.0);
        assert_eq!(value["machine_check"]["machine_code"], "L-01");
    }

    #[test]
    fn test_evaluate_unknown_machine_or_material() {
        let library = MaterialLibrary::default();
        let mut input = CuttingInput::turning("OD", "C45", 40.0, 0.2);
        input.machine = Some("X-99".to_string());
        let err = CalculationItem::Cutting(input).evaluate(&library, []).unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");

        let input = CuttingInput::turning("OD", "Unobtainium", 40.0, 0.2);
        let err = CalculationItem::Cutting(input).evaluate(&library, []).unwrap_err();
        assert_eq!(err.error_code(), "MATERIAL_NOT_FOUND");
    }
}
