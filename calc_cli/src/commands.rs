//! Building calculator inputs from command arguments.

use chrono::{Duration, Local, NaiveDate};

use calc_core::calculations::cost::Blank;
use calc_core::calculations::currency::{ForecastMethod, RatePoint};
use calc_core::calculations::cutting::Operation;
use calc_core::calculations::salary::{PayrollParameters, SalaryMode};
use calc_core::calculations::tolerance::ItGrade;
use calc_core::calculations::{
    CalculationItem, CostInput, CuttingInput, CurrencyInput, DrillingInput, GrindingInput, SalaryInput,
    ThreadingInput, ToleranceInput, ToolLifeInput,
};
use calc_core::materials::ToolMaterial;
use calc_core::units::coerce_number;
use calc_core::{CalcError, CalcResult, ShopData};

use crate::args::Args;

/// Calculator commands and their one-line usage.
pub const CALCULATORS: &[(&str, &str)] = &[
    ("cutting", "op=turning|milling material= d= f= [vc= z= ap= ae= length= r= tool= machine=]"),
    ("tool-life", "material= vc= [tool=] | c= n= vc=  [target= tpart= tct= ct= cm=]"),
    ("thread", "size=M12 | d= p= | d= tpi=  length= vc= [internal=1 passes=]"),
    ("drill", "material= d= depth= f= [vc= angle= holes= peck=]"),
    ("grind", "ds= ns= vw= ae= b= [wheel= vmax=]"),
    ("cost", "material= shape=bar|block d=|w= h= l= qty= cycle= [setup= rate= machine= tooling= overhead= margin=]"),
    ("salary", "amount= [mode=gross|net month= year= incentive=1]"),
    ("currency", "rates=36,1;36,4;... amount= [from= to= start=YYYY-MM-DD method=linear|ma:7|ses:0.3 horizon=]"),
    ("tolerance", "size= grade=IT7"),
];

/// Menu module that grants access to a command.
pub fn module_key(command: &str) -> &str {
    match command {
        "thread" => "threading",
        "drill" => "drilling",
        "grind" => "grinding",
        "chat" => "ai-chat",
        "export" => "history",
        other => other,
    }
}

fn tool_material(args: &Args, shop: &ShopData) -> CalcResult<ToolMaterial> {
    match args.text("tool") {
        Some(tool) => ToolMaterial::from_str_flexible(tool),
        None => Ok(shop.settings.default_tool_material),
    }
}

fn label(args: &Args, default: &str) -> String {
    args.text_or("label", default)
}

/// Build the calculation for a calculator command, or `None` when the
/// command is not a calculator.
pub fn build_item(command: &str, args: &Args, shop: &ShopData) -> CalcResult<Option<CalculationItem>> {
    let item = match command {
        "cutting" => CalculationItem::Cutting(cutting(args, shop)?),
        "tool-life" => CalculationItem::ToolLife(tool_life(args, shop)?),
        "thread" => CalculationItem::Threading(ThreadingInput {
            label: label(args, "Thread"),
            designation: args.text("size").map(str::to_string),
            major_diameter_mm: args.num("d", 0.0),
            pitch_mm: args.num("p", 0.0),
            tpi: args.opt_num("tpi"),
            internal: args.flag("internal"),
            thread_length_mm: args.num("length", 0.0),
            cutting_speed_m_min: args.num("vc", 0.0),
            passes: args.count("passes", 0),
        }),
        "drill" => {
            let mut input = DrillingInput::new(
                label(args, "Drilling"),
                args.text_or("material", ""),
                args.num("d", 0.0),
                args.num("depth", 0.0),
                args.num("f", 0.0),
            );
            input.cutting_speed_m_min = args.opt_num("vc");
            input.point_angle_deg = args.num("angle", input.point_angle_deg);
            input.holes = args.count("holes", 1);
            input.peck_depth_mm = args.opt_num("peck");
            CalculationItem::Drilling(input)
        }
        "grind" => CalculationItem::Grinding(GrindingInput {
            label: label(args, "Grinding"),
            wheel_diameter_mm: args.num("ds", 0.0),
            wheel_rpm: args.num("ns", 0.0),
            workpiece_speed_m_min: args.num("vw", 0.0),
            depth_of_cut_mm: args.num("ae", 0.0),
            grinding_width_mm: args.num("b", 0.0),
            wheel_code: args.text("wheel").map(str::to_string),
            max_wheel_speed_mps: args.opt_num("vmax"),
        }),
        "cost" => CalculationItem::Cost(cost(args)?),
        "salary" => CalculationItem::Salary(salary(args, shop)?),
        "currency" => CalculationItem::Currency(currency(args)?),
        "tolerance" => CalculationItem::Tolerance(ToleranceInput {
            label: label(args, "Tolerance"),
            nominal_size_mm: args.num("size", 0.0),
            grade: ItGrade::from_str_flexible(&args.text_or("grade", "IT7"))?,
        }),
        _ => return Ok(None),
    };
    Ok(Some(item))
}

fn cutting(args: &Args, shop: &ShopData) -> CalcResult<CuttingInput> {
    let operation = match args.text_or("op", "turning").to_lowercase().as_str() {
        "turning" | "turn" | "lathe" => Operation::Turning,
        "milling" | "mill" => Operation::Milling,
        other => return Err(CalcError::invalid_input("op", other, "Use turning or milling")),
    };
    let material = args.text_or("material", "");
    let d = args.num("d", 0.0);
    let f = args.num("f", 0.0);
    let mut input = match operation {
        Operation::Turning => CuttingInput::turning(label(args, "Turning"), material, d, f),
        Operation::Milling => CuttingInput::milling(label(args, "Milling"), material, d, f, args.count("z", 4)),
    };
    input.tool_material = tool_material(args, shop)?;
    input.cutting_speed_m_min = args.opt_num("vc");
    input.depth_of_cut_mm = args.num("ap", 0.0);
    input.width_of_cut_mm = args.num("ae", 0.0);
    input.cut_length_mm = args.num("length", 0.0);
    input.nose_radius_mm = args.num("r", input.nose_radius_mm);
    input.efficiency = args.num("eff", input.efficiency);
    input.machine = args.text("machine").map(str::to_string);
    Ok(input)
}

fn tool_life(args: &Args, shop: &ShopData) -> CalcResult<ToolLifeInput> {
    let vc = args.num("vc", 0.0);
    let mut input = match args.text("material") {
        Some(name) if args.opt_num("c").is_none() => {
            let material = shop.materials.find(name)?;
            ToolLifeInput::from_material(label(args, "Tool life"), &material, tool_material(args, shop)?, vc)
        }
        material => ToolLifeInput {
            label: label(args, "Tool life"),
            material: material.map(str::to_string),
            taylor_c: args.num("c", 0.0),
            taylor_n: args.num("n", 0.0),
            cutting_speed_m_min: vc,
            target_life_min: None,
            cutting_time_per_part_min: None,
            tool_change_time_min: 0.0,
            tool_cost_per_edge: 0.0,
            machine_cost_per_min: 0.0,
        },
    };
    input.target_life_min = args.opt_num("target");
    input.cutting_time_per_part_min = args.opt_num("tpart");
    input.tool_change_time_min = args.num("tct", 0.0);
    input.tool_cost_per_edge = args.num("ct", 0.0);
    input.machine_cost_per_min = args.num("cm", 0.0);
    Ok(input)
}

fn cost(args: &Args) -> CalcResult<CostInput> {
    let blank = match args.text_or("shape", "bar").to_lowercase().as_str() {
        "bar" | "round" => Blank::RoundBar {
            diameter_mm: args.num("d", 0.0),
            length_mm: args.num("l", 0.0),
        },
        "block" | "plate" => Blank::Block {
            length_mm: args.num("l", 0.0),
            width_mm: args.num("w", 0.0),
            height_mm: args.num("h", 0.0),
        },
        other => return Err(CalcError::invalid_input("shape", other, "Use bar or block")),
    };
    Ok(CostInput {
        label: label(args, "Quote"),
        material: args.text_or("material", ""),
        blank,
        quantity: args.count("qty", 1),
        setup_time_min: args.num("setup", 0.0),
        cycle_time_min: args.num("cycle", 0.0),
        hourly_rate: args.num("rate", 0.0),
        machine: args.text("machine").map(str::to_string),
        tooling_cost_per_part: args.num("tooling", 0.0),
        overhead_percent: args.num("overhead", 0.0),
        margin_percent: args.num("margin", 0.0),
    })
}

fn salary(args: &Args, shop: &ShopData) -> CalcResult<SalaryInput> {
    let mode = match args.text_or("mode", "gross").to_lowercase().as_str() {
        "gross" | "brut" => SalaryMode::GrossToNet,
        "net" => SalaryMode::NetToGross,
        other => return Err(CalcError::invalid_input("mode", other, "Use gross or net")),
    };
    let year = args.count("year", u32::from(shop.settings.payroll_year));
    let year = u16::try_from(year).map_err(|_| CalcError::invalid_input("year", year.to_string(), "Year out of range"))?;
    Ok(SalaryInput {
        label: label(args, "Payroll"),
        amount: args.num("amount", 0.0),
        mode,
        month: args.count("month", 1).min(u32::from(u8::MAX)) as u8,
        cumulative_tax_base: args.opt_num("cumulative"),
        employer_incentive: args.text("incentive").is_none() || args.flag("incentive"),
        parameters: PayrollParameters::for_year(year)?,
    })
}

fn currency(args: &Args) -> CalcResult<CurrencyInput> {
    let rates: Vec<f64> = args.list("rates").iter().map(|r| coerce_number(r)).collect();
    let last_day = Local::now().date_naive();
    let start = match args.text("start") {
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map_err(|_| CalcError::invalid_input("start", text, "Use YYYY-MM-DD"))?,
        None => last_day - Duration::days(rates.len().saturating_sub(1) as i64),
    };
    let history = rates
        .iter()
        .enumerate()
        .map(|(i, rate)| RatePoint::new(start + Duration::days(i as i64), *rate))
        .collect();
    Ok(CurrencyInput {
        label: label(args, "Exchange"),
        from: args.text_or("from", "USD"),
        to: args.text_or("to", "TRY"),
        amount: args.num("amount", 1.0),
        history,
        method: ForecastMethod::from_str_flexible(&args.text_or("method", "linear"))?,
        horizon_days: args.count("horizon", 7),
    })
}

/// Headline figures per calculator: caption, JSON pointer, unit.
pub fn summary_fields(calc_type: &str) -> &'static [(&'static str, &'static str, &'static str)] {
    match calc_type {
        "Cutting" => &[
            ("Cutting speed", "/cutting_speed_m_min", "m/min"),
            ("Spindle speed", "/spindle_speed_rpm", "rpm"),
            ("Feed rate", "/feed_rate_mm_min", "mm/min"),
            ("MRR", "/mrr_cm3_min", "cm³/min"),
            ("Spindle power", "/spindle_power_kw", "kW"),
            ("Torque", "/torque_nm", "N·m"),
            ("Cutting time", "/cutting_time_min", "min"),
            ("Ra", "/surface_roughness_ra_um", "µm"),
            ("Machine rpm", "/machine_check/effective_rpm", "rpm"),
        ],
        "ToolLife" => &[
            ("Tool life", "/tool_life_min", "min"),
            ("Parts per edge", "/parts_per_edge", ""),
            ("Speed for target", "/speed_for_target_life_m_min", "m/min"),
            ("Economic speed", "/economic_cutting_speed_m_min", "m/min"),
            ("Max production speed", "/max_production_speed_m_min", "m/min"),
        ],
        "Threading" => &[
            ("Pitch", "/pitch_mm", "mm"),
            ("Pitch diameter", "/pitch_diameter_mm", "mm"),
            ("Thread depth", "/thread_depth_mm", "mm"),
            ("Tap drill", "/tap_drill_mm", "mm"),
            ("Passes", "/passes", ""),
            ("Spindle speed", "/spindle_speed_rpm", "rpm"),
            ("Threading time", "/threading_time_min", "min"),
        ],
        "Drilling" => &[
            ("Spindle speed", "/spindle_speed_rpm", "rpm"),
            ("Feed rate", "/feed_rate_mm_min", "mm/min"),
            ("Power", "/power_kw", "kW"),
            ("Torque", "/torque_nm", "N·m"),
            ("Thrust", "/thrust_force_n", "N"),
            ("Pecks", "/pecks", ""),
            ("Drilling time", "/drilling_time_min", "min"),
        ],
        "Grinding" => &[
            ("Wheel speed", "/wheel_speed_mps", "m/s"),
            ("Speed ratio q", "/speed_ratio_q", ""),
            ("Removal rate", "/mrr_mm3_min", "mm³/min"),
            ("Q'w", "/specific_mrr_mm3_mm_s", "mm³/(mm·s)"),
            ("Max wheel rpm", "/max_wheel_rpm", "rpm"),
            ("Overspeed", "/overspeed", ""),
        ],
        "Cost" => &[
            ("Blank mass", "/blank_mass_kg", "kg"),
            ("Material / part", "/material_cost_per_part", ""),
            ("Machine cost", "/machine_cost", ""),
            ("Total cost", "/total_cost", ""),
            ("Price / part", "/price_per_part", ""),
            ("Total price", "/total_price", ""),
        ],
        "Salary" => &[
            ("Gross", "/slip/gross", ""),
            ("SGK employee", "/slip/sgk_employee", ""),
            ("Income tax", "/slip/income_tax", ""),
            ("Stamp tax", "/slip/stamp_tax", ""),
            ("Net", "/slip/net", ""),
            ("Employer cost", "/slip/employer_cost", ""),
            ("Annual net", "/annual_net", ""),
        ],
        "Currency" => &[
            ("Rate", "/current_rate", ""),
            ("Converted", "/converted_amount", ""),
            ("Change", "/change_percent", "%"),
            ("Forecast rate", "/forecast_rate", ""),
            ("Trend", "/trend", ""),
        ],
        "Tolerance" => &[
            ("Tolerance", "/tolerance_um", "µm"),
            ("Hole H max", "/hole_h_max_mm", "mm"),
            ("Shaft h min", "/shaft_h_min_mm", "mm"),
        ],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Args {
        Args::parse(items.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_cutting_command_builds_and_evaluates() {
        let shop = ShopData::new("Test", "admin");
        let item = build_item("cutting", &args(&["material=C45", "d=20", "vc=180", "f=0,2"]), &shop)
            .unwrap()
            .unwrap();
        let result = shop.evaluate(&item).unwrap();
        assert!((result["spindle_speed_rpm"].as_f64().unwrap() - 2864.79).abs() < 0.01);
    }

    #[test]
    fn test_tool_life_from_constants() {
        let shop = ShopData::new("Test", "admin");
        let item = build_item("tool-life", &args(&["c=300", "n=0.25", "vc=150"]), &shop)
            .unwrap()
            .unwrap();
        let result = shop.evaluate(&item).unwrap();
        assert!((result["tool_life_min"].as_f64().unwrap() - 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_currency_dates_end_today() {
        let input = currency(&args(&["rates=36,1;36,4;36,9"])).unwrap();
        assert_eq!(input.history.len(), 3);
        assert_eq!(input.history[2].date, Local::now().date_naive());
        assert_eq!(input.history[0].rate, 36.1);
    }

    #[test]
    fn test_unknown_command_is_not_a_calculator() {
        assert!(build_item("machines", &args(&[]), &ShopData::new("Test", "admin")).unwrap().is_none());
    }

    #[test]
    fn test_every_calculator_has_summary() {
        let shop = ShopData::new("Test", "admin");
        for (command, _) in CALCULATORS {
            if let Ok(Some(item)) = build_item(command, &args(&[]), &shop) {
                assert!(!summary_fields(item.calc_type()).is_empty(), "{}", command);
            }
        }
    }
}
