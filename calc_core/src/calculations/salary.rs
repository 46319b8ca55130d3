//! # Payroll (Turkish Gross ↔ Net)
//!
//! Monthly payroll under Turkish law:
//!
//! - SGK employee share 14 % and unemployment insurance 1 %, both on the
//!   gross wage capped at the SGK ceiling (7.5 × minimum wage)
//! - Income tax on the cumulative annual base using progressive brackets
//! - Stamp duty 0.759 % of gross
//! - The minimum wage portion is exempt from income tax and stamp duty: the
//!   tax that a minimum wage earner would pay is credited back
//!
//! Employer cost adds the SGK employer share (with the 5-point incentive when
//! it applies) and employer unemployment insurance.
//!
//! Net pay never decreases when gross pay increases, in any month. Without a
//! known cumulative base, earlier months are taken at the minimum wage base,
//! so the assumed history does not move with this month's gross.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::salary::{gross_to_net, PayrollParameters};
//!
//! let params = PayrollParameters::default();
//! let slip = gross_to_net(50_000.0, 1, None, &params);
//! assert!(slip.net < slip.gross);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// One income tax bracket; `upper` is the cumulative annual base limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub upper: Option<f64>,
    pub rate: f64,
}

/// Statutory rates and limits for one payroll year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollParameters {
    pub year: u16,
    pub minimum_wage_gross: f64,
    pub sgk_employee_rate: f64,
    pub unemployment_employee_rate: f64,
    pub sgk_employer_rate: f64,
    /// Reduction of the employer SGK rate under the 5-point incentive
    pub employer_incentive_rate: f64,
    pub unemployment_employer_rate: f64,
    pub stamp_tax_rate: f64,
    /// SGK base ceiling as a multiple of the minimum wage
    pub sgk_ceiling_multiplier: f64,
    pub brackets: Vec<TaxBracket>,
}

impl PayrollParameters {
    /// 2025 parameters.
    pub fn year_2025() -> Self {
        PayrollParameters {
            year: 2025,
            minimum_wage_gross: 26_005.50,
            sgk_employee_rate: 0.14,
            unemployment_employee_rate: 0.01,
            sgk_employer_rate: 0.2075,
            employer_incentive_rate: 0.05,
            unemployment_employer_rate: 0.02,
            stamp_tax_rate: 0.00759,
            sgk_ceiling_multiplier: 7.5,
            brackets: vec![
                TaxBracket { upper: Some(158_000.0), rate: 0.15 },
                TaxBracket { upper: Some(330_000.0), rate: 0.20 },
                TaxBracket { upper: Some(1_200_000.0), rate: 0.27 },
                TaxBracket { upper: Some(4_300_000.0), rate: 0.35 },
                TaxBracket { upper: None, rate: 0.40 },
            ],
        }
    }

    /// 2024 parameters.
    pub fn year_2024() -> Self {
        PayrollParameters {
            year: 2024,
            minimum_wage_gross: 20_002.50,
            brackets: vec![
                TaxBracket { upper: Some(110_000.0), rate: 0.15 },
                TaxBracket { upper: Some(230_000.0), rate: 0.20 },
                TaxBracket { upper: Some(870_000.0), rate: 0.27 },
                TaxBracket { upper: Some(3_000_000.0), rate: 0.35 },
                TaxBracket { upper: None, rate: 0.40 },
            ],
            ..PayrollParameters::year_2025()
        }
    }

    pub fn for_year(year: u16) -> CalcResult<Self> {
        match year {
            2024 => Ok(PayrollParameters::year_2024()),
            2025 => Ok(PayrollParameters::year_2025()),
            other => Err(CalcError::invalid_input("year", other.to_string(), "No payroll parameters for this year")),
        }
    }

    pub fn sgk_ceiling(&self) -> f64 {
        self.minimum_wage_gross * self.sgk_ceiling_multiplier
    }

    /// Income tax due on a cumulative annual base.
    pub fn income_tax_on(&self, annual_base: f64) -> f64 {
        let mut tax = 0.0;
        let mut lower = 0.0;
        for bracket in &self.brackets {
            if annual_base <= lower {
                break;
            }
            let upper = bracket.upper.unwrap_or(f64::INFINITY);
            tax += (annual_base.min(upper) - lower) * bracket.rate;
            lower = upper;
        }
        tax
    }

    /// Income tax for a month whose base sits on top of `cumulative_before`.
    fn monthly_income_tax(&self, cumulative_before: f64, base: f64) -> f64 {
        self.income_tax_on(cumulative_before + base) - self.income_tax_on(cumulative_before)
    }

    fn employee_deduction_rate(&self) -> f64 {
        self.sgk_employee_rate + self.unemployment_employee_rate
    }

    /// Taxable base of a minimum wage earner.
    fn minimum_wage_tax_base(&self) -> f64 {
        self.minimum_wage_gross * (1.0 - self.employee_deduction_rate())
    }
}

impl Default for PayrollParameters {
    fn default() -> Self {
        PayrollParameters::year_2025()
    }
}

/// Monthly pay slip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaySlip {
    pub month: u8,
    pub gross: f64,
    pub sgk_base: f64,
    pub sgk_employee: f64,
    pub unemployment_employee: f64,
    pub income_tax_base: f64,
    /// Cumulative base before this month
    pub cumulative_tax_base: f64,
    pub income_tax_gross: f64,
    pub income_tax_exemption: f64,
    pub income_tax: f64,
    pub stamp_tax_gross: f64,
    pub stamp_tax_exemption: f64,
    pub stamp_tax: f64,
    pub net: f64,
    pub employer_sgk: f64,
    pub employer_unemployment: f64,
    pub employer_cost: f64,
}

/// Compute a monthly pay slip from a gross wage.
///
/// `cumulative_tax_base` is the taxable base of earlier months this year;
/// `None` assumes the minimum wage base in every earlier month.
pub fn gross_to_net(gross: f64, month: u8, cumulative_tax_base: Option<f64>, params: &PayrollParameters) -> PaySlip {
    slip(gross, month, cumulative_tax_base, true, params)
}

fn slip(gross: f64, month: u8, cumulative_tax_base: Option<f64>, incentive: bool, params: &PayrollParameters) -> PaySlip {
    let gross = gross.max(0.0);
    let month = month.clamp(1, 12);
    let prior_months = (month - 1) as f64;

    let sgk_base = gross.min(params.sgk_ceiling());
    let sgk_employee = sgk_base * params.sgk_employee_rate;
    let unemployment_employee = sgk_base * params.unemployment_employee_rate;
    let tax_base = gross - sgk_employee - unemployment_employee;
    let mw_base = params.minimum_wage_tax_base();
    let cumulative = cumulative_tax_base.unwrap_or(mw_base * prior_months);

    let income_tax_gross = params.monthly_income_tax(cumulative, tax_base);
    let exemption_cap = params.monthly_income_tax(mw_base * prior_months, mw_base);
    let income_tax_exemption = exemption_cap.min(income_tax_gross);
    let income_tax = income_tax_gross - income_tax_exemption;

    let stamp_tax_gross = gross * params.stamp_tax_rate;
    let stamp_tax_exemption = (params.minimum_wage_gross * params.stamp_tax_rate).min(stamp_tax_gross);
    let stamp_tax = stamp_tax_gross - stamp_tax_exemption;

    let net = gross - sgk_employee - unemployment_employee - income_tax - stamp_tax;

    let employer_rate = if incentive {
        params.sgk_employer_rate - params.employer_incentive_rate
    } else {
        params.sgk_employer_rate
    };
    let employer_sgk = sgk_base * employer_rate;
    let employer_unemployment = sgk_base * params.unemployment_employer_rate;

    PaySlip {
        month,
        gross,
        sgk_base,
        sgk_employee,
        unemployment_employee,
        income_tax_base: tax_base,
        cumulative_tax_base: cumulative,
        income_tax_gross,
        income_tax_exemption,
        income_tax,
        stamp_tax_gross,
        stamp_tax_exemption,
        stamp_tax,
        net,
        employer_sgk,
        employer_unemployment,
        employer_cost: gross + employer_sgk + employer_unemployment,
    }
}

/// Find the gross wage that pays `net` in the given month (bisection).
pub fn net_to_gross(net: f64, month: u8, params: &PayrollParameters) -> CalcResult<PaySlip> {
    if net <= 0.0 {
        return Err(CalcError::invalid_input("net", net.to_string(), "Net wage must be positive"));
    }
    let mut low = net;
    let mut high = net * 2.0;
    while gross_to_net(high, month, None, params).net < net {
        high *= 2.0;
        if high > 1.0e12 {
            return Err(CalcError::calculation_failed("salary", "net wage out of range"));
        }
    }
    for _ in 0..200 {
        let mid = (low + high) / 2.0;
        if gross_to_net(mid, month, None, params).net < net {
            low = mid;
        } else {
            high = mid;
        }
        if high - low < 1e-6 {
            break;
        }
    }
    Ok(gross_to_net(high, month, None, params))
}

/// Twelve monthly slips for a constant gross wage, with the cumulative base
/// carried forward.
pub fn annual_schedule(gross: f64, params: &PayrollParameters) -> Vec<PaySlip> {
    let mut cumulative = 0.0;
    (1..=12u8)
        .map(|month| {
            let slip = gross_to_net(gross, month, Some(cumulative), params);
            cumulative += slip.income_tax_base;
            slip
        })
        .collect()
}

/// Direction of the salary calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SalaryMode {
    #[default]
    GrossToNet,
    NetToGross,
}

/// Input for the salary calculator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryInput {
    pub label: String,
    pub amount: f64,
    #[serde(default)]
    pub mode: SalaryMode,
    #[serde(default = "default_month")]
    pub month: u8,
    #[serde(default)]
    pub cumulative_tax_base: Option<f64>,
    /// Apply the employer 5-point SGK incentive
    #[serde(default = "default_incentive")]
    pub employer_incentive: bool,
    #[serde(default)]
    pub parameters: PayrollParameters,
}

fn default_month() -> u8 {
    1
}

fn default_incentive() -> bool {
    true
}

impl SalaryInput {
    pub fn validate(&self) -> CalcResult<()> {
        if self.amount < 0.0 {
            return Err(CalcError::invalid_input("amount", self.amount.to_string(), "Amount cannot be negative"));
        }
        if !(1..=12).contains(&self.month) {
            return Err(CalcError::invalid_input("month", self.month.to_string(), "Month must be 1-12"));
        }
        Ok(())
    }
}

/// Salary calculator result: the slip plus the full-year totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryResult {
    pub slip: PaySlip,
    pub annual_gross: f64,
    pub annual_net: f64,
    pub annual_employer_cost: f64,
}

/// Run the salary calculator.
pub fn calculate(input: &SalaryInput) -> CalcResult<SalaryResult> {
    input.validate()?;
    let params = &input.parameters;

    let base_slip = match input.mode {
        SalaryMode::GrossToNet => gross_to_net(input.amount, input.month, input.cumulative_tax_base, params),
        SalaryMode::NetToGross => net_to_gross(input.amount, input.month, params)?,
    };
    let slip = if input.employer_incentive {
        base_slip
    } else {
        self::slip(base_slip.gross, input.month, input.cumulative_tax_base, false, params)
    };

    let year = annual_schedule(slip.gross, params);
    let incentive_adjust = if input.employer_incentive {
        0.0
    } else {
        year.iter().map(|s| s.sgk_base * params.employer_incentive_rate).sum()
    };

    Ok(SalaryResult {
        annual_gross: year.iter().map(|s| s.gross).sum(),
        annual_net: year.iter().map(|s| s.net).sum(),
        annual_employer_cost: year.iter().map(|s| s.employer_cost).sum::<f64>() + incentive_adjust,
        slip,
    })
}
