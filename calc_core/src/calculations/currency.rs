//! # Currency Conversion and Forecasting
//!
//! Converts an amount at the latest rate of a daily rate series and projects
//! the rate forward with one of three methods:
//!
//! - Simple moving average of the last `window` rates (flat forecast)
//! - Least-squares linear regression over calendar days
//! - Simple exponential smoothing, `s = α·y + (1 − α)·s` (flat forecast)
//!
//! Trend is the direction of the final forecast relative to the latest rate,
//! with a ±0.1 % dead band.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Forecasts within this relative change are stable
const STABLE_BAND: f64 = 0.001;

/// One observed exchange rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatePoint {
    pub date: NaiveDate,
    pub rate: f64,
}

impl RatePoint {
    pub fn new(date: NaiveDate, rate: f64) -> Self {
        RatePoint { date, rate }
    }
}

/// Forecasting method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum ForecastMethod {
    MovingAverage { window: usize },
    LinearRegression,
    ExponentialSmoothing { alpha: f64 },
}

impl Default for ForecastMethod {
    fn default() -> Self {
        ForecastMethod::LinearRegression
    }
}

impl ForecastMethod {
    /// Parse "sma", "ma:7", "linear", "ses", "ses:0.5".
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        let lower = s.trim().to_lowercase();
        let (name, arg) = match lower.split_once(':') {
            Some((name, arg)) => (name.to_string(), Some(arg.to_string())),
            None => (lower.clone(), None),
        };
        let arg_value = arg.as_deref().map(crate::units::coerce_number);
        match name.as_str() {
            "sma" | "ma" | "moving" | "moving_average" => Ok(ForecastMethod::MovingAverage {
                window: arg_value.filter(|v| *v >= 1.0).map(|v| v as usize).unwrap_or(7),
            }),
            "linear" | "lr" | "regression" | "linear_regression" => Ok(ForecastMethod::LinearRegression),
            "ses" | "exp" | "exponential" | "exponential_smoothing" => Ok(ForecastMethod::ExponentialSmoothing {
                alpha: arg_value.filter(|v| *v > 0.0).unwrap_or(0.3),
            }),
            _ => Err(CalcError::invalid_input("method", s, "Unknown forecast method")),
        }
    }
}

/// Rate direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// Input for conversion and forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyInput {
    pub label: String,
    /// Base currency code, e.g. "USD"
    pub from: String,
    /// Quote currency code, e.g. "TRY"
    pub to: String,
    pub amount: f64,
    /// Daily rates (quote per base), any order
    pub history: Vec<RatePoint>,
    #[serde(default)]
    pub method: ForecastMethod,
    #[serde(default = "default_horizon")]
    pub horizon_days: u32,
}

fn default_horizon() -> u32 {
    7
}

/// Longest forecast, in days
pub const MAX_HORIZON_DAYS: u32 = 365;

impl CurrencyInput {
    pub fn validate(&self) -> CalcResult<()> {
        if self.history.is_empty() {
            return Err(CalcError::invalid_input("history", "[]", "At least one rate is required"));
        }
        if let Some(bad) = self.history.iter().find(|p| !(p.rate > 0.0 && p.rate.is_finite())) {
            return Err(CalcError::invalid_input(
                "history",
                format!("{}={}", bad.date, bad.rate),
                "Rates must be positive",
            ));
        }
        if self.horizon_days > MAX_HORIZON_DAYS {
            return Err(CalcError::invalid_input(
                "horizon_days",
                self.horizon_days.to_string(),
                format!("Forecast horizon is at most {} days", MAX_HORIZON_DAYS),
            ));
        }
        if self.amount < 0.0 {
            return Err(CalcError::invalid_input("amount", self.amount.to_string(), "Amount cannot be negative"));
        }
        match self.method {
            ForecastMethod::MovingAverage { window: 0 } => {
                Err(CalcError::invalid_input("window", "0", "Window must be at least 1"))
            }
            ForecastMethod::ExponentialSmoothing { alpha } if !(alpha > 0.0 && alpha <= 1.0) => Err(
                CalcError::invalid_input("alpha", alpha.to_string(), "Smoothing factor must be in (0, 1]"),
            ),
            _ => Ok(()),
        }
    }

    /// History sorted by date; a later entry for the same date wins.
    fn series(&self) -> Vec<RatePoint> {
        let mut points = self.history.clone();
        points.sort_by_key(|p| p.date);
        let mut series: Vec<RatePoint> = Vec::with_capacity(points.len());
        for point in points {
            match series.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => series.push(point),
            }
        }
        series
    }
}

/// Conversion, statistics and forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyResult {
    pub pair: String,
    pub current_rate: f64,
    pub converted_amount: f64,
    /// Change from the first to the latest rate, %
    pub change_percent: f64,
    pub min_rate: f64,
    pub max_rate: f64,
    pub mean_rate: f64,
    /// Standard deviation of daily returns, %
    pub volatility_percent: f64,
    pub forecast: Vec<RatePoint>,
    pub forecast_rate: f64,
    pub forecast_amount: f64,
    pub trend: Trend,
}

/// Simple moving average of the last `window` values.
pub fn moving_average(values: &[f64], window: usize) -> Option<f64> {
    if values.is_empty() || window == 0 {
        return None;
    }
    let tail = &values[values.len().saturating_sub(window)..];
    Some(tail.iter().sum::<f64>() / tail.len() as f64)
}

/// Least-squares fit `y = intercept + slope·x`. A single point or identical
/// x values give a zero slope.
pub fn linear_regression(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    let n = xs.len().min(ys.len());
    if n == 0 {
        return None;
    }
    let nf = n as f64;
    let mean_x = xs[..n].iter().sum::<f64>() / nf;
    let mean_y = ys[..n].iter().sum::<f64>() / nf;
    let sxx: f64 = xs[..n].iter().map(|x| (x - mean_x).powi(2)).sum();
    let sxy: f64 = xs[..n].iter().zip(&ys[..n]).map(|(x, y)| (x - mean_x) * (y - mean_y)).sum();
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    Some((mean_y - slope * mean_x, slope))
}

/// Final smoothed level of simple exponential smoothing.
pub fn exponential_smoothing(values: &[f64], alpha: f64) -> Option<f64> {
    let (first, rest) = values.split_first()?;
    Some(rest.iter().fold(*first, |level, y| alpha * y + (1.0 - alpha) * level))
}

fn volatility_percent(values: &[f64]) -> f64 {
    let returns: Vec<f64> = values.windows(2).map(|w| (w[1] - w[0]) / w[0] * 100.0).collect();
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (returns.len() - 1) as f64;
    variance.sqrt()
}

/// Convert and forecast.
pub fn calculate(input: &CurrencyInput) -> CalcResult<CurrencyResult> {
    input.validate()?;

    let series = input.series();
    let rates: Vec<f64> = series.iter().map(|p| p.rate).collect();
    let (first, last) = match (series.first(), series.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(CalcError::invalid_input("history", "[]", "At least one rate is required")),
    };

    let horizon = i64::from(input.horizon_days);
    let forecast: Vec<RatePoint> = match input.method {
        ForecastMethod::MovingAverage { window } => {
            let level = moving_average(&rates, window).unwrap_or(last.rate);
            (1..=horizon).map(|k| RatePoint::new(last.date + Duration::days(k), level)).collect()
        }
        ForecastMethod::ExponentialSmoothing { alpha } => {
            let level = exponential_smoothing(&rates, alpha).unwrap_or(last.rate);
            (1..=horizon).map(|k| RatePoint::new(last.date + Duration::days(k), level)).collect()
        }
        ForecastMethod::LinearRegression => {
            let xs: Vec<f64> = series.iter().map(|p| (p.date - first.date).num_days() as f64).collect();
            let (intercept, slope) = linear_regression(&xs, &rates).unwrap_or((last.rate, 0.0));
            let last_x = (last.date - first.date).num_days();
            (1..=horizon)
                .map(|k| {
                    let x = (last_x + k) as f64;
                    RatePoint::new(last.date + Duration::days(k), (intercept + slope * x).max(0.0))
                })
                .collect()
        }
    };

    let forecast_rate = forecast.last().map(|p| p.rate).unwrap_or(last.rate);
    let relative = (forecast_rate - last.rate) / last.rate;
    let trend = if relative > STABLE_BAND {
        Trend::Up
    } else if relative < -STABLE_BAND {
        Trend::Down
    } else {
        Trend::Stable
    };

    Ok(CurrencyResult {
        pair: format!("{}/{}", input.from.to_uppercase(), input.to.to_uppercase()),
        current_rate: last.rate,
        converted_amount: input.amount * last.rate,
        change_percent: (last.rate - first.rate) / first.rate * 100.0,
        min_rate: rates.iter().cloned().fold(f64::INFINITY, f64::min),
        max_rate: rates.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        mean_rate: rates.iter().sum::<f64>() / rates.len() as f64,
        volatility_percent: volatility_percent(&rates),
        forecast,
        forecast_rate,
        forecast_amount: input.amount * forecast_rate,
        trend,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn input(rates: &[f64], method: ForecastMethod) -> CurrencyInput {
        CurrencyInput {
            label: "USD".to_string(),
            from: "usd".to_string(),
            to: "try".to_string(),
            amount: 100.0,
            history: rates
                .iter()
                .enumerate()
                .map(|(i, r)| RatePoint::new(day(i as u32 + 1), *r))
                .collect(),
            method,
            horizon_days: 3,
        }
    }

    #[test]
    fn test_conversion_and_change() {
        let r = calculate(&input(&[36.0, 36.9, 37.8], ForecastMethod::LinearRegression)).unwrap();
        assert_eq!(r.pair, "USD/TRY");
        assert!((r.converted_amount - 3780.0).abs() < 1e-9);
        assert!((r.change_percent - 5.0).abs() < 1e-9);
        assert_eq!(r.min_rate, 36.0);
        assert_eq!(r.max_rate, 37.8);
    }

    #[test]
    fn test_linear_forecast_extends_line() {
        let r = calculate(&input(&[10.0, 11.0, 12.0, 13.0], ForecastMethod::LinearRegression)).unwrap();
        assert_eq!(r.forecast.len(), 3);
        assert_eq!(r.forecast[0].date, day(5));
        assert!((r.forecast[0].rate - 14.0).abs() < 1e-9);
        assert!((r.forecast_rate - 16.0).abs() < 1e-9);
        assert_eq!(r.trend, Trend::Up);
    }

    #[test]
    fn test_regression_uses_calendar_gaps() {
        let mut inp = input(&[], ForecastMethod::LinearRegression);
        inp.history = vec![RatePoint::new(day(1), 10.0), RatePoint::new(day(5), 14.0)];
        inp.horizon_days = 1;
        let r = calculate(&inp).unwrap();
        assert!((r.forecast_rate - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_horizon_is_capped() {
        let mut inp = input(&[10.0, 11.0], ForecastMethod::LinearRegression);
        inp.horizon_days = u32::MAX;
        let err = calculate(&inp).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");

        inp.horizon_days = MAX_HORIZON_DAYS;
        assert_eq!(calculate(&inp).unwrap().forecast.len(), 365);
    }

    #[test]
    fn test_moving_average() {
        assert_eq!(moving_average(&[1.0, 2.0, 3.0, 4.0], 2), Some(3.5));
        assert_eq!(moving_average(&[1.0, 2.0], 10), Some(1.5));
        let r = calculate(&input(&[10.0, 10.0, 13.0, 13.0], ForecastMethod::MovingAverage { window: 4 })).unwrap();
        assert!((r.forecast_rate - 11.5).abs() < 1e-9);
        assert_eq!(r.trend, Trend::Down);
    }

    #[test]
    fn test_exponential_smoothing() {
        // 10 → 0.5·20 + 0.5·10 = 15 → 0.5·20 + 0.5·15 = 17.5
        assert_eq!(exponential_smoothing(&[10.0, 20.0, 20.0], 0.5), Some(17.5));
        let r = calculate(&input(&[5.0, 5.0, 5.0], ForecastMethod::ExponentialSmoothing { alpha: 0.3 })).unwrap();
        assert_eq!(r.trend, Trend::Stable);
        assert_eq!(r.volatility_percent, 0.0);
    }

    #[test]
    fn test_unsorted_and_duplicate_dates() {
        let mut inp = input(&[], ForecastMethod::LinearRegression);
        inp.history = vec![
            RatePoint::new(day(3), 12.0),
            RatePoint::new(day(1), 10.0),
            RatePoint::new(day(2), 99.0),
            RatePoint::new(day(2), 11.0),
        ];
        let r = calculate(&inp).unwrap();
        assert_eq!(r.current_rate, 12.0);
        assert_eq!(r.max_rate, 12.0);
    }

    #[test]
    fn test_validation() {
        assert!(calculate(&input(&[], ForecastMethod::LinearRegression)).is_err());
        assert!(calculate(&input(&[1.0, -1.0], ForecastMethod::LinearRegression)).is_err());
        assert!(calculate(&input(&[1.0], ForecastMethod::MovingAverage { window: 0 })).is_err());
        assert!(calculate(&input(&[1.0], ForecastMethod::ExponentialSmoothing { alpha: 1.5 })).is_err());
    }

    #[test]
    fn test_method_parse() {
        assert_eq!(
            ForecastMethod::from_str_flexible("ma:5").unwrap(),
            ForecastMethod::MovingAverage { window: 5 }
        );
        assert_eq!(ForecastMethod::from_str_flexible("Linear").unwrap(), ForecastMethod::LinearRegression);
        assert_eq!(
            ForecastMethod::from_str_flexible("ses").unwrap(),
            ForecastMethod::ExponentialSmoothing { alpha: 0.3 }
        );
        assert!(ForecastMethod::from_str_flexible("arima").is_err());
    }
}
