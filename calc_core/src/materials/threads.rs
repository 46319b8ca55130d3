//! Thread standards
//!
//! Nominal sizes and pitches for ISO metric (ISO 261/262) and Unified
//! (ASME B1.1) threads. Unified sizes are stored in millimeters with the
//! threads-per-inch count kept alongside.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Thread series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThreadStandard {
    /// ISO metric coarse pitch
    MetricCoarse,
    /// ISO metric fine pitch
    MetricFine,
    /// Unified National Coarse
    Unc,
    /// Unified National Fine
    Unf,
}

impl ThreadStandard {
    pub fn display_name(&self) -> &'static str {
        match self {
            ThreadStandard::MetricCoarse => "ISO Metric Coarse",
            ThreadStandard::MetricFine => "ISO Metric Fine",
            ThreadStandard::Unc => "UNC",
            ThreadStandard::Unf => "UNF",
        }
    }
}

/// One standard thread size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThreadSize {
    pub designation: &'static str,
    pub standard: ThreadStandard,
    pub major_diameter_mm: f64,
    pub pitch_mm: f64,
    /// Threads per inch for unified sizes
    pub tpi: Option<f64>,
}

const fn metric(designation: &'static str, standard: ThreadStandard, d: f64, p: f64) -> ThreadSize {
    ThreadSize {
        designation,
        standard,
        major_diameter_mm: d,
        pitch_mm: p,
        tpi: None,
    }
}

const fn unified(designation: &'static str, standard: ThreadStandard, d_in: f64, tpi: f64) -> ThreadSize {
    ThreadSize {
        designation,
        standard,
        major_diameter_mm: d_in * 25.4,
        pitch_mm: 25.4 / tpi,
        tpi: Some(tpi),
    }
}

use ThreadStandard::{MetricCoarse as MC, MetricFine as MF, Unc, Unf};

/// All tabulated thread sizes.
pub const THREAD_SIZES: &[ThreadSize] = &[
    metric("M1", MC, 1.0, 0.25),
    metric("M1.2", MC, 1.2, 0.25),
    metric("M1.6", MC, 1.6, 0.35),
    metric("M2", MC, 2.0, 0.4),
    metric("M2.5", MC, 2.5, 0.45),
    metric("M3", MC, 3.0, 0.5),
    metric("M4", MC, 4.0, 0.7),
    metric("M5", MC, 5.0, 0.8),
    metric("M6", MC, 6.0, 1.0),
    metric("M8", MC, 8.0, 1.25),
    metric("M10", MC, 10.0, 1.5),
    metric("M12", MC, 12.0, 1.75),
    metric("M14", MC, 14.0, 2.0),
    metric("M16", MC, 16.0, 2.0),
    metric("M20", MC, 20.0, 2.5),
    metric("M24", MC, 24.0, 3.0),
    metric("M30", MC, 30.0, 3.5),
    metric("M36", MC, 36.0, 4.0),
    metric("M42", MC, 42.0, 4.5),
    metric("M48", MC, 48.0, 5.0),
    metric("M56", MC, 56.0, 5.5),
    metric("M64", MC, 64.0, 6.0),
    metric("M8x1", MF, 8.0, 1.0),
    metric("M10x1.25", MF, 10.0, 1.25),
    metric("M10x1", MF, 10.0, 1.0),
    metric("M12x1.5", MF, 12.0, 1.5),
    metric("M12x1.25", MF, 12.0, 1.25),
    metric("M14x1.5", MF, 14.0, 1.5),
    metric("M16x1.5", MF, 16.0, 1.5),
    metric("M20x1.5", MF, 20.0, 1.5),
    metric("M24x2", MF, 24.0, 2.0),
    metric("M30x2", MF, 30.0, 2.0),
    metric("M36x3", MF, 36.0, 3.0),
    metric("M42x3", MF, 42.0, 3.0),
    unified("1/4-20", Unc, 0.25, 20.0),
    unified("5/16-18", Unc, 0.3125, 18.0),
    unified("3/8-16", Unc, 0.375, 16.0),
    unified("1/2-13", Unc, 0.5, 13.0),
    unified("5/8-11", Unc, 0.625, 11.0),
    unified("3/4-10", Unc, 0.75, 10.0),
    unified("1-8", Unc, 1.0, 8.0),
    unified("1/4-28", Unf, 0.25, 28.0),
    unified("5/16-24", Unf, 0.3125, 24.0),
    unified("3/8-24", Unf, 0.375, 24.0),
    unified("1/2-20", Unf, 0.5, 20.0),
    unified("5/8-18", Unf, 0.625, 18.0),
    unified("3/4-16", Unf, 0.75, 16.0),
    unified("1-12", Unf, 1.0, 12.0),
];

/// Find a thread by designation (`"M10"`, `"m12x1.5"`, `"1/2-13"`).
pub fn find_thread(designation: &str) -> CalcResult<&'static ThreadSize> {
    let wanted = designation.trim().replace(['X', '×'], "x");
    THREAD_SIZES
        .iter()
        .find(|t| t.designation.eq_ignore_ascii_case(&wanted))
        .ok_or_else(|| CalcError::not_found("Thread", designation))
}

/// All sizes of one series.
pub fn threads_of(standard: ThreadStandard) -> impl Iterator<Item = &'static ThreadSize> {
    THREAD_SIZES.iter().filter(move |t| t.standard == standard)
}

/// Pitch in mm for a threads-per-inch count.
pub fn tpi_to_pitch(tpi: f64) -> f64 {
    if tpi <= 0.0 {
        0.0
    } else {
        25.4 / tpi
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_metric() {
        let m10 = find_thread("M10").unwrap();
        assert_eq!(m10.pitch_mm, 1.5);
        let fine = find_thread("m12X1.5").unwrap();
        assert_eq!(fine.standard, ThreadStandard::MetricFine);
    }

    #[test]
    fn test_find_unified() {
        let t = find_thread("1/2-13").unwrap();
        assert!((t.major_diameter_mm - 12.7).abs() < 1e-9);
        assert!((t.pitch_mm - 1.953_846).abs() < 1e-5);
        assert_eq!(t.tpi, Some(13.0));
    }

    #[test]
    fn test_series_filter() {
        assert_eq!(threads_of(ThreadStandard::Unf).count(), 7);
        assert!(find_thread("M7").is_err());
    }

    #[test]
    fn test_tpi_to_pitch() {
        assert!((tpi_to_pitch(20.0) - 1.27).abs() < 1e-12);
        assert_eq!(tpi_to_pitch(0.0), 0.0);
    }
}
