//! # Thread Turning
//!
//! ISO metric 60° thread geometry plus a radial infeed schedule for single
//! point threading.
//!
//! ## Geometry (ISO 68-1)
//!
//! - Fundamental triangle height: H = 0.866025·P
//! - Pitch diameter: d₂ = d − 0.649519·P
//! - External minor diameter: d₃ = d − 1.226869·P
//! - Internal minor diameter: D₁ = d − 1.082532·P
//! - External thread depth: h₃ = 0.613435·P; internal H₁ = 0.541266·P
//! - Tap drill: d − P
//!
//! Infeed follows the constant chip area rule: after pass i of N the
//! cumulative radial depth is h·√(i/N).

use serde::{Deserialize, Serialize};

use super::require_positive;
use crate::errors::{CalcError, CalcResult};
use crate::materials::threads::{find_thread, tpi_to_pitch};
use crate::units::{self, Millimeters, MetersPerMinute};

/// Input parameters for thread turning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadingInput {
    pub label: String,
    /// Standard designation (e.g. "M12", "1/2-13"); overrides diameter and pitch
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default)]
    pub major_diameter_mm: f64,
    /// Pitch in mm; ignored when `tpi` is given
    #[serde(default)]
    pub pitch_mm: f64,
    /// Threads per inch
    #[serde(default)]
    pub tpi: Option<f64>,
    /// Internal (nut) thread instead of external (bolt)
    #[serde(default)]
    pub internal: bool,
    pub thread_length_mm: f64,
    pub cutting_speed_m_min: f64,
    /// Number of passes; 0 picks a count from the pitch
    #[serde(default)]
    pub passes: u32,
}

impl ThreadingInput {
    /// Resolve designation/TPI into (major diameter, pitch).
    pub fn resolved_geometry(&self) -> CalcResult<(f64, f64)> {
        if let Some(designation) = self.designation.as_deref().filter(|d| !d.trim().is_empty()) {
            let size = find_thread(designation)?;
            return Ok((size.major_diameter_mm, size.pitch_mm));
        }
        let pitch = match self.tpi {
            Some(tpi) => tpi_to_pitch(tpi),
            None => self.pitch_mm,
        };
        Ok((self.major_diameter_mm, pitch))
    }

    pub fn validate(&self) -> CalcResult<()> {
        let (d, p) = self.resolved_geometry()?;
        require_positive("major_diameter_mm", d)?;
        require_positive("pitch_mm", p)?;
        require_positive("thread_length_mm", self.thread_length_mm)?;
        require_positive("cutting_speed_m_min", self.cutting_speed_m_min)?;
        if p >= d / 2.0 {
            return Err(CalcError::invalid_input(
                "pitch_mm",
                p.to_string(),
                "Pitch is too coarse for the diameter",
            ));
        }
        Ok(())
    }
}

/// One radial infeed step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InfeedPass {
    pub pass: u32,
    /// Radial depth reached after this pass
    pub cumulative_depth_mm: f64,
    /// Radial depth removed in this pass
    pub increment_mm: f64,
}

/// Results for thread turning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadingResult {
    pub major_diameter_mm: f64,
    pub pitch_mm: f64,
    pub fundamental_height_mm: f64,
    pub pitch_diameter_mm: f64,
    pub minor_diameter_external_mm: f64,
    pub minor_diameter_internal_mm: f64,
    /// Radial depth to cut for this thread (external h₃ or internal H₁)
    pub thread_depth_mm: f64,
    pub tap_drill_mm: f64,
    pub passes: u32,
    pub infeed: Vec<InfeedPass>,
    pub spindle_speed_rpm: f64,
    /// Feed along the axis equals the pitch per revolution (mm/min)
    pub feed_rate_mm_min: f64,
    pub threading_time_min: f64,
}

/// Typical pass count for a pitch.
pub fn recommended_passes(pitch_mm: f64) -> u32 {
    match pitch_mm {
        p if p <= 0.5 => 4,
        p if p <= 0.75 => 5,
        p if p <= 1.0 => 6,
        p if p <= 1.5 => 8,
        p if p <= 2.0 => 10,
        p if p <= 2.5 => 12,
        p if p <= 3.0 => 14,
        _ => 16,
    }
}

/// Constant chip area infeed schedule for `passes` passes to `depth_mm`.
pub fn infeed_schedule(depth_mm: f64, passes: u32) -> Vec<InfeedPass> {
    let mut schedule = Vec::with_capacity(passes as usize);
    let mut previous = 0.0;
    for i in 1..=passes {
        let cumulative = depth_mm * (i as f64 / passes as f64).sqrt();
        schedule.push(InfeedPass {
            pass: i,
            cumulative_depth_mm: cumulative,
            increment_mm: cumulative - previous,
        });
        previous = cumulative;
    }
    schedule
}

/// Calculate thread geometry, infeed and cycle time.
pub fn calculate(input: &ThreadingInput) -> CalcResult<ThreadingResult> {
    input.validate()?;
    let (d, p) = input.resolved_geometry()?;

    let minor_internal = d - 1.082_532 * p;
    let depth = if input.internal { 0.541_266 * p } else { 0.613_435 * p };
    let passes = if input.passes == 0 { recommended_passes(p) } else { input.passes };

    // The insert sees the major diameter outside and the bore inside.
    let cutting_diameter = if input.internal { minor_internal } else { d };
    let n = units::spindle_speed(MetersPerMinute(input.cutting_speed_m_min), Millimeters(cutting_diameter));
    let feed_rate = p * n.0;
    let per_pass = units::traverse_time(Millimeters(input.thread_length_mm), units::MmPerMin(feed_rate));

    Ok(ThreadingResult {
        major_diameter_mm: d,
        pitch_mm: p,
        fundamental_height_mm: 0.866_025 * p,
        pitch_diameter_mm: d - 0.649_519 * p,
        minor_diameter_external_mm: d - 1.226_869 * p,
        minor_diameter_internal_mm: minor_internal,
        thread_depth_mm: depth,
        tap_drill_mm: d - p,
        passes,
        infeed: infeed_schedule(depth, passes),
        spindle_speed_rpm: n.0,
        feed_rate_mm_min: feed_rate,
        threading_time_min: per_pass.0 * passes as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m10() -> ThreadingInput {
        ThreadingInput {
            label: "M10 stud".to_string(),
            designation: Some("M10".to_string()),
            major_diameter_mm: 0.0,
            pitch_mm: 0.0,
            tpi: None,
            internal: false,
            thread_length_mm: 20.0,
            cutting_speed_m_min: 100.0,
            passes: 0,
        }
    }

    #[test]
    fn test_m10_geometry() {
        let r = calculate(&m10()).unwrap();
        assert_eq!(r.pitch_mm, 1.5);
        assert!((r.pitch_diameter_mm - 9.026).abs() < 0.001);
        assert!((r.minor_diameter_external_mm - 8.160).abs() < 0.001);
        assert!((r.minor_diameter_internal_mm - 8.376).abs() < 0.001);
        assert!((r.thread_depth_mm - 0.920).abs() < 0.001);
        assert_eq!(r.tap_drill_mm, 8.5);
        assert_eq!(r.passes, 8);
    }

    #[test]
    fn test_infeed_reaches_full_depth_with_shrinking_steps() {
        let r = calculate(&m10()).unwrap();
        assert_eq!(r.infeed.len(), 8);
        let last = r.infeed.last().unwrap();
        assert!((last.cumulative_depth_mm - r.thread_depth_mm).abs() < 1e-12);
        for pair in r.infeed.windows(2) {
            assert!(pair[1].increment_mm < pair[0].increment_mm);
        }
        let total: f64 = r.infeed.iter().map(|p| p.increment_mm).sum();
        assert!((total - r.thread_depth_mm).abs() < 1e-12);
    }

    #[test]
    fn test_time_and_feed() {
        let r = calculate(&m10()).unwrap();
        // n = 100000 / (π·10) = 3183.1 rpm, Vf = 1.5 * n
        assert!((r.spindle_speed_rpm - 3183.1).abs() < 0.1);
        assert!((r.feed_rate_mm_min - 4774.6).abs() < 0.1);
        let expected = 20.0 / r.feed_rate_mm_min * 8.0;
        assert!((r.threading_time_min - expected).abs() < 1e-12);
    }

    #[test]
    fn test_internal_thread_uses_bore_diameter() {
        let mut input = m10();
        input.internal = true;
        let r = calculate(&input).unwrap();
        assert!((r.thread_depth_mm - 0.8119).abs() < 0.001);
        assert!(r.spindle_speed_rpm > 3183.1);
    }

    #[test]
    fn test_tpi_input() {
        let mut input = m10();
        input.designation = None;
        input.major_diameter_mm = 12.7;
        input.tpi = Some(13.0);
        input.passes = 5;
        let r = calculate(&input).unwrap();
        assert!((r.pitch_mm - 1.9538).abs() < 1e-4);
        assert_eq!(r.infeed.len(), 5);
    }

    #[test]
    fn test_invalid_thread() {
        let mut input = m10();
        input.designation = Some("M7".to_string());
        assert!(calculate(&input).is_err());

        let mut input = m10();
        input.designation = None;
        input.major_diameter_mm = 4.0;
        input.pitch_mm = 3.0;
        assert!(calculate(&input).is_err());
    }
}
