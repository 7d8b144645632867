//! Ruby fluorescence calibration for diamond-anvil-cell work.
//!
//! The R1 line shifts to longer wavelength with both pressure and temperature.
//! All constants come from [`RubyCalibration`] so a different reference ruby or
//! calibration standard only needs a different config file.

use crate::domain::RubyCalibration;
use crate::error::AppError;

/// Everything derived from one R1 line position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationReading {
    pub wavelength_nm: f64,
    /// Hydrostatic scale `A/B · ((λ/λ0)^B − 1)`, GPa.
    pub pressure_hydrostatic_gpa: f64,
    /// Ruby2020 scale `A · Δ (1 + B·Δ)`, `Δ = (λ − λ0)/λ0`, GPa.
    pub pressure_ruby2020_gpa: f64,
    /// Temperature assuming the shift is purely thermal, K.
    pub temperature_k: f64,
}

fn check_wavelength(wavelength_nm: f64) -> Result<(), AppError> {
    if !(wavelength_nm.is_finite() && wavelength_nm > 0.0) {
        return Err(AppError::invalid_config(format!(
            "Wavelength must be positive and finite, got {wavelength_nm}."
        )));
    }
    Ok(())
}

pub fn pressure_hydrostatic(wavelength_nm: f64, cal: &RubyCalibration) -> Result<f64, AppError> {
    check_wavelength(wavelength_nm)?;
    let ratio = wavelength_nm / cal.reference_wavelength_nm;
    Ok(cal.hydrostatic_a_gpa / cal.hydrostatic_b * (ratio.powf(cal.hydrostatic_b) - 1.0))
}

pub fn pressure_ruby2020(wavelength_nm: f64, cal: &RubyCalibration) -> Result<f64, AppError> {
    check_wavelength(wavelength_nm)?;
    let delta = (wavelength_nm - cal.reference_wavelength_nm) / cal.reference_wavelength_nm;
    Ok(cal.ruby2020_a_gpa * delta * (1.0 + cal.ruby2020_b * delta))
}

pub fn temperature_from_line(wavelength_nm: f64, cal: &RubyCalibration) -> Result<f64, AppError> {
    check_wavelength(wavelength_nm)?;
    Ok((wavelength_nm - cal.reference_wavelength_nm) / cal.temperature_coefficient_nm_per_k
        + cal.ambient_temperature_k)
}

/// Expected R1 position at `temperature_k` (ambient pressure).
pub fn line_position_at(temperature_k: f64, cal: &RubyCalibration) -> Result<f64, AppError> {
    if !(temperature_k.is_finite() && temperature_k > 0.0) {
        return Err(AppError::invalid_config(format!(
            "Temperature must be positive and finite, got {temperature_k} K."
        )));
    }
    Ok(cal.reference_wavelength_nm
        + (temperature_k - cal.ambient_temperature_k) * cal.temperature_coefficient_nm_per_k)
}

pub fn calibrate_line(wavelength_nm: f64, cal: &RubyCalibration) -> Result<CalibrationReading, AppError> {
    Ok(CalibrationReading {
        wavelength_nm,
        pressure_hydrostatic_gpa: pressure_hydrostatic(wavelength_nm, cal)?,
        pressure_ruby2020_gpa: pressure_ruby2020(wavelength_nm, cal)?,
        temperature_k: temperature_from_line(wavelength_nm, cal)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_line_is_ambient() {
        let cal = RubyCalibration::default();
        let r = calibrate_line(cal.reference_wavelength_nm, &cal).unwrap();
        assert!(r.pressure_hydrostatic_gpa.abs() < 1e-12);
        assert!(r.pressure_ruby2020_gpa.abs() < 1e-12);
        assert!((r.temperature_k - cal.ambient_temperature_k).abs() < 1e-12);
    }

    #[test]
    fn pressure_scales_agree_at_low_pressure() {
        // ~10 GPa: the two scales differ by well under 1 GPa.
        let cal = RubyCalibration::default();
        let wl = 697.8;
        let p1 = pressure_hydrostatic(wl, &cal).unwrap();
        let p2 = pressure_ruby2020(wl, &cal).unwrap();
        assert!(p1 > 9.0 && p1 < 11.0, "p1={p1}");
        assert!((p1 - p2).abs() < 0.5, "p1={p1} p2={p2}");
    }

    #[test]
    fn line_position_inverts_temperature() {
        let cal = RubyCalibration::default();
        let wl = line_position_at(80.0, &cal).unwrap();
        assert!(wl < cal.reference_wavelength_nm);
        let t = temperature_from_line(wl, &cal).unwrap();
        assert!((t - 80.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_nonsense_input() {
        let cal = RubyCalibration::default();
        assert!(pressure_hydrostatic(-1.0, &cal).is_err());
        assert!(line_position_at(f64::NAN, &cal).is_err());
    }
}
