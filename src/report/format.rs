//! Plain-text terminal output.
//!
//! Formatting lives here so the math and fitting code stays free of printing
//! and output changes stay localized.

use crate::calibration::CalibrationReading;
use crate::domain::{ParamSet, SmoothingConfig, Spectrum};
use crate::fit::{FitOutcome, FitSummary, ModelBuild, PeakSummary};
use crate::io::ConversionReport;
use crate::math::round_to;

/// Decimal places used for reported peak centers.
pub const CENTER_DECIMALS: i32 = 4;

/// Summary of a `smooth` run: input range plus the filter settings.
pub fn format_smoothing_summary(input: &Spectrum, config: &SmoothingConfig) -> String {
    let mut out = String::new();

    out.push_str("=== Savitzky-Golay ===\n");
    if let Some(label) = &input.label {
        out.push_str(&format!("Input: {label}\n"));
    }
    match input.x_range() {
        Some((lo, hi)) => out.push_str(&format!("Points: n={} | x=[{lo:.4}, {hi:.4}]\n", input.len())),
        None => out.push_str("Points: n=0\n"),
    }
    out.push_str(&format!(
        "Window: {} | order: {} | derivative: {}",
        config.window_size, config.polynomial_order, config.derivative_order
    ));
    if config.derivative_order > 0 {
        out.push_str(&format!(" | rate: {}", config.sampling_rate));
    }
    out.push('\n');

    out
}

/// Parameter table for the initial guess (seeds plus the background estimate).
pub fn format_initial_guess(build: &ModelBuild) -> String {
    let mut out = String::new();
    out.push_str("=== Initial guess ===\n");
    out.push_str(&format_params(&build.params));

    if let Some(peak) = build.init.iter().copied().reduce(f64::max) {
        out.push_str(&format!("Initial curve maximum: {peak:.3}\n"));
    }
    out
}

/// Full fit report: refined peaks, quality and the R1 calibration.
pub fn format_fit_summary(summary: &FitSummary, outcome: &FitOutcome, label: Option<&str>) -> String {
    let mut out = String::new();

    out.push_str("=== Ruby fit ===\n");
    if let Some(label) = label {
        out.push_str(&format!("Input: {label}\n"));
    }
    out.push_str(&format!(
        "Converged: {} ({} iterations, {} evaluations)\n",
        outcome.termination.description(),
        outcome.iterations,
        outcome.evaluations
    ));
    out.push_str(&format!("Background: {:.3}\n", summary.background));

    out.push('\n');
    out.push_str(&format!(
        "{:<4} {:>10} {:>12} {:>8} {:>8} {:>12}\n",
        "peak", "center", "amplitude", "sigma", "fwhm", "height"
    ));
    out.push_str(&format!(
        "{:-<4} {:-<10} {:-<12} {:-<8} {:-<8} {:-<12}\n",
        "", "", "", "", "", ""
    ));
    for peak in [&summary.v1, &summary.v2] {
        out.push_str(&format_peak_row(peak));
    }

    out.push('\n');
    out.push_str(&format!("R²: {:.6}\n", summary.r_squared));
    out.push_str(&format!(
        "χ²: {:.4} | reduced χ²: {:.4}\n",
        summary.chi_square, summary.reduced_chi_square
    ));

    out.push('\n');
    out.push_str("R1 calibration:\n");
    out.push_str(&format_calibration(&summary.r1));

    out
}

/// Pressure and temperature readings for one line position.
pub fn format_calibration(reading: &CalibrationReading) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "- line: {:.4} nm\n",
        round_to(reading.wavelength_nm, CENTER_DECIMALS)
    ));
    out.push_str(&format!(
        "- pressure (hydrostatic): {:.3} GPa\n",
        reading.pressure_hydrostatic_gpa
    ));
    out.push_str(&format!(
        "- pressure (Ruby2020): {:.3} GPa\n",
        reading.pressure_ruby2020_gpa
    ));
    out.push_str(&format!("- temperature: {:.1} K\n", reading.temperature_k));
    out
}

pub fn format_conversion_report(report: &ConversionReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Converted {} file(s) into {} dataset file(s)",
        report.files_seen.saturating_sub(report.failures.len()),
        report.written.len()
    ));
    if report.failures.is_empty() {
        out.push('\n');
        return out;
    }
    out.push_str(&format!(", {} failure(s):\n", report.failures.len()));
    for failure in &report.failures {
        out.push_str(&format!("  {}: {}\n", failure.path.display(), failure.message));
    }
    out
}

fn format_params(params: &ParamSet) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<14} {:>12} {:>12} {:>12} {:<5}\n",
        "name", "value", "min", "max", "vary"
    ));
    for p in params.iter() {
        out.push_str(&format!(
            "{:<14} {:>12.4} {:>12} {:>12} {:<5}\n",
            p.name,
            p.value,
            fmt_bound(p.min),
            fmt_bound(p.max),
            p.vary
        ));
    }
    out
}

fn format_peak_row(peak: &PeakSummary) -> String {
    format!(
        "{:<4} {:>10.4} {:>12.2} {:>8.4} {:>8.4} {:>12.2}\n",
        peak.prefix.trim_end_matches('_'),
        round_to(peak.center, CENTER_DECIMALS),
        peak.amplitude,
        peak.sigma,
        peak.fwhm,
        peak.height
    )
}

fn fmt_bound(v: f64) -> String {
    if v.is_infinite() {
        if v > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else {
        format!("{v:.4}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SynthOptions, synthetic_ruby_spectrum};
    use crate::domain::{FitConfig, PeakSeeds};
    use crate::fit::{build_ruby_model, fit_model, summarize_fit};
    use crate::io::FileFailure;

    fn clean_spectrum() -> Spectrum {
        synthetic_ruby_spectrum(&SynthOptions {
            noise_sigma: 0.0,
            ..SynthOptions::default()
        })
        .unwrap()
    }

    #[test]
    fn smoothing_summary_lists_settings() {
        let s = Spectrum::new(vec![1.0, 2.0, 3.0], vec![0.0; 3]).unwrap().with_label("a.txt");
        let text = format_smoothing_summary(&s, &SmoothingConfig::new(3, 1).with_derivative(1, 2.0));
        assert!(text.contains("Input: a.txt"));
        assert!(text.contains("Window: 3 | order: 1 | derivative: 1 | rate: 2"));
    }

    #[test]
    fn initial_guess_shows_every_parameter() {
        let spectrum = clean_spectrum();
        let build = build_ruby_model(&spectrum, &PeakSeeds::default(), &FitConfig::default()).unwrap();
        let text = format_initial_guess(&build);
        for name in ["bkg_c", "v1_center", "v1_amplitude", "v2_sigma"] {
            assert!(text.contains(name), "missing {name}:\n{text}");
        }
        assert!(text.contains("-inf"));
    }

    #[test]
    fn fit_summary_reports_rounded_centers_and_calibration() {
        let spectrum = clean_spectrum();
        let config = FitConfig::default();
        let build = build_ruby_model(&spectrum, &PeakSeeds::default(), &config).unwrap();
        let outcome = fit_model(&build.model, &build.params, &spectrum, &config.optimizer).unwrap();
        let summary = summarize_fit(&outcome, &spectrum, &config.calibration).unwrap();

        let text = format_fit_summary(&summary, &outcome, Some("synthetic"));
        assert!(text.contains("694.5000"), "{text}");
        assert!(text.contains("692.5000"), "{text}");
        assert!(text.contains("R1 calibration:"));
        assert!(text.contains("GPa"));
    }

    #[test]
    fn conversion_report_lists_failures() {
        let report = ConversionReport {
            files_seen: 2,
            written: vec!["a.dpt.Y1.txt".into()],
            failures: vec![FileFailure {
                path: "b.dpt".into(),
                message: "no columns".to_string(),
            }],
        };
        let text = format_conversion_report(&report);
        assert!(text.starts_with("Converted 1 file(s) into 1 dataset file(s), 1 failure(s):"));
        assert!(text.contains("b.dpt: no columns"));
    }
}
