//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads spectra, configs and sessions
//! - runs smoothing, fitting, conversion or calibration
//! - prints reports and writes optional exports

use std::path::Path;

use clap::Parser;

use crate::calibration::{calibrate_line, line_position_at, temperature_from_line};
use crate::cli::{
    Command, ConvertArgs, FitArgs, SeedArgs, SmoothArgs, SynthArgs, TemperatureArgs, WavelengthArgs,
};
use crate::data::{SynthOptions, synthetic_ruby_spectrum};
use crate::domain::{FitConfig, PeakSeeds, RubyCalibration, SmoothingConfig};
use crate::error::AppError;
use crate::io::{
    ColumnTableDecoder, convert_tree, load_spectrum, read_fit_config, read_session,
    write_components_csv, write_session, write_spectrum_csv,
};
use crate::math::smooth_spectrum;

pub mod pipeline;

/// Entry point for the `specfit` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Smooth(args) => handle_smooth(args),
        Command::Fit(args) => handle_fit(args),
        Command::Synth(args) => handle_synth(args),
        Command::Convert(args) => handle_convert(args),
        Command::Pressure(args) => handle_pressure(args),
        Command::Temperature(args) => handle_temperature(args),
        Command::LinePosition(args) => handle_line_position(args),
    }
}

fn handle_smooth(args: SmoothArgs) -> Result<(), AppError> {
    let config = smoothing_config_from_args(&args);
    let input = load_spectrum(&args.input)?.spectrum;
    let smoothed = smooth_spectrum(&input, &config)?;

    match &args.output {
        Some(path) => {
            write_spectrum_csv(path, &smoothed)?;
            println!("{}", crate::report::format_smoothing_summary(&input, &config));
            log::info!("wrote {} samples to {}", smoothed.len(), path.display());
        }
        None => {
            for (x, y) in smoothed.x.iter().zip(&smoothed.y) {
                println!("{x},{y}");
            }
        }
    }
    Ok(())
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = load_config(args.config.as_deref())?;

    let mut session = match &args.session {
        Some(path) => read_session(path)?.unwrap_or_default(),
        None => Default::default(),
    };
    session.seeds = seeds_from_args(session.seeds, &args.seeds);

    let ingest = load_spectrum(&args.input)?;
    let spectrum = ingest.spectrum;

    let run = pipeline::run_fit(&spectrum, &mut session, &config, args.guess_only)?;
    println!("{}", crate::report::format_initial_guess(&run.build));

    let Some(refit) = &run.refit else {
        return Ok(());
    };

    println!(
        "{}",
        crate::report::format_fit_summary(&refit.summary, &refit.outcome, spectrum.label.as_deref())
    );

    if let Some(path) = &args.export_components {
        write_components_csv(path, &spectrum, &refit.outcome)?;
    }
    if let Some(path) = &args.session {
        write_session(path, &session)?;
    }
    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let spectrum = synthetic_ruby_spectrum(&SynthOptions {
        seed: args.seed,
        noise_sigma: args.noise,
        ..SynthOptions::default()
    })?;
    write_spectrum_csv(&args.output, &spectrum)?;
    log::info!("wrote {} samples to {}", spectrum.len(), args.output.display());
    Ok(())
}

fn handle_convert(args: ConvertArgs) -> Result<(), AppError> {
    let report = convert_tree(&args.dir, &ColumnTableDecoder::default())?;
    print!("{}", crate::report::format_conversion_report(&report));
    Ok(())
}

fn handle_pressure(args: WavelengthArgs) -> Result<(), AppError> {
    let cal = load_calibration(args.config.as_deref())?;
    let reading = calibrate_line(args.wavelength, &cal)?;
    print!("{}", crate::report::format_calibration(&reading));
    Ok(())
}

fn handle_temperature(args: WavelengthArgs) -> Result<(), AppError> {
    let cal = load_calibration(args.config.as_deref())?;
    println!("{:.1}", temperature_from_line(args.wavelength, &cal)?);
    Ok(())
}

fn handle_line_position(args: TemperatureArgs) -> Result<(), AppError> {
    let cal = load_calibration(args.config.as_deref())?;
    println!("{:.4}", line_position_at(args.temperature, &cal)?);
    Ok(())
}

pub fn smoothing_config_from_args(args: &SmoothArgs) -> SmoothingConfig {
    SmoothingConfig::new(args.window, args.order).with_derivative(args.deriv, args.rate)
}

/// Apply command-line seed overrides on top of `base`.
pub fn seeds_from_args(base: PeakSeeds, args: &SeedArgs) -> PeakSeeds {
    let mut seeds = base;
    let overrides = [
        (&mut seeds.v1.center, args.v1_center),
        (&mut seeds.v1.amplitude, args.v1_amplitude),
        (&mut seeds.v1.sigma, args.v1_sigma),
        (&mut seeds.v2.center, args.v2_center),
        (&mut seeds.v2.amplitude, args.v2_amplitude),
        (&mut seeds.v2.sigma, args.v2_sigma),
    ];
    for (slot, value) in overrides {
        if let Some(v) = value {
            *slot = v;
        }
    }
    seeds
}

fn load_config(path: Option<&Path>) -> Result<FitConfig, AppError> {
    match path {
        Some(path) => read_fit_config(path),
        None => Ok(FitConfig::default()),
    }
}

fn load_calibration(path: Option<&Path>) -> Result<RubyCalibration, AppError> {
    Ok(load_config(path)?.calibration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_overrides_replace_only_given_values() {
        let base = PeakSeeds::default();
        let args = SeedArgs {
            v1_sigma: Some(0.5),
            v2_center: Some(695.0),
            ..SeedArgs::default()
        };
        let seeds = seeds_from_args(base, &args);
        assert_eq!(seeds.v1.sigma, 0.5);
        assert_eq!(seeds.v2.center, 695.0);
        assert_eq!(seeds.v1.center, base.v1.center);
        assert_eq!(seeds.v2.amplitude, base.v2.amplitude);
    }
}
