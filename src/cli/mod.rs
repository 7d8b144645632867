//! Command-line parsing for the spectrum smoothing and ruby fitting tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the numerical code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "specfit",
    version,
    about = "Savitzky-Golay smoothing and ruby fluorescence peak fitting"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Smooth (or differentiate) a two-column spectrum.
    Smooth(SmoothArgs),
    /// Fit a constant background plus two Voigt peaks to a ruby spectrum.
    Fit(FitArgs),
    /// Write a synthetic ruby spectrum.
    Synth(SynthArgs),
    /// Convert every multi-column table under a directory into x,y text files.
    Convert(ConvertArgs),
    /// Pressure (GPa) from an R1 line position in nm.
    Pressure(WavelengthArgs),
    /// Temperature (K) from an R1 line position in nm.
    Temperature(WavelengthArgs),
    /// Expected R1 line position (nm) at a temperature in K.
    LinePosition(TemperatureArgs),
}

#[derive(Debug, Args, Clone)]
pub struct SmoothArgs {
    /// Two-column text file (x, y).
    pub input: PathBuf,

    /// Odd window length in samples.
    #[arg(short = 'w', long, default_value_t = 11)]
    pub window: usize,

    /// Polynomial order (must be below window - 1).
    #[arg(short = 'p', long, default_value_t = 3)]
    pub order: usize,

    /// Derivative order (0 = smoothing).
    #[arg(short = 'd', long, default_value_t = 0)]
    pub deriv: usize,

    /// Sampling rate (samples per x unit); scales derivatives.
    #[arg(long, default_value_t = 1.0)]
    pub rate: f64,

    /// Write the smoothed spectrum here instead of printing it.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

/// Seeds given on the command line override the session and the defaults.
#[derive(Debug, Args, Clone, Default)]
pub struct SeedArgs {
    #[arg(long)]
    pub v1_center: Option<f64>,
    #[arg(long)]
    pub v1_amplitude: Option<f64>,
    #[arg(long)]
    pub v1_sigma: Option<f64>,
    #[arg(long)]
    pub v2_center: Option<f64>,
    #[arg(long)]
    pub v2_amplitude: Option<f64>,
    #[arg(long)]
    pub v2_sigma: Option<f64>,
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Two-column text file (wavelength nm, intensity).
    pub input: PathBuf,

    #[command(flatten)]
    pub seeds: SeedArgs,

    /// Session file holding the last refined seeds (read, then updated).
    #[arg(long, value_name = "JSON")]
    pub session: Option<PathBuf>,

    /// Bounds / calibration / optimizer settings.
    #[arg(long, value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// Only evaluate the model at the seeds; no refinement.
    #[arg(long)]
    pub guess_only: bool,

    /// Export data, best fit, residual and components to CSV.
    #[arg(long = "export-components", value_name = "CSV")]
    pub export_components: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    /// Output file (x,y).
    pub output: PathBuf,

    /// Random seed for the noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Gaussian noise standard deviation.
    #[arg(long, default_value_t = 10.0)]
    pub noise: f64,
}

#[derive(Debug, Args, Clone)]
pub struct ConvertArgs {
    /// Root directory to walk.
    pub dir: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct WavelengthArgs {
    /// Line position in nm.
    pub wavelength: f64,

    /// Calibration constants (`calibration` section of a fit config).
    #[arg(long, value_name = "JSON")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct TemperatureArgs {
    /// Temperature in K.
    pub temperature: f64,

    #[arg(long, value_name = "JSON")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn fit_seed_flags_are_optional() {
        let cli = Cli::parse_from(["specfit", "fit", "ruby.txt", "--v2-center", "694.9", "--guess-only"]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.seeds.v2_center, Some(694.9));
        assert_eq!(args.seeds.v1_center, None);
        assert!(args.guess_only);
    }

    #[test]
    fn smooth_defaults() {
        let cli = Cli::parse_from(["specfit", "smooth", "a.txt"]);
        let Command::Smooth(args) = cli.command else {
            panic!("expected smooth");
        };
        assert_eq!((args.window, args.order, args.deriv), (11, 3, 0));
    }
}
