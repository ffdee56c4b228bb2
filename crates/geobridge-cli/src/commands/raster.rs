//! Raster algorithm commands

use anyhow::{Context, Result};
use geobridge::alg::{sieve_filter, Connectedness};
use geobridge::{Access, Dataset, Gdal, Options};
use geobridge_config::Config;
use indicatif::{ProgressBar, ProgressStyle};

/// Print the checksum of one band
pub fn checksum(gdal: &Gdal, dataset: &str, band: usize) -> Result<()> {
    let ds = Dataset::open(gdal, dataset, Access::ReadOnly)
        .with_context(|| format!("Failed to open {}", dataset))?;
    let sum = ds.band(band)?.checksum_full()?;
    println!("{}", sum);
    Ok(())
}

/// Arguments for `geobridge sieve`
#[derive(Debug, Clone)]
pub struct SieveArgs {
    pub dataset: String,
    pub band: usize,
    /// Band receiving the result (defaults to the source band)
    pub dest_band: Option<usize>,
    pub threshold: usize,
    pub eight_connected: bool,
    /// Extra `KEY=VALUE` options after the configured defaults
    pub options: Vec<String>,
    pub quiet: bool,
}

/// Run the sieve filter in place on a dataset opened for update
pub fn sieve(gdal: &Gdal, config: &Config, args: SieveArgs) -> Result<()> {
    let ds = Dataset::open(gdal, &args.dataset, Access::Update)
        .with_context(|| format!("Failed to open {} for update", args.dataset))?;
    let src = ds.band(args.band)?;
    let dest = ds.band(args.dest_band.unwrap_or(args.band))?;

    let options = Options::from_strs(
        config
            .algorithm_options("sieve_filter")
            .iter()
            .chain(args.options.iter()),
    )?;
    let connectedness = if args.eight_connected {
        Connectedness::Eight
    } else {
        Connectedness::Four
    };

    let pb = progress_bar(args.quiet)?;
    let mut report = |fraction: f64, message: &str| {
        pb.set_position((fraction.clamp(0.0, 1.0) * 100.0).round() as u64);
        if !message.is_empty() {
            pb.set_message(message.to_string());
        }
        true
    };

    let result = sieve_filter(
        &src,
        None,
        &dest,
        args.threshold,
        connectedness,
        &options,
        Some(&mut report),
    );
    pb.finish_and_clear();
    result.with_context(|| format!("Sieve filter failed on {}", args.dataset))?;

    if !args.quiet {
        println!(
            "Sieved {} band {} (threshold {}, {:?} connected)",
            args.dataset, args.band, args.threshold, connectedness
        );
    }
    Ok(())
}

fn progress_bar(quiet: bool) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {msg}")
            .context("Invalid progress bar template")?,
    );
    Ok(pb)
}
