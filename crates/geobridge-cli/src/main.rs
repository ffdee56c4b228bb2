use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geobridge::Gdal;
use std::path::PathBuf;

mod commands;
mod config;

/// Command-line access to the GDAL virtual file system and raster algorithms.
///
/// Loads the native GDAL library at startup, installs the virtual file system
/// handlers listed in geobridge.toml, and runs one operation through it.
///
/// EXAMPLES:
///     geobridge ls /vsimem/                        List memory files
///     geobridge put tile.png /vsimem/tile.png      Copy a local file in
///     geobridge cat /vsizip/archive.zip/readme     Print a file
///     geobridge checksum dem.tif --band 1          Checksum a raster band
///     geobridge sieve classes.tif --threshold 25   Remove small regions
///
/// ENVIRONMENT VARIABLES:
///     GEOBRIDGE_LIBRARY  Path to the native GDAL library
///     GEOBRIDGE_LOG      Log filter, e.g. "debug" or "geobridge=trace,warn"
#[derive(Parser)]
#[command(name = "geobridge")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Native library to load: a path, or a short name such as "gdal"
    #[arg(long, global = true)]
    library: Option<String>,

    /// Log filter directives (overrides GEOBRIDGE_LOG and config files)
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the size and kind of a virtual path
    ///
    /// EXAMPLES:
    ///     geobridge stat /vsimem/tile.png
    ///     geobridge stat /vsisubfile/512_1024,data.bin
    Stat {
        /// Virtual file system path
        path: String,
    },

    /// Write the contents of a virtual file to stdout
    ///
    /// EXAMPLES:
    ///     geobridge cat /vsimem/notes.txt
    ///     geobridge cat /vsisubfile/0_64,header.bin | xxd
    Cat {
        /// Virtual file system path
        path: String,
    },

    /// Copy a local file into the virtual file system
    ///
    /// EXAMPLES:
    ///     geobridge put dem.tif /vsimem/dem.tif
    Put {
        /// Local file to read
        source: PathBuf,
        /// Destination virtual path
        dest: String,
    },

    /// List the entries of a virtual directory
    ///
    /// EXAMPLES:
    ///     geobridge ls /vsimem/
    Ls {
        /// Virtual directory path
        path: String,
    },

    /// Create a virtual directory
    ///
    /// EXAMPLES:
    ///     geobridge mkdir /vsimem/tiles
    ///     geobridge mkdir -p /vsimem/tiles/12/2048
    Mkdir {
        /// Directory to create
        path: String,
        /// Create missing parent directories too
        #[arg(long, short = 'p')]
        parents: bool,
    },

    /// Remove an empty virtual directory
    Rmdir {
        /// Directory to remove
        path: String,
    },

    /// Delete a virtual file
    Rm {
        /// File to delete
        path: String,
    },

    /// Rename a virtual file
    ///
    /// EXAMPLES:
    ///     geobridge mv /vsimem/a.tif /vsimem/b.tif
    Mv {
        /// Current path
        from: String,
        /// New path
        to: String,
    },

    /// Describe a VSI error number
    Strerror {
        /// Error number reported by a failed operation
        errno: i32,
    },

    /// Print the checksum of a raster band
    ///
    /// EXAMPLES:
    ///     geobridge checksum dem.tif
    ///     geobridge checksum /vsimem/rgb.tif --band 3
    Checksum {
        /// Dataset to open
        dataset: String,
        /// 1-based band index
        #[arg(long, short = 'b', default_value_t = 1)]
        band: usize,
    },

    /// Merge raster regions smaller than a threshold into their neighbors
    ///
    /// Runs in place on a dataset opened for update. Default options come
    /// from [options.sieve_filter] in geobridge.toml; --option adds more.
    ///
    /// EXAMPLES:
    ///     geobridge sieve classes.tif --threshold 25
    ///     geobridge sieve classes.tif -t 10 --eight --dest-band 2
    Sieve {
        /// Dataset to filter
        dataset: String,
        /// Minimum region size in pixels
        #[arg(long, short = 't')]
        threshold: usize,
        /// 1-based source band index
        #[arg(long, short = 'b', default_value_t = 1)]
        band: usize,
        /// Band receiving the result (defaults to the source band)
        #[arg(long)]
        dest_band: Option<usize>,
        /// Use 8-connectedness instead of 4
        #[arg(long)]
        eight: bool,
        /// Extra KEY=VALUE algorithm option (repeatable)
        #[arg(long = "option", short = 'o')]
        options: Vec<String>,
        /// Hide the progress bar
        #[arg(long, short = 'q')]
        quiet: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let overrides = config::Overrides {
        library: cli.library,
        log: cli.log,
    };
    let config = config::load(&std::env::current_dir()?, &overrides)?;
    config::init_logging(config.log_filter())?;

    let gdal = Gdal::from_config(&config).with_context(|| {
        format!(
            "Failed to load GDAL library '{}'",
            config::library_label(&config)
        )
    })?;
    tracing::debug!(origin = gdal.origin(), "native library ready");

    match cli.command {
        Commands::Stat { path } => commands::vsi::stat(&gdal, &path)?,
        Commands::Cat { path } => commands::vsi::cat(&gdal, &path)?,
        Commands::Put { source, dest } => commands::vsi::put(&gdal, &source, &dest)?,
        Commands::Ls { path } => commands::vsi::ls(&gdal, &path)?,
        Commands::Mkdir { path, parents } => commands::vsi::mkdir(&gdal, &path, parents)?,
        Commands::Rmdir { path } => commands::vsi::rmdir(&gdal, &path)?,
        Commands::Rm { path } => commands::vsi::rm(&gdal, &path)?,
        Commands::Mv { from, to } => commands::vsi::mv(&gdal, &from, &to)?,
        Commands::Strerror { errno } => commands::vsi::strerror(&gdal, errno)?,
        Commands::Checksum { dataset, band } => {
            commands::raster::checksum(&gdal, &dataset, band)?
        }
        Commands::Sieve {
            dataset,
            threshold,
            band,
            dest_band,
            eight,
            options,
            quiet,
        } => {
            let args = commands::raster::SieveArgs {
                dataset,
                band,
                dest_band,
                threshold,
                eight_connected: eight,
                options,
                quiet,
            };
            commands::raster::sieve(&gdal, &config, args)?;
        }
    }

    Ok(())
}
