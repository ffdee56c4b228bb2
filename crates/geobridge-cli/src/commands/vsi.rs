//! Virtual file system commands

use anyhow::{bail, Context, Result};
use geobridge::{Gdal, StatFlags};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

const DIR_MODE: u32 = 0o755;

/// Print the size and kind of a path
pub fn stat(gdal: &Gdal, path: &str) -> Result<()> {
    let Some(stat) = gdal.stat(path, StatFlags::ALL)? else {
        bail!("No such file or directory: {}", path);
    };
    let kind = if stat.is_dir() {
        "directory"
    } else if stat.is_file() {
        "file"
    } else {
        "other"
    };
    println!("{}: {}, {} bytes, mode {:o}", path, kind, stat.size, stat.mode & 0o7777);
    Ok(())
}

/// Copy a virtual file to stdout
pub fn cat(gdal: &Gdal, path: &str) -> Result<()> {
    let mut file = gdal
        .open(path, "rb")
        .with_context(|| format!("Failed to open {}", path))?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    io::copy(&mut file, &mut out).with_context(|| format!("Failed to read {}", path))?;
    out.flush()?;
    file.close()?;
    Ok(())
}

/// Copy a local file into the virtual file system
pub fn put(gdal: &Gdal, source: &Path, dest: &str) -> Result<()> {
    let mut input =
        File::open(source).with_context(|| format!("Failed to open {}", source.display()))?;
    let mut file = gdal
        .open(dest, "wb")
        .with_context(|| format!("Failed to create {}", dest))?;
    let copied = io::copy(&mut input, &mut file).with_context(|| format!("Failed to write {}", dest))?;
    file.close()?;
    println!("{} bytes -> {}", copied, dest);
    Ok(())
}

/// List a directory, one entry per line
pub fn ls(gdal: &Gdal, path: &str) -> Result<()> {
    for name in gdal.read_dir(path)? {
        println!("{}", name);
    }
    Ok(())
}

pub fn mkdir(gdal: &Gdal, path: &str, parents: bool) -> Result<()> {
    if parents {
        gdal.mkdir_recursive(path, DIR_MODE)?;
    } else {
        gdal.mkdir(path, DIR_MODE)?;
    }
    Ok(())
}

pub fn rmdir(gdal: &Gdal, path: &str) -> Result<()> {
    gdal.rmdir(path)?;
    Ok(())
}

pub fn rm(gdal: &Gdal, path: &str) -> Result<()> {
    gdal.unlink(path)?;
    Ok(())
}

pub fn mv(gdal: &Gdal, from: &str, to: &str) -> Result<()> {
    gdal.rename(from, to)
        .with_context(|| format!("Failed to move {} to {}", from, to))?;
    Ok(())
}

/// Describe a VSI error number
pub fn strerror(gdal: &Gdal, errno: i32) -> Result<()> {
    println!("{}", gdal.strerror(errno));
    Ok(())
}
