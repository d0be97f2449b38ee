#![allow(dead_code)]

use anyhow::{Context, Result, bail};
use gridcurator::{DataType, FileHeader, MemoryOpener};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

pub const LEVELS: [f64; 3] = [1000.0, 500.0, 200.0];

pub fn curate_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_curate"))
}

pub fn lookup_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_catalog-lookup"))
}

pub fn run_command(mut cmd: Command) -> Result<Output> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to run command: {:?}", cmd))?;
    if output.status.success() {
        Ok(output)
    } else {
        bail!(
            "command {:?} failed: status {:?}\nstdout: {}\nstderr: {}",
            cmd,
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    }
}

/// One time step on the standard pressure levels with `T(time, lev)`.
pub fn time_slice(time: f64, temperature_units: &str) -> FileHeader {
    FileHeader::new()
        .attribute("Conventions", "CF-1.6")
        .attribute("source", "model")
        .dimension("time", 1)
        .dimension("lev", LEVELS.len())
        .coordinate(
            "time",
            DataType::Double,
            &[time],
            &[("units", "days since 2000-01-01")],
        )
        .coordinate(
            "lev",
            DataType::Double,
            &LEVELS,
            &[("units", "hPa"), ("long_name", "pressure")],
        )
        .variable(
            "T",
            DataType::Float,
            &["time", "lev"],
            &[("units", temperature_units), ("long_name", "temperature")],
        )
}

/// In-memory opener serving `headers` under `base`.
pub fn memory_opener(base: &Path, headers: Vec<(&str, FileHeader)>) -> MemoryOpener {
    let mut opener = MemoryOpener::new();
    for (name, header) in headers {
        opener.insert(base.join(name), header);
    }
    opener
}

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|name| name.to_string()).collect()
}

/// Store `header` as a JSON header file at `dir/name`.
pub fn write_header(dir: &Path, name: &str, header: &FileHeader) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_vec_pretty(header)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
