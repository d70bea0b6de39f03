//! Gemeinsame CLI-Bausteine der beiden Binaries.

use crate::{ClError, DeviceKind, PlatformInfo, Result, RunConfig, RunReport};
use clap::{Args, ValueEnum};
use log::error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeviceTypeArg {
    Gpu,
    All,
}

impl From<DeviceTypeArg> for DeviceKind {
    fn from(arg: DeviceTypeArg) -> Self {
        match arg {
            DeviceTypeArg::Gpu => DeviceKind::Gpu,
            DeviceTypeArg::All => DeviceKind::All,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Number of elements per array
    #[arg(long, default_value_t = crate::config::DEFAULT_LEN)]
    pub len: usize,

    /// Local work-group size; must divide --len
    #[arg(long = "work-group", default_value_t = crate::config::DEFAULT_WORK_GROUP)]
    pub work_group: usize,

    /// Kernel source file
    #[arg(long, env = "CL_ADDARRAYS_KERNEL", default_value = crate::config::DEFAULT_KERNEL_FILE)]
    pub kernel: PathBuf,

    /// Kernel entry point
    #[arg(long, default_value = crate::config::DEFAULT_ENTRY)]
    pub entry: String,

    /// Print result triples only up to this many elements
    #[arg(long = "display-limit", default_value_t = crate::config::DEFAULT_DISPLAY_LIMIT)]
    pub display_limit: usize,

    #[arg(long = "device-type", value_enum, default_value_t = DeviceTypeArg::Gpu)]
    pub device_type: DeviceTypeArg,
}

impl CommonArgs {
    pub fn into_config(self) -> RunConfig {
        RunConfig {
            len: self.len,
            work_group_size: self.work_group,
            kernel_path: self.kernel,
            entry: self.entry,
            display_limit: self.display_limit,
            device_kind: self.device_type.into(),
            ..RunConfig::default()
        }
    }
}

/// `RUST_LOG` überschreibt den Default `warn`.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
}

pub fn print_platforms(out: &mut impl Write, platforms: &[PlatformInfo]) -> io::Result<()> {
    for p in platforms {
        writeln!(out, "{}: {}", p.index, p.name)?;
    }
    Ok(())
}

/// Liest eine Plattform-Nummer von `input` und prüft sie gegen `count`.
pub fn read_platform_index(mut input: impl BufRead, count: usize) -> Result<usize> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|e| ClError::Input(format!("cannot read platform index: {e}")))?;
    let trimmed = line.trim();
    let index: usize = trimmed
        .parse()
        .map_err(|_| ClError::Input(format!("'{trimmed}' is not a platform index")))?;
    if index >= count {
        return Err(ClError::PlatformIndex { index, count });
    }
    Ok(index)
}

/// Ergebnis-Zeilen (falls klein genug) und Abschlusszeile.
pub fn print_report(out: &mut impl Write, report: &RunReport, display_limit: usize) -> io::Result<()> {
    if report.len() <= display_limit {
        for (i, a, b, c) in report.triples() {
            writeln!(out, "Result {i}: ({a} + {b} = {c})")?;
        }
    }
    if let Some(ns) = report.kernel_time_ns {
        writeln!(out, "Kernel time: {:.3} ms", ns as f64 / 1e6)?;
    }
    writeln!(out, "Done with size {}!", report.len())
}

/// Loggt einen Fehler genau einmal und liefert den Prozess-Exit-Code.
pub fn exit_code(result: &Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{e}");
            1
        }
    }
}
