//! Listet Plattformen, fragt eine Auswahl ab, zeigt Versionen und addiert
//! mit seitenausgerichteten Host-Arrays.

use clap::Parser;
use cl_addarrays::cli::{
    exit_code, init_logging, print_platforms, print_report, read_platform_index, CommonArgs,
};
use cl_addarrays::platform::{enumerate_platforms, select_platform};
use cl_addarrays::{execute, ClSession, InputPattern, PlatformChoice, Result};
use std::io::{self, Write};
use std::process::ExitCode;

#[cfg(feature = "metrics")]
use cl_addarrays::summary;

#[derive(Parser, Debug)]
#[command(version, about = "Pick an OpenCL platform and add two integer arrays")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Platform index; prompts on stdin when omitted
    #[arg(long)]
    platform: Option<usize>,

    /// Enable queue profiling and report the kernel time
    #[arg(long)]
    profile: bool,
}

fn main() -> ExitCode {
    init_logging();
    ExitCode::from(exit_code(&try_main(Args::parse())))
}

fn try_main(args: Args) -> Result<()> {
    let mut out = io::stdout().lock();

    /* ---------- 1. Plattformen ------------------------------------ */
    let platforms = enumerate_platforms()?;
    print_platforms(&mut out, &platforms)?;

    let index = match args.platform {
        Some(i) => i,
        None => {
            write!(out, "Select platform: ")?;
            out.flush()?;
            read_platform_index(io::stdin().lock(), platforms.len())?
        }
    };
    let platform = select_platform(&platforms, PlatformChoice::Index(index))?;
    writeln!(out, "Platform: {} ({})", platform.name, platform.vendor)?;
    writeln!(out, "Platform version: {}", platform.version_string)?;

    /* ---------- 2. Gerät, Kontext, Queue -------------------------- */
    let mut config = args.common.into_config();
    config.platform = PlatformChoice::Index(index);
    config.profiling = args.profile;
    config.page_aligned = true;
    config.pattern = InputPattern::Mirrored;
    config.validate()?;

    let session = ClSession::open(platform, config.device_kind, config.profiling)?;
    let device = session.device_info();
    writeln!(out, "Device: {} ({})", device.name, device.vendor)?;
    writeln!(out, "Device version: {}", device.version_string)?;
    writeln!(out, "Driver version: {}", device.driver_version)?;
    writeln!(out, "OpenCL C version: {}", device.opencl_c_version)?;

    /* ---------- 3. Lauf ------------------------------------------- */
    let report = execute(&session, &config)?;
    print_report(&mut out, &report, config.display_limit)?;
    report.verify()?;

    #[cfg(feature = "metrics")]
    summary();

    Ok(())
}
