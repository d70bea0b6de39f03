//! Addiert zwei Integer-Arrays auf der ersten GPU der ersten Plattform.

use clap::Parser;
use cl_addarrays::cli::{exit_code, init_logging, print_report, CommonArgs};
use cl_addarrays::{run, InputPattern, PlatformChoice, Result};
use std::io;
use std::process::ExitCode;

#[cfg(feature = "metrics")]
use cl_addarrays::summary;

#[derive(Parser, Debug)]
#[command(version, about = "Add two integer arrays on the first OpenCL GPU")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    init_logging();
    ExitCode::from(exit_code(&try_main(Args::parse())))
}

fn try_main(args: Args) -> Result<()> {
    let mut config = args.common.into_config();
    config.platform = PlatformChoice::First;
    config.pattern = InputPattern::Ascending;

    let report = run(&config)?;
    print_report(&mut io::stdout().lock(), &report, config.display_limit)?;
    report.verify()?;

    #[cfg(feature = "metrics")]
    summary();

    Ok(())
}
