//! Compiles a list of C++ modules into object files, then links them into a single executable.
use std::process::ExitCode;

use clap::{ColorChoice, Parser};

mod cli;
mod config;
mod dirs;
mod driver;
mod error;
mod process;
mod report;
mod toolchain;
mod unit;

use crate::cli::{Args, Print};
use crate::driver::BuildDriver;
use crate::process::SystemRunner;

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    if args.color == ColorChoice::Never {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    } else if args.color == ColorChoice::Always {
        console::set_colors_enabled(true);
        console::set_colors_enabled_stderr(true);
    }

    let root = args.root().to_path_buf();
    let config = args.config()?;

    if args.print == Some(Print::Config) {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(ExitCode::SUCCESS);
    }

    let driver = BuildDriver::new(config, &root, SystemRunner::new(&root));

    if args.print == Some(Print::Commands) {
        for invocation in driver.plan()? {
            println!("{invocation}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    let report = driver
        .with_progress(driver::progress_bar()?)
        .verbose(args.verbose)
        .build()?;

    if let Some(path) = args.report_path() {
        report.write(&path)?;
    }

    Ok(report.exit_code())
}
