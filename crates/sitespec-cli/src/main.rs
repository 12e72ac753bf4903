use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};
use miette::GraphicalReportHandler;

use sitespec::SiteSpecError;
use sitespec_cli::{Args, error_adapter::to_reportables};

fn main() {
    miette::set_panic_hook();

    let args = Args::parse();
    init_logger(&args.log_level);
    debug!(args:?; "Parsed arguments");

    match sitespec_cli::run(&args) {
        Ok(()) => info!(input = args.input; "Done"),
        Err(err) => {
            let count = report(&err);
            error!(input = args.input, problems = count; "Failed to process site spec");
            process::exit(1);
        }
    }
}

fn init_logger(level: &str) {
    let filter = LevelFilter::from_str(level).unwrap_or_else(|_| {
        eprintln!("Invalid log level `{level}`, falling back to `warn`");
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(filter)
        .init();
}

/// Render every diagnostic of `err` to stderr and return how many there were.
fn report(err: &SiteSpecError) -> usize {
    let handler = GraphicalReportHandler::new();
    let reportables = to_reportables(err);

    for reportable in &reportables {
        let mut out = String::new();
        if handler.render_report(&mut out, reportable).is_err() {
            out = reportable.to_string();
        }
        eprintln!("{out}");
    }
    reportables.len()
}
