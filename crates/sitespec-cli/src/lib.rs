//! CLI logic for the sitespec tool.
//!
//! This module contains the core CLI logic: load the configuration, resolve
//! and parse the root file, and write the IR or syntax tree dump.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{fs, io::Write};

use log::info;

use sitespec::{SiteSpecError, SpecLoader, config::OutputFormat, print_ast};

/// Run the sitespec CLI application
///
/// This function processes the input file through the sitespec pipeline
/// and writes the resulting dump to the output file, or stdout.
///
/// # Errors
///
/// Returns `SiteSpecError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Import, syntax and (in strict mode) semantic errors
/// - JSON serialization errors
pub fn run(args: &Args) -> Result<(), SiteSpecError> {
    info!(
        input_path = args.input,
        output_path:? = args.output;
        "Processing site spec"
    );

    let mut app_config = config::load_config(args.config.as_ref())?;
    if let Some(format) = &args.format {
        let format: OutputFormat = format.parse().map_err(SiteSpecError::Config)?;
        app_config = app_config.with_format(format);
    }

    let loader = SpecLoader::new(app_config);
    let dump = if args.ast {
        print_ast(&loader.load_ast(&args.input)?)
    } else {
        let spec = loader.load(&args.input)?;
        loader.render(&spec)?
    };

    match &args.output {
        Some(path) => {
            fs::write(path, dump)?;
            info!(output_file = path; "Dump written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(dump.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}
