//! Build (or extend) a catalog from a directory of data files and write it
//! out as JSON and/or XML.
//!
//! Outputs are only written after the whole scan succeeded; a failure leaves
//! any existing output files untouched.

use anyhow::{Context, Result};
use gridcurator::catalog::{from_json_file, to_json_file, to_xml_file};
use gridcurator::report::init_tracing;
use gridcurator::{Catalog, Command, CurateOptions, FormatOpener, Reporter};
use std::env;
use tracing::warn;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = match CurateOptions::parse_from(env::args_os().skip(1))? {
        Command::Run(options) => options,
        Command::Help => {
            print!("{}", CurateOptions::usage());
            return Ok(());
        }
    };
    init_tracing("info");
    let reporter = Reporter::from_env();

    let mut catalog = match &options.in_json {
        Some(path) => {
            reporter.progress(format_args!("loading catalog {}", path.display()));
            from_json_file(path)?
        }
        None => Catalog::new(),
    };

    if let Some(path) = &options.path {
        let opener = FormatOpener::new(options.format);
        let summary = catalog
            .populate_from_file_path(path, &options.pattern, options.recurse, &opener, &reporter)
            .with_context(|| format!("building catalog from {}", path.display()))?;
        reporter.scan_finished(&summary);
    }

    if options.out_xml.is_none() && options.out_json.is_none() {
        warn!("no --out_xml or --out_json given; catalog not written");
    }
    if let Some(path) = &options.out_xml {
        to_xml_file(&catalog, path)?;
        reporter.progress(format_args!("wrote {}", path.display()));
    }
    if let Some(path) = &options.out_json {
        to_json_file(&catalog, path, options.out_pretty)?;
        reporter.progress(format_args!("wrote {}", path.display()));
    }
    Ok(())
}
