//! Answer "which file holds variable V at these sub-axes" from a saved JSON
//! catalog, or list every sub-axis tuple of a variable with its file.

use anyhow::{Result, bail};
use gridcurator::catalog::from_json_file;
use gridcurator::report::init_tracing;
use gridcurator::{Command, LookupOptions};
use std::env;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = match LookupOptions::parse_from(env::args_os().skip(1))? {
        Command::Run(options) => options,
        Command::Help => {
            print!("{}", LookupOptions::usage());
            return Ok(());
        }
    };
    init_tracing("warn");

    let catalog = from_json_file(&options.in_json)?;
    let Some(variable) = catalog.variable(&options.variable) else {
        bail!("variable \"{}\" not found in catalog", options.variable);
    };

    if options.list {
        for (axis_names, table) in &variable.axis_groups {
            for (sub_axis_ids, file_id) in table {
                let selection: Vec<String> = axis_names
                    .iter()
                    .zip(sub_axis_ids)
                    .map(|(axis, id)| format!("{axis}={id}"))
                    .collect();
                let filename = catalog
                    .file(file_id.as_str())
                    .map(|record| record.filename.as_str())
                    .unwrap_or_default();
                println!("{}\t{file_id}\t{filename}", selection.join(" "));
            }
        }
        return Ok(());
    }

    let selection: Vec<(&str, &str)> = options
        .selection
        .iter()
        .map(|(axis, id)| (axis.as_str(), id.as_str()))
        .collect();
    match catalog.locate(&options.variable, &selection) {
        Some((file_id, record)) => {
            println!("{file_id}\t{}", record.filename);
            Ok(())
        }
        None => bail!(
            "no file holds variable \"{}\" at the requested sub-axes",
            options.variable
        ),
    }
}
