//! Command-line and environment configuration for the binaries.
//!
//! There is no configuration file. `curate` and `catalog-lookup` take flags,
//! and the process rank (which decides who reports progress) comes from the
//! environment.

use crate::source::SourceFormat;
use anyhow::{Result, anyhow, bail};
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

pub const DEFAULT_PATTERN: &str = "*.nc";

/// Rank variables consulted in order; the first one that parses wins.
const RANK_VARIABLES: [&str; 3] = ["GRIDCURATOR_RANK", "PMI_RANK", "OMPI_COMM_WORLD_RANK"];

/// Outcome of parsing a command line: either options to run with or a
/// request for the usage text.
#[derive(Clone, Debug, PartialEq)]
pub enum Command<T> {
    Run(T),
    Help,
}

/// Everything `curate` needs to know.
#[derive(Clone, Debug, PartialEq)]
pub struct CurateOptions {
    pub path: Option<PathBuf>,
    pub pattern: String,
    pub recurse: bool,
    pub in_json: Option<PathBuf>,
    pub out_xml: Option<PathBuf>,
    pub out_json: Option<PathBuf>,
    pub out_pretty: bool,
    pub format: SourceFormat,
}

impl Default for CurateOptions {
    fn default() -> Self {
        Self {
            path: None,
            pattern: DEFAULT_PATTERN.to_string(),
            recurse: false,
            in_json: None,
            out_xml: None,
            out_json: None,
            out_pretty: false,
            format: SourceFormat::Auto,
        }
    }
}

impl CurateOptions {
    pub fn usage() -> &'static str {
        "Usage: curate [--path DIR] [--ext PATTERN] [--recurse] [--in_json FILE] [--out_xml FILE] [--out_json FILE] [--out_pretty] [--format auto|netcdf|header]\n\
Builds a catalog of the files in DIR matching PATTERN (default *.nc), optionally appending to the catalog in --in_json, and writes it as XML and/or JSON.\n"
    }

    pub fn parse_from(args: impl IntoIterator<Item = OsString>) -> Result<Command<Self>> {
        let mut args = args.into_iter();
        let mut options = Self::default();

        while let Some(arg_os) = args.next() {
            let arg = arg_os
                .into_string()
                .map_err(|_| anyhow!("argument is not valid UTF-8"))?;
            match arg.as_str() {
                "--path" => options.path = Some(PathBuf::from(next_value(&mut args, "--path")?)),
                "--ext" => options.pattern = next_value(&mut args, "--ext")?,
                "--recurse" => options.recurse = true,
                "--in_json" => {
                    options.in_json = Some(PathBuf::from(next_value(&mut args, "--in_json")?))
                }
                "--out_xml" => {
                    options.out_xml = Some(PathBuf::from(next_value(&mut args, "--out_xml")?))
                }
                "--out_json" => {
                    options.out_json = Some(PathBuf::from(next_value(&mut args, "--out_json")?))
                }
                "--out_pretty" => options.out_pretty = true,
                "--format" => {
                    options.format = SourceFormat::parse(&next_value(&mut args, "--format")?)?
                }
                "--help" | "-h" => return Ok(Command::Help),
                other => bail!("unknown flag: {other}"),
            }
        }

        if options.path.is_none() && options.in_json.is_none() {
            bail!("at least one of --path or --in_json is required");
        }
        if options.pattern.is_empty() {
            bail!("--ext must not be empty");
        }
        Ok(Command::Run(options))
    }
}

/// Options for `catalog-lookup`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LookupOptions {
    pub in_json: PathBuf,
    pub variable: String,
    /// (axis name, sub-axis id) in dimension order.
    pub selection: Vec<(String, String)>,
    pub list: bool,
}

impl LookupOptions {
    pub fn usage() -> &'static str {
        "Usage: catalog-lookup --in_json FILE --variable NAME [--axis NAME=SUBAXIS ...] [--list]\n\
Prints the file holding NAME at the given sub-axes, or with --list every sub-axis tuple of NAME and its file.\n"
    }

    pub fn parse_from(args: impl IntoIterator<Item = OsString>) -> Result<Command<Self>> {
        let mut args = args.into_iter();
        let mut in_json: Option<PathBuf> = None;
        let mut variable: Option<String> = None;
        let mut selection = Vec::new();
        let mut list = false;

        while let Some(arg_os) = args.next() {
            let arg = arg_os
                .into_string()
                .map_err(|_| anyhow!("argument is not valid UTF-8"))?;
            match arg.as_str() {
                "--in_json" => in_json = Some(PathBuf::from(next_value(&mut args, "--in_json")?)),
                "--variable" => variable = Some(next_value(&mut args, "--variable")?),
                "--axis" => {
                    let raw = next_value(&mut args, "--axis")?;
                    let Some((axis, sub_axis)) = raw.split_once('=') else {
                        bail!("--axis expects NAME=SUBAXIS, got {raw}");
                    };
                    if axis.is_empty() || sub_axis.is_empty() {
                        bail!("--axis expects NAME=SUBAXIS, got {raw}");
                    }
                    selection.push((axis.to_string(), sub_axis.to_string()));
                }
                "--list" => list = true,
                "--help" | "-h" => return Ok(Command::Help),
                other => bail!("unknown flag: {other}"),
            }
        }

        let in_json = in_json.ok_or_else(|| anyhow!("missing required --in_json"))?;
        let variable = variable.ok_or_else(|| anyhow!("missing required --variable"))?;
        if !list && selection.is_empty() {
            bail!("provide --axis NAME=SUBAXIS pairs or --list");
        }
        Ok(Command::Run(Self {
            in_json,
            variable,
            selection,
            list,
        }))
    }
}

fn next_value(args: &mut impl Iterator<Item = OsString>, flag: &str) -> Result<String> {
    args.next()
        .map(|os| {
            os.into_string()
                .map_err(|_| anyhow!("value for {flag} is not valid UTF-8"))
        })
        .transpose()?
        .ok_or_else(|| anyhow!("missing value for {flag}"))
}

/// Rank of this process within its group, 0 when not launched as a group.
pub fn process_rank() -> u32 {
    RANK_VARIABLES
        .iter()
        .find_map(|name| env::var(name).ok()?.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    #[test]
    fn curate_defaults_and_flags() {
        let parsed = CurateOptions::parse_from(args(&[
            "--path",
            "/data",
            "--recurse",
            "--out_json",
            "out.json",
            "--out_pretty",
            "--format",
            "header",
        ]))
        .unwrap();
        let Command::Run(options) = parsed else {
            panic!("expected options");
        };
        assert_eq!(options.path, Some(PathBuf::from("/data")));
        assert_eq!(options.pattern, DEFAULT_PATTERN);
        assert!(options.recurse);
        assert!(options.out_pretty);
        assert_eq!(options.format, SourceFormat::Header);
        assert!(options.out_xml.is_none());
    }

    #[test]
    fn curate_requires_an_input() {
        let err = CurateOptions::parse_from(args(&["--out_json", "x.json"])).unwrap_err();
        assert!(err.to_string().contains("--path or --in_json"));
        let err = CurateOptions::parse_from(args(&["--path"])).unwrap_err();
        assert!(err.to_string().contains("missing value for --path"));
        assert_eq!(
            CurateOptions::parse_from(args(&["--help"])).unwrap(),
            Command::Help
        );
    }

    #[test]
    fn lookup_parses_axis_pairs() {
        let parsed = LookupOptions::parse_from(args(&[
            "--in_json",
            "c.json",
            "--variable",
            "T",
            "--axis",
            "time=1",
            "--axis",
            "lev=0",
        ]))
        .unwrap();
        let Command::Run(options) = parsed else {
            panic!("expected options");
        };
        assert_eq!(
            options.selection,
            vec![
                ("time".to_string(), "1".to_string()),
                ("lev".to_string(), "0".to_string())
            ]
        );

        let err = LookupOptions::parse_from(args(&[
            "--in_json", "c.json", "--variable", "T", "--axis", "time",
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("NAME=SUBAXIS"));
    }
}
