//! Reader interface the catalog pulls per-file metadata through.
//!
//! The catalog never touches array payloads: it needs global attributes,
//! dimension lengths, variable headers and the values of coordinate
//! variables. `MetadataSource` is that surface. `FileHeader` implements it
//! from an in-memory description that can also be stored on disk as JSON
//! (the `header` format), and `netcdf::NetcdfOpener` reads real NetCDF files
//! when the `netcdf` feature is enabled.

#[cfg(feature = "netcdf")]
pub mod netcdf;

use crate::catalog::{CoordinateValues, DataType, SourceRecord, exact_i32, narrow_to_f32};
use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// A named dimension and its declared length.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DimensionHeader {
    pub name: String,
    pub len: usize,
}

/// Header of one variable: name, element type, dimension order, attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableHeader {
    pub name: String,
    pub data_type: DataType,
    pub dimensions: Vec<String>,
    pub attributes: Vec<(String, String)>,
}

impl VariableHeader {
    /// The observation handed to `AttributeSet::merge_from_source`.
    pub fn to_source_record(&self) -> SourceRecord {
        SourceRecord {
            name: self.name.clone(),
            data_type: self.data_type,
            attributes: self.attributes.clone(),
        }
    }

    /// True for a 1-d variable whose only dimension shares its name.
    pub fn is_coordinate(&self) -> bool {
        self.dimensions.len() == 1 && self.dimensions[0] == self.name
    }
}

/// Metadata view of one opened data file.
pub trait MetadataSource {
    fn global_attributes(&self) -> Result<Vec<(String, String)>>;

    fn dimensions(&self) -> Result<Vec<DimensionHeader>>;

    fn variables(&self) -> Result<Vec<VariableHeader>>;

    /// Full value vector of the coordinate variable `name`, read at once.
    fn read_coordinate(&self, name: &str) -> Result<CoordinateValues>;
}

/// Opens files for scanning.
pub trait SourceOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn MetadataSource>>;
}

/// How `curate` should read the files it finds.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SourceFormat {
    /// `.json` files are headers, everything else NetCDF.
    #[default]
    Auto,
    Netcdf,
    Header,
}

impl SourceFormat {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "auto" => Ok(Self::Auto),
            "netcdf" => Ok(Self::Netcdf),
            "header" => Ok(Self::Header),
            other => bail!("unknown format '{other}' (expected auto|netcdf|header)"),
        }
    }
}

/// Opener dispatching on `SourceFormat`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FormatOpener {
    format: SourceFormat,
}

impl FormatOpener {
    pub fn new(format: SourceFormat) -> Self {
        Self { format }
    }
}

impl SourceOpener for FormatOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn MetadataSource>> {
        let is_header = match self.format {
            SourceFormat::Header => true,
            SourceFormat::Netcdf => false,
            SourceFormat::Auto => path.extension().and_then(|ext| ext.to_str()) == Some("json"),
        };
        if is_header {
            return HeaderOpener.open(path);
        }
        open_netcdf(path)
    }
}

#[cfg(feature = "netcdf")]
fn open_netcdf(path: &Path) -> Result<Box<dyn MetadataSource>> {
    self::netcdf::NetcdfOpener.open(path)
}

#[cfg(not(feature = "netcdf"))]
fn open_netcdf(path: &Path) -> Result<Box<dyn MetadataSource>> {
    bail!(
        "unable to open data file \"{}\" for reading: built without NetCDF support (rebuild with --features netcdf or use --format header)",
        path.display()
    )
}

/// Reads `FileHeader` documents stored as JSON.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeaderOpener;

impl SourceOpener for HeaderOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn MetadataSource>> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("unable to open data file \"{}\" for reading", path.display()))?;
        let header: FileHeader = serde_json::from_str(&data)
            .with_context(|| format!("parsing header file {}", path.display()))?;
        header
            .check_dimensions()
            .with_context(|| format!("validating header file {}", path.display()))?;
        Ok(Box::new(header))
    }
}

/// Serves pre-built headers keyed by path; used by tests and embedders that
/// already hold metadata in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryOpener {
    files: HashMap<PathBuf, FileHeader>,
}

impl MemoryOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, header: FileHeader) {
        self.files.insert(path.into(), header);
    }
}

impl SourceOpener for MemoryOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn MetadataSource>> {
        let header = self
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("unable to open data file \"{}\" for reading", path.display()))?;
        header.check_dimensions()?;
        Ok(Box::new(header))
    }
}

/// In-memory description of one data file's metadata.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FileHeader {
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub dimensions: Vec<DimensionHeader>,
    #[serde(default)]
    pub variables: Vec<HeaderVariable>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeaderVariable {
    pub name: String,
    #[serde(rename = "datatype")]
    pub data_type: DataType,
    #[serde(default)]
    pub dimensions: Vec<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f64>>,
}

impl FileHeader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn dimension(mut self, name: &str, len: usize) -> Self {
        self.dimensions.push(DimensionHeader {
            name: name.to_string(),
            len,
        });
        self
    }

    /// Add a coordinate variable named after its dimension.
    pub fn coordinate(
        self,
        name: &str,
        data_type: DataType,
        values: &[f64],
        attributes: &[(&str, &str)],
    ) -> Self {
        let mut header = self.variable(name, data_type, &[name], attributes);
        if let Some(variable) = header.variables.last_mut() {
            variable.values = Some(values.to_vec());
        }
        header
    }

    pub fn variable(
        mut self,
        name: &str,
        data_type: DataType,
        dimensions: &[&str],
        attributes: &[(&str, &str)],
    ) -> Self {
        self.variables.push(HeaderVariable {
            name: name.to_string(),
            data_type,
            dimensions: dimensions.iter().map(|d| d.to_string()).collect(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            values: None,
        });
        self
    }
}

impl FileHeader {
    /// Every variable dimension must be declared in `dimensions`.
    pub fn check_dimensions(&self) -> Result<()> {
        for variable in &self.variables {
            for dimension in &variable.dimensions {
                if !self.dimensions.iter().any(|d| &d.name == dimension) {
                    bail!(
                        "variable \"{}\" uses undeclared dimension \"{dimension}\"",
                        variable.name
                    );
                }
            }
        }
        Ok(())
    }
}

impl MetadataSource for FileHeader {
    fn global_attributes(&self) -> Result<Vec<(String, String)>> {
        Ok(self
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn dimensions(&self) -> Result<Vec<DimensionHeader>> {
        Ok(self.dimensions.clone())
    }

    fn variables(&self) -> Result<Vec<VariableHeader>> {
        Ok(self
            .variables
            .iter()
            .map(|variable| VariableHeader {
                name: variable.name.clone(),
                data_type: variable.data_type,
                dimensions: variable.dimensions.clone(),
                attributes: variable
                    .attributes
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            })
            .collect())
    }

    fn read_coordinate(&self, name: &str) -> Result<CoordinateValues> {
        let variable = self
            .variables
            .iter()
            .find(|variable| variable.name == name)
            .ok_or_else(|| anyhow!("variable \"{name}\" not found"))?;
        let values = variable
            .values
            .as_ref()
            .ok_or_else(|| anyhow!("coordinate variable \"{name}\" has no values"))?;
        match variable.data_type {
            DataType::Int => values
                .iter()
                .map(|&v| {
                    exact_i32(v)
                        .ok_or_else(|| anyhow!("coordinate \"{name}\" value {v} is not a 32-bit integer"))
                })
                .collect::<Result<Vec<i32>>>()
                .map(CoordinateValues::Int),
            DataType::Float => values
                .iter()
                .map(|&v| {
                    narrow_to_f32(v)
                        .ok_or_else(|| anyhow!("coordinate \"{name}\" value {v} is out of range for Float"))
                })
                .collect::<Result<Vec<f32>>>()
                .map(CoordinateValues::Float),
            DataType::Double => Ok(CoordinateValues::Double(values.clone())),
            other => bail!("unsupported coordinate type {other} for \"{name}\""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips_through_json() {
        let header = FileHeader::new()
            .attribute("Conventions", "CF-1.6")
            .dimension("lev", 2)
            .coordinate("lev", DataType::Double, &[1000.0, 500.0], &[("units", "hPa")]);
        let json = serde_json::to_string(&header).unwrap();
        let back: FileHeader = serde_json::from_str(&json).unwrap();
        assert_eq!(back, header);
    }

    #[test]
    fn reads_coordinates_in_declared_type() {
        let header = FileHeader::new()
            .dimension("time", 2)
            .coordinate("time", DataType::Int, &[0.0, 6.0], &[]);
        let values = header.read_coordinate("time").unwrap();
        assert_eq!(values, CoordinateValues::Int(vec![0, 6]));

        let variables = header.variables().unwrap();
        assert!(variables[0].is_coordinate());
    }

    #[test]
    fn lossy_coordinate_values_are_rejected() {
        let header = FileHeader::new()
            .dimension("time", 2)
            .coordinate("time", DataType::Int, &[0.0, 1.5], &[]);
        let err = header.read_coordinate("time").unwrap_err();
        assert!(err.to_string().contains("not a 32-bit integer"), "{err:#}");

        let header = FileHeader::new()
            .dimension("lev", 1)
            .coordinate("lev", DataType::Float, &[1e300], &[]);
        let err = header.read_coordinate("lev").unwrap_err();
        assert!(err.to_string().contains("out of range for Float"), "{err:#}");
    }

    #[test]
    fn memory_opener_reports_missing_files() {
        let opener = MemoryOpener::new();
        let err = opener.open(Path::new("/nowhere/a.nc")).err().unwrap();
        assert!(err.to_string().contains("unable to open data file"));
    }

    #[test]
    fn undeclared_dimensions_are_rejected() {
        let header = FileHeader::new().variable("T", DataType::Float, &["time"], &[]);
        let err = header.check_dimensions().unwrap_err();
        assert!(err.to_string().contains("undeclared dimension \"time\""));
    }

    #[test]
    fn format_parsing() {
        assert_eq!(SourceFormat::parse("header").unwrap(), SourceFormat::Header);
        assert!(SourceFormat::parse("grib").is_err());
    }
}
