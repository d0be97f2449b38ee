//! Shared library for the gridcurator tools.
//!
//! Builds a deduplicated catalog over a set of gridded data files that share
//! one logical schema but are split across many files (one per time chunk,
//! for example). For every axis the catalog keeps each distinct coordinate
//! vector seen across the files, and for every variable a table from sub-axis
//! id tuples to the file that holds that combination. Consumers can then
//! find "the file with variable V at these coordinates" without rescanning.
//!
//! The binaries are thin: `curate` scans directories and writes JSON/XML,
//! `catalog-lookup` answers queries against a saved JSON catalog.

pub mod catalog;
pub mod config;
pub mod discovery;
pub mod output;
pub mod report;
pub mod source;

pub use catalog::{
    AttributeSet, AxisCatalog, AxisKind, Catalog, CoordinateValues, DataType, FileId, FileRecord,
    Repository, ScanSummary, SubAxis, SubAxisId, VariableCatalog, from_json_file, from_json_str,
    to_json_file, to_xml_file,
};
pub use config::{Command, CurateOptions, LookupOptions, process_rank};
pub use report::Reporter;
pub use source::{
    DimensionHeader, FileHeader, FormatOpener, HeaderOpener, MemoryOpener, MetadataSource,
    SourceFormat, SourceOpener, VariableHeader,
};
