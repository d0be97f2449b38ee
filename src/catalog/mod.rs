//! Catalog data model and the scan/merge engine.
//!
//! `Catalog` (in `index.rs`) owns files, axes and variables in insertion
//! order through `Repository`. Every record embeds an `AttributeSet`. Axes
//! keep one `SubAxis` per distinct coordinate vector, and variables map
//! sub-axis id tuples to the file that holds them. `json` persists and
//! reloads a catalog; `xml` exports it.

pub mod attributes;
pub mod coordinates;
pub mod identity;
pub mod index;
pub mod json;
pub mod model;
pub mod repository;
pub mod xml;

pub use attributes::{AttributeClass, AttributeMap, AttributeSet, SourceRecord};
pub use coordinates::{
    CoordinateValues, almost_equal, exact_i32, format_significant, narrow_to_f32,
};
pub use identity::{AxisKind, DataType, FileId, SubAxisId};
pub use index::{Catalog, ScanSummary};
pub use json::{from_json_file, from_json_str, to_json_file, to_json_string, to_json_value};
pub use model::{
    AxisCatalog, AxisNameTuple, FileRecord, SubAxis, SubAxisFileMap, SubAxisIdTuple,
    VariableCatalog,
};
pub use repository::Repository;
pub use xml::{to_xml_file, to_xml_string};
