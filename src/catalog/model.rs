//! Records that make up a catalog: sub-axes, axes, variables and files.
//!
//! Each record embeds an `AttributeSet` and adds its own fields beside it.
//! The records are plain data; `Catalog` in `index.rs` drives how they are
//! created, deduplicated and checked.

use crate::catalog::attributes::{AttributeClass, AttributeSet};
use crate::catalog::coordinates::CoordinateValues;
use crate::catalog::identity::{AxisKind, DataType, FileId, SubAxisId};
use crate::catalog::repository::Repository;
use std::collections::BTreeMap;

/// Ordered axis names of one variable layout, e.g. `["time", "lat", "lon"]`.
pub type AxisNameTuple = Vec<String>;

/// Sub-axis ids parallel to an `AxisNameTuple`.
pub type SubAxisIdTuple = Vec<SubAxisId>;

/// Lookup table from a sub-axis id tuple to the file that holds it.
pub type SubAxisFileMap = BTreeMap<SubAxisIdTuple, FileId>;

/// One distinct set of coordinate values observed for an axis.
///
/// `values` is `None` when the files that produced it have no coordinate
/// variable for the axis; only the dimension length is known then.
#[derive(Clone, Debug, Default)]
pub struct SubAxis {
    pub info: AttributeSet,
    pub size: usize,
    pub values: Option<CoordinateValues>,
}

impl SubAxis {
    /// A sub-axis with a length but no coordinate values.
    pub fn placeholder(size: usize) -> Self {
        Self {
            info: AttributeSet::new("", AttributeClass::Variable),
            size,
            values: None,
        }
    }

    pub fn with_values(size: usize, values: CoordinateValues) -> Self {
        let mut sub_axis = Self::placeholder(size);
        sub_axis.info.data_type = values.data_type();
        sub_axis.values = Some(values);
        sub_axis
    }

    pub fn data_type(&self) -> DataType {
        self.values
            .as_ref()
            .map(CoordinateValues::data_type)
            .unwrap_or(DataType::None)
    }
}

/// Structural equality: same element type and values equal within tolerance.
///
/// The embedded attribute set and the declared size do not take part; two
/// placeholder sub-axes are always equal.
impl PartialEq for SubAxis {
    fn eq(&self, other: &Self) -> bool {
        match (&self.values, &other.values) {
            (None, None) => true,
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

/// Everything known about one axis name across the file set.
#[derive(Clone, Debug, PartialEq)]
pub struct AxisCatalog {
    pub info: AttributeSet,
    pub kind: AxisKind,
    pub sub_axes: Repository<SubAxisId, SubAxis>,
}

impl AxisCatalog {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: AxisKind::classify(&name),
            info: AttributeSet::new(name, AttributeClass::Variable),
            sub_axes: Repository::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn sub_axis(&self, id: &str) -> Option<&SubAxis> {
        self.sub_axes.get(id)
    }

    /// Reuse the id of the first structurally equal sub-axis, or store
    /// `candidate` under the next sequential id.
    pub fn intern(&mut self, candidate: SubAxis) -> SubAxisId {
        if let Some(existing) = self.sub_axes.find_key(|stored| *stored == candidate) {
            return existing.clone();
        }
        let id = self.sub_axes.next_sequential_key();
        self.sub_axes.get_or_insert_with(id.clone(), || candidate);
        id
    }
}

/// Everything known about one variable name across the file set.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableCatalog {
    pub info: AttributeSet,
    pub axis_groups: BTreeMap<AxisNameTuple, SubAxisFileMap>,
}

impl VariableCatalog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: AttributeSet::new(name, AttributeClass::Variable),
            axis_groups: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Record that `file_id` holds this variable at `sub_axis_ids`.
    ///
    /// Returns false when the tuple was already mapped; the earlier file is
    /// kept.
    pub fn insert(
        &mut self,
        axis_names: AxisNameTuple,
        sub_axis_ids: SubAxisIdTuple,
        file_id: FileId,
    ) -> bool {
        let table = self.axis_groups.entry(axis_names).or_default();
        if table.contains_key(&sub_axis_ids) {
            return false;
        }
        table.insert(sub_axis_ids, file_id);
        true
    }

    /// File holding the given sub-axis tuple within the given layout.
    pub fn file_for(&self, axis_names: &[String], sub_axis_ids: &[SubAxisId]) -> Option<&FileId> {
        self.axis_groups.get(axis_names)?.get(sub_axis_ids)
    }

    /// Every distinct file id this variable is stored in, in id order.
    pub fn file_ids(&self) -> Vec<&FileId> {
        let mut ids: Vec<&FileId> = self
            .axis_groups
            .values()
            .flat_map(|table| table.values())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

/// Per-file attributes and the sub-axis each axis resolved to in that file.
#[derive(Clone, Debug, PartialEq)]
pub struct FileRecord {
    pub info: AttributeSet,
    pub filename: String,
    pub axis_sub_axes: BTreeMap<String, SubAxisId>,
}

impl FileRecord {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            info: AttributeSet::new("", AttributeClass::Dataset),
            filename: filename.into(),
            axis_sub_axes: BTreeMap::new(),
        }
    }

    pub fn sub_axis_for(&self, axis: &str) -> Option<&SubAxisId> {
        self.axis_sub_axes.get(axis)
    }
}
