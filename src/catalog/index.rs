//! The catalog orchestrator: scanning files into the model and querying it.
//!
//! Files are indexed strictly in list order. Each file contributes one
//! `FileRecord`; its dimensions are resolved to sub-axes first and its data
//! variables are then filed under the sub-axis tuple of their dimensions.
//! Ids are assigned in first-seen order, so the same ordered input always
//! produces the same catalog. A failed scan leaves the catalog in whatever
//! state it reached; callers discard it.

use crate::catalog::attributes::{AttributeClass, AttributeSet};
use crate::catalog::identity::{DataType, FileId, SubAxisId};
use crate::catalog::json::{AXIS_KEYS, FILE_KEYS, VARIABLE_KEYS, check_reserved};
use crate::catalog::model::{AxisCatalog, AxisNameTuple, FileRecord, SubAxis, VariableCatalog};
use crate::catalog::repository::Repository;
use crate::discovery::list_directory;
use crate::report::Reporter;
use crate::source::{DimensionHeader, MetadataSource, SourceOpener, VariableHeader};
use anyhow::{Context, Result, bail};
use std::path::Path;
use tracing::debug;

/// Counters describing one populate call.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ScanSummary {
    pub files_indexed: usize,
    /// Variable entries dropped because an earlier file already claimed the
    /// same sub-axis tuple.
    pub dropped_collisions: usize,
}

impl ScanSummary {
    fn absorb(&mut self, other: ScanSummary) {
        self.files_indexed += other.files_indexed;
        self.dropped_collisions += other.dropped_collisions;
    }
}

/// Complete index of files, axes, sub-axes and variable layouts.
#[derive(Clone, Debug)]
pub struct Catalog {
    pub(crate) dataset: AttributeSet,
    pub(crate) base_directory: String,
    pub(crate) files: Repository<FileId, FileRecord>,
    pub(crate) variables: Repository<String, VariableCatalog>,
    pub(crate) axes: Repository<String, AxisCatalog>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            dataset: AttributeSet::new("", AttributeClass::Dataset),
            base_directory: String::new(),
            files: Repository::new(),
            variables: Repository::new(),
            axes: Repository::new(),
        }
    }
}

/// Two catalogs are equal when their dataset attributes, files, axes and
/// variables match; the directory they were scanned from does not matter.
impl PartialEq for Catalog {
    fn eq(&self, other: &Self) -> bool {
        self.dataset == other.dataset
            && self.files == other.files
            && self.variables == other.variables
            && self.axes == other.axes
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dataset(&self) -> &AttributeSet {
        &self.dataset
    }

    pub fn base_directory(&self) -> &str {
        &self.base_directory
    }

    pub fn files(&self) -> &Repository<FileId, FileRecord> {
        &self.files
    }

    pub fn axes(&self) -> &Repository<String, AxisCatalog> {
        &self.axes
    }

    pub fn variables(&self) -> &Repository<String, VariableCatalog> {
        &self.variables
    }

    pub fn file(&self, id: &str) -> Option<&FileRecord> {
        self.files.get(id)
    }

    pub fn axis(&self, name: &str) -> Option<&AxisCatalog> {
        self.axes.get(name)
    }

    pub fn variable(&self, name: &str) -> Option<&VariableCatalog> {
        self.variables.get(name)
    }

    /// Index `filenames` (relative to `base_dir`) in the given order.
    ///
    /// Appends to whatever the catalog already holds: ids continue from the
    /// existing entries and new files are checked against them.
    pub fn populate_from_file_list(
        &mut self,
        base_dir: &Path,
        filenames: &[String],
        opener: &dyn SourceOpener,
        reporter: &Reporter,
    ) -> Result<ScanSummary> {
        self.base_directory = base_dir.display().to_string();
        self.scan_batch(base_dir, filenames, opener, reporter)
    }

    /// Index every file in `path` whose name matches `pattern`, then, when
    /// `recurse` is set, every non-hidden subdirectory as its own batch.
    pub fn populate_from_file_path(
        &mut self,
        path: &Path,
        pattern: &str,
        recurse: bool,
        opener: &dyn SourceOpener,
        reporter: &Reporter,
    ) -> Result<ScanSummary> {
        if path.as_os_str().is_empty() {
            bail!("empty file path");
        }
        self.base_directory = path.display().to_string();
        self.scan_directory(path, pattern, recurse, opener, reporter)
    }

    fn scan_directory(
        &mut self,
        dir: &Path,
        pattern: &str,
        recurse: bool,
        opener: &dyn SourceOpener,
        reporter: &Reporter,
    ) -> Result<ScanSummary> {
        let listing = list_directory(dir, pattern)?;
        let mut summary = self.scan_batch(dir, &listing.files, opener, reporter)?;
        if recurse {
            for subdirectory in &listing.subdirectories {
                let nested =
                    self.scan_directory(&dir.join(subdirectory), pattern, true, opener, reporter)?;
                summary.absorb(nested);
            }
        }
        Ok(summary)
    }

    fn scan_batch(
        &mut self,
        base_dir: &Path,
        filenames: &[String],
        opener: &dyn SourceOpener,
        reporter: &Reporter,
    ) -> Result<ScanSummary> {
        let mut summary = ScanSummary::default();
        for (position, filename) in filenames.iter().enumerate() {
            let path = base_dir.join(filename);
            reporter.progress(format_args!(
                "indexing file {}/{}: {}",
                position + 1,
                filenames.len(),
                path.display()
            ));
            let source = opener.open(&path)?;
            let dropped = self
                .index_source(&path, source.as_ref())
                .with_context(|| format!("indexing {}", path.display()))?;
            summary.files_indexed += 1;
            summary.dropped_collisions += dropped;
        }
        if summary.dropped_collisions > 0 {
            reporter.warning(format_args!(
                "{} variable entries shadowed by an earlier file with identical sub-axes",
                summary.dropped_collisions
            ));
        }
        Ok(summary)
    }

    /// Merge one opened file; returns the number of dropped collisions.
    pub fn index_source(&mut self, path: &Path, source: &dyn MetadataSource) -> Result<usize> {
        let global_attributes = source.global_attributes()?;
        if self.files.is_empty() {
            self.dataset.merge_global_attributes(&global_attributes);
        }

        let file_id = self.files.next_sequential_key();
        let mut record = FileRecord::new(path.display().to_string());
        record.info.merge_global_attributes(&global_attributes);
        record.info.remove_redundant_other_attributes(&self.dataset);
        check_reserved(&record.info, &FILE_KEYS, &format!("file \"{}\"", path.display()))?;

        let dimensions = source.dimensions()?;
        let variables = source.variables()?;
        for dimension in &dimensions {
            let coordinate = variables.iter().find(|v| v.name == dimension.name);
            let sub_axis_id = self.index_axis(dimension, coordinate, source)?;
            record
                .axis_sub_axes
                .insert(dimension.name.clone(), sub_axis_id);
        }

        let mut dropped = 0;
        for variable in &variables {
            if self.axes.contains_key(variable.name.as_str()) {
                continue;
            }
            if !self.index_variable(variable, &record, &file_id)? {
                debug!(
                    variable = %variable.name,
                    file = %path.display(),
                    "sub-axis tuple already mapped to an earlier file"
                );
                dropped += 1;
            }
        }

        debug!(file_id = %file_id, path = %path.display(), "indexed file");
        self.files.insert(file_id, record)?;
        Ok(dropped)
    }

    fn index_axis(
        &mut self,
        dimension: &DimensionHeader,
        coordinate: Option<&VariableHeader>,
        source: &dyn MetadataSource,
    ) -> Result<SubAxisId> {
        let name = &dimension.name;
        let (axis, is_new) = self
            .axes
            .get_or_insert_with(name.clone(), || AxisCatalog::new(name.clone()));

        let Some(variable) = coordinate else {
            if !is_new && axis.info.data_type != DataType::None {
                bail!("axis \"{name}\" has no coordinate variable in this file but had one in earlier files");
            }
            return Ok(axis.intern(SubAxis::placeholder(dimension.len)));
        };

        if variable.dimensions.len() != 1 {
            bail!(
                "coordinate variable \"{name}\" must have exactly one dimension (found {})",
                variable.dimensions.len()
            );
        }
        if variable.dimensions[0] != *name {
            bail!(
                "coordinate variable \"{name}\" is indexed by dimension \"{}\"",
                variable.dimensions[0]
            );
        }
        if !is_new && axis.info.data_type == DataType::None {
            bail!("axis \"{name}\" has a coordinate variable in this file but not in earlier files");
        }
        if !is_new && axis.info.data_type != variable.data_type {
            bail!(
                "axis \"{name}\" dimension variable type mismatch ({} vs {}): possible duplicate dimension name",
                axis.info.data_type,
                variable.data_type
            );
        }
        if !variable.data_type.holds_coordinates() {
            bail!(
                "coordinate variable \"{name}\" has unsupported type {}",
                variable.data_type
            );
        }
        axis.info
            .merge_from_source(&variable.to_source_record(), !is_new, "axis")?;
        if is_new {
            check_reserved(&axis.info, &AXIS_KEYS, &format!("axis \"{name}\""))?;
        }

        let values = source
            .read_coordinate(name)
            .with_context(|| format!("reading coordinate variable \"{name}\""))?;
        if values.data_type() != variable.data_type {
            bail!(
                "axis \"{name}\" dimension variable type mismatch ({} vs {}): possible duplicate dimension name",
                variable.data_type,
                values.data_type()
            );
        }
        if values.len() != dimension.len {
            bail!(
                "coordinate variable \"{name}\" has {} values but dimension length {}",
                values.len(),
                dimension.len
            );
        }

        let mut candidate = SubAxis::with_values(dimension.len, values);
        candidate.info.name = name.clone();
        candidate.info.units = axis.info.units.clone();
        Ok(axis.intern(candidate))
    }

    fn index_variable(
        &mut self,
        variable: &VariableHeader,
        record: &FileRecord,
        file_id: &FileId,
    ) -> Result<bool> {
        let (catalog, is_new) = self
            .variables
            .get_or_insert_with(variable.name.clone(), || {
                VariableCatalog::new(variable.name.clone())
            });
        catalog
            .info
            .merge_from_source(&variable.to_source_record(), !is_new, "variable")?;
        if is_new {
            check_reserved(
                &catalog.info,
                &VARIABLE_KEYS,
                &format!("variable \"{}\"", variable.name),
            )?;
        }

        let axis_names: AxisNameTuple = variable.dimensions.clone();
        let sub_axis_ids = axis_names
            .iter()
            .map(|axis| {
                record.sub_axis_for(axis).cloned().unwrap_or_else(|| {
                    panic!(
                        "variable \"{}\" uses dimension \"{axis}\" that was not indexed for this file",
                        variable.name
                    )
                })
            })
            .collect();
        Ok(catalog.insert(axis_names, sub_axis_ids, file_id.clone()))
    }

    /// The file holding `variable` at exactly `sub_axis_ids` within the axis
    /// group `axis_names`.
    pub fn file_for(
        &self,
        variable: &str,
        axis_names: &[String],
        sub_axis_ids: &[SubAxisId],
    ) -> Option<(&FileId, &FileRecord)> {
        let file_id = self
            .variables
            .get(variable)?
            .file_for(axis_names, sub_axis_ids)?;
        self.files.get(file_id).map(|record| (file_id, record))
    }

    /// Like `file_for`, with the axis group spelled as (axis, sub-axis id)
    /// pairs in dimension order.
    pub fn locate(&self, variable: &str, selection: &[(&str, &str)]) -> Option<(&FileId, &FileRecord)> {
        let axis_names: Vec<String> = selection.iter().map(|(axis, _)| axis.to_string()).collect();
        let sub_axis_ids: Vec<SubAxisId> = selection
            .iter()
            .map(|(_, id)| SubAxisId::from(*id))
            .collect();
        self.file_for(variable, &axis_names, &sub_axis_ids)
    }

    /// Every file that stores `variable`, in file id order.
    pub fn variable_files(&self, variable: &str) -> Vec<(&FileId, &FileRecord)> {
        let Some(catalog) = self.variables.get(variable) else {
            return Vec::new();
        };
        catalog
            .file_ids()
            .into_iter()
            .filter_map(|id| self.files.get(id).map(|record| (id, record)))
            .collect()
    }
}
