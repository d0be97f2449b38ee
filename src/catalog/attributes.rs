//! Name/type/units plus the key/other attribute bags shared by every record.
//!
//! Files, axes, sub-axes and variables embed one `AttributeSet` each. The
//! first observation of an entity populates the set; later observations are
//! checked against it and any drift aborts the scan with a message naming the
//! entity and the attribute.

use crate::catalog::identity::DataType;
use anyhow::{Result, bail};
use std::collections::{BTreeMap, BTreeSet};

/// Attribute name -> value, both rendered as strings.
pub type AttributeMap = BTreeMap<String, String>;

const UNITS: &str = "units";

const VARIABLE_KEY_ATTRIBUTES: [&str; 5] =
    ["missing_value", "comments", "long_name", "grid_name", "grid_type"];

const DATASET_KEY_ATTRIBUTES: [&str; 3] = ["conventions", "version", "history"];

/// Which allow-list decides whether an attribute is a "key" attribute.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AttributeClass {
    /// Global attributes of the dataset and of individual files; matched
    /// case-insensitively.
    Dataset,
    /// Attributes of variables and coordinate axes; matched exactly.
    #[default]
    Variable,
}

impl AttributeClass {
    pub fn is_key(&self, attribute: &str) -> bool {
        match self {
            AttributeClass::Dataset => {
                let lowered = attribute.to_ascii_lowercase();
                DATASET_KEY_ATTRIBUTES.contains(&lowered.as_str())
            }
            AttributeClass::Variable => VARIABLE_KEY_ATTRIBUTES.contains(&attribute),
        }
    }

    pub fn key_attribute_names(&self) -> BTreeSet<String> {
        let names: &[&str] = match self {
            AttributeClass::Dataset => &DATASET_KEY_ATTRIBUTES,
            AttributeClass::Variable => &VARIABLE_KEY_ATTRIBUTES,
        };
        names.iter().map(|name| name.to_string()).collect()
    }
}

/// One observation of a named entity as reported by a file reader.
///
/// `attributes` keeps the reader's order and still contains `units`; the
/// merge extracts it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceRecord {
    pub name: String,
    pub data_type: DataType,
    pub attributes: Vec<(String, String)>,
}

impl SourceRecord {
    pub fn units(&self) -> &str {
        self.attributes
            .iter()
            .find(|(name, _)| name == UNITS)
            .map(|(_, value)| value.as_str())
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, Default)]
pub struct AttributeSet {
    pub name: String,
    pub data_type: DataType,
    pub units: String,
    pub class: AttributeClass,
    pub key_attributes: AttributeMap,
    pub other_attributes: AttributeMap,
}

impl PartialEq for AttributeSet {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.data_type == other.data_type
            && self.units == other.units
            && self.key_attributes == other.key_attributes
            && self.other_attributes == other.other_attributes
    }
}

impl AttributeSet {
    pub fn new(name: impl Into<String>, class: AttributeClass) -> Self {
        Self {
            name: name.into(),
            class,
            ..Default::default()
        }
    }

    /// Attribute names this set classifies as "key".
    pub fn key_attribute_names(&self) -> BTreeSet<String> {
        self.class.key_attribute_names()
    }

    /// Look an attribute up in either bag.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.key_attributes
            .get(name)
            .or_else(|| self.other_attributes.get(name))
            .map(String::as_str)
    }

    /// Key attributes followed by other attributes, each in name order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.key_attributes
            .iter()
            .chain(self.other_attributes.iter())
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Populate from (`check_consistency == false`) or verify against
    /// (`check_consistency == true`) a reader observation.
    ///
    /// `entity` names the kind of record in error messages ("variable",
    /// "axis", ...).
    pub fn merge_from_source(
        &mut self,
        source: &SourceRecord,
        check_consistency: bool,
        entity: &str,
    ) -> Result<()> {
        let units = source.units();
        if !check_consistency {
            self.name = source.name.clone();
            self.data_type = source.data_type;
            self.units = units.to_string();
            for (name, value) in &source.attributes {
                if name == UNITS {
                    continue;
                }
                self.classify_into(name, value);
            }
            return Ok(());
        }

        if source.name != self.name {
            bail!(
                "{entity} \"{}\" has inconsistent name across files (\"{}\")",
                self.name,
                source.name
            );
        }
        if source.data_type != self.data_type {
            bail!(
                "{entity} \"{}\" has inconsistent type across files ({} vs {})",
                self.name,
                self.data_type,
                source.data_type
            );
        }
        if units != self.units {
            bail!(
                "{entity} \"{}\" has inconsistent units across files (\"{}\" vs \"{}\")",
                self.name,
                self.units,
                units
            );
        }
        for (name, value) in &source.attributes {
            if name == UNITS {
                continue;
            }
            match self.attribute(name) {
                Some(stored) if stored == value => {}
                Some(stored) => bail!(
                    "{entity} \"{}\" has inconsistent value of attribute \"{name}\" across files (\"{stored}\" vs \"{value}\")",
                    self.name
                ),
                None => bail!(
                    "{entity} \"{}\" has inconsistent appearance of attribute \"{name}\" across files",
                    self.name
                ),
            }
        }
        Ok(())
    }

    /// Store global (file-level) attributes without touching name or type.
    ///
    /// Units are pulled out of the bags like everywhere else.
    pub fn merge_global_attributes(&mut self, attributes: &[(String, String)]) {
        for (name, value) in attributes {
            if name == UNITS {
                self.units = value.clone();
                continue;
            }
            self.classify_into(name, value);
        }
    }

    /// Insert one attribute into the bag its name classifies it into.
    pub fn insert_attribute(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        if self.key_attributes.contains_key(name) || self.other_attributes.contains_key(name) {
            bail!("attribute key \"{name}\" already exists");
        }
        self.classify_into(name, value.into());
        Ok(())
    }

    /// Drop "other" attributes that `master` already carries.
    pub fn remove_redundant_other_attributes(&mut self, master: &AttributeSet) {
        for name in master.other_attributes.keys() {
            self.other_attributes.remove(name);
        }
    }

    fn classify_into(&mut self, name: &str, value: impl Into<String>) {
        let bag = if self.class.is_key(name) {
            &mut self.key_attributes
        } else {
            &mut self.other_attributes
        };
        bag.entry(name.to_string()).or_insert_with(|| value.into());
    }
}
