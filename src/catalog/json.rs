//! Object-notation form of a catalog: the persisted, reloadable format.
//!
//! Layout:
//!
//! ```text
//! { "dataset":   { attr: value, ... },
//!   "file":      { id: { "name", "axes": [[axis, subaxis], ...], attr... } },
//!   "axes":      { name: { "datatype", "units", ("size", "values") | "subaxes", attr... } },
//!   "variables": { name: { "datatype", "units", ("axisids", "subaxismap") | "axisgroups", attr... } } }
//! ```
//!
//! A lone sub-axis with id `"0"` is inlined into its axis, and a lone axis
//! group into its variable; anything else nests. Loading checks value types
//! against the bundled JSON Schema, then decodes with explicit key checks so
//! a missing key is reported by name.

use crate::catalog::attributes::AttributeSet;
use crate::catalog::coordinates::{CoordinateValues, narrow_to_f32};
use crate::catalog::identity::{DataType, FileId, SubAxisId};
use crate::catalog::index::Catalog;
use crate::catalog::model::{AxisCatalog, FileRecord, SubAxis, SubAxisFileMap, VariableCatalog};
use crate::output::write_atomically;
use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Number, Value};
use std::fs;
use std::path::Path;

const CATALOG_SCHEMA: &str = include_str!("../../schema/catalog.schema.json");

pub(crate) const FILE_KEYS: [&str; 3] = ["name", "axes", "units"];
pub(crate) const AXIS_KEYS: [&str; 5] = ["datatype", "units", "size", "values", "subaxes"];
pub(crate) const VARIABLE_KEYS: [&str; 5] =
    ["datatype", "units", "axisids", "subaxismap", "axisgroups"];

/// Render the catalog as a JSON document.
pub fn to_json_value(catalog: &Catalog) -> Result<Value> {
    let mut root = Map::new();

    let mut dataset = Map::new();
    if !catalog.dataset.units.is_empty() {
        dataset.insert("units".into(), Value::String(catalog.dataset.units.clone()));
    }
    push_attributes(&mut dataset, &catalog.dataset, &["units"], "dataset")?;
    root.insert("dataset".into(), Value::Object(dataset));

    let mut files = Map::new();
    for (id, record) in catalog.files.iter() {
        files.insert(id.to_string(), Value::Object(encode_file(id, record)?));
    }
    root.insert("file".into(), Value::Object(files));

    let mut axes = Map::new();
    for (name, axis) in catalog.axes.iter() {
        axes.insert(name.clone(), Value::Object(encode_axis(axis)?));
    }
    root.insert("axes".into(), Value::Object(axes));

    let mut variables = Map::new();
    for (name, variable) in catalog.variables.iter() {
        variables.insert(name.clone(), Value::Object(encode_variable(variable)?));
    }
    root.insert("variables".into(), Value::Object(variables));

    Ok(Value::Object(root))
}

/// Serialize to text; `pretty` indents with four spaces.
pub fn to_json_string(catalog: &Catalog, pretty: bool) -> Result<String> {
    let value = to_json_value(catalog)?;
    if !pretty {
        return Ok(serde_json::to_string(&value)?);
    }
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    buffer.push(b'\n');
    Ok(String::from_utf8(buffer)?)
}

pub fn to_json_file(catalog: &Catalog, path: &Path, pretty: bool) -> Result<()> {
    let text = to_json_string(catalog, pretty)?;
    write_atomically(path, text.as_bytes())
}

pub fn from_json_file(path: &Path) -> Result<Catalog> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("unable to open file \"{}\" for reading", path.display()))?;
    from_json_str(&text).with_context(|| format!("loading catalog {}", path.display()))
}

pub fn from_json_str(text: &str) -> Result<Catalog> {
    let value: Value = serde_json::from_str(text).context("parsing catalog JSON")?;
    let mut catalog = Catalog::new();
    load_json_value(&mut catalog, &value)?;
    Ok(catalog)
}

/// Decode `value` into an empty `catalog`.
pub fn load_json_value(catalog: &mut Catalog, value: &Value) -> Result<()> {
    if !catalog.files.is_empty() || !catalog.axes.is_empty() || !catalog.variables.is_empty() {
        bail!("catalog must be empty before loading");
    }
    validate_against_schema(value)?;

    let root = as_object(value, "catalog")?;

    let dataset = as_object(required(root, "dataset", "catalog")?, "\"dataset\"")?;
    for (key, value) in dataset {
        let text = attribute_text(value, key, "dataset")?;
        if key == "units" {
            catalog.dataset.units = text;
        } else {
            catalog.dataset.insert_attribute(key, text)?;
        }
    }

    let axes = as_object(required(root, "axes", "catalog")?, "\"axes\"")?;
    for (name, entry) in axes {
        let axis = decode_axis(name, entry)?;
        catalog.axes.insert(name.clone(), axis)?;
    }

    let files = as_object(required(root, "file", "catalog")?, "\"file\"")?;
    for (id, entry) in files {
        let record = decode_file(id, entry, catalog)?;
        catalog.files.insert(FileId::from(id.as_str()), record)?;
    }

    let variables = as_object(required(root, "variables", "catalog")?, "\"variables\"")?;
    for (name, entry) in variables {
        let variable = decode_variable(name, entry, catalog)?;
        catalog.variables.insert(name.clone(), variable)?;
    }
    Ok(())
}

fn validate_against_schema(value: &Value) -> Result<()> {
    let schema: Value =
        serde_json::from_str(CATALOG_SCHEMA).context("parsing bundled catalog schema")?;
    let compiled = JSONSchema::compile(&schema)
        .map_err(|err| anyhow!("compiling bundled catalog schema: {err}"))?;
    if let Err(errors) = compiled.validate(value) {
        let details = errors
            .map(|err| format!("{} (at {})", err, err.instance_path))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("catalog failed schema validation:\n{details}");
    }
    Ok(())
}

fn encode_file(id: &FileId, record: &FileRecord) -> Result<Map<String, Value>> {
    let owner = format!("file \"{id}\"");
    let mut entry = Map::new();
    entry.insert("name".into(), Value::String(record.filename.clone()));
    let pairs = record
        .axis_sub_axes
        .iter()
        .map(|(axis, sub_axis)| {
            Value::Array(vec![
                Value::String(axis.clone()),
                Value::String(sub_axis.to_string()),
            ])
        })
        .collect();
    entry.insert("axes".into(), Value::Array(pairs));
    if !record.info.units.is_empty() {
        entry.insert("units".into(), Value::String(record.info.units.clone()));
    }
    push_attributes(&mut entry, &record.info, &FILE_KEYS, &owner)?;
    Ok(entry)
}

fn encode_axis(axis: &AxisCatalog) -> Result<Map<String, Value>> {
    let owner = format!("axis \"{}\"", axis.name());
    let mut entry = Map::new();
    entry.insert("datatype".into(), Value::String(axis.info.data_type.to_string()));
    entry.insert("units".into(), Value::String(axis.info.units.clone()));

    let inline = match axis.sub_axes.get_index(0) {
        Some((id, sub_axis)) if axis.sub_axes.len() == 1 && id.as_str() == "0" => Some(sub_axis),
        _ => None,
    };
    if let Some(sub_axis) = inline {
        encode_sub_axis_fields(&mut entry, sub_axis);
    } else {
        let mut nested = Map::new();
        for (id, sub_axis) in axis.sub_axes.iter() {
            let mut fields = Map::new();
            fields.insert("datatype".into(), Value::String(sub_axis.data_type().to_string()));
            encode_sub_axis_fields(&mut fields, sub_axis);
            nested.insert(id.to_string(), Value::Object(fields));
        }
        entry.insert("subaxes".into(), Value::Object(nested));
    }

    push_attributes(&mut entry, &axis.info, &AXIS_KEYS, &owner)?;
    Ok(entry)
}

fn encode_sub_axis_fields(target: &mut Map<String, Value>, sub_axis: &SubAxis) {
    target.insert("size".into(), Value::from(sub_axis.size));
    if let Some(values) = &sub_axis.values {
        target.insert("values".into(), encode_values(values));
    }
}

fn encode_values(values: &CoordinateValues) -> Value {
    let items = match values {
        CoordinateValues::Int(values) => values.iter().map(|&v| Value::from(v)).collect(),
        CoordinateValues::Float(values) => values
            .iter()
            .map(|&v| number_or_null(f64::from(v)))
            .collect(),
        CoordinateValues::Double(values) => values.iter().map(|&v| number_or_null(v)).collect(),
    };
    Value::Array(items)
}

/// JSON has no NaN or infinity; those become `null` and load back as NaN.
fn number_or_null(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn encode_variable(variable: &VariableCatalog) -> Result<Map<String, Value>> {
    let owner = format!("variable \"{}\"", variable.name());
    let mut entry = Map::new();
    entry.insert("datatype".into(), Value::String(variable.info.data_type.to_string()));
    entry.insert("units".into(), Value::String(variable.info.units.clone()));

    if variable.axis_groups.len() == 1 {
        for (axis_names, table) in &variable.axis_groups {
            encode_axis_group(&mut entry, axis_names, table);
        }
    } else {
        let mut groups = Map::new();
        for (index, (axis_names, table)) in variable.axis_groups.iter().enumerate() {
            let mut group = Map::new();
            encode_axis_group(&mut group, axis_names, table);
            groups.insert(index.to_string(), Value::Object(group));
        }
        entry.insert("axisgroups".into(), Value::Object(groups));
    }

    push_attributes(&mut entry, &variable.info, &VARIABLE_KEYS, &owner)?;
    Ok(entry)
}

fn encode_axis_group(target: &mut Map<String, Value>, axis_names: &[String], table: &SubAxisFileMap) {
    let names = axis_names
        .iter()
        .map(|name| Value::String(name.clone()))
        .collect();
    target.insert("axisids".into(), Value::Array(names));
    let rows = table
        .iter()
        .map(|(sub_axis_ids, file_id)| {
            let mut row: Vec<Value> = sub_axis_ids
                .iter()
                .map(|id| Value::String(id.to_string()))
                .collect();
            row.push(Value::String(file_id.to_string()));
            Value::Array(row)
        })
        .collect();
    target.insert("subaxismap".into(), Value::Array(rows));
}

/// Attributes share the JSON object with the layout keys of their record,
/// so none of them may use one of `reserved`.
pub(crate) fn check_reserved(info: &AttributeSet, reserved: &[&str], owner: &str) -> Result<()> {
    if let Some((name, _)) = info.attributes().find(|(name, _)| reserved.contains(name)) {
        bail!("{owner} has attribute \"{name}\" that collides with a reserved catalog key");
    }
    Ok(())
}

fn push_attributes(
    target: &mut Map<String, Value>,
    info: &AttributeSet,
    reserved: &[&str],
    owner: &str,
) -> Result<()> {
    check_reserved(info, reserved, owner)?;
    for (name, value) in info.attributes() {
        target.insert(name.to_string(), Value::String(value.to_string()));
    }
    Ok(())
}

fn decode_file(id: &str, entry: &Value, catalog: &Catalog) -> Result<FileRecord> {
    let owner = format!("file \"{id}\"");
    let fields = as_object(entry, &owner)?;
    let name = as_str(required(fields, "name", &owner)?, "name", &owner)?;
    let mut record = FileRecord::new(name);

    if let Some(pairs) = fields.get("axes") {
        let pairs = pairs
            .as_array()
            .ok_or_else(|| anyhow!("{owner}: \"axes\" must be of type array"))?;
        for pair in pairs {
            let (axis, sub_axis) = match pair.as_array().map(Vec::as_slice) {
                Some([Value::String(axis), Value::String(sub_axis)]) => (axis, sub_axis),
                _ => bail!("{owner}: \"axes\" must be an array of [axis, subaxis] string pairs"),
            };
            let known = catalog
                .axes
                .get(axis.as_str())
                .is_some_and(|catalog_axis| catalog_axis.sub_axis(sub_axis).is_some());
            if !known {
                bail!("{owner} refers to unknown sub-axis \"{sub_axis}\" of axis \"{axis}\"");
            }
            record
                .axis_sub_axes
                .insert(axis.clone(), SubAxisId::from(sub_axis.as_str()));
        }
    }

    for (key, value) in fields {
        if key == "name" || key == "axes" {
            continue;
        }
        let text = attribute_text(value, key, &owner)?;
        if key == "units" {
            record.info.units = text;
        } else {
            record.info.insert_attribute(key, text)?;
        }
    }
    Ok(record)
}

fn decode_axis(name: &str, entry: &Value) -> Result<AxisCatalog> {
    let owner = format!("axis \"{name}\"");
    let fields = as_object(entry, &owner)?;
    let mut axis = AxisCatalog::new(name);
    axis.info.data_type = decode_datatype(required(fields, "datatype", &owner)?, &owner)?;
    axis.info.units = optional_str(fields, "units", &owner)?;

    let inline = fields.contains_key("size") || fields.contains_key("values");
    match (inline, fields.get("subaxes")) {
        (true, Some(_)) => bail!("{owner} specifies both \"size\"/\"values\" and \"subaxes\""),
        (true, None) => {
            let sub_axis = decode_sub_axis(fields, axis.info.data_type, &axis.info, &owner)?;
            axis.sub_axes.insert(SubAxisId::from("0"), sub_axis)?;
        }
        (false, Some(nested)) => {
            for (id, sub_entry) in as_object(nested, &format!("{owner}: \"subaxes\""))? {
                let sub_owner = format!("sub-axis \"{id}\" of {owner}");
                let sub_fields = as_object(sub_entry, &sub_owner)?;
                let data_type = match sub_fields.get("datatype") {
                    Some(raw) => decode_datatype(raw, &sub_owner)?,
                    None => axis.info.data_type,
                };
                if data_type != axis.info.data_type {
                    bail!(
                        "{sub_owner} has datatype {data_type} but the axis is {}",
                        axis.info.data_type
                    );
                }
                let sub_axis = decode_sub_axis(sub_fields, data_type, &axis.info, &sub_owner)?;
                axis.sub_axes.insert(SubAxisId::from(id.as_str()), sub_axis)?;
            }
        }
        (false, None) => bail!("{owner} is missing required key \"size\" or \"subaxes\""),
    }

    for (key, value) in fields {
        if AXIS_KEYS.contains(&key.as_str()) {
            continue;
        }
        axis.info
            .insert_attribute(key, attribute_text(value, key, &owner)?)?;
    }
    Ok(axis)
}

fn decode_sub_axis(
    fields: &Map<String, Value>,
    data_type: DataType,
    axis_info: &AttributeSet,
    owner: &str,
) -> Result<SubAxis> {
    let size = required(fields, "size", owner)?
        .as_u64()
        .ok_or_else(|| anyhow!("{owner}: \"size\" must be a non-negative integer"))?
        as usize;

    if data_type == DataType::None {
        if fields.contains_key("values") {
            bail!("{owner} has \"values\" but datatype None");
        }
        return Ok(SubAxis::placeholder(size));
    }

    let values = decode_values(required(fields, "values", owner)?, data_type, owner)?;
    if values.len() != size {
        bail!(
            "{owner} declares size {size} but lists {} values",
            values.len()
        );
    }
    let mut sub_axis = SubAxis::with_values(size, values);
    sub_axis.info.name = axis_info.name.clone();
    sub_axis.info.units = axis_info.units.clone();
    Ok(sub_axis)
}

fn decode_values(raw: &Value, data_type: DataType, owner: &str) -> Result<CoordinateValues> {
    let items = raw
        .as_array()
        .ok_or_else(|| anyhow!("{owner}: \"values\" must be of type array"))?;
    match data_type {
        DataType::Int => items
            .iter()
            .map(|item| {
                item.as_i64()
                    .and_then(|v| i32::try_from(v).ok())
                    .ok_or_else(|| anyhow!("{owner}: {item} is not a 32-bit integer"))
            })
            .collect::<Result<Vec<i32>>>()
            .map(CoordinateValues::Int),
        DataType::Float => items
            .iter()
            .map(|item| {
                let value = float_item(item, owner)?;
                narrow_to_f32(value)
                    .ok_or_else(|| anyhow!("{owner}: {item} is out of range for Float"))
            })
            .collect::<Result<Vec<f32>>>()
            .map(CoordinateValues::Float),
        DataType::Double => items
            .iter()
            .map(|item| float_item(item, owner))
            .collect::<Result<Vec<f64>>>()
            .map(CoordinateValues::Double),
        other => bail!("{owner} has unsupported coordinate datatype {other}"),
    }
}

fn float_item(item: &Value, owner: &str) -> Result<f64> {
    if item.is_null() {
        return Ok(f64::NAN);
    }
    item.as_f64()
        .ok_or_else(|| anyhow!("{owner}: {item} is not a number"))
}

fn decode_variable(name: &str, entry: &Value, catalog: &Catalog) -> Result<VariableCatalog> {
    let owner = format!("variable \"{name}\"");
    let fields = as_object(entry, &owner)?;
    let mut variable = VariableCatalog::new(name);
    variable.info.data_type = decode_datatype(required(fields, "datatype", &owner)?, &owner)?;
    variable.info.units = optional_str(fields, "units", &owner)?;

    let inline = fields.contains_key("axisids") || fields.contains_key("subaxismap");
    match (inline, fields.get("axisgroups")) {
        (true, Some(_)) => {
            bail!("{owner} specifies both \"axisgroups\" and \"axisids\"/\"subaxismap\"")
        }
        (true, None) => decode_axis_group(fields, &mut variable, catalog, &owner)?,
        (false, Some(groups)) => {
            for (index, group) in as_object(groups, &format!("{owner}: \"axisgroups\""))? {
                let group_owner = format!("axis group \"{index}\" of {owner}");
                let group_fields = as_object(group, &group_owner)?;
                decode_axis_group(group_fields, &mut variable, catalog, &group_owner)?;
            }
        }
        (false, None) => bail!("{owner} is missing required key \"axisids\" or \"axisgroups\""),
    }

    for (key, value) in fields {
        if VARIABLE_KEYS.contains(&key.as_str()) {
            continue;
        }
        variable
            .info
            .insert_attribute(key, attribute_text(value, key, &owner)?)?;
    }
    Ok(variable)
}

fn decode_axis_group(
    fields: &Map<String, Value>,
    variable: &mut VariableCatalog,
    catalog: &Catalog,
    owner: &str,
) -> Result<()> {
    let axis_names = string_array(required(fields, "axisids", owner)?, "axisids", owner)?;
    let rows = required(fields, "subaxismap", owner)?
        .as_array()
        .ok_or_else(|| anyhow!("{owner}: \"subaxismap\" must be of type array"))?;

    for axis in &axis_names {
        if !catalog.axes.contains_key(axis.as_str()) {
            bail!("{owner} refers to unknown axis \"{axis}\"");
        }
    }
    if variable.axis_groups.contains_key(&axis_names) {
        bail!("{owner} repeats axis group {axis_names:?}");
    }
    variable.axis_groups.entry(axis_names.clone()).or_default();

    for row in rows {
        let cells = string_array(row, "subaxismap", owner)?;
        if cells.len() != axis_names.len() + 1 {
            bail!(
                "{owner}: \"subaxismap\" rows must hold {} sub-axis ids and a file id",
                axis_names.len()
            );
        }
        let (ids, file) = cells.split_at(axis_names.len());
        for (axis, id) in axis_names.iter().zip(ids) {
            let known = catalog
                .axes
                .get(axis.as_str())
                .is_some_and(|catalog_axis| catalog_axis.sub_axis(id).is_some());
            if !known {
                bail!("{owner} refers to unknown sub-axis \"{id}\" of axis \"{axis}\"");
            }
        }
        let file_id = FileId::from(file[0].as_str());
        if !catalog.files.contains_key(file_id.as_str()) {
            bail!("{owner} refers to unknown file id \"{file_id}\"");
        }
        let sub_axis_ids = ids.iter().map(|id| SubAxisId::from(id.as_str())).collect();
        if !variable.insert(axis_names.clone(), sub_axis_ids, file_id) {
            bail!("{owner} maps the sub-axis tuple {ids:?} more than once");
        }
    }
    Ok(())
}

fn required<'a>(fields: &'a Map<String, Value>, key: &str, owner: &str) -> Result<&'a Value> {
    fields
        .get(key)
        .ok_or_else(|| anyhow!("{owner} is missing required key \"{key}\""))
}

fn as_object<'a>(value: &'a Value, owner: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| anyhow!("{owner} must be of type object"))
}

fn as_str<'a>(value: &'a Value, key: &str, owner: &str) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| anyhow!("{owner}: \"{key}\" must be of type string"))
}

fn optional_str(fields: &Map<String, Value>, key: &str, owner: &str) -> Result<String> {
    match fields.get(key) {
        Some(value) => Ok(as_str(value, key, owner)?.to_string()),
        None => Ok(String::new()),
    }
}

fn string_array(value: &Value, key: &str, owner: &str) -> Result<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| anyhow!("{owner}: \"{key}\" must be of type array"))?;
    items
        .iter()
        .map(|item| as_str(item, key, owner).map(str::to_string))
        .collect()
}

fn decode_datatype(value: &Value, owner: &str) -> Result<DataType> {
    let raw = as_str(value, "datatype", owner)?;
    DataType::parse(raw).ok_or_else(|| anyhow!("{owner} has unknown datatype \"{raw}\""))
}

/// Attribute values are strings; numbers are accepted and kept as their
/// textual form.
fn attribute_text(value: &Value, key: &str, owner: &str) -> Result<String> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        _ => bail!("{owner}: attribute \"{key}\" must be a string or number"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> Value {
        json!({
            "dataset": {"Conventions": "CF-1.6", "units": "none"},
            "file": {"0": {"name": "a.nc", "axes": [["x", "0"]], "version": 2}},
            "axes": {"x": {"datatype": "Int", "units": "m", "size": 2, "values": [1, 2]}},
            "variables": {"v": {
                "datatype": "Float", "units": "K",
                "axisids": ["x"], "subaxismap": [["0", "0"]],
                "long_name": "value"
            }}
        })
    }

    #[test]
    fn decodes_minimal_document() {
        let catalog = from_json_str(&minimal().to_string()).unwrap();
        assert_eq!(catalog.dataset().units, "none");
        assert_eq!(catalog.dataset().key_attributes["Conventions"], "CF-1.6");
        let file = catalog.file("0").unwrap();
        assert_eq!(file.info.attribute("version"), Some("2"));
        let axis = catalog.axis("x").unwrap();
        assert_eq!(
            axis.sub_axis("0").and_then(|s| s.values.clone()),
            Some(CoordinateValues::Int(vec![1, 2]))
        );
        let variable = catalog.variable("v").unwrap();
        assert_eq!(variable.info.key_attributes["long_name"], "value");
        assert_eq!(variable.info.units, "K");
    }

    #[test]
    fn missing_top_level_keys_are_named() {
        for key in ["dataset", "file", "axes", "variables"] {
            let mut document = minimal();
            document.as_object_mut().unwrap().remove(key);
            let err = from_json_str(&document.to_string()).unwrap_err();
            assert!(
                err.to_string().contains(&format!("missing required key \"{key}\"")),
                "{err:#}"
            );
        }
    }

    #[test]
    fn axis_must_pick_one_layout() {
        let mut document = minimal();
        document["axes"]["x"]["subaxes"] = json!({"0": {"size": 2, "values": [1, 2]}});
        let err = from_json_str(&document.to_string()).unwrap_err();
        assert!(err.to_string().contains("both"), "{err:#}");

        let mut document = minimal();
        let axis = document["axes"]["x"].as_object_mut().unwrap();
        axis.remove("size");
        axis.remove("values");
        let err = from_json_str(&document.to_string()).unwrap_err();
        assert!(err.to_string().contains("\"size\" or \"subaxes\""), "{err:#}");

        let mut document = minimal();
        document["axes"]["x"].as_object_mut().unwrap().remove("datatype");
        let err = from_json_str(&document.to_string()).unwrap_err();
        assert!(err.to_string().contains("axis \"x\" is missing required key \"datatype\""));
    }

    #[test]
    fn variable_must_pick_one_layout() {
        let mut document = minimal();
        document["variables"]["v"]["axisgroups"] = json!({});
        let err = from_json_str(&document.to_string()).unwrap_err();
        assert!(err.to_string().contains("both"), "{err:#}");

        let mut document = minimal();
        let variable = document["variables"]["v"].as_object_mut().unwrap();
        variable.remove("axisids");
        variable.remove("subaxismap");
        let err = from_json_str(&document.to_string()).unwrap_err();
        assert!(err.to_string().contains("\"axisids\" or \"axisgroups\""), "{err:#}");
    }

    #[test]
    fn malformed_axis_pairs_are_rejected() {
        let mut document = minimal();
        document["file"]["0"]["axes"] = json!([["x"]]);
        let err = from_json_str(&document.to_string()).unwrap_err();
        assert!(format!("{err:#}").contains("pairs"), "{err:#}");
    }

    #[test]
    fn schema_rejects_wrong_value_types() {
        let mut document = minimal();
        document["axes"]["x"]["size"] = json!("two");
        let err = from_json_str(&document.to_string()).unwrap_err();
        assert!(err.to_string().contains("schema validation"), "{err:#}");
    }

    #[test]
    fn dangling_references_are_rejected() {
        let mut document = minimal();
        document["variables"]["v"]["subaxismap"] = json!([["0", "9"]]);
        let err = from_json_str(&document.to_string()).unwrap_err();
        assert!(err.to_string().contains("unknown file id \"9\""), "{err:#}");
    }

    #[test]
    fn unknown_axis_references_are_rejected() {
        let mut document = minimal();
        document["file"]["0"]["axes"] = json!([["y", "0"]]);
        let err = from_json_str(&document.to_string()).unwrap_err();
        assert!(
            err.to_string().contains("unknown sub-axis \"0\" of axis \"y\""),
            "{err:#}"
        );

        let mut document = minimal();
        document["variables"]["v"]["axisids"] = json!(["y"]);
        let err = from_json_str(&document.to_string()).unwrap_err();
        assert!(err.to_string().contains("unknown axis \"y\""), "{err:#}");
    }

    #[test]
    fn unknown_sub_axis_references_are_rejected() {
        let mut document = minimal();
        document["file"]["0"]["axes"] = json!([["x", "3"]]);
        let err = from_json_str(&document.to_string()).unwrap_err();
        assert!(
            err.to_string().contains("unknown sub-axis \"3\" of axis \"x\""),
            "{err:#}"
        );

        let mut document = minimal();
        document["variables"]["v"]["subaxismap"] = json!([["3", "0"]]);
        let err = from_json_str(&document.to_string()).unwrap_err();
        assert!(
            err.to_string().contains("unknown sub-axis \"3\" of axis \"x\""),
            "{err:#}"
        );
    }

    #[test]
    fn variable_datatype_is_required() {
        let mut document = minimal();
        document["variables"]["v"].as_object_mut().unwrap().remove("datatype");
        let err = from_json_str(&document.to_string()).unwrap_err();
        assert!(
            err.to_string().contains("variable \"v\" is missing required key \"datatype\""),
            "{err:#}"
        );
    }

    #[test]
    fn attribute_values_must_be_scalars() {
        let mut document = minimal();
        document["variables"]["v"]["flags"] = json!({"nested": true});
        let err = from_json_str(&document.to_string()).unwrap_err();
        assert!(err.to_string().contains("schema validation"), "{err:#}");

        let err = attribute_text(&json!([1, 2]), "flags", "variable \"v\"").unwrap_err();
        assert!(err.to_string().contains("must be a string or number"), "{err:#}");
        assert_eq!(attribute_text(&json!(2.5), "scale", "dataset").unwrap(), "2.5");
    }

    #[test]
    fn out_of_range_float_values_are_rejected() {
        let mut document = minimal();
        document["axes"]["x"] = json!({"datatype": "Float", "units": "", "size": 1, "values": [1e300]});
        let err = from_json_str(&document.to_string()).unwrap_err();
        assert!(err.to_string().contains("out of range for Float"), "{err:#}");
    }

    #[test]
    fn reserved_attribute_names_cannot_be_saved() {
        let mut catalog = from_json_str(&minimal().to_string()).unwrap();
        catalog
            .variables
            .get_mut("v")
            .unwrap()
            .info
            .other_attributes
            .insert("axisids".into(), "oops".into());
        let err = to_json_value(&catalog).unwrap_err();
        assert!(err.to_string().contains("reserved"), "{err:#}");
    }

    #[test]
    fn non_finite_values_survive_as_nan() {
        let mut document = minimal();
        document["axes"]["x"] = json!({"datatype": "Double", "units": "", "size": 2, "values": [1.5, null]});
        let catalog = from_json_str(&document.to_string()).unwrap();
        let values = catalog.axis("x").unwrap().sub_axis("0").unwrap().values.clone();
        let Some(CoordinateValues::Double(values)) = values else {
            panic!("expected doubles");
        };
        assert_eq!(values[0], 1.5);
        assert!(values[1].is_nan());
    }

    #[test]
    fn pretty_output_uses_four_spaces() {
        let catalog = from_json_str(&minimal().to_string()).unwrap();
        let text = to_json_string(&catalog, true).unwrap();
        assert!(text.starts_with("{\n    \"dataset\": {\n        \"units\": \"none\""), "{text}");
        assert_eq!(from_json_str(&text).unwrap(), catalog);
    }
}
