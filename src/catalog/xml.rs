//! CDML-style XML export. Write-only.

use crate::catalog::attributes::AttributeSet;
use crate::catalog::index::Catalog;
use crate::catalog::model::{AxisCatalog, SubAxis, SubAxisFileMap, VariableCatalog};
use crate::output::write_atomically;
use anyhow::Result;
use quick_xml::Writer;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::path::Path;

const DOCTYPE: &str = r#"dataset SYSTEM "http://www-pcmdi.llnl.gov/software/cdms/cdml.dtd""#;

type XmlWriter = Writer<Vec<u8>>;

pub fn to_xml_string(catalog: &Catalog) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::DocType(BytesText::from_escaped(DOCTYPE)))?;

    let mut root = BytesStart::new("dataset");
    push_key_attributes(&mut root, &catalog.dataset);
    writer.write_event(Event::Start(root))?;
    write_other_attributes(&mut writer, &catalog.dataset)?;

    for (id, record) in catalog.files.iter() {
        let mut element = BytesStart::new("file");
        element.push_attribute(("id", id.as_str()));
        element.push_attribute(("name", record.filename.as_str()));
        if !record.info.units.is_empty() {
            element.push_attribute(("units", record.info.units.as_str()));
        }
        push_key_attributes(&mut element, &record.info);
        writer.write_event(Event::Start(element))?;
        write_other_attributes(&mut writer, &record.info)?;
        for (axis, sub_axis) in &record.axis_sub_axes {
            let mut pair = BytesStart::new("subaxis");
            pair.push_attribute(("axis", axis.as_str()));
            pair.push_attribute(("subaxis", sub_axis.as_str()));
            writer.write_event(Event::Empty(pair))?;
        }
        writer.write_event(Event::End(BytesEnd::new("file")))?;
    }

    for axis in catalog.axes.values() {
        write_axis(&mut writer, axis)?;
    }
    for variable in catalog.variables.values() {
        write_variable(&mut writer, variable)?;
    }

    writer.write_event(Event::End(BytesEnd::new("dataset")))?;
    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(String::from_utf8(bytes)?)
}

pub fn to_xml_file(catalog: &Catalog, path: &Path) -> Result<()> {
    let text = to_xml_string(catalog)?;
    write_atomically(path, text.as_bytes())
}

fn write_axis(writer: &mut XmlWriter, axis: &AxisCatalog) -> Result<()> {
    let mut element = BytesStart::new("axis");
    element.push_attribute(("id", axis.name()));
    element.push_attribute(("units", axis.info.units.as_str()));
    element.push_attribute(("datatype", axis.info.data_type.as_str()));
    push_key_attributes(&mut element, &axis.info);

    let single = match axis.sub_axes.get_index(0) {
        Some((_, sub_axis)) if axis.sub_axes.len() == 1 => Some(sub_axis),
        _ => None,
    };
    if let Some(sub_axis) = single {
        let size = sub_axis.size.to_string();
        element.push_attribute(("size", size.as_str()));
        writer.write_event(Event::Start(element))?;
        write_values(writer, sub_axis)?;
        write_other_attributes(writer, &axis.info)?;
    } else {
        writer.write_event(Event::Start(element))?;
        write_other_attributes(writer, &axis.info)?;
        for (id, sub_axis) in axis.sub_axes.iter() {
            let size = sub_axis.size.to_string();
            let mut nested = BytesStart::new("subaxis");
            nested.push_attribute(("id", id.as_str()));
            nested.push_attribute(("size", size.as_str()));
            if sub_axis.values.is_none() {
                writer.write_event(Event::Empty(nested))?;
                continue;
            }
            writer.write_event(Event::Start(nested))?;
            write_values(writer, sub_axis)?;
            writer.write_event(Event::End(BytesEnd::new("subaxis")))?;
        }
    }
    writer.write_event(Event::End(BytesEnd::new("axis")))?;
    Ok(())
}

fn write_values(writer: &mut XmlWriter, sub_axis: &SubAxis) -> Result<()> {
    if let Some(values) = &sub_axis.values {
        writer.write_event(Event::Text(BytesText::new(&values.to_bracketed_string())))?;
    }
    Ok(())
}

fn write_variable(writer: &mut XmlWriter, variable: &VariableCatalog) -> Result<()> {
    let mut element = BytesStart::new("variable");
    element.push_attribute(("id", variable.name()));
    element.push_attribute(("datatype", variable.info.data_type.as_str()));
    element.push_attribute(("units", variable.info.units.as_str()));
    push_key_attributes(&mut element, &variable.info);
    writer.write_event(Event::Start(element))?;
    write_other_attributes(writer, &variable.info)?;

    let nested = variable.axis_groups.len() > 1;
    for (axis_names, table) in &variable.axis_groups {
        if nested {
            writer.write_event(Event::Start(BytesStart::new("axisgroup")))?;
        }
        write_text_element(writer, "axisids", &quoted_list(axis_names.iter().map(String::as_str)))?;
        write_text_element(writer, "subaxismap", &sub_axis_map_text(table))?;
        if nested {
            writer.write_event(Event::End(BytesEnd::new("axisgroup")))?;
        }
    }

    writer.write_event(Event::End(BytesEnd::new("variable")))?;
    Ok(())
}

fn push_key_attributes(element: &mut BytesStart<'_>, info: &AttributeSet) {
    for (name, value) in &info.key_attributes {
        element.push_attribute((name.as_str(), value.as_str()));
    }
}

fn write_other_attributes(writer: &mut XmlWriter, info: &AttributeSet) -> Result<()> {
    for (name, value) in &info.other_attributes {
        let mut element = BytesStart::new("attr");
        element.push_attribute(("name", name.as_str()));
        element.push_attribute(("datatype", "String"));
        writer.write_event(Event::Start(element))?;
        writer.write_event(Event::Text(BytesText::new(value)))?;
        writer.write_event(Event::End(BytesEnd::new("attr")))?;
    }
    Ok(())
}

/// Text child whose content may contain quotes; only markup characters are
/// escaped.
fn write_text_element(writer: &mut XmlWriter, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// `["a", "b"]`
fn quoted_list<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let quoted: Vec<String> = items.map(|item| format!("\"{item}\"")).collect();
    format!("[{}]", quoted.join(", "))
}

/// `[["0", "0", "0"], ["1", "0", "1"]]`: sub-axis ids then the file id.
fn sub_axis_map_text(table: &SubAxisFileMap) -> String {
    let rows: Vec<String> = table
        .iter()
        .map(|(ids, file_id)| {
            quoted_list(
                ids.iter()
                    .map(|id| id.as_str())
                    .chain(std::iter::once(file_id.as_str())),
            )
        })
        .collect();
    format!("[{}]", rows.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::json::from_json_str;
    use serde_json::json;

    fn sample() -> Catalog {
        let document = json!({
            "dataset": {"Conventions": "CF-1.6", "source": "model <x>"},
            "file": {
                "0": {"name": "a.nc", "axes": [["lev", "0"], ["time", "0"]]},
                "1": {"name": "b.nc", "axes": [["lev", "0"], ["time", "1"]]}
            },
            "axes": {
                "lev": {"datatype": "Double", "units": "hPa", "size": 3, "values": [1000.0, 500.0, 200.0]},
                "time": {"datatype": "Int", "units": "days", "subaxes": {
                    "0": {"datatype": "Int", "size": 1, "values": [0]},
                    "1": {"datatype": "Int", "size": 1, "values": [6]}
                }}
            },
            "variables": {"T": {
                "datatype": "Float", "units": "K", "long_name": "temperature",
                "axisids": ["time", "lev"],
                "subaxismap": [["0", "0", "0"], ["1", "0", "1"]]
            }}
        });
        from_json_str(&document.to_string()).unwrap()
    }

    #[test]
    fn renders_header_and_dataset() {
        let text = to_xml_string(&sample()).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"), "{text}");
        assert!(text.contains("<!DOCTYPE dataset SYSTEM \"http://www-pcmdi.llnl.gov/software/cdms/cdml.dtd\">"));
        assert!(text.contains("<dataset Conventions=\"CF-1.6\">"), "{text}");
        assert!(text.contains("<attr name=\"source\" datatype=\"String\">model &lt;x&gt;</attr>"));
        assert!(text.contains("<subaxis axis=\"time\" subaxis=\"1\"/>"), "{text}");
    }

    #[test]
    fn inlines_single_sub_axis_and_nests_several() {
        let text = to_xml_string(&sample()).unwrap();
        assert!(
            text.contains("<axis id=\"lev\" units=\"hPa\" datatype=\"Double\" size=\"3\">[1000 500 200]"),
            "{text}"
        );
        assert!(text.contains("<subaxis id=\"1\" size=\"1\">[6]</subaxis>"), "{text}");
    }

    #[test]
    fn renders_lookup_table_with_quotes() {
        let text = to_xml_string(&sample()).unwrap();
        assert!(text.contains("<variable id=\"T\" datatype=\"Float\" units=\"K\" long_name=\"temperature\">"));
        assert!(text.contains("<axisids>[\"time\", \"lev\"]</axisids>"), "{text}");
        assert!(
            text.contains("<subaxismap>[[\"0\", \"0\", \"0\"], [\"1\", \"0\", \"1\"]]</subaxismap>"),
            "{text}"
        );
        assert!(!text.contains("<axisgroup>"));
    }
}
