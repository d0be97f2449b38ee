//! NetCDF reader, compiled with the `netcdf` feature.

use crate::catalog::{CoordinateValues, DataType};
use crate::source::{DimensionHeader, MetadataSource, SourceOpener, VariableHeader};
use anyhow::{Context, Result, anyhow, bail};
use netcdf::AttrValue;
use netcdf::types::{BasicType, VariableType};
use std::path::Path;

#[derive(Clone, Copy, Debug, Default)]
pub struct NetcdfOpener;

impl SourceOpener for NetcdfOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn MetadataSource>> {
        let file = netcdf::open(path)
            .with_context(|| format!("unable to open data file \"{}\" for reading", path.display()))?;
        Ok(Box::new(NetcdfSource { file }))
    }
}

pub struct NetcdfSource {
    file: netcdf::File,
}

impl MetadataSource for NetcdfSource {
    fn global_attributes(&self) -> Result<Vec<(String, String)>> {
        read_attributes(self.file.attributes())
    }

    fn dimensions(&self) -> Result<Vec<DimensionHeader>> {
        Ok(self
            .file
            .dimensions()
            .map(|dimension| DimensionHeader {
                name: dimension.name(),
                len: dimension.len(),
            })
            .collect())
    }

    fn variables(&self) -> Result<Vec<VariableHeader>> {
        self.file
            .variables()
            .map(|variable| {
                Ok(VariableHeader {
                    name: variable.name(),
                    data_type: data_type(&variable.vartype()),
                    dimensions: variable.dimensions().iter().map(|d| d.name()).collect(),
                    attributes: read_attributes(variable.attributes())
                        .with_context(|| format!("reading attributes of \"{}\"", variable.name()))?,
                })
            })
            .collect()
    }

    fn read_coordinate(&self, name: &str) -> Result<CoordinateValues> {
        let variable = self
            .file
            .variable(name)
            .ok_or_else(|| anyhow!("variable \"{name}\" not found"))?;
        let values = match data_type(&variable.vartype()) {
            DataType::Int => CoordinateValues::Int(variable.get_values::<i32, _>(..)?),
            DataType::Float => CoordinateValues::Float(variable.get_values::<f32, _>(..)?),
            DataType::Double => CoordinateValues::Double(variable.get_values::<f64, _>(..)?),
            other => bail!("unsupported coordinate type {other} for \"{name}\""),
        };
        Ok(values)
    }
}

fn data_type(vartype: &VariableType) -> DataType {
    match vartype {
        VariableType::Basic(basic) => match basic {
            BasicType::Byte => DataType::Byte,
            BasicType::Char => DataType::Char,
            BasicType::Ubyte => DataType::UByte,
            BasicType::Short => DataType::Short,
            BasicType::Ushort => DataType::UShort,
            BasicType::Int => DataType::Int,
            BasicType::Uint => DataType::UInt,
            BasicType::Int64 => DataType::Int64,
            BasicType::Uint64 => DataType::UInt64,
            BasicType::Float => DataType::Float,
            BasicType::Double => DataType::Double,
        },
        VariableType::String => DataType::String,
        _ => DataType::None,
    }
}

fn read_attributes<'f>(
    attributes: impl Iterator<Item = netcdf::Attribute<'f>>,
) -> Result<Vec<(String, String)>> {
    attributes
        .map(|attribute| {
            let value = attribute
                .value()
                .with_context(|| format!("reading attribute \"{}\"", attribute.name()))?;
            Ok((attribute.name().to_string(), render(&value)))
        })
        .collect()
}

/// Attribute value as text; arrays are comma-joined.
fn render(value: &AttrValue) -> String {
    fn join<T: ToString>(items: &[T]) -> String {
        items.iter().map(T::to_string).collect::<Vec<_>>().join(",")
    }
    match value {
        AttrValue::Uchar(v) => v.to_string(),
        AttrValue::Uchars(v) => join(v),
        AttrValue::Schar(v) => v.to_string(),
        AttrValue::Schars(v) => join(v),
        AttrValue::Ushort(v) => v.to_string(),
        AttrValue::Ushorts(v) => join(v),
        AttrValue::Short(v) => v.to_string(),
        AttrValue::Shorts(v) => join(v),
        AttrValue::Uint(v) => v.to_string(),
        AttrValue::Uints(v) => join(v),
        AttrValue::Int(v) => v.to_string(),
        AttrValue::Ints(v) => join(v),
        AttrValue::Ulonglong(v) => v.to_string(),
        AttrValue::Ulonglongs(v) => join(v),
        AttrValue::Longlong(v) => v.to_string(),
        AttrValue::Longlongs(v) => join(v),
        AttrValue::Float(v) => v.to_string(),
        AttrValue::Floats(v) => join(v),
        AttrValue::Double(v) => v.to_string(),
        AttrValue::Doubles(v) => join(v),
        AttrValue::Str(v) => v.clone(),
        AttrValue::Strs(v) => v.join(","),
    }
}
