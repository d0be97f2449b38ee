use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;

/// Sequential identifier assigned to a file the first time it is scanned.
///
/// Ids are stringified insertion indices (`"0"`, `"1"`, ...) and are never
/// reused, so catalogs written out and loaded back keep the same ids.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub String);

/// Identifier of one sub-axis inside its owning axis.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubAxisId(pub String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<usize> for $name {
            fn from(index: usize) -> Self {
                Self(index.to_string())
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(FileId);
string_id!(SubAxisId);

/// Declared element type of a variable or coordinate axis.
///
/// The string forms match the catalog's `datatype` field. Only `Int`,
/// `Float` and `Double` can carry coordinate values; the other variants
/// exist so data variables of any type can be catalogued.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum DataType {
    #[default]
    None,
    Byte,
    Char,
    Short,
    Int,
    Float,
    Double,
    UByte,
    UShort,
    UInt,
    Int64,
    UInt64,
    String,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::None => "None",
            DataType::Byte => "Byte",
            DataType::Char => "Char",
            DataType::Short => "Short",
            DataType::Int => "Int",
            DataType::Float => "Float",
            DataType::Double => "Double",
            DataType::UByte => "UByte",
            DataType::UShort => "UShort",
            DataType::UInt => "UInt",
            DataType::Int64 => "Int64",
            DataType::UInt64 => "UInt64",
            DataType::String => "String",
        }
    }

    /// Parse the catalog spelling; unknown names yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let parsed = match value {
            "None" => DataType::None,
            "Byte" => DataType::Byte,
            "Char" => DataType::Char,
            "Short" => DataType::Short,
            "Int" => DataType::Int,
            "Float" => DataType::Float,
            "Double" => DataType::Double,
            "UByte" => DataType::UByte,
            "UShort" => DataType::UShort,
            "UInt" => DataType::UInt,
            "Int64" => DataType::Int64,
            "UInt64" => DataType::UInt64,
            "String" => DataType::String,
            _ => return None,
        };
        Some(parsed)
    }

    /// Whether coordinate values of this type can be stored in a sub-axis.
    pub fn holds_coordinates(&self) -> bool {
        matches!(self, DataType::Int | DataType::Float | DataType::Double)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DataType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DataType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        DataType::parse(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown datatype \"{value}\"")))
    }
}

/// Informational classification of an axis.
///
/// Derived from the axis name alone so that a catalog loaded from disk
/// classifies its axes exactly as the scan that produced it did.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum AxisKind {
    #[default]
    Unknown,
    Auxiliary,
    Grid,
    Record,
    Vertical,
}

impl AxisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AxisKind::Unknown => "unknown",
            AxisKind::Auxiliary => "auxiliary",
            AxisKind::Grid => "grid",
            AxisKind::Record => "record",
            AxisKind::Vertical => "vertical",
        }
    }

    pub fn classify(axis_name: &str) -> Self {
        match axis_name {
            "time" => AxisKind::Record,
            "lev" | "plev" | "pres" | "z" => AxisKind::Vertical,
            "lat" | "lon" => AxisKind::Grid,
            _ => AxisKind::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datatype_round_trips_through_json() {
        for dtype in [
            DataType::None,
            DataType::Int,
            DataType::Float,
            DataType::Double,
            DataType::Int64,
        ] {
            let json = serde_json::to_string(&dtype).unwrap();
            assert_eq!(json.trim_matches('"'), dtype.as_str());
            let back: DataType = serde_json::from_str(&json).unwrap();
            assert_eq!(back, dtype);
        }

        let err = serde_json::from_str::<DataType>("\"Quaternion\"").unwrap_err();
        assert!(err.to_string().contains("Quaternion"));
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = FileId::from(12usize);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"12\"");
        let parsed: SubAxisId = serde_json::from_str("\"3\"").unwrap();
        assert_eq!(parsed, SubAxisId::from("3"));
        assert_eq!(parsed.to_string(), "3");
    }

    #[test]
    fn axis_kind_follows_conventional_names() {
        assert_eq!(AxisKind::classify("time"), AxisKind::Record);
        assert_eq!(AxisKind::classify("plev"), AxisKind::Vertical);
        assert_eq!(AxisKind::classify("lat"), AxisKind::Grid);
        assert_eq!(AxisKind::classify("ensemble"), AxisKind::Unknown);
    }
}
