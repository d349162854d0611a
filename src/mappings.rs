//! Mapping of declared Access types onto the primitive types used as
//! CSV parsing hints.

use std::fmt;

use polars::prelude::*;

use crate::schema::TableDef;

/// The closed set of primitive semantic types an Access column maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessType {
    Float,
    Integer,
    Boolean,
    Text,
    /// OLE columns: octal-escaped binary content
    Bytes,
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessType::Float => write!(f, "Float"),
            AccessType::Integer => write!(f, "Integer"),
            AccessType::Boolean => write!(f, "Boolean"),
            AccessType::Text => write!(f, "Text"),
            AccessType::Bytes => write!(f, "Bytes"),
        }
    }
}

/// Map a declared-type token to a primitive type by case-insensitive prefix.
///
/// First match wins. The list is surely incomplete; Access exports reliably
/// use a handful of types and unknown ones fall back per `implicit_string`.
pub fn map_declared_type(declared_type: &str) -> Option<AccessType> {
    let lower = declared_type.to_ascii_lowercase();
    if lower.starts_with("double") {
        Some(AccessType::Float)
    } else if lower.starts_with("long") {
        Some(AccessType::Integer)
    } else if lower.starts_with("bool") {
        Some(AccessType::Boolean)
    } else if lower.starts_with("text") || lower.starts_with("memo") {
        Some(AccessType::Text)
    } else if lower.starts_with("ole") {
        Some(AccessType::Bytes)
    } else {
        None
    }
}

/// Convert a primitive type to the Polars DataType the column is read as.
pub fn access_type_to_polars(access_type: AccessType) -> DataType {
    match access_type {
        AccessType::Float => DataType::Float64,
        AccessType::Integer => DataType::Int64,
        AccessType::Boolean => DataType::Boolean,
        AccessType::Text => DataType::String,
        AccessType::Bytes => DataType::Binary,
    }
}

/// Resolve every column of a table definition to a primitive type,
/// preserving column order.
///
/// Columns whose declared type matches no prefix become `Text` when
/// `implicit_string` is set and are omitted otherwise. Never an error.
pub fn typed_columns(table_def: &TableDef, implicit_string: bool) -> Vec<(String, AccessType)> {
    let mut typed = Vec::with_capacity(table_def.len());
    for column in table_def.columns() {
        match map_declared_type(&column.declared_type) {
            Some(access_type) => typed.push((column.name.clone(), access_type)),
            None if implicit_string => typed.push((column.name.clone(), AccessType::Text)),
            None => {}
        }
    }
    typed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_schema_text;

    #[test]
    fn test_prefix_mapping() {
        assert_eq!(map_declared_type("Double"), Some(AccessType::Float));
        assert_eq!(map_declared_type("double precision"), Some(AccessType::Float));
        assert_eq!(map_declared_type("Long Integer"), Some(AccessType::Integer));
        assert_eq!(map_declared_type("Boolean NOT NULL"), Some(AccessType::Boolean));
        assert_eq!(map_declared_type("Text (50)"), Some(AccessType::Text));
        assert_eq!(map_declared_type("Memo/Hyperlink"), Some(AccessType::Text));
        assert_eq!(map_declared_type("OLE"), Some(AccessType::Bytes));
    }

    #[test]
    fn test_mapping_is_case_insensitive() {
        assert_eq!(map_declared_type("DOUBLE"), Some(AccessType::Float));
        assert_eq!(map_declared_type("lOnG iNtEgEr"), Some(AccessType::Integer));
        assert_eq!(map_declared_type("TEXT (255)"), Some(AccessType::Text));
        assert_eq!(map_declared_type("ole"), Some(AccessType::Bytes));
    }

    #[test]
    fn test_unknown_types_map_to_none() {
        assert_eq!(map_declared_type("DateTime"), None);
        assert_eq!(map_declared_type("Currency"), None);
        assert_eq!(map_declared_type(""), None);
    }

    #[test]
    fn test_to_polars_mapping() {
        assert_eq!(access_type_to_polars(AccessType::Float), DataType::Float64);
        assert_eq!(access_type_to_polars(AccessType::Integer), DataType::Int64);
        assert_eq!(access_type_to_polars(AccessType::Boolean), DataType::Boolean);
        assert_eq!(access_type_to_polars(AccessType::Text), DataType::String);
        assert_eq!(access_type_to_polars(AccessType::Bytes), DataType::Binary);
    }

    #[test]
    fn test_typed_columns_implicit_string() {
        let schema = parse_schema_text(
            "CREATE TABLE [Foo] (\n\t[A]\tLong Integer,\n\t[B]\tText (50),\n\t[C]\tDateTime\n);",
        );
        let typed = typed_columns(&schema["Foo"], true);
        assert_eq!(
            typed,
            vec![
                ("A".to_string(), AccessType::Integer),
                ("B".to_string(), AccessType::Text),
                ("C".to_string(), AccessType::Text),
            ]
        );
    }

    #[test]
    fn test_typed_columns_unmapped_omitted() {
        let schema = parse_schema_text(
            "CREATE TABLE [Foo] (\n\t[A]\tLong Integer,\n\t[C]\tDateTime\n);",
        );
        let typed = typed_columns(&schema["Foo"], false);
        assert_eq!(typed, vec![("A".to_string(), AccessType::Integer)]);
    }

    #[test]
    fn test_scrape_then_map_pipeline() {
        let schema = parse_schema_text(
            "CREATE TABLE [Foo] (\n\t[A]\tLong Integer,\n\t[B]\tText (50)\n);",
        );
        assert_eq!(schema["Foo"].declared_type("A"), Some("Long Integer"));
        assert_eq!(schema["Foo"].declared_type("B"), Some("Text (50)"));

        let typed = typed_columns(&schema["Foo"], true);
        assert_eq!(typed[0], ("A".to_string(), AccessType::Integer));
        assert_eq!(typed[1], ("B".to_string(), AccessType::Text));
    }
}
