//! Table summaries: scraped declared types side by side with the primitive
//! and Polars types a read would use, without touching any row data.

use std::path::Path;

use polars::prelude::DataType;

use crate::error::{MdbError, MdbResult};
use crate::mappings::{access_type_to_polars, map_declared_type, AccessType};
use crate::schema::TableDef;
use crate::tools::MdbTools;

/// One column of a summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    /// Raw declared type from the schema dump
    pub declared_type: String,
    /// Primitive type the column resolves to, if any
    pub access_type: Option<AccessType>,
    /// Polars dtype the column would be read as
    pub polars_type: Option<DataType>,
}

/// Summary of one table's scraped schema.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSummary {
    pub table: String,
    pub columns: Vec<ColumnInfo>,
}

impl TableSummary {
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Build a summary from an already-scraped table definition.
    pub fn from_table_def(table: &str, table_def: &TableDef, implicit_string: bool) -> Self {
        let columns = table_def
            .columns()
            .iter()
            .map(|column| {
                let access_type = match map_declared_type(&column.declared_type) {
                    Some(access_type) => Some(access_type),
                    None if implicit_string => Some(AccessType::Text),
                    None => None,
                };
                ColumnInfo {
                    name: column.name.clone(),
                    declared_type: column.declared_type.clone(),
                    access_type,
                    polars_type: access_type.map(access_type_to_polars),
                }
            })
            .collect();

        Self {
            table: table.to_string(),
            columns,
        }
    }
}

impl MdbTools {
    /// Summarize one table of a database: names, declared types, and the
    /// types a read would resolve them to.
    pub fn summarize_table<P: AsRef<Path>>(
        &self,
        db_file: P,
        table_name: &str,
        implicit_string: bool,
    ) -> MdbResult<TableSummary> {
        let schema = self.read_schema(db_file)?;
        let table_def = schema
            .get(table_name)
            .ok_or_else(|| MdbError::SchemaLookup(table_name.to_string()))?;
        Ok(TableSummary::from_table_def(
            table_name,
            table_def,
            implicit_string,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_schema_text;

    fn sample() -> TableDef {
        let schema = parse_schema_text(
            "CREATE TABLE [Inventory] (\n\
             \t[Id]\tLong Integer,\n\
             \t[Price]\tDouble,\n\
             \t[Photo]\tOLE,\n\
             \t[Updated]\tDateTime\n);",
        );
        schema["Inventory"].clone()
    }

    #[test]
    fn test_summary_resolves_each_column() {
        let summary = TableSummary::from_table_def("Inventory", &sample(), true);
        assert_eq!(summary.table, "Inventory");
        assert_eq!(summary.n_columns(), 4);

        assert_eq!(summary.columns[0].access_type, Some(AccessType::Integer));
        assert_eq!(summary.columns[1].polars_type, Some(DataType::Float64));
        assert_eq!(summary.columns[2].access_type, Some(AccessType::Bytes));
        // unmapped declared type resolves as text under implicit_string
        assert_eq!(summary.columns[3].access_type, Some(AccessType::Text));
    }

    #[test]
    fn test_summary_keeps_unmapped_columns_visible() {
        let summary = TableSummary::from_table_def("Inventory", &sample(), false);
        assert_eq!(summary.n_columns(), 4);
        assert_eq!(summary.columns[3].declared_type, "DateTime");
        assert_eq!(summary.columns[3].access_type, None);
        assert_eq!(summary.columns[3].polars_type, None);
    }
}
