//! Scraping of `mdb-schema` DDL dumps into a table/column/type mapping.
//!
//! The dump is a stream of `CREATE TABLE [Name] (...);` blocks, optionally
//! interleaved with `-` comment lines. All knowledge of that textual shape
//! lives in this module so format drift stays a localized change.

use std::collections::HashMap;
use std::path::Path;

use encoding::all::UTF_8;
use encoding::EncodingRef;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::MdbResult;
use crate::tools::{decode_output, MdbTools};

/// One `CREATE TABLE [Name] (...);` block, with `.` spanning newlines.
static TABLE_BLOCK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)CREATE TABLE \[(\w+)\]\s+\((.*?)\);")
        .expect("invalid table block pattern")
});

/// One `[Column] Declared Type` line inside a block.
static COLUMN_DEF_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\[(\w+)\]\s*(.*)$").expect("invalid column def pattern"));

/// A single column definition as emitted by the schema dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    /// Raw declared-type token, e.g. `"Long Integer"` or `"Text (50)"`
    pub declared_type: String,
}

/// The columns of one table, in the dump's physical order.
///
/// Order matters: it governs downstream output column order, so the
/// definitions are kept as a list rather than a map.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableDef {
    columns: Vec<ColumnDef>,
}

impl TableDef {
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Declared type of a column, if the table has it.
    pub fn declared_type(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.declared_type.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn push(&mut self, name: String, declared_type: String) {
        self.columns.push(ColumnDef {
            name,
            declared_type,
        });
    }
}

/// Mapping from table name to its column definitions.
pub type Schema = HashMap<String, TableDef>;

/// Parse the text of a schema dump into a [`Schema`].
///
/// Blank lines and comment lines (leading `-`) are dropped before matching.
/// Lines inside a block that don't have the bracketed-column shape (keys,
/// constraints) are skipped without error.
pub fn parse_schema_text(text: &str) -> Schema {
    let ddl = text
        .lines()
        .filter(|line| !line.is_empty() && !line.starts_with('-'))
        .collect::<Vec<_>>()
        .join("\n");

    let mut schema = Schema::new();
    for block in TABLE_BLOCK_PATTERN.captures_iter(&ddl) {
        let table = block[1].to_string();
        let defs = parse_column_defs(&block[2]);
        debug!("scraped table `{table}` with {} columns", defs.len());
        schema.insert(table, defs);
    }
    schema
}

fn parse_column_defs(defs_text: &str) -> TableDef {
    let mut defs = TableDef::default();
    for line in defs_text.lines() {
        if let Some(caps) = COLUMN_DEF_PATTERN.captures(line) {
            let declared = caps[2].trim().trim_end_matches(',').trim_end().to_string();
            defs.push(caps[1].to_string(), declared);
        }
    }
    defs
}

impl MdbTools {
    /// Scrape the schema of an Access database.
    ///
    /// The dump is decoded as UTF-8, which is what mdb-tools emits; use
    /// [`MdbTools::read_schema_with_encoding`] to override.
    pub fn read_schema<P: AsRef<Path>>(&self, db_file: P) -> MdbResult<Schema> {
        self.read_schema_with_encoding(db_file, UTF_8)
    }

    pub fn read_schema_with_encoding<P: AsRef<Path>>(
        &self,
        db_file: P,
        encoding: EncodingRef,
    ) -> MdbResult<Schema> {
        let stdout = self.run_capture(&self.mdb_schema, db_file.as_ref())?;
        let text = decode_output(&stdout, encoding)?;
        Ok(parse_schema_text(&text))
    }
}
