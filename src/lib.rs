//! Read MS Access databases as Polars DataFrames through the external
//! mdb-tools CLI suite.
//!
//! There is no Access engine in here. `mdb-schema` output is scraped into a
//! table/column/declared-type mapping, declared types are mapped onto a
//! small closed set of primitive types, and `mdb-export` CSV output is
//! streamed through a typed CSV parse, with octal-escaped binary columns
//! decoded back into raw bytes.

pub mod describe;
pub mod error;
pub mod escape;
pub mod mappings;
pub mod read;
pub mod schema;
pub mod tools;

use std::path::Path;

use polars::prelude::DataFrame;

pub use describe::{ColumnInfo, TableSummary};
pub use error::{MdbError, MdbResult};
pub use escape::unescape_octal;
pub use mappings::{access_type_to_polars, map_declared_type, typed_columns, AccessType};
pub use read::{ReadOptions, TableChunks};
pub use schema::{parse_schema_text, ColumnDef, Schema, TableDef};
pub use tools::MdbTools;

/// List the tables in a database, resolving the tools through `PATH`.
pub fn list_tables<P: AsRef<Path>>(db_file: P) -> MdbResult<Vec<String>> {
    MdbTools::default().list_tables(db_file)
}

/// Scrape a database's schema, resolving the tools through `PATH`.
pub fn read_schema<P: AsRef<Path>>(db_file: P) -> MdbResult<Schema> {
    MdbTools::default().read_schema(db_file)
}

/// Read one table as a DataFrame, resolving the tools through `PATH`.
pub fn read_table<P: AsRef<Path>>(
    db_file: P,
    table_name: &str,
    options: &ReadOptions,
) -> MdbResult<DataFrame> {
    MdbTools::default().read_table(db_file, table_name, options)
}
