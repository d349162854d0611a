//! Streaming of `mdb-export` CSV output into typed Polars DataFrames.
//!
//! The export subprocess's stdout is consumed as a pipe, so a table is never
//! fully buffered before parsing starts. Reads come in two shapes: one
//! materialized DataFrame, or a lazy sequence of row chunks.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::process::{Child, ChildStdout};

use csv::ByteRecord;
use encoding::all::UTF_8;
use encoding::{Encoding, EncodingRef};
use log::debug;
use polars::prelude::*;

use crate::error::{MdbError, MdbResult};
use crate::escape::unescape_octal;
use crate::mappings::{access_type_to_polars, typed_columns, AccessType};
use crate::tools::{decode_output, MdbTools};

/// Configuration for reading one table.
#[derive(Clone)]
pub struct ReadOptions {
    /// Infer per-column types from the scraped schema before reading
    pub converters_from_schema: bool,
    /// Explicit per-column type overrides; these win over inferred types
    pub dtype: HashMap<String, AccessType>,
    /// Encoding of the schema dump used for inference
    pub schema_encoding: EncodingRef,
    /// Encoding of the exported CSV cells
    pub data_encoding: EncodingRef,
    /// Type unmapped declared types as Text instead of leaving them unhinted
    pub implicit_string: bool,
    /// CSV field delimiter
    pub delimiter: u8,
    /// Maximum number of records to read (None for all)
    pub max_records: Option<usize>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            converters_from_schema: true,
            dtype: HashMap::new(),
            schema_encoding: UTF_8,
            data_encoding: UTF_8,
            implicit_string: true,
            delimiter: b',',
            max_records: None,
        }
    }
}

impl fmt::Debug for ReadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOptions")
            .field("converters_from_schema", &self.converters_from_schema)
            .field("dtype", &self.dtype)
            .field("schema_encoding", &self.schema_encoding.name())
            .field("data_encoding", &self.data_encoding.name())
            .field("implicit_string", &self.implicit_string)
            .field("delimiter", &self.delimiter)
            .field("max_records", &self.max_records)
            .finish()
    }
}

/// A column as it will be materialized: output name, Polars dtype, and the
/// primitive type driving cell conversion (None means plain string).
struct ResolvedColumn {
    name: PlSmallStr,
    dtype: DataType,
    access_type: Option<AccessType>,
}

impl MdbTools {
    /// Read a whole table into a DataFrame.
    ///
    /// Unless `converters_from_schema` is off, the per-column types come from
    /// the database's own schema dump, with `options.dtype` overrides applied
    /// on top. Binary (OLE) columns are decoded from their octal escaping.
    pub fn read_table<P: AsRef<Path>>(
        &self,
        db_file: P,
        table_name: &str,
        options: &ReadOptions,
    ) -> MdbResult<DataFrame> {
        let mut chunks = self.read_table_chunks(db_file, table_name, options, usize::MAX)?;
        match chunks.next() {
            Some(result) => result,
            None => Ok(DataFrame::empty()),
        }
    }

    /// Read a table as a lazy sequence of DataFrame chunks of at most
    /// `chunk_size` rows each.
    ///
    /// The returned iterator owns the export subprocess; dropping it early
    /// reaps the child. The first chunk is always yielded, even when the
    /// table has no rows.
    pub fn read_table_chunks<P: AsRef<Path>>(
        &self,
        db_file: P,
        table_name: &str,
        options: &ReadOptions,
        chunk_size: usize,
    ) -> MdbResult<TableChunks> {
        let dtypes = self.resolve_dtypes(db_file.as_ref(), table_name, options)?;

        let program = self.mdb_export.display().to_string();
        let mut child = self.spawn_export(db_file.as_ref(), table_name)?;
        let Some(stdout) = child.stdout.take() else {
            reap(&mut child);
            return Err(MdbError::external_tool(&program, "stdout pipe unavailable"));
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .from_reader(stdout);

        let headers = match reader.byte_headers() {
            Ok(headers) => headers.clone(),
            Err(e) => {
                reap(&mut child);
                return Err(e.into());
            }
        };

        if headers.is_empty() {
            // no header row at all: the export command produced nothing
            finish(&mut child, &program)?;
            return Ok(TableChunks {
                child,
                reader,
                columns: Vec::new(),
                data_encoding: options.data_encoding,
                chunk_size,
                records_left: options.max_records,
                program,
                yielded_first: false,
                finished: true,
            });
        }

        let mut columns = Vec::with_capacity(headers.len());
        for raw_name in headers.iter() {
            let name = match decode_output(raw_name, options.data_encoding) {
                Ok(name) => name,
                Err(e) => {
                    reap(&mut child);
                    return Err(e);
                }
            };
            let access_type = dtypes.get(&name).copied();
            columns.push(ResolvedColumn {
                name: PlSmallStr::from(name),
                dtype: access_type
                    .map(access_type_to_polars)
                    .unwrap_or(DataType::String),
                access_type,
            });
        }
        debug!("reading `{table_name}` with {} columns", columns.len());

        Ok(TableChunks {
            child,
            reader,
            columns,
            data_encoding: options.data_encoding,
            chunk_size: chunk_size.max(1),
            records_left: options.max_records,
            program,
            yielded_first: false,
            finished: false,
        })
    }

    /// Merge schema-inferred types with explicit overrides. Overrides win.
    fn resolve_dtypes(
        &self,
        db_file: &Path,
        table_name: &str,
        options: &ReadOptions,
    ) -> MdbResult<HashMap<String, AccessType>> {
        let mut dtypes: HashMap<String, AccessType> = if options.converters_from_schema {
            let schema = self.read_schema_with_encoding(db_file, options.schema_encoding)?;
            let table_def = schema
                .get(table_name)
                .ok_or_else(|| MdbError::SchemaLookup(table_name.to_string()))?;
            typed_columns(table_def, options.implicit_string)
                .into_iter()
                .collect()
        } else {
            HashMap::new()
        };

        for (column, access_type) in &options.dtype {
            dtypes.insert(column.clone(), *access_type);
        }
        Ok(dtypes)
    }
}

/// Lazy sequence of row chunks streamed out of the export subprocess.
pub struct TableChunks {
    child: Child,
    reader: csv::Reader<ChildStdout>,
    columns: Vec<ResolvedColumn>,
    data_encoding: EncodingRef,
    chunk_size: usize,
    records_left: Option<usize>,
    program: String,
    yielded_first: bool,
    finished: bool,
}

impl TableChunks {
    /// Output column names, in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    fn abort(&mut self) {
        self.finished = true;
        reap(&mut self.child);
    }

    fn build_chunk(&self, cells: Vec<Vec<AnyValue<'static>>>) -> MdbResult<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.columns.len());
        for (column, values) in self.columns.iter().zip(cells) {
            let series =
                Series::from_any_values_and_dtype(column.name.clone(), &values, &column.dtype, true)?;
            columns.push(series.into());
        }
        DataFrame::new(columns).map_err(Into::into)
    }
}

impl Iterator for TableChunks {
    type Item = MdbResult<DataFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished && self.yielded_first {
            return None;
        }
        if self.finished {
            // the export produced no output at all: one empty frame
            self.yielded_first = true;
            return Some(self.build_chunk(vec![Vec::new(); self.columns.len()]));
        }

        let mut cells: Vec<Vec<AnyValue<'static>>> =
            self.columns.iter().map(|_| Vec::new()).collect();
        let mut record = ByteRecord::new();
        let mut rows = 0usize;
        let mut truncated = false;

        while rows < self.chunk_size {
            if self.records_left == Some(0) {
                truncated = true;
                break;
            }
            match self.reader.read_byte_record(&mut record) {
                Ok(true) => {
                    let mut row_error = None;
                    for (idx, column) in self.columns.iter().enumerate() {
                        let raw = record.get(idx).unwrap_or(b"");
                        match convert_cell(raw, column.access_type, self.data_encoding) {
                            Ok(value) => cells[idx].push(value),
                            Err(e) => {
                                row_error = Some(e);
                                break;
                            }
                        }
                    }
                    if let Some(e) = row_error {
                        self.abort();
                        return Some(Err(e));
                    }
                    rows += 1;
                    if let Some(left) = self.records_left.as_mut() {
                        *left -= 1;
                    }
                }
                Ok(false) => {
                    self.finished = true;
                    break;
                }
                Err(e) => {
                    self.abort();
                    return Some(Err(e.into()));
                }
            }
        }

        if truncated {
            // stopped early on purpose: discard the child without a status check
            self.abort();
        } else if self.finished {
            if let Err(e) = finish(&mut self.child, &self.program) {
                self.yielded_first = true;
                return Some(Err(e));
            }
        }

        if rows == 0 && self.yielded_first {
            return None;
        }
        self.yielded_first = true;
        Some(self.build_chunk(cells))
    }
}

impl Drop for TableChunks {
    fn drop(&mut self) {
        if !self.finished {
            reap(&mut self.child);
        }
    }
}

/// Kill and reap an export child whose output is no longer wanted.
fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Wait for a naturally finished child and surface a non-zero exit.
fn finish(child: &mut Child, program: &str) -> MdbResult<()> {
    let status = child
        .wait()
        .map_err(|e| MdbError::external_tool(program, e))?;
    if !status.success() {
        return Err(MdbError::external_tool(
            program,
            format!("exited with {status}"),
        ));
    }
    Ok(())
}

/// Convert one CSV cell into the AnyValue for its resolved column type.
///
/// Empty cells stay empty strings in Text and unhinted columns (there is no
/// missing-value sentinel in the export format) and become nulls in the
/// other typed columns.
fn convert_cell(
    raw: &[u8],
    target: Option<AccessType>,
    encoding: EncodingRef,
) -> MdbResult<AnyValue<'static>> {
    let text = decode_output(raw, encoding)?;
    let value = match target {
        None | Some(AccessType::Text) => AnyValue::StringOwned(text.into()),
        Some(AccessType::Bytes) => AnyValue::BinaryOwned(unescape_octal(&text)),
        Some(AccessType::Float) => {
            if text.is_empty() {
                AnyValue::Null
            } else {
                text.parse::<f64>().map(AnyValue::Float64).map_err(|e| {
                    MdbError::conversion(format!("cannot parse '{text}' as a float: {e}"))
                })?
            }
        }
        Some(AccessType::Integer) => {
            if text.is_empty() {
                AnyValue::Null
            } else {
                text.parse::<i64>().map(AnyValue::Int64).map_err(|e| {
                    MdbError::conversion(format!("cannot parse '{text}' as an integer: {e}"))
                })?
            }
        }
        Some(AccessType::Boolean) => {
            if text.is_empty() {
                AnyValue::Null
            } else {
                parse_boolean(&text)?
            }
        }
    };
    Ok(value)
}

fn parse_boolean(text: &str) -> MdbResult<AnyValue<'static>> {
    match text.to_ascii_uppercase().as_str() {
        "1" | "T" | "TRUE" | "Y" | "YES" => Ok(AnyValue::Boolean(true)),
        "0" | "F" | "FALSE" | "N" | "NO" => Ok(AnyValue::Boolean(false)),
        _ => Err(MdbError::conversion(format!(
            "cannot parse '{text}' as a boolean"
        ))),
    }
}
