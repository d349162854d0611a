//! Location and invocation of the external mdb-tools executables.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use encoding::all::ISO_8859_1;
use encoding::{DecoderTrap, Encoding, EncodingRef};
use log::debug;

use crate::error::{MdbError, MdbResult};

const MDB_TABLES: &str = "mdb-tables";
const MDB_SCHEMA: &str = "mdb-schema";
const MDB_EXPORT: &str = "mdb-export";

/// Resolved locations of the three mdb-tools commands this crate drives.
///
/// The default resolves bare program names through `PATH` at spawn time;
/// `with_bin_dir` pins all three to a caller-supplied directory so nothing
/// about the process environment is inspected.
#[derive(Debug, Clone)]
pub struct MdbTools {
    pub(crate) mdb_tables: PathBuf,
    pub(crate) mdb_schema: PathBuf,
    pub(crate) mdb_export: PathBuf,
}

impl Default for MdbTools {
    fn default() -> Self {
        Self {
            mdb_tables: PathBuf::from(MDB_TABLES),
            mdb_schema: PathBuf::from(MDB_SCHEMA),
            mdb_export: PathBuf::from(MDB_EXPORT),
        }
    }
}

impl MdbTools {
    /// Resolve all three executables inside `bin_dir`.
    pub fn with_bin_dir<P: AsRef<Path>>(bin_dir: P) -> Self {
        let dir = bin_dir.as_ref();
        Self {
            mdb_tables: dir.join(MDB_TABLES),
            mdb_schema: dir.join(MDB_SCHEMA),
            mdb_export: dir.join(MDB_EXPORT),
        }
    }

    /// List the tables in an Access database.
    ///
    /// `mdb-tables` output is decoded as ISO-8859-1; so many MS files carry
    /// that encoding. Use [`MdbTools::list_tables_with_encoding`] to override.
    pub fn list_tables<P: AsRef<Path>>(&self, db_file: P) -> MdbResult<Vec<String>> {
        self.list_tables_with_encoding(db_file, ISO_8859_1)
    }

    pub fn list_tables_with_encoding<P: AsRef<Path>>(
        &self,
        db_file: P,
        encoding: EncodingRef,
    ) -> MdbResult<Vec<String>> {
        let stdout = self.run_capture(&self.mdb_tables, db_file.as_ref())?;
        let text = decode_output(&stdout, encoding)?;
        Ok(text.split_whitespace().map(str::to_string).collect())
    }

    /// Run a command against `db_file`, capturing stdout to completion.
    pub(crate) fn run_capture(&self, program: &Path, db_file: &Path) -> MdbResult<Vec<u8>> {
        let name = program.display().to_string();
        debug!("running {name} {}", db_file.display());

        let output = Command::new(program)
            .arg(db_file)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| MdbError::external_tool(&name, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = if stderr.trim().is_empty() {
                format!("exited with {}", output.status)
            } else {
                format!("exited with {}: {}", output.status, stderr.trim())
            };
            return Err(MdbError::external_tool(&name, reason));
        }

        Ok(output.stdout)
    }

    /// Spawn the export command with piped stdout for streaming consumption.
    pub(crate) fn spawn_export(&self, db_file: &Path, table_name: &str) -> MdbResult<Child> {
        let name = self.mdb_export.display().to_string();
        debug!("running {name} -b octal {} {table_name}", db_file.display());

        Command::new(&self.mdb_export)
            .arg("-b")
            .arg("octal")
            .arg(db_file)
            .arg(table_name)
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| MdbError::external_tool(&name, e))
    }
}

/// Strictly decode raw tool output under `encoding`.
pub(crate) fn decode_output(bytes: &[u8], encoding: EncodingRef) -> MdbResult<String> {
    encoding
        .decode(bytes, DecoderTrap::Strict)
        .map_err(|e| MdbError::decode(encoding.name(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding::all::UTF_8;

    #[test]
    fn test_default_uses_bare_names() {
        let tools = MdbTools::default();
        assert_eq!(tools.mdb_tables, PathBuf::from("mdb-tables"));
        assert_eq!(tools.mdb_schema, PathBuf::from("mdb-schema"));
        assert_eq!(tools.mdb_export, PathBuf::from("mdb-export"));
    }

    #[test]
    fn test_with_bin_dir_joins_all_three() {
        let tools = MdbTools::with_bin_dir("/opt/mdbtools/bin");
        assert_eq!(tools.mdb_schema, PathBuf::from("/opt/mdbtools/bin/mdb-schema"));
        assert_eq!(tools.mdb_export, PathBuf::from("/opt/mdbtools/bin/mdb-export"));
        assert_eq!(tools.mdb_tables, PathBuf::from("/opt/mdbtools/bin/mdb-tables"));
    }

    #[test]
    fn test_missing_executable_is_an_external_tool_error() {
        let tools = MdbTools::with_bin_dir("/nonexistent/bin");
        let err = tools.list_tables("whatever.mdb").unwrap_err();
        assert!(matches!(err, MdbError::ExternalTool { .. }));
    }

    #[test]
    fn test_decode_output_strict() {
        assert_eq!(decode_output(b"hello", UTF_8).unwrap(), "hello");

        // 0xE9 is not valid UTF-8 on its own but is 'e-acute' in ISO-8859-1
        let raw = [0x63, 0x61, 0x66, 0xE9];
        assert!(matches!(
            decode_output(&raw, UTF_8).unwrap_err(),
            MdbError::Decode { .. }
        ));
        assert_eq!(decode_output(&raw, ISO_8859_1).unwrap(), "caf\u{e9}");
    }
}
