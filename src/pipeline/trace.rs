//! Textual compilation trace.
//!
//! Records are appended to `turbo-<pid>.cfg` in the C1Visualizer layout, so
//! several compilations (and several threads) can share one file.

use super::info::CompilationInfo;
use crate::core::{CompileError, CompileResult};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Compilation-identity record written before anything else for a function.
#[derive(Debug, Clone, Copy)]
pub struct AsC1VCompilation<'a> {
    name: &'a str,
    date_millis: u128,
}

impl<'a> AsC1VCompilation<'a> {
    pub fn new(info: &CompilationInfo<'a>) -> Self {
        let date_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or(0);
        Self::with_timestamp(info.debug_name(), date_millis)
    }

    pub fn with_timestamp(name: &'a str, date_millis: u128) -> Self {
        Self { name, date_millis }
    }
}

impl fmt::Display for AsC1VCompilation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "begin_compilation")?;
        writeln!(f, "  name \"{}\"", self.name)?;
        writeln!(f, "  method \"{}\"", self.name)?;
        writeln!(f, "  date {}", self.date_millis)?;
        writeln!(f, "end_compilation")
    }
}

/// Append-mode handle on the per-process trace file.
#[derive(Debug)]
pub struct CfgTraceFile {
    path: PathBuf,
    file: File,
}

impl CfgTraceFile {
    pub fn file_name() -> String {
        format!("turbo-{}.cfg", std::process::id())
    }

    /// Open (creating if needed) the trace file inside `dir`.
    pub fn open(dir: &Path) -> CompileResult<Self> {
        let path = dir.join(Self::file_name());
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| CompileError::TraceIo {
                path: path.clone(),
                source,
            })?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single write.
    pub fn write_compilation(&mut self, record: &AsC1VCompilation<'_>) -> CompileResult<()> {
        let text = record.to_string();
        self.file
            .write_all(text.as_bytes())
            .and_then(|()| self.file.flush())
            .map_err(|source| CompileError::TraceIo {
                path: self.path.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_format() {
        let record = AsC1VCompilation::with_timestamp("wasm-function#3", 1234);
        assert_eq!(
            record.to_string(),
            "begin_compilation\n  name \"wasm-function#3\"\n  method \"wasm-function#3\"\n  date 1234\nend_compilation\n"
        );
    }

    #[test]
    fn test_append_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut trace = CfgTraceFile::open(dir.path()).unwrap();
        trace
            .write_compilation(&AsC1VCompilation::with_timestamp("a", 1))
            .unwrap();
        drop(trace);

        let mut trace = CfgTraceFile::open(dir.path()).unwrap();
        trace
            .write_compilation(&AsC1VCompilation::with_timestamp("b", 2))
            .unwrap();

        let contents = std::fs::read_to_string(trace.path()).unwrap();
        assert_eq!(contents.matches("begin_compilation").count(), 2);
        assert!(contents.contains("name \"a\""));
        assert!(contents.contains("name \"b\""));
        assert!(trace.path().ends_with(CfgTraceFile::file_name()));
    }

    #[test]
    fn test_open_in_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = CfgTraceFile::open(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, CompileError::TraceIo { .. }));
    }
}
