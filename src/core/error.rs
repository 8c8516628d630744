// This module defines the error types for memcheck using the thiserror crate. MemcheckError
// covers the fatal outcomes of a run: I/O failures on the two output files or the diagnostic
// stream, CSV/JSON serialization failures, text IR parse errors (with the offending line),
// malformed data-layout strings, load/store types without a size under the data layout, byte
// totals that overflow a u64, calls to functions the module never defines, and LLVM loading
// failures when the `llvm` feature is enabled. A missing project root is not an error: the
// driver reports it once and produces empty outputs.

//! Error types for memcheck.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for analysis runs.
#[derive(Error, Debug)]
pub enum MemcheckError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write diagnostics: {0}")]
    Diagnostics(#[source] io::Error),

    #[error("CSV output failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid data layout specification '{spec}': {reason}")]
    DataLayout { spec: String, reason: String },

    #[error("{opcode} in function {function} accesses a type with no allocation size")]
    UnsizedType {
        function: String,
        opcode: &'static str,
    },

    #[error("Byte total of function {function} overflows 64 bits")]
    SizeOverflow { function: String },

    #[error("Call to undefined function @{callee} in @{caller}")]
    UndefinedCallee { caller: String, callee: String },

    #[cfg(feature = "llvm")]
    #[error("LLVM error: {0}")]
    Llvm(String),
}

impl MemcheckError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for analysis operations.
pub type MemcheckResult<T> = Result<T, MemcheckError>;
