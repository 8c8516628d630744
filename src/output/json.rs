//! Structured-document sink (`static_function_analysis.json`).
//!
//! Entries are streamed as they arrive: `[` and a newline on open, objects
//! separated by `,\n`, and `\n]` on finish. A run with no entries therefore
//! produces `[\n\n]`.

use crate::analysis::FunctionAnalysis;
use crate::core::{MemcheckError, MemcheckResult};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct JsonSink<W: Write> {
    out: W,
    path: Option<PathBuf>,
    entries: usize,
}

impl JsonSink<BufWriter<File>> {
    /// Create (or truncate) the file at `path` and open the array.
    pub fn create(path: &Path) -> MemcheckResult<Self> {
        let file = File::create(path).map_err(|source| MemcheckError::io(path, source))?;
        let mut sink = Self {
            out: BufWriter::new(file),
            path: Some(path.to_path_buf()),
            entries: 0,
        };
        sink.write(b"[\n")?;
        Ok(sink)
    }
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> MemcheckResult<Self> {
        let mut sink = Self {
            out,
            path: None,
            entries: 0,
        };
        sink.write(b"[\n")?;
        Ok(sink)
    }

    /// Append one object, indented one level inside the array.
    pub fn append(&mut self, analysis: &FunctionAnalysis) -> MemcheckResult<()> {
        let object = serde_json::to_string_pretty(analysis)?;

        let mut chunk = String::with_capacity(object.len() + 64);
        if self.entries > 0 {
            chunk.push_str(",\n");
        }
        for (idx, line) in object.lines().enumerate() {
            if idx > 0 {
                chunk.push('\n');
            }
            chunk.push_str("  ");
            chunk.push_str(line);
        }

        self.write(chunk.as_bytes())?;
        self.entries += 1;
        Ok(())
    }

    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Close the array, flush, and hand back the underlying writer.
    pub fn finish(mut self) -> MemcheckResult<W> {
        self.write(b"\n]")?;
        self.out.flush().map_err(|err| self.io_error(err))?;
        Ok(self.out)
    }

    fn write(&mut self, bytes: &[u8]) -> MemcheckResult<()> {
        self.out.write_all(bytes).map_err(|err| self.io_error(err))
    }

    fn io_error(&self, err: io::Error) -> MemcheckError {
        match &self.path {
            Some(path) => MemcheckError::io(path, err),
            None => MemcheckError::Json(serde_json::Error::io(err)),
        }
    }
}
