//! Tabular sink (`static_function_analysis.csv`).
//!
//! The header row is written when the sink opens, so a run that analyzes
//! nothing still leaves a header-only file. Fields containing a comma or a
//! double quote are quoted and embedded quotes doubled.

use crate::analysis::FunctionAnalysis;
use crate::core::{MemcheckError, MemcheckResult};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Header row, written verbatim.
pub const CSV_HEADER: [&str; 5] = [
    "'Function Name (Demangled)'",
    "'Function Name (Mangled)'",
    "'Loads'",
    "'Stores'",
    "'Bytes'",
];

pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    path: Option<PathBuf>,
    rows: usize,
}

impl CsvSink<File> {
    /// Create (or truncate) the file at `path` and write the header.
    pub fn create(path: &Path) -> MemcheckResult<Self> {
        let file = File::create(path).map_err(|source| MemcheckError::io(path, source))?;
        let mut sink = Self::new(file)?;
        sink.path = Some(path.to_path_buf());
        Ok(sink)
    }
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W) -> MemcheckResult<Self> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(inner);
        writer.write_record(CSV_HEADER)?;
        Ok(Self {
            writer,
            path: None,
            rows: 0,
        })
    }

    /// Append one data row.
    pub fn append(&mut self, analysis: &FunctionAnalysis) -> MemcheckResult<()> {
        let loads = analysis.loads.to_string();
        let stores = analysis.stores.to_string();
        let bytes = analysis.bytes.to_string();
        self.writer.write_record([
            analysis.demangled_name.as_str(),
            analysis.mangled_name.as_str(),
            &loads,
            &stores,
            &bytes,
        ])?;
        self.rows += 1;
        Ok(())
    }

    /// Data rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(self) -> MemcheckResult<W> {
        let path = self.path;
        self.writer.into_inner().map_err(|err| {
            let source = err.into_error();
            match path {
                Some(path) => MemcheckError::io(path, source),
                None => MemcheckError::Csv(csv::Error::from(source)),
            }
        })
    }
}
