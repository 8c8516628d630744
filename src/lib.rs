//! memcheck - per-function memory access inventory for compiled modules.
//!
//! memcheck walks every function of a compiled module that was built from a
//! source file under the project root, counts its load and store
//! instructions, and sums the bytes those instructions move according to the
//! module's data layout. Results go to `static_function_analysis.csv` and
//! `static_function_analysis.json`, with a readable block per function on the
//! diagnostic stream.
//!
//! # Primary Usage
//!
//! ```ignore
//! use memcheck::core::Config;
//! use memcheck::text_ir::{TextIR, TextIRAdaptor};
//!
//! let ir = TextIR::parse(&std::fs::read_to_string("module.tir")?)?;
//! let config = Config::from_env();
//! let summary = memcheck::driver::run(&TextIRAdaptor::new(&ir), &config, &mut std::io::stderr())?;
//! ```
//!
//! # Architecture
//!
//! - [`core`] - IrAdaptor seam, configuration and errors
//! - [`analysis`] - Provenance filter, classifier, cache and call counts
//! - [`driver`] - Module driver tying analysis and output together
//! - [`output`] - CSV and JSON sinks, diagnostic report
//! - [`text_ir`] - Textual IR front end
//! - `llvm` - LLVM bitcode and `.ll` front end (feature `llvm`)

pub mod analysis;
pub mod core;
pub mod demangle;
pub mod driver;
pub mod output;
pub mod text_ir;

#[cfg(feature = "llvm")]
pub mod llvm;

pub use crate::analysis::{AnalysisCache, CallCountTable, FunctionAnalysis};
pub use crate::core::{Config, Inst, IrAdaptor, MemcheckError, MemcheckResult, SourceLocation};
pub use crate::driver::{run, RunSummary};
