// This module gathers the infrastructure shared by every part of memcheck: the IrAdaptor
// trait that exposes a compiled module to the analysis, the error type used across the
// crate, and the run configuration (project root and output location).

//! Core memcheck infrastructure.
//!
//! # Key Components
//!
//! ## Adaptor (`adaptor`)
//! - Read-only view of a compiled module through [`IrAdaptor`]
//! - Instructions pre-classified as load, store, call or other
//!
//! ## Errors (`error`)
//! - [`MemcheckError`] for every fatal outcome of a run
//!
//! ## Configuration (`config`)
//! - Project root from `SCOP_ROOT`, fixed output file names

pub mod adaptor;
pub mod config;
pub mod error;

pub use adaptor::{Inst, IrAdaptor, SourceLocation};
pub use config::{Config, CSV_FILE_NAME, JSON_FILE_NAME, PROJECT_ROOT_ENV};
pub use error::{MemcheckError, MemcheckResult};
