//! Memory-access analysis.
//!
//! - [`provenance`] decides which functions belong to the user's project.
//! - [`classifier`] counts loads, stores and bytes for one function.
//! - [`cache`] memoizes those results for the length of a run.
//! - [`call_counts`] records direct calls across the module.

pub mod cache;
pub mod call_counts;
pub mod classifier;
pub mod provenance;
pub mod result;

pub use cache::AnalysisCache;
pub use call_counts::CallCountTable;
pub use classifier::{analyze, walk_function};
pub use provenance::{is_user_defined, path_in_project};
pub use result::FunctionAnalysis;
