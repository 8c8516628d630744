//! Per-function analysis results.
//!
//! A [`FunctionAnalysis`] is immutable once computed and owns its names, so
//! it can outlive the module it was computed from.

use serde::Serialize;

/// Memory-access inventory of one function.
///
/// `bytes` is the sum of the allocation sizes of every loaded type and every
/// stored value type; `loads` and `stores` are instruction counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FunctionAnalysis {
    /// Human-readable name, equal to the mangled name when demangling does not apply.
    #[serde(rename = "Function Name (Demangled)")]
    pub demangled_name: String,

    /// Raw linkage name.
    #[serde(rename = "Function Name (Mangled)")]
    pub mangled_name: String,

    /// Number of load instructions.
    #[serde(rename = "Loads")]
    pub loads: u64,

    /// Number of store instructions.
    #[serde(rename = "Stores")]
    pub stores: u64,

    /// Bytes transferred by all loads and stores.
    #[serde(rename = "Bytes")]
    pub bytes: u64,
}

impl FunctionAnalysis {
    /// Zeroed result for the given names.
    pub fn new(mangled_name: impl Into<String>, demangled_name: impl Into<String>) -> Self {
        Self {
            demangled_name: demangled_name.into(),
            mangled_name: mangled_name.into(),
            ..Self::default()
        }
    }

    /// Whether the function touched memory at all.
    pub fn is_empty(&self) -> bool {
        self.loads == 0 && self.stores == 0
    }
}
