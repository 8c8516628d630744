//! Human-readable diagnostic block written for every analyzed function.

use crate::analysis::FunctionAnalysis;
use crate::core::PROJECT_ROOT_ENV;
use std::io::{self, Write};

const SEPARATOR: &str = "-------------------------------------------";

pub fn write_report<W: Write>(out: &mut W, analysis: &FunctionAnalysis) -> io::Result<()> {
    writeln!(out, "{SEPARATOR}")?;
    writeln!(out, " Function Name (Demangled): {}", analysis.demangled_name)?;
    writeln!(out, " Function Name (Mangled): {}", analysis.mangled_name)?;
    writeln!(out, "{SEPARATOR}")?;
    writeln!(out, "  'Loads': {}", analysis.loads)?;
    writeln!(out, "  'Stores': {}", analysis.stores)?;
    writeln!(out, "  'Bytes': {}", analysis.bytes)?;
    writeln!(out, "{SEPARATOR}")?;
    writeln!(out)
}

/// The one-line report for a missing project root.
pub fn write_missing_root<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "Error: ${PROJECT_ROOT_ENV} environment variable is not set.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_block() {
        let analysis = FunctionAnalysis {
            loads: 2,
            stores: 1,
            bytes: 12,
            ..FunctionAnalysis::new("_Z3addii", "add(int, int)")
        };
        let mut out = Vec::new();
        write_report(&mut out, &analysis).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], SEPARATOR);
        assert_eq!(lines[1], " Function Name (Demangled): add(int, int)");
        assert_eq!(lines[2], " Function Name (Mangled): _Z3addii");
        assert_eq!(lines[4], "  'Loads': 2");
        assert_eq!(lines[6], "  'Bytes': 12");
        assert_eq!(lines[8], "");
    }

    #[test]
    fn test_missing_root_line() {
        let mut out = Vec::new();
        write_missing_root(&mut out).unwrap();
        assert_eq!(out, b"Error: $SCOP_ROOT environment variable is not set.\n");
    }
}
