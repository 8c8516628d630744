//! Output sinks.
//!
//! Each analyzed function is appended to both files in module order, and a
//! diagnostic block goes to the diagnostic stream.

pub mod csv;
pub mod json;
pub mod report;

pub use self::csv::{CsvSink, CSV_HEADER};
pub use self::json::JsonSink;
pub use self::report::{write_missing_root, write_report};
