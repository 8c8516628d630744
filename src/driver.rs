// The module driver ties the analysis together. One run scans the whole module twice: first
// to fill the call count table from every direct call, then in module order to analyze each
// function that has a body and whose source file lies under the project root. Every analyzed
// function produces a diagnostic block and one entry in each output sink. Both sinks are
// opened before the analysis pass and finished after it, so the output files are well formed
// even when no function qualifies or the project root is missing.

//! Module driver.

use crate::analysis::{analyze, is_user_defined, AnalysisCache, CallCountTable};
use crate::core::{Config, IrAdaptor, MemcheckError, MemcheckResult};
use crate::output::{write_missing_root, write_report, CsvSink, JsonSink};
use std::io::Write;

/// What a run did, beyond the files it wrote.
#[derive(Debug)]
pub struct RunSummary<F> {
    /// Functions that passed the filter and were written to both sinks.
    pub functions_written: usize,
    /// Instruction walks the run's cache performed.
    pub walks: usize,
    /// Direct-call counts for every callee in the module.
    pub call_counts: CallCountTable<F>,
}

/// Analyze `adaptor` and write both output files under `config.output_dir()`.
///
/// Existing files are overwritten. Diagnostic blocks go to `diagnostics`.
pub fn run<A, W>(adaptor: &A, config: &Config, diagnostics: &mut W) -> MemcheckResult<RunSummary<A::FuncRef>>
where
    A: IrAdaptor,
    W: Write,
{
    let csv_path = config.csv_path();
    let json_path = config.json_path();
    let mut csv = CsvSink::create(&csv_path)?;
    let mut json = JsonSink::create(&json_path)?;

    let summary = run_into(adaptor, config.project_root(), &mut csv, &mut json, diagnostics)?;
    debug_assert_eq!(csv.rows(), json.entries());
    let rows = csv.rows();

    csv.finish()?;
    json.finish()?;
    log::info!(
        "wrote {} function(s) to {} and {}",
        rows,
        csv_path.display(),
        json_path.display()
    );
    Ok(summary)
}

/// Run both passes against already opened sinks.
///
/// The sinks are left open; the caller finishes them.
pub fn run_into<A, C, J, W>(
    adaptor: &A,
    project_root: Option<&str>,
    csv: &mut CsvSink<C>,
    json: &mut JsonSink<J>,
    diagnostics: &mut W,
) -> MemcheckResult<RunSummary<A::FuncRef>>
where
    A: IrAdaptor,
    C: Write,
    J: Write,
    W: Write,
{
    let call_counts = CallCountTable::build(adaptor);
    log::debug!(
        "{} function(s), {} distinct direct callee(s)",
        adaptor.func_count(),
        call_counts.len()
    );

    let mut cache = AnalysisCache::new();
    let mut functions_written = 0;

    match project_root {
        None => {
            // Every function fails the filter without a root; report once.
            log::error!("no project root configured, nothing will be analyzed");
            write_missing_root(diagnostics).map_err(MemcheckError::Diagnostics)?;
        }
        Some(root) => {
            for func in adaptor.funcs() {
                if adaptor.func_is_declaration(func) {
                    continue;
                }
                if !is_user_defined(adaptor, func, root) {
                    log::trace!("skipping {}: outside project", adaptor.func_link_name(func));
                    continue;
                }

                let analysis = analyze(adaptor, func, &mut cache)?;
                write_report(diagnostics, &analysis).map_err(MemcheckError::Diagnostics)?;
                csv.append(&analysis)?;
                json.append(&analysis)?;
                functions_written += 1;
            }
        }
    }

    Ok(RunSummary {
        functions_written,
        walks: cache.walks(),
        call_counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_ir::{TextIR, TextIRAdaptor};

    const MODULE: &str = r#"
define @kept !source("/proj", "a.c") {
entry:
  %x = load i32, ptr %p
  store i64 0, ptr %q
  call void @ext()
  ret void
}

define @outside !source("/usr/include", "b.h") {
  %y = load i8, ptr %p
  ret void
}

define @nosource {
  ret void
}

declare @ext !source("/proj", "a.c")
"#;

    struct Rendered {
        csv: String,
        json: String,
        diagnostics: String,
    }

    fn render(text: &str, root: Option<&str>) -> (Rendered, usize) {
        let ir = TextIR::parse(text).unwrap();
        let adaptor = TextIRAdaptor::new(&ir);

        let mut csv = CsvSink::new(Vec::new()).unwrap();
        let mut json = JsonSink::new(Vec::new()).unwrap();
        let mut diagnostics = Vec::new();
        let summary = run_into(&adaptor, root, &mut csv, &mut json, &mut diagnostics).unwrap();
        assert_eq!(csv.rows(), summary.functions_written);
        assert_eq!(json.entries(), summary.functions_written);

        let rendered = Rendered {
            csv: String::from_utf8(csv.finish().unwrap()).unwrap(),
            json: String::from_utf8(json.finish().unwrap()).unwrap(),
            diagnostics: String::from_utf8(diagnostics).unwrap(),
        };
        (rendered, summary.functions_written)
    }

    #[test]
    fn test_only_project_bodies_are_written() {
        let (out, written) = render(MODULE, Some("/proj"));
        assert_eq!(written, 1);

        let rows: Vec<&str> = out.csv.lines().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], "kept,kept,1,1,12");

        assert!(out.diagnostics.contains(" Function Name (Mangled): kept"));
        assert!(!out.diagnostics.contains("outside"));
        assert!(!out.diagnostics.contains("ext"));

        let parsed: serde_json::Value = serde_json::from_str(&out.json).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_root_reports_once() {
        let (out, written) = render(MODULE, None);
        assert_eq!(written, 0);
        assert_eq!(out.diagnostics, "Error: $SCOP_ROOT environment variable is not set.\n");
        assert_eq!(out.csv.lines().count(), 1);
        assert_eq!(out.json, "[\n\n]");
    }

    #[test]
    fn test_call_counts_cover_declarations() {
        let ir = TextIR::parse(MODULE).unwrap();
        let adaptor = TextIRAdaptor::new(&ir);
        let mut csv = CsvSink::new(Vec::new()).unwrap();
        let mut json = JsonSink::new(Vec::new()).unwrap();
        let summary = run_into(&adaptor, Some("/proj"), &mut csv, &mut json, &mut Vec::new()).unwrap();

        let ext = adaptor.func_by_name("ext").unwrap();
        let kept = adaptor.func_by_name("kept").unwrap();
        assert_eq!(summary.call_counts.count(ext), 1);
        assert_eq!(summary.call_counts.count(kept), 0);
        assert_eq!(summary.walks, 1);
    }

    #[test]
    fn test_output_order_follows_module() {
        let text = r#"
define @second !source("/p", "x.c") {
  ret void
}
define @first !source("/p", "x.c") {
  ret void
}
"#;
        let (out, written) = render(text, Some("/p"));
        assert_eq!(written, 2);
        let names: Vec<&str> = out
            .csv
            .lines()
            .skip(1)
            .map(|row| row.split(',').next().unwrap())
            .collect();
        assert_eq!(names, vec!["second", "first"]);
    }
}
