//! Integration tests for the text IR front end.
//!
//! Each fixture under `tests/filetest` is parsed and checked through the
//! printed module and through the adaptor the analysis sees.

use memcheck::analysis::walk_function;
use memcheck::core::{IrAdaptor, MemcheckError};
use memcheck::text_ir::{TextIR, TextIRAdaptor};
use std::fs;
use std::path::Path;

/// Helper to load and parse a TIR file from the fixture directory
fn load_tir_file(filename: &str) -> TextIR {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/filetest").join(filename);
    let contents = fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));

    TextIR::parse(&contents).unwrap_or_else(|e| panic!("Failed to parse {filename}: {e}"))
}

/// Helper to check if output contains expected patterns
fn check_output_contains(output: &str, patterns: &[&str]) {
    for pattern in patterns {
        assert!(
            output.contains(pattern),
            "Output missing expected pattern: '{pattern}'\nFull output:\n{output}"
        );
    }
}

#[test]
fn test_add_tir() {
    let ir = load_tir_file("add.tir");
    let output = ir.print();

    check_output_contains(
        &output,
        &[
            "Printing IR",
            "Function add",
            "Source /proj add.c",
            "Block entry",
            "Value x (load)",
            "Type i32",
            "Value s (add)",
            "Value (store)",
            "Value (ret)",
        ],
    );

    assert_eq!(ir.functions.len(), 1);
    assert_eq!(ir.blocks.len(), 1);
    assert_eq!(ir.insts.len(), 5);
}

#[test]
fn test_calls_tir() {
    let ir = load_tir_file("calls.tir");
    let output = ir.print();

    check_output_contains(
        &output,
        &[
            "Function g",
            "Function f",
            "Block more",
            "Value r (call)",
            "Target g",
            "Target <indirect>",
            "Target h",
            "Extern function h",
        ],
    );
}

#[test]
fn test_layout_tir() {
    let _ = env_logger::builder().is_test(true).try_init();
    let ir = load_tir_file("layout.tir");
    let adaptor = TextIRAdaptor::new(&ir);
    let func = adaptor.func_by_name("layout").unwrap();

    let analysis = walk_function(&adaptor, func).unwrap();
    assert_eq!(analysis.loads, 2);
    assert_eq!(analysis.stores, 2);
    // { i8, i32, i64 } = 16, ptr = 4, [3 x i16] = 6, <4 x float> = 16
    assert_eq!(analysis.bytes, 42);
}

#[test]
fn test_opaque_access_is_fatal() {
    let ir = load_tir_file("opaque.tir");
    let adaptor = TextIRAdaptor::new(&ir);
    let func = adaptor.func_by_name("peek").unwrap();

    match walk_function(&adaptor, func) {
        Err(MemcheckError::UnsizedType { function, opcode }) => {
            assert_eq!(function, "peek");
            assert_eq!(opcode, "load");
        }
        other => panic!("expected an unsized type error, got {other:?}"),
    }
}

#[test]
fn test_mixed_tir_sources() {
    let ir = load_tir_file("mixed.tir");
    let adaptor = TextIRAdaptor::new(&ir);

    assert_eq!(adaptor.func_count(), 5);
    let no_debug = adaptor.func_by_name("no_debug_info").unwrap();
    assert!(adaptor.func_source(no_debug).is_none());

    let bar = adaptor.func_by_name("_Z3barv").unwrap();
    assert!(adaptor.func_is_declaration(bar));
    assert_eq!(adaptor.func_source(bar).unwrap().full_path(), "/proj/src/foo.cpp");
}

#[test]
fn test_parse_errors_carry_line() {
    let err = TextIR::parse("define @f {\nentry:\n  %v = load i7x, ptr %p\n}\n").unwrap_err();
    match err {
        MemcheckError::Parse { line, .. } => assert_eq!(line, 3),
        other => panic!("expected a parse error, got {other:?}"),
    }

    let err = TextIR::parse("define @f {\n  call void @missing()\n  ret void\n}\n").unwrap_err();
    assert!(matches!(err, MemcheckError::UndefinedCallee { .. }));
}
