//! Provenance filter: does a function belong to the user's project?
//!
//! The test is a raw string prefix on the joined debug-info path. Paths are
//! never normalized, so `..` segments, symlinks and trailing slashes on the
//! root can misclassify a function; that behaviour is kept on purpose.

use crate::core::IrAdaptor;

/// Whether `func` was compiled from a source file under `project_root`.
///
/// Returns `false` for an empty root and for functions without source
/// location metadata. Never logs.
pub fn is_user_defined<A: IrAdaptor>(adaptor: &A, func: A::FuncRef, project_root: &str) -> bool {
    if project_root.is_empty() {
        return false;
    }
    match adaptor.func_source(func) {
        Some(location) => path_in_project(&location.full_path(), project_root),
        None => false,
    }
}

/// Literal prefix test that must end on a `/` boundary.
///
/// `/proj/src/a.c` is inside `/proj`, `/projX/src/a.c` is not, and
/// `/proj/../other/a.c` is (nothing is resolved).
pub fn path_in_project(path: &str, project_root: &str) -> bool {
    if project_root.is_empty() {
        return false;
    }
    match path.strip_prefix(project_root) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || project_root.ends_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_ir::{TextIR, TextIRAdaptor};

    #[test]
    fn test_prefix_inside_project() {
        assert!(path_in_project("/proj/src/a.c", "/proj"));
        assert!(path_in_project("/proj/src/a.c", "/proj/"));
        assert!(path_in_project("/proj", "/proj"));
    }

    #[test]
    fn test_sibling_directory_is_rejected() {
        assert!(!path_in_project("/projX/src/a.c", "/proj"));
        assert!(!path_in_project("/usr/include/stdio.h", "/proj"));
    }

    #[test]
    fn test_dot_dot_segments_are_not_resolved() {
        // Lexically under the root even though it points elsewhere.
        assert!(path_in_project("/proj/../other/a.c", "/proj"));
    }

    #[test]
    fn test_trailing_slash_root_misses_bare_directory() {
        assert!(!path_in_project("/proj", "/proj/"));
    }

    #[test]
    fn test_empty_root_fails_closed() {
        assert!(!path_in_project("/proj/src/a.c", ""));
    }

    #[test]
    fn test_functions_without_metadata_fail_closed() {
        let ir = TextIR::parse(
            "define @with_info !source(\"/proj\", \"src/a.c\") {\n  ret\n}\n\
             define @no_info {\n  ret\n}\n",
        )
        .unwrap();
        let adaptor = TextIRAdaptor::new(&ir);
        let funcs: Vec<_> = adaptor.funcs().collect();

        assert!(is_user_defined(&adaptor, funcs[0], "/proj"));
        assert!(!is_user_defined(&adaptor, funcs[1], "/proj"));
        assert!(!is_user_defined(&adaptor, funcs[0], ""));
    }
}
