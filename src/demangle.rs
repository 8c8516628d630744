//! Best-effort symbol demangling.
//!
//! Rust v0 symbols (`_R`) go through `rustc-demangle`, Itanium symbols
//! (`_Z`, or `__Z` on Darwin) through `cpp_demangle`. Anything that is not
//! recognised, or fails to demangle, comes back unchanged. That includes
//! MSVC (`?`) and D (`_D`) symbols, which are not decoded.

use cpp_demangle::{DemangleOptions, Symbol};

/// Human-readable form of `name`, or `name` itself.
pub fn demangle(name: &str) -> String {
    if name.starts_with("_R") {
        if let Ok(symbol) = rustc_demangle::try_demangle(name) {
            return format!("{symbol:#}");
        }
        return name.to_string();
    }

    let itanium = name.strip_prefix('_').filter(|rest| rest.starts_with("_Z")).unwrap_or(name);
    if itanium.starts_with("_Z") {
        if let Some(demangled) = demangle_itanium(itanium) {
            return demangled;
        }
    }
    name.to_string()
}

fn demangle_itanium(name: &str) -> Option<String> {
    let symbol = Symbol::new(name).ok()?;
    symbol.demangle(&DemangleOptions::default()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names_pass_through() {
        assert_eq!(demangle("add"), "add");
        assert_eq!(demangle("main"), "main");
        assert_eq!(demangle(""), "");
    }

    #[test]
    fn test_itanium_names() {
        assert_eq!(demangle("_Z3addii"), "add(int, int)");
        assert_eq!(demangle("__Z3addii"), "add(int, int)");
    }

    #[test]
    fn test_invalid_mangling_falls_back() {
        assert_eq!(demangle("_Z"), "_Z");
        assert_eq!(demangle("_Z$"), "_Z$");
    }

    #[test]
    fn test_other_manglings_are_kept() {
        assert_eq!(demangle("?add@@YAHHH@Z"), "?add@@YAHHH@Z");
        assert_eq!(demangle("_D4main3addFiiZi"), "_D4main3addFiiZi");
    }
}
