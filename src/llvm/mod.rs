//! LLVM front end.
//!
//! Loads `.bc` bitcode or `.ll` text through inkwell and exposes the module
//! through [`LlvmAdaptor`].

pub mod adaptor;

pub use adaptor::{FuncRef, LlvmAdaptor, TypeRef};

use crate::core::{MemcheckError, MemcheckResult};
use inkwell::context::Context;
use inkwell::memory_buffer::MemoryBuffer;
use inkwell::module::Module;
use std::path::Path;

/// Load a module from disk; bitcode is recognised by the `.bc` extension.
pub fn load_module<'ctx>(context: &'ctx Context, path: &Path) -> MemcheckResult<Module<'ctx>> {
    let is_bitcode = path.extension().is_some_and(|ext| ext == "bc");
    let module = if is_bitcode {
        Module::parse_bitcode_from_path(path, context)
    } else {
        MemoryBuffer::create_from_file(path).and_then(|buffer| context.create_module_from_ir(buffer))
    };
    let module = module.map_err(|err| MemcheckError::Llvm(format!("{}: {}", path.display(), err)))?;
    log::debug!("loaded LLVM module from {}", path.display());
    Ok(module)
}

/// Parse textual LLVM IR held in memory.
pub fn parse_module<'ctx>(context: &'ctx Context, ir: &str, name: &str) -> MemcheckResult<Module<'ctx>> {
    let buffer = MemoryBuffer::create_from_memory_range_copy(ir.as_bytes(), name);
    context
        .create_module_from_ir(buffer)
        .map_err(|err| MemcheckError::Llvm(err.to_string()))
}
