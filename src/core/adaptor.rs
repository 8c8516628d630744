// This module defines the IrAdaptor trait, the read-only bridge between memcheck and a
// compiled module. The analysis never owns the module: it asks the adaptor for the ordered
// function list, each function's linkage name, declaration flag and source location, the
// blocks of a function and the instructions of a block, and the allocation size of a type
// under the module's data layout. Instructions arrive already reduced to the four shapes the
// analysis cares about (load, store, call, other), so adaptors for different IRs (the text IR
// and LLVM) only need to classify opcodes and resolve direct callees.

//! IrAdaptor responsibilities.
//!
//! The adaptor is the glue between memcheck and a compiled module. It assumes:
//! - Functions are listed in module order and identified by a cheap, hashable handle.
//! - A function without a body is a declaration and has no blocks.
//! - Blocks are ordered and every retained block is reported, reachable or not.
//! - Every load/store type that is well formed has an allocation size.

use core::fmt;
use core::hash::Hash;

/// An instruction as seen by the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inst<F, T> {
    /// Memory read; `ty` is the loaded (result) type.
    Load { ty: T },
    /// Memory write; `ty` is the type of the stored value operand.
    Store { ty: T },
    /// Call instruction; `callee` is set when the target is statically known.
    Call { callee: Option<F> },
    /// Anything else.
    Other,
}

impl<F, T> Inst<F, T> {
    /// Opcode mnemonic, used in diagnostics.
    pub fn opcode_name(&self) -> &'static str {
        match self {
            Inst::Load { .. } => "load",
            Inst::Store { .. } => "store",
            Inst::Call { .. } => "call",
            Inst::Other => "other",
        }
    }
}

/// Source file a function was compiled from, as recorded in its debug info.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation<'a> {
    pub directory: &'a str,
    pub filename: &'a str,
}

impl SourceLocation<'_> {
    /// Join directory and filename into one path.
    ///
    /// Mirrors LLVM's `sys::path::append`: a single `/` is inserted unless
    /// one side already provides it, and an empty directory yields the
    /// filename unchanged. No normalization happens.
    pub fn full_path(&self) -> String {
        let dir = self.directory;
        let file = self.filename;
        if dir.is_empty() {
            return file.to_string();
        }
        if dir.ends_with('/') {
            return format!("{dir}{}", file.trim_start_matches('/'));
        }
        if file.starts_with('/') || file.is_empty() {
            return format!("{dir}{file}");
        }
        format!("{dir}/{file}")
    }
}

/// Read-only view of a compiled module.
///
/// Implementations exist for the textual IR ([`crate::text_ir::TextIRAdaptor`])
/// and, with the `llvm` feature, for LLVM modules.
///
/// ```ignore
/// for func in adaptor.funcs() {
///     for block in adaptor.func_blocks(func) {
///         for inst in adaptor.block_insts(block) {
///             if let Inst::Load { ty } = inst {
///                 let _ = adaptor.type_alloc_size(ty);
///             }
///         }
///     }
/// }
/// ```
pub trait IrAdaptor {
    type FuncRef: Copy + Eq + Hash + fmt::Debug;
    type BlockRef: Copy;
    type TypeRef: Copy;

    /// Number of functions contained in the module.
    fn func_count(&self) -> usize;

    /// Iterator over all functions in module order.
    fn funcs(&self) -> Box<dyn Iterator<Item = Self::FuncRef> + '_>;

    /// Raw (possibly mangled) linkage name of the function.
    fn func_link_name(&self, func: Self::FuncRef) -> &str;

    /// Whether the function is only declared (has no body).
    fn func_is_declaration(&self, func: Self::FuncRef) -> bool;

    /// Source file recorded in the function's debug info, if any.
    fn func_source(&self, func: Self::FuncRef) -> Option<SourceLocation<'_>>;

    /// Blocks of the function in layout order. Empty for declarations.
    fn func_blocks(&self, func: Self::FuncRef) -> Box<dyn Iterator<Item = Self::BlockRef> + '_>;

    /// Instructions of a block in order.
    fn block_insts(
        &self,
        block: Self::BlockRef,
    ) -> Box<dyn Iterator<Item = Inst<Self::FuncRef, Self::TypeRef>> + '_>;

    /// Allocation size in bytes of a type, `None` if the type is unsized.
    fn type_alloc_size(&self, ty: Self::TypeRef) -> Option<u64>;
}
