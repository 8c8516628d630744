// This module implements the instruction classifier, the part of memcheck that turns a
// function body into a FunctionAnalysis. It walks every block in layout order and every
// instruction within it exactly once, counting loads and stores and adding the allocation
// size of each accessed type under the module's data layout. Calls and all other opcodes are
// ignored here; the module driver observes calls separately for the call count table.
// Results go through the AnalysisCache so that a function is walked at most once per run.

//! Load/store classification with byte accounting.

use super::cache::AnalysisCache;
use super::result::FunctionAnalysis;
use crate::core::{Inst, IrAdaptor, MemcheckError, MemcheckResult};
use crate::demangle::demangle;

/// Analyze `func`, reusing the cached result when there is one.
pub fn analyze<A: IrAdaptor>(
    adaptor: &A,
    func: A::FuncRef,
    cache: &mut AnalysisCache<A::FuncRef>,
) -> MemcheckResult<FunctionAnalysis> {
    cache.get_or_compute(adaptor, func).cloned()
}

/// Walk every instruction of `func` once and build a fresh result.
///
/// Fails when a load or store names a type without an allocation size,
/// which means the module itself is malformed, or when the byte total no
/// longer fits in a u64.
pub fn walk_function<A: IrAdaptor>(adaptor: &A, func: A::FuncRef) -> MemcheckResult<FunctionAnalysis> {
    let name = adaptor.func_link_name(func);
    let mut result = FunctionAnalysis::new(name, demangle(name));

    for block in adaptor.func_blocks(func) {
        for inst in adaptor.block_insts(block) {
            match inst {
                Inst::Load { ty } => {
                    result.loads += 1;
                    result.bytes = add_bytes(result.bytes, access_size(adaptor, ty, &inst, name)?, name)?;
                }
                Inst::Store { ty } => {
                    result.stores += 1;
                    result.bytes = add_bytes(result.bytes, access_size(adaptor, ty, &inst, name)?, name)?;
                }
                Inst::Call { .. } | Inst::Other => {}
            }
        }
    }

    log::debug!(
        "analyzed {}: {} loads, {} stores, {} bytes",
        result.mangled_name,
        result.loads,
        result.stores,
        result.bytes
    );
    Ok(result)
}

fn access_size<A: IrAdaptor>(
    adaptor: &A,
    ty: A::TypeRef,
    inst: &Inst<A::FuncRef, A::TypeRef>,
    function: &str,
) -> MemcheckResult<u64> {
    adaptor.type_alloc_size(ty).ok_or_else(|| MemcheckError::UnsizedType {
        function: function.to_string(),
        opcode: inst.opcode_name(),
    })
}

fn add_bytes(total: u64, size: u64, function: &str) -> MemcheckResult<u64> {
    total.checked_add(size).ok_or_else(|| MemcheckError::SizeOverflow {
        function: function.to_string(),
    })
}
