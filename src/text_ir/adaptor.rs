//! TextIR adaptor implementation.
//!
//! Exposes a parsed [`TextIR`] through [`IrAdaptor`] without copying it:
//! references are plain indices into the module's flat vectors.

use super::{Operation, TextIR, TypeId};
use crate::core::{Inst, IrAdaptor, SourceLocation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncRef(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRef(pub u32);

/// Adaptor that implements IrAdaptor for TextIR.
pub struct TextIRAdaptor<'ir> {
    ir: &'ir TextIR,
}

impl<'ir> TextIRAdaptor<'ir> {
    pub fn new(ir: &'ir TextIR) -> Self {
        Self { ir }
    }

    /// Handle of the function called `name`, if the module has one.
    pub fn func_by_name(&self, name: &str) -> Option<FuncRef> {
        self.ir.function_index(name).map(FuncRef)
    }

    /// Get the name of a block.
    pub fn block_name(&self, block: BlockRef) -> &str {
        &self.ir.blocks[block.0 as usize].name
    }
}

impl IrAdaptor for TextIRAdaptor<'_> {
    type FuncRef = FuncRef;
    type BlockRef = BlockRef;
    type TypeRef = TypeId;

    fn func_count(&self) -> usize {
        self.ir.functions.len()
    }

    fn funcs(&self) -> Box<dyn Iterator<Item = FuncRef> + '_> {
        Box::new((0..self.ir.functions.len() as u32).map(FuncRef))
    }

    fn func_link_name(&self, func: FuncRef) -> &str {
        &self.ir.functions[func.0 as usize].name
    }

    fn func_is_declaration(&self, func: FuncRef) -> bool {
        self.ir.functions[func.0 as usize].declaration
    }

    fn func_source(&self, func: FuncRef) -> Option<SourceLocation<'_>> {
        self.ir.functions[func.0 as usize]
            .source
            .as_ref()
            .map(|source| SourceLocation {
                directory: &source.directory,
                filename: &source.filename,
            })
    }

    fn func_blocks(&self, func: FuncRef) -> Box<dyn Iterator<Item = BlockRef> + '_> {
        let func = &self.ir.functions[func.0 as usize];
        Box::new((func.block_begin_idx..func.block_end_idx).map(BlockRef))
    }

    fn block_insts(&self, block: BlockRef) -> Box<dyn Iterator<Item = Inst<FuncRef, TypeId>> + '_> {
        let block = &self.ir.blocks[block.0 as usize];
        let insts = &self.ir.insts[block.inst_begin_idx as usize..block.inst_end_idx as usize];
        Box::new(insts.iter().map(|inst| match inst.op {
            Operation::Load { ty } => Inst::Load { ty },
            Operation::Store { ty } => Inst::Store { ty },
            Operation::Call { callee } => Inst::Call {
                callee: callee.map(FuncRef),
            },
            Operation::Other { .. } => Inst::Other,
        }))
    }

    fn type_alloc_size(&self, ty: TypeId) -> Option<u64> {
        self.ir.data_layout.alloc_size(&self.ir.types, ty)
    }
}
