// This module implements IrAdaptor for LLVM modules loaded through inkwell. Function handles
// are indices into a table built once at construction time; the table caches each function's
// linkage name, whether it has a body, and the directory/filename pair of its DISubprogram so
// that the string accessors can hand out borrowed data. Blocks are inkwell BasicBlocks walked
// in layout order. Loads are sized by their result type and stores by the type of operand 0,
// both through the module's own data layout (LLVMABISizeOfType, the C API equivalent of
// DataLayout::getTypeAllocSize). A call's callee is resolved when the called operand is one of
// the module's functions; anything else (function pointers, inline asm, casts) is indirect.

//! LLVM adaptor implementation.

use crate::core::{Inst, IrAdaptor, SourceLocation};
use hashbrown::HashMap;
use inkwell::basic_block::BasicBlock;
use inkwell::llvm_sys::core::{LLVMGetCalledValue, LLVMGetOperand, LLVMTypeIsSized, LLVMTypeOf};
use inkwell::llvm_sys::debuginfo::{
    LLVMDIFileGetDirectory, LLVMDIFileGetFilename, LLVMDIScopeGetFile, LLVMGetSubprogram,
};
use inkwell::llvm_sys::prelude::{LLVMMetadataRef, LLVMTypeRef, LLVMValueRef};
use inkwell::llvm_sys::target::{LLVMABISizeOfType, LLVMGetModuleDataLayout, LLVMTargetDataRef};
use inkwell::module::Module;
use inkwell::values::{AsValueRef, FunctionValue, InstructionOpcode, InstructionValue};
use std::os::raw::{c_char, c_uint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncRef(pub u32);

/// Raw LLVM type handle, sized through the module's data layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeRef(LLVMTypeRef);

struct FunctionEntry<'ctx> {
    value: FunctionValue<'ctx>,
    name: String,
    declaration: bool,
    source: Option<(String, String)>,
}

/// Adaptor that implements IrAdaptor for an inkwell [`Module`].
pub struct LlvmAdaptor<'m, 'ctx> {
    // Function and block handles stay valid only while the module is borrowed.
    _module: &'m Module<'ctx>,
    target_data: LLVMTargetDataRef,
    funcs: Vec<FunctionEntry<'ctx>>,
    func_lookup: HashMap<LLVMValueRef, FuncRef>,
}

impl<'m, 'ctx> LlvmAdaptor<'m, 'ctx> {
    pub fn new(module: &'m Module<'ctx>) -> Self {
        let mut funcs = Vec::new();
        let mut func_lookup = HashMap::new();

        for value in module.get_functions() {
            let idx = FuncRef(funcs.len() as u32);
            func_lookup.insert(value.as_value_ref(), idx);
            funcs.push(FunctionEntry {
                value,
                name: value.get_name().to_string_lossy().into_owned(),
                declaration: value.get_first_basic_block().is_none(),
                source: subprogram_file(value),
            });
        }

        // The data layout is owned by the module and lives as long as it does.
        let target_data = unsafe { LLVMGetModuleDataLayout(module.as_mut_ptr()) };

        log::trace!("LLVM module '{}': {} functions", module.get_name().to_string_lossy(), funcs.len());
        Self {
            _module: module,
            target_data,
            funcs,
            func_lookup,
        }
    }

    /// Handle of the function called `name`, if the module has one.
    pub fn func_by_name(&self, name: &str) -> Option<FuncRef> {
        self.funcs
            .iter()
            .position(|entry| entry.name == name)
            .map(|idx| FuncRef(idx as u32))
    }

    fn entry(&self, func: FuncRef) -> &FunctionEntry<'ctx> {
        &self.funcs[func.0 as usize]
    }

    fn classify(&self, inst: InstructionValue<'ctx>) -> Inst<FuncRef, TypeRef> {
        let raw = inst.as_value_ref();
        match inst.get_opcode() {
            InstructionOpcode::Load => Inst::Load {
                ty: TypeRef(unsafe { LLVMTypeOf(raw) }),
            },
            InstructionOpcode::Store => Inst::Store {
                ty: TypeRef(unsafe { LLVMTypeOf(LLVMGetOperand(raw, 0)) }),
            },
            InstructionOpcode::Call => {
                let called = unsafe { LLVMGetCalledValue(raw) };
                Inst::Call {
                    callee: self.func_lookup.get(&called).copied(),
                }
            }
            _ => Inst::Other,
        }
    }
}

impl<'ctx> IrAdaptor for LlvmAdaptor<'_, 'ctx> {
    type FuncRef = FuncRef;
    type BlockRef = BasicBlock<'ctx>;
    type TypeRef = TypeRef;

    fn func_count(&self) -> usize {
        self.funcs.len()
    }

    fn funcs(&self) -> Box<dyn Iterator<Item = FuncRef> + '_> {
        Box::new((0..self.funcs.len() as u32).map(FuncRef))
    }

    fn func_link_name(&self, func: FuncRef) -> &str {
        &self.entry(func).name
    }

    fn func_is_declaration(&self, func: FuncRef) -> bool {
        self.entry(func).declaration
    }

    fn func_source(&self, func: FuncRef) -> Option<SourceLocation<'_>> {
        self.entry(func)
            .source
            .as_ref()
            .map(|(directory, filename)| SourceLocation { directory, filename })
    }

    fn func_blocks(&self, func: FuncRef) -> Box<dyn Iterator<Item = BasicBlock<'ctx>> + '_> {
        Box::new(self.entry(func).value.get_basic_blocks().into_iter())
    }

    fn block_insts(&self, block: BasicBlock<'ctx>) -> Box<dyn Iterator<Item = Inst<FuncRef, TypeRef>> + '_> {
        let insts = std::iter::successors(block.get_first_instruction(), |inst| inst.get_next_instruction());
        Box::new(insts.map(move |inst| self.classify(inst)))
    }

    fn type_alloc_size(&self, ty: TypeRef) -> Option<u64> {
        unsafe {
            if LLVMTypeIsSized(ty.0) == 0 {
                return None;
            }
            Some(LLVMABISizeOfType(self.target_data, ty.0))
        }
    }
}

/// Directory and filename of the function's `DISubprogram`, if it has one.
fn subprogram_file(func: FunctionValue<'_>) -> Option<(String, String)> {
    unsafe {
        let subprogram = LLVMGetSubprogram(func.as_value_ref());
        if subprogram.is_null() {
            return None;
        }
        let file = LLVMDIScopeGetFile(subprogram);
        if file.is_null() {
            return None;
        }
        let directory = metadata_string(file, LLVMDIFileGetDirectory);
        let filename = metadata_string(file, LLVMDIFileGetFilename);
        Some((directory, filename))
    }
}

unsafe fn metadata_string(
    file: LLVMMetadataRef,
    getter: unsafe extern "C" fn(LLVMMetadataRef, *mut c_uint) -> *const c_char,
) -> String {
    let mut len: c_uint = 0;
    let ptr = getter(file, &mut len);
    if ptr.is_null() || len == 0 {
        return String::new();
    }
    let bytes = std::slice::from_raw_parts(ptr as *const u8, len as usize);
    String::from_utf8_lossy(bytes).into_owned()
}
