//! Text IR (TIR) module format and its adaptor.
//!
//! A small, line-oriented subset of LLVM assembly that carries exactly what
//! the memory analysis needs: functions with their source files, blocks, and
//! load/store/call instructions with typed operands. It lets the tool and
//! its tests run without an LLVM installation.
//!
//! # TIR Format
//!
//! ```text
//! ; Comments start with semicolon
//! target datalayout = "e-m:e-p:64:64-i64:64-n8:16:32:64-S128"
//! %struct.point = type { i32, i32 }
//!
//! define @add !source("/proj/src", "add.c") {
//! entry:
//!     %a = load i32, ptr %p
//!     store %struct.point %v, ptr %q
//!     call void @log_value(i32 %a)
//!     ret void
//! }
//!
//! declare @log_value
//! ```

use std::fmt;

pub mod adaptor;
pub mod layout;
pub mod parser;

pub use adaptor::{BlockRef, FuncRef, TextIRAdaptor};
pub use layout::{DataLayout, Type, TypeId};

use crate::core::MemcheckResult;

/// A parsed text IR module.
///
/// Functions, blocks and instructions are stored in flat vectors; each
/// function owns a contiguous block range and each block a contiguous
/// instruction range.
#[derive(Debug, Clone, PartialEq)]
pub struct TextIR {
    pub data_layout: DataLayout,
    pub types: Vec<Type>,
    pub functions: Vec<Function>,
    pub blocks: Vec<Block>,
    pub insts: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub declaration: bool,
    pub source: Option<SourceFile>,
    pub block_begin_idx: u32,
    pub block_end_idx: u32,
}

/// Directory and file recorded for a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub directory: String,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub name: String,
    pub inst_begin_idx: u32,
    pub inst_end_idx: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Result name without the `%` sigil.
    pub name: Option<String>,
    pub op: Operation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Load { ty: TypeId },
    Store { ty: TypeId },
    /// `callee` indexes [`TextIR::functions`]; `None` for indirect calls.
    Call { callee: Option<u32> },
    Other { opcode: String },
}

impl Operation {
    pub fn opcode(&self) -> &str {
        match self {
            Operation::Load { .. } => "load",
            Operation::Store { .. } => "store",
            Operation::Call { .. } => "call",
            Operation::Other { opcode } => opcode,
        }
    }
}

impl TextIR {
    pub fn new() -> Self {
        Self {
            data_layout: DataLayout::default(),
            types: Vec::new(),
            functions: Vec::new(),
            blocks: Vec::new(),
            insts: Vec::new(),
        }
    }

    pub fn parse(text: &str) -> MemcheckResult<Self> {
        parser::parse_ir(text)
    }

    /// Look up a function index by name.
    pub fn function_index(&self, name: &str) -> Option<u32> {
        self.functions
            .iter()
            .position(|func| func.name == name)
            .map(|idx| idx as u32)
    }

    /// Render the module structure, one item per line.
    pub fn print(&self) -> String {
        let mut output = String::new();
        output.push_str("Printing IR\n");

        for func in &self.functions {
            if func.declaration {
                output.push_str(&format!("Extern function {}", func.name));
            } else {
                output.push_str(&format!("Function {}", func.name));
            }
            if let Some(source) = &func.source {
                output.push_str(&format!("\nSource {} {}", source.directory, source.filename));
            }

            for block in &self.blocks[func.block_begin_idx as usize..func.block_end_idx as usize] {
                output.push_str(&format!("\nBlock {}", block.name));

                for inst in &self.insts[block.inst_begin_idx as usize..block.inst_end_idx as usize] {
                    match &inst.name {
                        Some(name) => output.push_str(&format!("\nValue {} ({})", name, inst.op.opcode())),
                        None => output.push_str(&format!("\nValue ({})", inst.op.opcode())),
                    }
                    match &inst.op {
                        Operation::Load { ty } | Operation::Store { ty } => {
                            output.push_str(&format!("\nType {}", self.types[ty.0 as usize]));
                        }
                        Operation::Call { callee: Some(callee) } => {
                            output.push_str(&format!("\nTarget {}", self.functions[*callee as usize].name));
                        }
                        Operation::Call { callee: None } => output.push_str("\nTarget <indirect>"),
                        Operation::Other { .. } => {}
                    }
                }
            }
            output.push('\n');
        }

        output
    }
}

impl Default for TextIR {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TextIR {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.print())
    }
}
