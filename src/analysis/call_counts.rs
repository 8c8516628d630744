//! Direct-call counts across the whole module.
//!
//! The table is built on every driver run for every function, user-defined
//! or not. Nothing in the analysis consumes it yet; it is exposed through
//! [`crate::driver::RunSummary`].

use crate::core::{Inst, IrAdaptor};
use core::hash::Hash;
use hashbrown::HashMap;

/// Number of direct call sites per callee.
#[derive(Debug, Clone)]
pub struct CallCountTable<F> {
    counts: HashMap<F, usize>,
}

impl<F: Copy + Eq + Hash> CallCountTable<F> {
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }

    /// Scan every instruction of every function for calls with a known callee.
    pub fn build<A: IrAdaptor<FuncRef = F>>(adaptor: &A) -> Self {
        let mut table = Self::new();
        for func in adaptor.funcs() {
            for block in adaptor.func_blocks(func) {
                for inst in adaptor.block_insts(block) {
                    if let Inst::Call {
                        callee: Some(callee),
                    } = inst
                    {
                        table.record(callee);
                    }
                }
            }
        }
        log::trace!("call count table holds {} callees", table.len());
        table
    }

    pub fn record(&mut self, callee: F) {
        *self.counts.entry(callee).or_insert(0) += 1;
    }

    /// Call sites targeting `func`; zero when it is never called directly.
    pub fn count(&self, func: F) -> usize {
        self.counts.get(&func).copied().unwrap_or(0)
    }

    /// Number of distinct callees.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (F, usize)> + '_ {
        self.counts.iter().map(|(&func, &count)| (func, count))
    }
}

impl<F: Copy + Eq + Hash> Default for CallCountTable<F> {
    fn default() -> Self {
        Self::new()
    }
}
