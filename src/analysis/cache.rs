//! Memoized per-function analysis results.
//!
//! One cache lives for one driver run and is shared by every function the
//! run analyzes. A hit hands back the stored result without touching the
//! instruction stream; [`AnalysisCache::walks`] counts the misses.
//!
//! The cache is single-threaded. A parallel driver would need a sharded or
//! locked map whose check-then-insert is atomic per key.

use super::classifier;
use super::result::FunctionAnalysis;
use crate::core::{IrAdaptor, MemcheckResult};
use core::hash::Hash;
use hashbrown::hash_map::Entry;
use hashbrown::HashMap;

/// Map from function identity to its analysis.
#[derive(Debug)]
pub struct AnalysisCache<F> {
    entries: HashMap<F, FunctionAnalysis>,
    walks: usize,
}

impl<F: Copy + Eq + Hash> AnalysisCache<F> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            walks: 0,
        }
    }

    /// Stored result for `func`, if it has been analyzed.
    pub fn get(&self, func: &F) -> Option<&FunctionAnalysis> {
        self.entries.get(func)
    }

    /// Return the stored result for `func`, walking its instructions on a miss.
    pub fn get_or_compute<A>(&mut self, adaptor: &A, func: F) -> MemcheckResult<&FunctionAnalysis>
    where
        A: IrAdaptor<FuncRef = F>,
    {
        match self.entries.entry(func) {
            Entry::Occupied(entry) => {
                log::trace!("cache hit for {}", entry.get().mangled_name);
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                let analysis = classifier::walk_function(adaptor, func)?;
                self.walks += 1;
                Ok(entry.insert(analysis))
            }
        }
    }

    /// Number of cached functions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many instruction walks the cache has performed.
    pub fn walks(&self) -> usize {
        self.walks
    }
}

impl<F: Copy + Eq + Hash> Default for AnalysisCache<F> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_ir::{TextIR, TextIRAdaptor};

    const TWO_FUNCS: &str = "\
define @first {
  %a = load i64
  ret
}
define @second {
  store i8 0
  ret
}
";

    #[test]
    fn test_second_lookup_does_not_walk() {
        let ir = TextIR::parse(TWO_FUNCS).unwrap();
        let adaptor = TextIRAdaptor::new(&ir);
        let first = adaptor.funcs().next().unwrap();
        let mut cache = AnalysisCache::new();

        let once = cache.get_or_compute(&adaptor, first).unwrap().clone();
        let twice = cache.get_or_compute(&adaptor, first).unwrap().clone();

        assert_eq!(once, twice);
        assert_eq!(cache.walks(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_one_entry_per_function() {
        let ir = TextIR::parse(TWO_FUNCS).unwrap();
        let adaptor = TextIRAdaptor::new(&ir);
        let mut cache = AnalysisCache::new();

        for _ in 0..3 {
            for func in adaptor.funcs() {
                cache.get_or_compute(&adaptor, func).unwrap();
            }
        }

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.walks(), 2);
        let second = adaptor.funcs().nth(1).unwrap();
        assert_eq!(cache.get(&second).map(|a| a.bytes), Some(1));
    }
}
