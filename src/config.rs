//! The VM's only tunables: how many words each semispace and the value
//! stack get. SPEC_FULL.md §10 — deliberately not backed by a configuration
//! file crate; two optional integers don't warrant one.

use crate::heap::DEFAULT_HEAP_WORDS;

pub const DEFAULT_STACK_WORDS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    pub heap_words: usize,
    pub stack_words: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            heap_words: DEFAULT_HEAP_WORDS,
            stack_words: DEFAULT_STACK_WORDS,
        }
    }
}

impl VmConfig {
    /// Start from the defaults, overriding from `CELLVM_HEAP_WORDS` /
    /// `CELLVM_STACK_WORDS` when present and a valid positive integer,
    /// silently falling back to the default otherwise.
    pub fn from_env() -> VmConfig {
        let mut config = VmConfig::default();
        if let Some(n) = env_usize("CELLVM_HEAP_WORDS") {
            config.heap_words = n;
        }
        if let Some(n) = env_usize("CELLVM_STACK_WORDS") {
            config.stack_words = n;
        }
        config
    }
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok()?.parse().ok()
}
