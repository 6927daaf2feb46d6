use crate::constants::DEFAULT_EPG_THRESHOLD;
use crate::filter::{FirstProgram, ProgramSelector};

/// Configuration for EPG extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpgOptions {
    /// Keys seen this many times or fewer are treated as noise
    pub threshold: u32,
}

impl Default for EpgOptions {
    fn default() -> Self {
        Self { threshold: DEFAULT_EPG_THRESHOLD }
    }
}

/// Configuration for the program splitter
pub struct SplitOptions {
    pub selector: Box<dyn ProgramSelector>,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self { selector: Box::new(FirstProgram) }
    }
}

/// Packet counters of one copy pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub kept: u64,
    pub dropped: u64,
    pub pat_replaced: u64,
}

/// Counters of one EPG extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EpgStats {
    pub sections: u64,
    pub events: u64,
    pub incomplete: u64,
    pub keys: u64,
    pub written: u64,
}
