//! Limits applied while compiling a document.

/// Default maximum nesting of `#include` directives.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 64;

/// Default maximum number of paths one section header may expand into.
pub const DEFAULT_MAX_EXPANSIONS: usize = 4096;

/// Default maximum nesting of values, dotted keys and section paths.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 128;

/// Configuration for the compile passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileConfig {
    /// Maximum nesting of included files below the root document
    pub max_include_depth: usize,
    /// Maximum number of concrete paths produced by one section header
    pub max_expansions: usize,
    /// Maximum nesting depth accepted by the parser
    pub max_nesting_depth: usize,
}

impl CompileConfig {
    /// Create a new CompileConfig with the specified limits
    pub fn new(max_include_depth: usize, max_expansions: usize) -> Self {
        Self {
            max_include_depth,
            max_expansions,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }

    /// Set the maximum nesting depth
    pub fn with_max_nesting_depth(mut self, max_nesting_depth: usize) -> Self {
        self.max_nesting_depth = max_nesting_depth;
        self
    }
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_INCLUDE_DEPTH, DEFAULT_MAX_EXPANSIONS)
    }
}
