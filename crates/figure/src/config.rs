//! Configuration types for compiling Figure documents.
//!
//! All types implement [`serde::Deserialize`], and every section falls back
//! to its defaults when missing, so an empty file is a valid configuration.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining compile and output settings.
//! - [`CompileSettings`] - Limits applied by the compiler.
//! - [`OutputConfig`] - Controls how the JSON output is written.
//!
//! # Example
//!
//! ```
//! # use figure::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.compile().max_include_depth(), 64);
//! assert!(config.output().pretty());
//! ```

use serde::Deserialize;

use figure_parser::{
    CompileConfig, DEFAULT_MAX_EXPANSIONS, DEFAULT_MAX_INCLUDE_DEPTH, DEFAULT_MAX_NESTING_DEPTH,
};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Compile limits section.
    #[serde(default)]
    compile: CompileSettings,

    /// Output section.
    #[serde(default)]
    output: OutputConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(compile: CompileSettings, output: OutputConfig) -> Self {
        Self { compile, output }
    }

    /// Returns the compile settings.
    pub fn compile(&self) -> &CompileSettings {
        &self.compile
    }

    /// Returns the output settings.
    pub fn output(&self) -> &OutputConfig {
        &self.output
    }

    /// Returns a copy with the output settings replaced.
    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }
}

/// Limits applied while compiling.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CompileSettings {
    /// Maximum nesting of included files.
    max_include_depth: usize,

    /// Maximum number of paths one section header may expand into.
    max_expansions: usize,

    /// Maximum nesting of lists, maps, dotted keys and section paths.
    max_nesting_depth: usize,
}

impl CompileSettings {
    /// Creates new [`CompileSettings`] with the specified limits.
    ///
    /// # Arguments
    ///
    /// * `max_include_depth` - Maximum nesting of `#include` directives.
    /// * `max_expansions` - Maximum paths produced by one section header.
    pub fn new(max_include_depth: usize, max_expansions: usize) -> Self {
        Self {
            max_include_depth,
            max_expansions,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }

    /// Returns a copy with the nesting limit replaced.
    pub fn with_max_nesting_depth(mut self, max_nesting_depth: usize) -> Self {
        self.max_nesting_depth = max_nesting_depth;
        self
    }

    pub fn max_include_depth(&self) -> usize {
        self.max_include_depth
    }

    pub fn max_expansions(&self) -> usize {
        self.max_expansions
    }

    pub fn max_nesting_depth(&self) -> usize {
        self.max_nesting_depth
    }
}

impl Default for CompileSettings {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_INCLUDE_DEPTH, DEFAULT_MAX_EXPANSIONS)
    }
}

impl From<&CompileSettings> for CompileConfig {
    fn from(settings: &CompileSettings) -> Self {
        CompileConfig::new(settings.max_include_depth, settings.max_expansions)
            .with_max_nesting_depth(settings.max_nesting_depth)
    }
}

/// JSON output settings.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print the JSON output.
    pretty: bool,
}

impl OutputConfig {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Returns `true` if the output is pretty-printed.
    pub fn pretty(&self) -> bool {
        self.pretty
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::new(true)
    }
}
