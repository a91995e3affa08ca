//! Figure - a sectioned key/value configuration language that compiles to JSON.
//!
//! Source files are made of fields (`key: value`), sections (`[a.b]`) that
//! prefix the fields below them, and `#include` directives. Compiling a file
//! produces a [`Tree`], which serializes to JSON.

pub mod config;

mod error;
mod loader;

pub use figure_core::{Map, Tree, Value};

pub use error::FigureError;
pub use loader::FsLoader;

use std::{fs, path::Path};

use log::{debug, info};

use figure_parser::{CompileConfig, SourceMap};

use config::AppConfig;

/// Compiler for Figure documents.
///
/// # Examples
///
/// ```rust,no_run
/// use figure::{Compiler, config::AppConfig};
///
/// let compiler = Compiler::new(AppConfig::default());
///
/// let tree = compiler.compile_file("app.fig")
///     .expect("Failed to compile");
///
/// let json = compiler.to_json(&tree)
///     .expect("Failed to serialize");
/// println!("{json}");
/// ```
#[derive(Debug, Default)]
pub struct Compiler {
    config: AppConfig,
}

impl Compiler {
    /// Create a new compiler with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration in use.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Compile the file at `path`.
    ///
    /// Includes resolve relative to the directory of the file naming them.
    ///
    /// # Errors
    ///
    /// Returns [`FigureError::Io`] if `path` cannot be read, and
    /// [`FigureError::Compile`] for any error in the document or the files
    /// it includes.
    pub fn compile_file(&self, path: impl AsRef<Path>) -> Result<Tree, FigureError> {
        let path = path.as_ref().canonicalize()?;
        info!(input_path:? = path; "Compiling file");

        let text = fs::read_to_string(&path)?;
        let base_dir = path.parent().unwrap_or(Path::new("."));

        self.compile(path.display().to_string(), text, &FsLoader::new(base_dir))
    }

    /// Compile in-memory source text registered under `name`.
    ///
    /// Includes resolve relative to the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`FigureError::Compile`] for any error in the document or the
    /// files it includes.
    ///
    /// # Examples
    ///
    /// ```
    /// use figure::Compiler;
    ///
    /// let compiler = Compiler::default();
    /// let tree = compiler.compile_str("[server] port: 8080", "inline.fig").unwrap();
    ///
    /// assert_eq!(tree.get_path("server.port").and_then(|v| v.as_integer()), Some(8080));
    /// ```
    pub fn compile_str(&self, source: &str, name: &str) -> Result<Tree, FigureError> {
        info!(name = name; "Compiling source");
        self.compile(name.to_string(), source.to_string(), &FsLoader::default())
    }

    /// Serialize a tree to JSON, pretty-printed unless the output config
    /// asks for compact output.
    ///
    /// # Errors
    ///
    /// Returns [`FigureError::Serialize`] if serialization fails.
    pub fn to_json(&self, tree: &Tree) -> Result<String, FigureError> {
        let json = if self.config.output().pretty() {
            serde_json::to_string_pretty(tree)?
        } else {
            serde_json::to_string(tree)?
        };
        Ok(json)
    }

    fn compile(&self, name: String, text: String, loader: &FsLoader) -> Result<Tree, FigureError> {
        let mut sources = SourceMap::new();
        let file = sources.add(name, text);
        let config = CompileConfig::from(self.config.compile());

        let result = figure_parser::parse_with_config(sources.file(file).text(), file, &config)
            .and_then(|document| figure_parser::compile(document, &mut sources, loader, &config));

        match result {
            Ok(tree) => {
                debug!(keys = tree.len(), files = sources.len(); "Compiled successfully");
                Ok(tree)
            }
            Err(err) => Err(FigureError::new_compile_error(err, sources)),
        }
    }
}
