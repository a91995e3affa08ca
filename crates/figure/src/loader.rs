//! Filesystem loader for included files.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::trace;

use figure_parser::{LoadError, LoadedSource, Loader};

/// A [`Loader`] reading included files from disk.
///
/// Relative paths resolve against the directory of the including file when
/// that file has an absolute name, and against `base_dir` otherwise. Loaded
/// files are named by their canonical path, so cycle detection sees one name
/// per file however it is reached.
#[derive(Debug, Clone)]
pub struct FsLoader {
    base_dir: PathBuf,
}

impl FsLoader {
    /// Create a loader resolving top-level includes against `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn resolve(&self, path: &str, from: &str) -> PathBuf {
        let from = Path::new(from);
        let dir = from
            .is_absolute()
            .then(|| from.parent())
            .flatten()
            .unwrap_or(self.base_dir.as_path());
        dir.join(path)
    }
}

impl Default for FsLoader {
    fn default() -> Self {
        Self::new(".")
    }
}

impl Loader for FsLoader {
    fn load(&self, path: &str, from: &str) -> Result<LoadedSource, LoadError> {
        let resolved = self.resolve(path, from);
        trace!(path = path, resolved:? = resolved; "Loading include");

        let canonical = resolved
            .canonicalize()
            .map_err(|err| load_error(path, err))?;
        let text = fs::read_to_string(&canonical).map_err(|err| load_error(path, err))?;

        Ok(LoadedSource::new(canonical.display().to_string(), text))
    }
}

fn load_error(path: &str, err: io::Error) -> LoadError {
    match err.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound {
            path: path.to_string(),
        },
        _ => LoadError::Io {
            path: path.to_string(),
            source: err,
        },
    }
}
