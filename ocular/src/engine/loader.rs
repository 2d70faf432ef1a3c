//! Program file resolution against a search path

use crate::error::{EngineError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Loader {
    search_path: Vec<PathBuf>,
    extension: String,
}

impl Loader {
    pub fn new(search_path: Vec<PathBuf>, extension: impl Into<String>) -> Self {
        Loader {
            search_path,
            extension: extension.into(),
        }
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// `name` with the program extension appended when absent
    pub fn file_name(&self, name: &str) -> String {
        if name.ends_with(&self.extension) {
            name.to_string()
        } else {
            format!("{name}{}", self.extension)
        }
    }

    /// First existing `<dir>/<name>.rpn` along the search path
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let file = self.file_name(name);
        for dir in &self.search_path {
            let candidate = dir.join(&file);
            debug!(path = %candidate.display(), "probing");
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        Err(EngineError::load_failure(file))
    }

    /// Resolve and read a program
    pub fn read(&self, name: &str) -> Result<(PathBuf, String)> {
        let path = self.resolve(name)?;
        let text = read_program(&path)?;
        Ok((path, text))
    }
}

fn read_program(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| EngineError::io_error(format!("{}: {e}", path.display())))
}
