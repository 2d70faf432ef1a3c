//! Runtime configuration loaded from `ocular.toml`
//!
//! Every field has a default, so a partial file (or none at all) is valid.

use crate::error::ConfigError;
use crate::numeric::signal::Boundary;
use crate::optics::DEFAULT_ATTENUATION;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File probed in the working directory when no explicit path is given
pub const DEFAULT_CONFIG_FILE: &str = "ocular.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub optics: OpticsConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directories probed in order by the loader
    pub search_path: Vec<PathBuf>,
    /// Extension appended to program names that lack it
    pub extension: String,
    /// Maximum nesting of calls, groups and loads
    pub max_depth: usize,
    /// Program run by the host on every frame
    pub program: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            search_path: vec![PathBuf::from("."), PathBuf::from("./rpn")],
            extension: ".rpn".to_string(),
            max_depth: 64,
            program: "default".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OpticsConfig {
    pub attenuation: f64,
    /// Convolution mode used when the `boundary` symbol is unset
    pub boundary: Boundary,
    /// Crop host output by the kernel half extents
    pub crop: bool,
}

impl Default for OpticsConfig {
    fn default() -> Self {
        OpticsConfig {
            attenuation: DEFAULT_ATTENUATION,
            boundary: Boundary::Same,
            crop: false,
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text, &path.display().to_string())
    }

    /// Load `explicit` if given; otherwise `ocular.toml` when present, else
    /// the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_toml_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_toml_file(fallback)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.engine.max_depth, 64);
        assert_eq!(config.engine.extension, ".rpn");
        assert_eq!(
            config.engine.search_path,
            vec![PathBuf::from("."), PathBuf::from("./rpn")]
        );
        assert_eq!(config.optics.attenuation, 0.95);
        assert_eq!(config.optics.boundary, Boundary::Same);
        assert!(!config.optics.crop);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let text = r#"
[engine]
max_depth = 8

[optics]
boundary = "valid"
crop = true
"#;
        let config = Config::from_toml_str(text, "inline").unwrap();
        assert_eq!(config.engine.max_depth, 8);
        assert_eq!(config.engine.program, "default");
        assert_eq!(config.optics.boundary, Boundary::Valid);
        assert!(config.optics.crop);
        assert_eq!(config.optics.attenuation, 0.95);
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(Config::from_toml_str("", "inline").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_boundary_is_parse_error() {
        let err = Config::from_toml_str("[optics]\nboundary = \"wrap\"\n", "bad.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with("parsing bad.toml"));
    }

    #[test]
    fn test_missing_explicit_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_toml_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ocular.toml");
        std::fs::write(&path, "[engine]\nsearch_path = [\"progs\"]\nprogram = \"glare\"\n").unwrap();
        let config = Config::from_toml_file(&path).unwrap();
        assert_eq!(config.engine.search_path, vec![PathBuf::from("progs")]);
        assert_eq!(config.engine.program, "glare");
    }
}
