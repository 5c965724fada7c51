use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::export::OutputFormat;
use crate::normalize::KeyCase;

/// The three folders a run needs. An empty path means "not selected".
#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct FolderConfig {
    pub data_dir: PathBuf,
    pub reference_dir: PathBuf,
    pub output_dir: PathBuf,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct MatchingConfig {
    /// Write `Name` / `Father Name` lowercased in the output instead of as found.
    pub lowercase_output_keys: bool,
    /// Keep loaded reference tables in memory across data files.
    pub cache_reference_tables: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            lowercase_output_keys: false,
            cache_reference_tables: true,
        }
    }
}

impl MatchingConfig {
    pub fn key_case(&self) -> KeyCase {
        if self.lowercase_output_keys {
            KeyCase::Lowered
        } else {
            KeyCase::Original
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct ExportConfig {
    pub format: OutputFormat,
}

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct AppConfig {
    pub folders: FolderConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

fn is_blank(p: &Path) -> bool {
    p.to_string_lossy().trim().is_empty()
}

impl AppConfig {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        reference_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            folders: FolderConfig {
                data_dir: data_dir.into(),
                reference_dir: reference_dir.into(),
                output_dir: output_dir.into(),
            },
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if is_blank(&self.folders.data_dir) {
            return Err(ConfigError::MissingField {
                field: "folders.data_dir",
            });
        }
        if is_blank(&self.folders.reference_dir) {
            return Err(ConfigError::MissingField {
                field: "folders.reference_dir",
            });
        }
        if is_blank(&self.folders.output_dir) {
            return Err(ConfigError::MissingField {
                field: "folders.output_dir",
            });
        }
        if self.folders.output_dir.is_file() {
            return Err(ConfigError::InvalidValue {
                field: "folders.output_dir",
                reason: format!("{} is a file", self.folders.output_dir.display()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_folder_is_required() {
        assert!(AppConfig::new("d", "r", "o").validate().is_ok());
        for (cfg, field) in [
            (AppConfig::new("", "r", "o"), "folders.data_dir"),
            (AppConfig::new("d", "  ", "o"), "folders.reference_dir"),
            (AppConfig::new("d", "r", ""), "folders.output_dir"),
        ] {
            match cfg.validate() {
                Err(ConfigError::MissingField { field: f }) => assert_eq!(f, field),
                other => panic!("expected missing {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn output_folder_must_not_be_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let f = dir.path().join("taken");
        std::fs::write(&f, "x").unwrap();
        let err = AppConfig::new("d", "r", &f).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn defaults_cache_and_keep_case() {
        let cfg = AppConfig::default();
        assert!(cfg.matching.cache_reference_tables);
        assert_eq!(cfg.matching.key_case(), KeyCase::Original);
        assert_eq!(cfg.export.format, OutputFormat::Xlsx);
    }
}
