use std::path::PathBuf;

use crate::config::{AppConfig, ExportConfig, FolderConfig, MatchingConfig};
use crate::error::ConfigError;
use crate::export::OutputFormat;
use clap::{Parser, ValueEnum};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, ValueEnum, Debug)]
pub enum FormatOpt {
    Xlsx,
    Csv,
}

impl FormatOpt {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
        }
    }
}

impl std::fmt::Display for FormatOpt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<FormatOpt> for OutputFormat {
    fn from(f: FormatOpt) -> Self {
        match f {
            FormatOpt::Xlsx => OutputFormat::Xlsx,
            FormatOpt::Csv => OutputFormat::Csv,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "folder-matcher",
    version,
    about = "Match records across folders of CSV/XLSX files on Name + Father Name",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Folder of data files to search (env: FOLDER_MATCHER_DATA_DIR)
    #[arg(long = "data-dir", value_name = "DIR", env = "FOLDER_MATCHER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
    /// Folder of reference files holding the keys to look for (env: FOLDER_MATCHER_REFERENCE_DIR)
    #[arg(
        long = "reference-dir",
        value_name = "DIR",
        env = "FOLDER_MATCHER_REFERENCE_DIR"
    )]
    pub reference_dir: Option<PathBuf>,
    /// Folder the result file is written to; created if missing (env: FOLDER_MATCHER_OUTPUT_DIR)
    #[arg(
        long = "output-dir",
        value_name = "DIR",
        env = "FOLDER_MATCHER_OUTPUT_DIR"
    )]
    pub output_dir: Option<PathBuf>,
    /// Output format (env: FOLDER_MATCHER_FORMAT)
    #[arg(
        long = "format",
        value_name = "FORMAT",
        env = "FOLDER_MATCHER_FORMAT",
        default_value_t = FormatOpt::Xlsx
    )]
    pub format: FormatOpt,
    /// Write Name / Father Name lowercased in the output (env: FOLDER_MATCHER_LOWERCASE_KEYS)
    #[arg(long = "lowercase-keys", env = "FOLDER_MATCHER_LOWERCASE_KEYS")]
    pub lowercase_keys: bool,
    /// Re-read every reference file for each data file instead of caching it (env: FOLDER_MATCHER_NO_CACHE)
    #[arg(long = "no-cache", env = "FOLDER_MATCHER_NO_CACHE")]
    pub no_cache: bool,
    /// Print the run report as JSON on stdout
    #[arg(long = "json")]
    pub json: bool,
    /// Write a commented .env.template to this path and exit
    #[arg(long = "write-env-template", value_name = "PATH")]
    pub write_env_template: Option<PathBuf>,
}

impl Cli {
    pub fn to_app_config(&self) -> Result<AppConfig, ConfigError> {
        let cfg = AppConfig {
            folders: FolderConfig {
                data_dir: self.data_dir.clone().unwrap_or_default(),
                reference_dir: self.reference_dir.clone().unwrap_or_default(),
                output_dir: self.output_dir.clone().unwrap_or_default(),
            },
            matching: MatchingConfig {
                lowercase_output_keys: self.lowercase_keys,
                cache_reference_tables: !self.no_cache,
            },
            export: ExportConfig {
                format: self.format.into(),
            },
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_onto_config() {
        let cli = Cli::try_parse_from([
            "folder-matcher",
            "--data-dir",
            "in/data",
            "--reference-dir",
            "in/ref",
            "--output-dir",
            "out",
            "--format",
            "csv",
            "--no-cache",
        ])
        .unwrap();
        let cfg = cli.to_app_config().unwrap();
        assert_eq!(cfg.folders.data_dir, PathBuf::from("in/data"));
        assert_eq!(cfg.export.format, OutputFormat::Csv);
        assert!(!cfg.matching.cache_reference_tables);
        assert!(!cfg.matching.lowercase_output_keys);
    }

    #[test]
    fn missing_output_dir_is_a_config_error() {
        let cli = Cli {
            data_dir: Some("d".into()),
            reference_dir: Some("r".into()),
            output_dir: None,
            format: FormatOpt::Xlsx,
            lowercase_keys: false,
            no_cache: false,
            json: false,
            write_env_template: None,
        };
        assert!(matches!(
            cli.to_app_config(),
            Err(ConfigError::MissingField {
                field: "folders.output_dir"
            })
        ));
    }
}
