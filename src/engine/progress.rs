use std::fmt;
use std::path::PathBuf;

/// Status updates emitted by the run loop. Each renders as one human-readable line.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    RunStarted {
        data_files: usize,
        reference_files: usize,
    },
    DataFileStarted {
        index: usize,
        total: usize,
        name: String,
    },
    ReferenceFileStarted {
        index: usize,
        total: usize,
        name: String,
    },
    PairMatched {
        data: String,
        reference: String,
        count: usize,
    },
    DataFileTotal {
        name: String,
        total: usize,
    },
    FileSkipped {
        name: String,
        reason: String,
    },
    StopRequested,
    PartialSaved {
        path: PathBuf,
        rows: usize,
    },
    NothingToSave,
    FinalSaved {
        path: PathBuf,
        rows: usize,
    },
    NoMatches,
    SaveFailed {
        reason: String,
    },
    RunFinished,
}

impl ProgressEvent {
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::FileSkipped { .. } | Self::SaveFailed { .. })
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunStarted {
                data_files,
                reference_files,
            } => write!(
                f,
                "Searching {} data file(s) against {} reference file(s)...",
                data_files, reference_files
            ),
            Self::DataFileStarted { index, total, name } => {
                write!(f, "Processing file {}/{}: '{}'...", index, total, name)
            }
            Self::ReferenceFileStarted { index, total, name } => write!(
                f,
                "  Comparing with reference file {}/{}: '{}'...",
                index, total, name
            ),
            Self::PairMatched {
                data,
                reference,
                count,
            } => write!(
                f,
                "    Found {} valid matches in '{}' from reference file '{}'.",
                count, data, reference
            ),
            Self::DataFileTotal { name, total } if *total > 0 => {
                write!(f, "Total valid matches found in '{}': {}.", name, total)
            }
            Self::DataFileTotal { name, .. } => {
                write!(f, "No valid matches found in '{}'.", name)
            }
            Self::FileSkipped { name, reason } => {
                write!(f, "  Skipping '{}': {}", name, reason)
            }
            Self::StopRequested => f.write_str("Process stopped by user."),
            Self::PartialSaved { path, rows } => write!(
                f,
                "Partial results ({} rows) saved to '{}'.",
                rows,
                path.display()
            ),
            Self::NothingToSave => f.write_str("No matches collected before stopping; nothing saved."),
            Self::FinalSaved { path, rows } => write!(
                f,
                "Matching process completed. {} total matches found and saved to '{}'.",
                rows,
                path.display()
            ),
            Self::NoMatches => f.write_str(
                "No valid matches found where both 'Name' and 'Father Name' are present.",
            ),
            Self::SaveFailed { reason } => write!(f, "Failed to save results: {}", reason),
            Self::RunFinished => f.write_str("Search process completed."),
        }
    }
}

/// Progress sink that forwards every event to the `log` facade.
pub fn log_progress(event: &ProgressEvent) {
    if event.is_warning() {
        log::warn!("{}", event);
    } else {
        log::info!("{}", event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_file_total_wording() {
        let found = ProgressEvent::DataFileTotal {
            name: "d.csv".into(),
            total: 3,
        };
        let none = ProgressEvent::DataFileTotal {
            name: "d.csv".into(),
            total: 0,
        };
        assert_eq!(found.to_string(), "Total valid matches found in 'd.csv': 3.");
        assert_eq!(none.to_string(), "No valid matches found in 'd.csv'.");
    }

    #[test]
    fn skips_are_warnings() {
        let e = ProgressEvent::FileSkipped {
            name: "x.csv".into(),
            reason: "boom".into(),
        };
        assert!(e.is_warning());
        assert!(!ProgressEvent::RunFinished.is_warning());
    }
}
