//! Run controller: the data-file × reference-file loop and its save policy.
//!
//! One run walks every data file in path order and compares it against every
//! reference file in path order. The [`CancelToken`] is polled before each data
//! file and before each reference file; once it is seen set, the loops unwind
//! and whatever matched so far is written as a partial result. A run that gets
//! through every pair writes the final result instead. Exactly one of the two
//! is written per run.

pub mod control;
pub mod progress;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;

pub use control::{CancelToken, RunState};
pub use progress::{ProgressEvent, log_progress};

use crate::config::AppConfig;
use crate::error::{EngineError, LoadError};
use crate::export::{ResultWriter, SaveKind, SavedOutput};
use crate::loader::{discover_tables, load_table};
use crate::matching::{CombinedResult, match_pair};
use crate::normalize::{KeyedTable, normalize_keys};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed {
        output: SavedOutput,
        total_matches: usize,
    },
    NoMatches,
    Stopped {
        partial: Option<SavedOutput>,
        total_matches: usize,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct DataFileSummary {
    pub name: String,
    pub rows: usize,
    pub matches: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub total_matches: usize,
    pub pairs_compared: usize,
    pub data_files: Vec<DataFileSummary>,
    pub skipped: Vec<SkippedFile>,
    pub started_utc: String,
    pub duration_secs: f64,
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn load_keyed(path: &Path) -> Result<KeyedTable, LoadError> {
    let table = load_table(path)?;
    normalize_keys(table, &base_name(path))
}

/// Per-run mutable bookkeeping.
struct RunTally {
    combined: CombinedResult,
    total_overall_matches: usize,
    pairs_compared: usize,
    data_files: Vec<DataFileSummary>,
    skipped: Vec<SkippedFile>,
}

impl RunTally {
    fn new() -> Self {
        Self {
            combined: CombinedResult::new(),
            total_overall_matches: 0,
            pairs_compared: 0,
            data_files: Vec::new(),
            skipped: Vec::new(),
        }
    }

    fn skip<P>(&mut self, path: &Path, err: &LoadError, on_progress: &mut P)
    where
        P: FnMut(&ProgressEvent),
    {
        log::warn!("Skipping {}: {}", path.display(), err);
        on_progress(&ProgressEvent::FileSkipped {
            name: base_name(path),
            reason: err.to_string(),
        });
        if !self.skipped.iter().any(|s| s.path == path) {
            self.skipped.push(SkippedFile {
                path: path.to_path_buf(),
                reason: err.to_string(),
            });
        }
    }
}

pub struct RunController {
    config: AppConfig,
    cancel: CancelToken,
    state: RunState,
    pending: Option<(SaveKind, CombinedResult)>,
}

impl RunController {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            cancel: CancelToken::new(),
            state: RunState::Idle,
            pending: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Handle the shell keeps to stop a run in progress.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// True when the last save failed and its rows are held for [`Self::retry_save`].
    pub fn has_pending_save(&self) -> bool {
        self.pending.is_some()
    }

    fn set_state(&mut self, next: RunState) {
        log::debug!("run state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Execute one full run. `on_progress` receives every status update and is
    /// the point where the caller may refresh its display.
    pub fn run<P>(&mut self, mut on_progress: P) -> Result<RunReport, EngineError>
    where
        P: FnMut(&ProgressEvent),
    {
        self.config.validate()?;
        self.cancel.reset();
        self.pending = None;

        let folders = self.config.folders.clone();
        let data_files =
            discover_tables(&folders.data_dir).map_err(|source| EngineError::Discover {
                dir: folders.data_dir.clone(),
                source,
            })?;
        let reference_files =
            discover_tables(&folders.reference_dir).map_err(|source| EngineError::Discover {
                dir: folders.reference_dir.clone(),
                source,
            })?;

        if !folders.output_dir.exists() {
            std::fs::create_dir_all(&folders.output_dir).map_err(|source| {
                EngineError::OutputDir {
                    dir: folders.output_dir.clone(),
                    source,
                }
            })?;
            log::info!("Created output folder {}", folders.output_dir.display());
        }

        let started = Instant::now();
        let started_utc = chrono::Utc::now().to_rfc3339();
        self.set_state(RunState::Running);
        on_progress(&ProgressEvent::RunStarted {
            data_files: data_files.len(),
            reference_files: reference_files.len(),
        });

        let mut tally = RunTally::new();
        let stopped = self.match_all(&data_files, &reference_files, &mut tally, &mut on_progress);

        let total = tally.total_overall_matches;
        debug_assert_eq!(total, tally.combined.row_count());
        let writer = ResultWriter::new(&folders.output_dir, self.config.export.format);

        let outcome = if stopped {
            self.set_state(RunState::Cancelling);
            on_progress(&ProgressEvent::StopRequested);
            match self.persist(&writer, SaveKind::Partial, tally.combined, &mut on_progress)? {
                Some(saved) => RunOutcome::Stopped {
                    partial: Some(saved),
                    total_matches: total,
                },
                None => {
                    on_progress(&ProgressEvent::NothingToSave);
                    RunOutcome::Stopped {
                        partial: None,
                        total_matches: total,
                    }
                }
            }
        } else {
            self.set_state(RunState::Completing);
            if tally.combined.is_empty() {
                on_progress(&ProgressEvent::NoMatches);
                RunOutcome::NoMatches
            } else {
                match self.persist(&writer, SaveKind::Final, tally.combined, &mut on_progress)? {
                    Some(output) => RunOutcome::Completed {
                        output,
                        total_matches: total,
                    },
                    None => RunOutcome::NoMatches,
                }
            }
        };

        self.set_state(RunState::Idle);
        on_progress(&ProgressEvent::RunFinished);
        Ok(RunReport {
            outcome,
            total_matches: total,
            pairs_compared: tally.pairs_compared,
            data_files: tally.data_files,
            skipped: tally.skipped,
            started_utc,
            duration_secs: started.elapsed().as_secs_f64(),
        })
    }

    /// The double loop. Returns true when it stopped because of cancellation.
    fn match_all<P>(
        &self,
        data_files: &[PathBuf],
        reference_files: &[PathBuf],
        tally: &mut RunTally,
        on_progress: &mut P,
    ) -> bool
    where
        P: FnMut(&ProgressEvent),
    {
        let key_case = self.config.matching.key_case();
        let use_cache = self.config.matching.cache_reference_tables;
        let mut ref_cache: HashMap<usize, KeyedTable> = HashMap::new();
        let mut bad_refs: HashMap<usize, LoadError> = HashMap::new();

        for (di, data_path) in data_files.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return true;
            }
            let data_name = base_name(data_path);
            on_progress(&ProgressEvent::DataFileStarted {
                index: di + 1,
                total: data_files.len(),
                name: data_name.clone(),
            });
            let data = match load_keyed(data_path) {
                Ok(d) => d,
                Err(e) => {
                    tally.skip(data_path, &e, on_progress);
                    continue;
                }
            };

            let mut total_matches = 0usize;
            for (ri, ref_path) in reference_files.iter().enumerate() {
                if self.cancel.is_cancelled() {
                    return true;
                }
                let ref_name = base_name(ref_path);
                on_progress(&ProgressEvent::ReferenceFileStarted {
                    index: ri + 1,
                    total: reference_files.len(),
                    name: ref_name.clone(),
                });

                if let Some(e) = bad_refs.get(&ri) {
                    tally.skip(ref_path, e, on_progress);
                    continue;
                }
                let mut fresh: Option<KeyedTable> = None;
                let reference: &KeyedTable = if use_cache {
                    match ref_cache.entry(ri) {
                        Entry::Occupied(o) => &*o.into_mut(),
                        Entry::Vacant(v) => match load_keyed(ref_path) {
                            Ok(r) => &*v.insert(r),
                            Err(e) => {
                                tally.skip(ref_path, &e, on_progress);
                                bad_refs.insert(ri, e);
                                continue;
                            }
                        },
                    }
                } else {
                    match load_keyed(ref_path) {
                        Ok(r) => &*fresh.insert(r),
                        Err(e) => {
                            tally.skip(ref_path, &e, on_progress);
                            continue;
                        }
                    }
                };

                let batch = match_pair(reference, &data, key_case);
                let count = tally.combined.append(batch, &data_name, &ref_name);
                tally.pairs_compared += 1;
                if count > 0 {
                    total_matches += count;
                    tally.total_overall_matches += count;
                    on_progress(&ProgressEvent::PairMatched {
                        data: data_name.clone(),
                        reference: ref_name,
                        count,
                    });
                }
            }

            tally.data_files.push(DataFileSummary {
                name: data_name.clone(),
                rows: data.table.row_count(),
                matches: total_matches,
            });
            on_progress(&ProgressEvent::DataFileTotal {
                name: data_name,
                total: total_matches,
            });
            // A stop raised during the last pair of this file must not fall
            // through to the final save.
            if self.cancel.is_cancelled() {
                return true;
            }
        }
        false
    }

    fn persist<P>(
        &mut self,
        writer: &ResultWriter,
        kind: SaveKind,
        combined: CombinedResult,
        on_progress: &mut P,
    ) -> Result<Option<SavedOutput>, EngineError>
    where
        P: FnMut(&ProgressEvent),
    {
        match writer.save(kind, &combined) {
            Ok(saved) => {
                if let Some(s) = &saved {
                    on_progress(&saved_event(s));
                }
                Ok(saved)
            }
            Err(e) => {
                log::error!("Saving {:?} results failed: {}", kind, e);
                on_progress(&ProgressEvent::SaveFailed {
                    reason: e.to_string(),
                });
                self.pending = Some((kind, combined));
                self.set_state(RunState::Idle);
                Err(e.into())
            }
        }
    }

    /// Re-attempt the save that failed at the end of the last run.
    pub fn retry_save(&mut self) -> Result<SavedOutput, EngineError> {
        let out_dir = self.config.folders.output_dir.clone();
        self.retry_save_to(&out_dir)
    }

    /// Re-attempt the failed save into `out_dir` instead of the configured folder.
    /// The rows stay pending if this attempt fails too.
    pub fn retry_save_to(&mut self, out_dir: &Path) -> Result<SavedOutput, EngineError> {
        let Some((kind, combined)) = self.pending.take() else {
            return Err(EngineError::NothingToSave);
        };
        if !out_dir.exists() {
            if let Err(source) = std::fs::create_dir_all(out_dir) {
                let dir = out_dir.to_path_buf();
                self.pending = Some((kind, combined));
                return Err(EngineError::OutputDir { dir, source });
            }
        }
        let writer = ResultWriter::new(out_dir, self.config.export.format);
        match writer.save(kind, &combined) {
            Ok(Some(saved)) => Ok(saved),
            Ok(None) => Err(EngineError::NothingToSave),
            Err(e) => {
                self.pending = Some((kind, combined));
                Err(e.into())
            }
        }
    }
}

fn saved_event(s: &SavedOutput) -> ProgressEvent {
    match s.kind {
        SaveKind::Partial => ProgressEvent::PartialSaved {
            path: s.path.clone(),
            rows: s.rows,
        },
        SaveKind::Final => ProgressEvent::FinalSaved {
            path: s.path.clone(),
            rows: s.rows,
        },
    }
}
