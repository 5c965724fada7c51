use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};

use folder_matcher::cli::Cli;
use folder_matcher::engine::{RunController, RunOutcome, RunReport, log_progress};
use folder_matcher::error::EngineError;
use folder_matcher::logging::init_logging;
use folder_matcher::util::envfile::{load_dotenv_if_present, write_env_template};

#[tokio::main]
async fn main() {
    init_logging();
    match load_dotenv_if_present() {
        Ok(keys) if !keys.is_empty() => info!("Loaded {} setting(s) from .env", keys.len()),
        Ok(_) => {}
        Err(e) => warn!("Ignoring .env: {:#}", e),
    }
    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            1
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    if let Some(path) = cli.write_env_template.as_ref() {
        write_env_template(path)?;
        info!("Wrote {}", path.display());
        return Ok(0);
    }

    let cfg = match cli.to_app_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Please select all folders: {}", e);
            return Ok(2);
        }
    };
    info!(
        "Data: {} | Reference: {} | Output: {} ({})",
        cfg.folders.data_dir.display(),
        cfg.folders.reference_dir.display(),
        cfg.folders.output_dir.display(),
        cfg.export.format.extension()
    );

    let mut controller = RunController::new(cfg);
    let cancel = controller.cancel_token();
    let mut worker = tokio::task::spawn_blocking(move || {
        let result = controller.run(log_progress);
        (controller, result)
    });

    let finished = tokio::select! {
        res = &mut worker => Some(res),
        _ = tokio::signal::ctrl_c() => None,
    };
    let joined = match finished {
        Some(res) => res,
        None => {
            warn!("Stopping the process...");
            cancel.cancel();
            worker.await
        }
    };
    let (mut controller, result) = joined.context("matching worker panicked")?;

    match result {
        Ok(report) => {
            print_summary(&report);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Ok(0)
        }
        Err(e @ (EngineError::Config(_) | EngineError::Discover { .. })) => {
            error!("{}", e);
            Ok(2)
        }
        Err(e @ EngineError::Save(_)) => {
            error!("{}", e);
            save_to_working_dir(&mut controller);
            Ok(1)
        }
        Err(e) => {
            error!("{}", e);
            Ok(1)
        }
    }
}

/// One more attempt for rows whose save failed, into the current directory.
fn save_to_working_dir(controller: &mut RunController) {
    if !controller.has_pending_save() {
        return;
    }
    let dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            error!("Results were not saved: no working directory: {}", e);
            return;
        }
    };
    match controller.retry_save_to(&dir) {
        Ok(saved) => warn!(
            "Saved {} rows to {} instead",
            saved.rows,
            saved.path.display()
        ),
        Err(e) => error!("Results were not saved: {}", e),
    }
}

fn print_summary(report: &RunReport) {
    match &report.outcome {
        RunOutcome::Completed {
            output,
            total_matches,
        } => info!(
            "Process completed: {} total matches saved to {}",
            total_matches,
            output.path.display()
        ),
        RunOutcome::NoMatches => info!("Process completed: no valid matches"),
        RunOutcome::Stopped {
            partial,
            total_matches,
        } => match partial {
            Some(p) => info!(
                "Process stopped: {} matches saved to {}",
                total_matches,
                p.path.display()
            ),
            None => info!("Process stopped: nothing to save"),
        },
    }
    for s in &report.skipped {
        warn!("Skipped {}: {}", s.path.display(), s.reason);
    }
    info!(
        "{} file pair(s) compared in {:.1}s",
        report.pairs_compared, report.duration_secs
    );
}
