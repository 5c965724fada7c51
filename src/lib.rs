pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod loader;
pub mod logging;
pub mod matching;
pub mod models;
pub mod normalize;
pub mod util;

pub use config::AppConfig;
pub use engine::{CancelToken, ProgressEvent, RunController, RunOutcome, RunReport, RunState};
pub use error::{ConfigError, EngineError, ExportError, LoadError};
