//! CLI module: argument parsing into an [`AppConfig`](crate::config::AppConfig).
//!
//! Folder paths may come from flags, from the process environment, or from a
//! `.env` file in the working directory (loaded before parsing, never
//! overriding variables that are already set).

mod clap_parser;

pub use clap_parser::{Cli, FormatOpt};
