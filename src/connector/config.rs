//! Runtime configuration (§2 ambient stack, §6 "single data-dir env var").
//! Read from `CODESEARCH_DATA_DIR`, falling back to `~/.codesearch`, and
//! overridable by the CLI's `--data-dir` flag. Mirrors the donor's own
//! `Cli` struct in `main.rs` (global `--data-dir`/`--verbose` flags read
//! once at startup and threaded down, rather than re-read per component).

use std::path::PathBuf;

pub const DATA_DIR_ENV_VAR: &str = "CODESEARCH_DATA_DIR";
const DEFAULT_DATA_DIR: &str = "~/.codesearch";

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub verbose: bool,
}

impl Config {
    /// Resolves the data directory from (in priority order) an explicit
    /// CLI flag, the `CODESEARCH_DATA_DIR` environment variable, or the
    /// default `~/.codesearch`.
    pub fn resolve(cli_data_dir: Option<String>, verbose: bool) -> Self {
        let raw = cli_data_dir
            .or_else(|| std::env::var(DATA_DIR_ENV_VAR).ok())
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        Self {
            data_dir: PathBuf::from(expand_tilde(&raw)),
            verbose,
        }
    }
}

fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{}", home.to_string_lossy(), rest);
        }
    }
    path.to_string()
}
