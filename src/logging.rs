use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use anyhow::Result;
use env_logger::{Env, Target};

fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("stock-dash")
        .join("stock-dash.log")
}

/// Send log output to a file; the terminal belongs to the UI.
/// Level comes from `RUST_LOG`, defaulting to `info`.
pub fn init(path: Option<PathBuf>) -> Result<PathBuf> {
    let path = path.unwrap_or_else(default_log_path);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_secs()
        .try_init()?;
    Ok(path)
}
