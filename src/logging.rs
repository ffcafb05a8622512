//! Tracing subscriber setup for the binary and tests

use std::fs::{self, OpenOptions};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

static INIT: OnceLock<()> = OnceLock::new();

/// Build the filter: `RUST_LOG` wins over `level` when set
fn build_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level.trim())
        .map_err(|e| Error::InvalidArgument(format!("invalid log level '{}': {}", level, e)))
}

/// Install the global subscriber, writing to `log_file` when given, stderr otherwise
///
/// Only the first call has an effect.
pub fn init(level: &str, log_file: Option<&Path>) -> Result<()> {
    if INIT.get().is_some() {
        return Ok(());
    }

    let filter = build_filter(level)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| Error::io(path, e))?;
            let _ = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = builder
                .with_ansi(std::io::stderr().is_terminal())
                .with_writer(std::io::stderr)
                .try_init();
        }
    }

    INIT.get_or_init(|| ());
    Ok(())
}
