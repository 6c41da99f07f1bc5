use std::path::PathBuf;
use std::time::Instant;

use crate::errors::{Error, ErrorKind, Result};

static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Monotonic millisecond clock, zeroed at first call in the process.
pub fn mono_time_ms() -> u64 {
    let start = START_TIME.get_or_init(Instant::now);
    start.elapsed().as_millis() as u64
}

pub fn get_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|e| Error::wrap(e, ErrorKind::Parse)
            .with_msg("utils: Failed to get home environment variable"))?;

    Ok(PathBuf::from(home).join(".config/ringd.conf"))
}
