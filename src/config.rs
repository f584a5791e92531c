use crate::error::ShiftError;
use crate::parser::parse_offset;

use std::path::Path;

use anyhow::{Context, Result};
use log::debug;

/// Picks the offset in seconds: an explicit value wins over the offset file.
pub fn resolve_offset(value: Option<&str>, offset_file: &Path) -> Result<f64> {
    match value {
        Some(value) => {
            debug!("Using offset given on the command line: {}", value);
            Ok(parse_offset(value)?)
        }
        None => read_offset_file(offset_file),
    }
}

/// Reads a file holding a single number of seconds, e.g. `2.5` or `-1.2`.
pub fn read_offset_file(path: &Path) -> Result<f64> {
    if !path.is_file() {
        return Err(ShiftError::Config(format!(
            "No offset file found at '{}'. Create it with a single number of seconds, \
             e.g. 2.5 or -1.2.",
            path.display()
        ))
        .into());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read offset file: '{}'", path.display()))?;
    let secs = parse_offset(&text)
        .with_context(|| format!("Failed to read offset file: '{}'", path.display()))?;
    debug!("Read offset of {} seconds from '{}'", secs, path.display());
    Ok(secs)
}
