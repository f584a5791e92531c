use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShiftError {
    #[error("{0}")]
    Format(String),
    #[error("{0}")]
    Config(String),
    #[error("{hint} ({})", .path.display())]
    MissingInput { path: PathBuf, hint: String },
}
