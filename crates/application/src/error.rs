use std::path::PathBuf;

use crate::speech::RecognizerError;

#[derive(Debug, thiserror::Error)]
pub enum AlignmentError {
    #[error("no script loaded")]
    NotInitialized,
    #[error("recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),
    #[error("failed to read settings from {path}: {source}")]
    SettingsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings: {0}")]
    SettingsParse(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

pub type Result<T> = std::result::Result<T, AlignmentError>;
