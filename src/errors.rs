use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpdaterError {
    #[error("Failed to download peer list: {0}")]
    HttpError(String),

    #[error("Failed to read peer archive: {0}")]
    ArchiveError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Malformed peer address: {0}")]
    ParseError(String),

    #[error("Probe failed: {0}")]
    ProbeError(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("No peers found in {0}")]
    NoPeersFound(String),

    #[error("{0}")]
    GeneralError(String),
}

impl From<reqwest::Error> for UpdaterError {
    fn from(error: reqwest::Error) -> Self {
        UpdaterError::HttpError(error.to_string())
    }
}

impl From<zip::result::ZipError> for UpdaterError {
    fn from(error: zip::result::ZipError) -> Self {
        UpdaterError::ArchiveError(error.to_string())
    }
}

impl From<std::io::Error> for UpdaterError {
    fn from(error: std::io::Error) -> Self {
        UpdaterError::IoError(error.to_string())
    }
}

impl From<serde_json::Error> for UpdaterError {
    fn from(error: serde_json::Error) -> Self {
        UpdaterError::GeneralError(format!("JSON serialization failed: {}", error))
    }
}

impl From<anyhow::Error> for UpdaterError {
    fn from(error: anyhow::Error) -> Self {
        UpdaterError::GeneralError(error.to_string())
    }
}
