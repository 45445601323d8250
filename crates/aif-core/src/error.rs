use thiserror::Error;

#[derive(Debug, Error)]
pub enum AifError {
    #[error("template directory not found: {0}")]
    TemplatesNotFound(String),

    #[error("invalid checksum '{0}': expected 64 hex characters")]
    InvalidChecksum(String),

    #[error("invalid file category '{0}': expected user-owned, framework-only, compiled-output, or user-customizable")]
    InvalidCategory(String),

    #[error("invalid path '{0}': must be relative and stay inside the project")]
    InvalidPath(String),

    #[error("not UTF-8 text: {0}")]
    NotText(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AifError>;
