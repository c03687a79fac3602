use std::path::PathBuf;

use thiserror::Error;

/// Coarse failure categories surfaced in a failed `PublicationResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FileNotFound,
    MissingCredentials,
    /// Image or metadata stage; the message tells them apart.
    UploadFailed,
    UnexpectedFault,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::FileNotFound => "file_not_found",
            ErrorKind::MissingCredentials => "missing_credentials",
            ErrorKind::UploadFailed => "upload_failed",
            ErrorKind::UnexpectedFault => "unexpected_fault",
        }
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Missing Pinata credentials: set PINATA_JWT or PINATA_API_KEY and PINATA_SECRET_API_KEY")]
    MissingCredentials,

    #[error("Failed to upload image to IPFS")]
    ImageUploadFailed,

    #[error("Failed to upload metadata to IPFS")]
    MetadataUploadFailed,

    #[error("Malformed gateway response: {0}")]
    MalformedResponse(String),

    #[error("Gateway rejected request: {status} - {body}")]
    GatewayRejected { status: u16, body: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("Invalid credential header: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

impl PublishError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PublishError::FileNotFound(_) => ErrorKind::FileNotFound,
            PublishError::MissingCredentials => ErrorKind::MissingCredentials,
            PublishError::ImageUploadFailed | PublishError::MetadataUploadFailed => {
                ErrorKind::UploadFailed
            }
            PublishError::MalformedResponse(_)
            | PublishError::GatewayRejected { .. }
            | PublishError::Io(_)
            | PublishError::Json(_)
            | PublishError::Http(_)
            | PublishError::InvalidHeader(_) => ErrorKind::UnexpectedFault,
        }
    }
}
