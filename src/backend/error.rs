//! Error type shared by the whole backend.

use thiserror::Error;

/// Every failure the backend can report to the UI.
///
/// None of these are fatal: the UI shows the message and the user may retry
/// the action that produced it.
#[derive(Debug, Error)]
pub enum Error {
    /// Security mode that can't be expressed in a WiFi QR code
    #[error("Unsupported security type: {0}")]
    UnsupportedSecurityType(String),

    /// Text is not a well-formed `WIFI:` payload
    #[error("Malformed WiFi QR code: {0}")]
    MalformedPayload(String),

    /// Profile is missing a field required before asking NetworkManager
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    /// NetworkManager could not activate the profile
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// NetworkManager could not store the profile
    #[error("Failed to save profile: {0}")]
    ProfileSaveFailed(String),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// External tool exited with an error while reading state
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("QR encoding failed: {0}")]
    QrEncode(#[from] qrcode::types::QrError),

    #[error("No WiFi QR code found")]
    QrNotFound,

    #[error("Camera error: {0}")]
    Camera(String),
}

impl Error {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Error::MalformedPayload(reason.into())
    }
}

/// A specialized `Result` type for backend operations.
pub type Result<T> = std::result::Result<T, Error>;
