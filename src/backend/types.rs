//! Data types shared between backend and UI layers.

use std::path::PathBuf;

use super::import::{ImportAction, ImportRequest};
use super::payload::QrPayload;
use super::profile::NetworkProfile;

/// Commands sent from UI to backend
#[derive(Debug, Clone)]
pub enum BackendCommand {
    /// Shutdown the backend gracefully
    Shutdown,
    RefreshProfiles,
    /// Render the QR code for a saved profile
    ShowQr { name: String },
    /// Image file, or `.txt` holding payload text
    ScanFile { path: PathBuf },
    StartCamera,
    StopCamera,
    /// User confirmed an import in the dialog
    Import(ImportRequest),
    ExportPng { path: PathBuf, payload: String },
    ExportText { path: PathBuf, payload: String },
}

/// A rendered code, ready for the QR panel.
#[derive(Debug, Clone)]
pub struct QrCodeData {
    pub profile_name: String,
    pub ssid: String,
    /// Full payload text, kept for export
    pub payload: String,
    /// Payload text with the password masked
    pub caption: String,
    pub png: Vec<u8>,
}

/// Events sent from backend to UI
#[derive(Debug, Clone)]
pub enum BackendEvent {
    /// A profile-store operation started or finished
    Loading(bool),
    Profiles(Vec<NetworkProfile>),
    QrReady(QrCodeData),
    /// A WiFi payload was found in a file or camera frame
    PayloadScanned(QrPayload),
    CameraActive(bool),
    /// Downscaled PNG of the latest camera frame
    CameraPreview(Vec<u8>),
    Imported { name: String, action: ImportAction },
    Exported { path: PathBuf },
    Error(String),
}
