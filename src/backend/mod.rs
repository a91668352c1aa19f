pub mod error;
pub mod event_loop;
pub mod export;
pub mod import;
pub mod payload;
pub mod profile;
pub mod qr;
pub mod settings;
pub mod store;
pub mod types;

pub use error::{Error, Result};
pub use import::{import_payload, ImportAction, ImportRequest};
pub use payload::{format_profile, parse_payload, QrPayload, QrSecurity};
pub use profile::{NetworkProfile, SecurityType};
pub use settings::Settings;
pub use store::{NmcliStore, ProfileStore};
pub use types::{BackendCommand, BackendEvent, QrCodeData};
