//! Turning a scanned payload into a NetworkManager profile.

use super::error::{Error, Result};
use super::payload::{QrPayload, QrSecurity};
use super::profile::NetworkProfile;
use super::store::ProfileStore;

/// Connection name given to imported profiles.
const PROFILE_NAME_PREFIX: &str = "WiFi_";

/// What the user chose to do with a scanned network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportAction {
    ConnectNow,
    SaveOnly,
}

/// A confirmed import, consumed by [`import_payload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    pub payload: QrPayload,
    pub action: ImportAction,
}

impl ImportRequest {
    pub fn new(payload: QrPayload, action: ImportAction) -> Self {
        Self { payload, action }
    }
}

pub fn profile_name_for(ssid: &str) -> String {
    format!("{PROFILE_NAME_PREFIX}{ssid}")
}

/// Validate `payload` and ask the store to create (and maybe activate) it.
///
/// Not idempotent: importing the same code twice reports whatever the store
/// reports for a duplicate. Returns the new profile's name.
pub async fn import_payload(
    store: &dyn ProfileStore,
    payload: &QrPayload,
    action: ImportAction,
) -> Result<String> {
    let profile = profile_from_payload(payload)?;
    let activate = action == ImportAction::ConnectNow;

    match store.create_profile(&profile, activate).await {
        Ok(()) => Ok(profile.name),
        Err(e @ (Error::ConnectionFailed(_) | Error::ProfileSaveFailed(_))) => Err(e),
        Err(e) if activate => Err(Error::ConnectionFailed(e.to_string())),
        Err(e) => Err(Error::ProfileSaveFailed(e.to_string())),
    }
}

fn profile_from_payload(payload: &QrPayload) -> Result<NetworkProfile> {
    if payload.ssid.is_empty() {
        return Err(Error::InvalidProfile("network name is empty".into()));
    }

    let password = match payload.security {
        QrSecurity::NoPass => None,
        QrSecurity::Wpa | QrSecurity::Wep if payload.password.is_empty() => {
            return Err(Error::InvalidProfile(format!(
                "{} network {} has no password",
                payload.security.token(),
                payload.ssid
            )));
        }
        QrSecurity::Wpa | QrSecurity::Wep => Some(payload.password.clone()),
    };

    Ok(NetworkProfile::new(
        profile_name_for(&payload.ssid),
        payload.ssid.clone(),
        payload.security.to_profile(),
        password,
    )
    .with_hidden(payload.hidden))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::payload::parse_payload;
    use crate::backend::profile::SecurityType;
    use crate::backend::store::memory::MemoryStore;

    fn payload(text: &str) -> QrPayload {
        parse_payload(text).unwrap()
    }

    #[tokio::test]
    async fn save_only_creates_inactive_profile() {
        let store = MemoryStore::default();
        let name = import_payload(
            &store,
            &payload("WIFI:T:WPA;S:Home;P:hunter22;H:true;;"),
            ImportAction::SaveOnly,
        )
        .await
        .unwrap();

        assert_eq!(name, "WiFi_Home");
        let profiles = store.profiles();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].ssid, "Home");
        assert_eq!(profiles[0].security, SecurityType::WpaPersonal);
        assert_eq!(profiles[0].password.as_deref(), Some("hunter22"));
        assert!(profiles[0].hidden);
        assert!(store.activated().is_empty());
    }

    #[tokio::test]
    async fn connect_now_activates() {
        let store = MemoryStore::default();
        import_payload(&store, &payload("WIFI:T:nopass;S:Cafe;;"), ImportAction::ConnectNow)
            .await
            .unwrap();
        assert_eq!(store.activated(), ["WiFi_Cafe"]);
        assert_eq!(store.profiles()[0].password, None);
    }

    #[tokio::test]
    async fn empty_ssid_never_reaches_store() {
        let store = MemoryStore::default();
        let result = import_payload(&store, &payload("WIFI:T:WPA;S:;P:x;;"), ImportAction::ConnectNow).await;
        assert!(matches!(result, Err(Error::InvalidProfile(_))));
        assert_eq!(store.create_calls(), 0);
    }

    #[tokio::test]
    async fn secured_network_needs_password() {
        let store = MemoryStore::default();
        let result = import_payload(&store, &payload("WIFI:T:WEP;S:Old;;"), ImportAction::SaveOnly).await;
        assert!(matches!(result, Err(Error::InvalidProfile(_))));
        assert_eq!(store.create_calls(), 0);
    }

    #[tokio::test]
    async fn activation_failure_carries_message() {
        let store = MemoryStore::default();
        store.fail_next_activation("Secrets were required, but not provided");
        let result = import_payload(
            &store,
            &payload("WIFI:T:WPA;S:Home;P:wrongpass;;"),
            ImportAction::ConnectNow,
        )
        .await;
        match result {
            Err(Error::ConnectionFailed(message)) => {
                assert!(message.contains("Secrets were required"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_import_reports_store_error() {
        let existing = NetworkProfile::new("WiFi_Home", "Home", SecurityType::Open, None);
        let store = MemoryStore::with_profiles(vec![existing]);
        let result = import_payload(&store, &payload("WIFI:T:nopass;S:Home;;"), ImportAction::SaveOnly).await;
        assert!(matches!(result, Err(Error::ProfileSaveFailed(m)) if m.contains("already exists")));
        assert_eq!(store.create_calls(), 1);
    }

    #[test]
    fn request_keeps_fields() {
        let request = ImportRequest::new(payload("WIFI:T:WPA;S:a;P:b;;"), ImportAction::SaveOnly);
        assert_eq!(request.payload.ssid, "a");
        assert_eq!(request.action, ImportAction::SaveOnly);
    }
}
