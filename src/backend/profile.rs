//! Saved WiFi connection profiles as NetworkManager knows them.

use std::fmt;

/// Security mode of a saved profile, derived from NetworkManager's key management.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityType {
    Open,
    WpaPersonal,
    WpaEnterprise,
    Wep,
    /// Key management we don't map (e.g. "owe"), kept for display
    Unknown(String),
}

impl SecurityType {
    /// Map an `802-11-wireless-security.key-mgmt` value.
    /// `None` means the profile has no security setting at all.
    pub fn from_key_mgmt(key_mgmt: Option<&str>) -> Self {
        match key_mgmt {
            None | Some("") => SecurityType::Open,
            Some("wpa-psk") | Some("sae") => SecurityType::WpaPersonal,
            Some("wpa-eap") | Some("wpa-eap-suite-b-192") => SecurityType::WpaEnterprise,
            Some("none") => SecurityType::Wep,
            Some(other) => SecurityType::Unknown(other.to_string()),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, SecurityType::Open)
    }

    pub fn label(&self) -> &str {
        match self {
            SecurityType::Open => "Open",
            SecurityType::WpaPersonal => "WPA Personal",
            SecurityType::WpaEnterprise => "WPA Enterprise",
            SecurityType::Wep => "WEP",
            SecurityType::Unknown(key_mgmt) => key_mgmt,
        }
    }
}

impl fmt::Display for SecurityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One saved WiFi connection.
///
/// `name` is the NetworkManager connection id and is unique within its store;
/// `ssid` is not. `password` is `None` for open networks and for modes whose
/// secret isn't a single shared key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkProfile {
    pub name: String,
    pub ssid: String,
    pub security: SecurityType,
    pub password: Option<String>,
    pub hidden: bool,
}

impl NetworkProfile {
    pub fn new(
        name: impl Into<String>,
        ssid: impl Into<String>,
        security: SecurityType,
        password: Option<String>,
    ) -> Self {
        let password = if security.is_open() { None } else { password };
        Self {
            name: name.into(),
            ssid: ssid.into(),
            security,
            password,
            hidden: false,
        }
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }
}

/// Secret as shown to the user, one bullet per character.
pub(crate) fn mask(secret: &str) -> String {
    "•".repeat(secret.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_mgmt_mapping() {
        assert_eq!(SecurityType::from_key_mgmt(None), SecurityType::Open);
        assert_eq!(SecurityType::from_key_mgmt(Some("wpa-psk")), SecurityType::WpaPersonal);
        assert_eq!(SecurityType::from_key_mgmt(Some("sae")), SecurityType::WpaPersonal);
        assert_eq!(SecurityType::from_key_mgmt(Some("wpa-eap")), SecurityType::WpaEnterprise);
        assert_eq!(SecurityType::from_key_mgmt(Some("none")), SecurityType::Wep);
        assert_eq!(
            SecurityType::from_key_mgmt(Some("owe")),
            SecurityType::Unknown("owe".into())
        );
    }

    #[test]
    fn open_profile_drops_password() {
        let profile = NetworkProfile::new("Cafe", "Cafe", SecurityType::Open, Some("x".into()));
        assert_eq!(profile.password, None);
    }

    #[test]
    fn mask_counts_chars() {
        assert_eq!(mask("pässwd").chars().count(), 6);
        assert_eq!(mask(""), "");
    }
}
