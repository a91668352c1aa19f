//! The `WIFI:` text payload understood by phone camera apps.
//!
//! Canonical form, as produced by [`format_profile`]:
//!
//! ```text
//! WIFI:T:<nopass|WPA|WEP>;S:<ssid>;P:<password>;[H:true;];
//! ```
//!
//! `\`, `;`, `,` and `:` inside the SSID and password are prefixed with a
//! backslash. Field order is fixed when encoding; [`parse_payload`] accepts
//! any order since codes may come from other generators.

use std::fmt;
use std::str::FromStr;

use super::error::{Error, Result};
use super::profile::{mask, NetworkProfile, SecurityType};

const PREFIX: &str = "WIFI:";

/// Characters escaped when encoding.
const ESCAPED: [char; 4] = ['\\', ';', ',', ':'];

/// Characters accepted after a backslash when decoding. `"` is not escaped by
/// us but other generators do escape it.
const UNESCAPABLE: [char; 5] = ['\\', ';', ',', ':', '"'];

/// Security token carried in the `T:` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrSecurity {
    NoPass,
    Wpa,
    Wep,
}

impl QrSecurity {
    pub fn token(self) -> &'static str {
        match self {
            QrSecurity::NoPass => "nopass",
            QrSecurity::Wpa => "WPA",
            QrSecurity::Wep => "WEP",
        }
    }

    /// Empty means open; WPA2/WPA3 are folded into WPA.
    fn from_token(token: &str) -> Result<Self> {
        match token.to_ascii_uppercase().as_str() {
            "" | "NOPASS" => Ok(QrSecurity::NoPass),
            "WPA" | "WPA2" | "WPA3" => Ok(QrSecurity::Wpa),
            "WEP" => Ok(QrSecurity::Wep),
            _ => Err(Error::UnsupportedSecurityType(token.to_string())),
        }
    }

    pub fn from_profile(security: &SecurityType) -> Result<Self> {
        match security {
            SecurityType::Open => Ok(QrSecurity::NoPass),
            SecurityType::WpaPersonal | SecurityType::WpaEnterprise => Ok(QrSecurity::Wpa),
            SecurityType::Wep => Ok(QrSecurity::Wep),
            SecurityType::Unknown(key_mgmt) => {
                Err(Error::UnsupportedSecurityType(key_mgmt.clone()))
            }
        }
    }

    /// Profile security to request when importing a code with this token.
    pub fn to_profile(self) -> SecurityType {
        match self {
            QrSecurity::NoPass => SecurityType::Open,
            QrSecurity::Wpa => SecurityType::WpaPersonal,
            QrSecurity::Wep => SecurityType::Wep,
        }
    }
}

/// Decoded or about-to-be-encoded contents of a WiFi QR code.
///
/// `password` is always empty for [`QrSecurity::NoPass`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrPayload {
    pub ssid: String,
    pub security: QrSecurity,
    pub password: String,
    pub hidden: bool,
}

impl QrPayload {
    pub fn from_profile(profile: &NetworkProfile) -> Result<Self> {
        let security = QrSecurity::from_profile(&profile.security)?;
        let password = match security {
            QrSecurity::NoPass => String::new(),
            _ => profile.password.clone().unwrap_or_default(),
        };
        Ok(Self {
            ssid: profile.ssid.clone(),
            security,
            password,
            hidden: profile.hidden,
        })
    }

    pub fn masked_password(&self) -> String {
        mask(&self.password)
    }

    /// Canonical text with the password replaced, safe for logs and captions.
    pub fn redacted(&self) -> String {
        Self {
            password: self.masked_password(),
            ..self.clone()
        }
        .to_string()
    }
}

impl fmt::Display for QrPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let password = match self.security {
            QrSecurity::NoPass => String::new(),
            _ => escape(&self.password),
        };
        write!(
            f,
            "{PREFIX}T:{};S:{};P:{};",
            self.security.token(),
            escape(&self.ssid),
            password
        )?;
        if self.hidden {
            f.write_str("H:true;")?;
        }
        f.write_str(";")
    }
}

impl FromStr for QrPayload {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let body = text
            .trim_start()
            .strip_prefix(PREFIX)
            .ok_or_else(|| Error::malformed("missing WIFI: prefix"))?;

        let mut security = None;
        let mut ssid = None;
        let mut password = None;
        let mut hidden = None;

        for (key, value) in split_fields(trim_terminated(body))? {
            let slot = match key.as_str() {
                "T" => &mut security,
                "S" => &mut ssid,
                "P" => &mut password,
                "H" => &mut hidden,
                _ => continue,
            };
            if slot.replace(value).is_some() {
                return Err(Error::malformed(format!("duplicate {key} field")));
            }
        }

        let security = security.ok_or_else(|| Error::malformed("missing T field"))?;
        let ssid = ssid.ok_or_else(|| Error::malformed("missing S field"))?;
        let security = QrSecurity::from_token(&security)?;
        let password = match security {
            QrSecurity::NoPass => String::new(),
            _ => password.unwrap_or_default(),
        };
        let hidden = match hidden.as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("") | Some("false") => false,
            Some("true") => true,
            Some(_) => return Err(Error::malformed("invalid H field")),
        };

        Ok(Self {
            ssid,
            security,
            password,
            hidden,
        })
    }
}

/// Build the canonical payload text for a saved profile.
pub fn format_profile(profile: &NetworkProfile) -> Result<String> {
    Ok(QrPayload::from_profile(profile)?.to_string())
}

/// Parse scanned text into a payload.
pub fn parse_payload(text: &str) -> Result<QrPayload> {
    text.parse()
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if ESCAPED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Drop whitespace some generators append after the closing `;;`.
///
/// Only applied when the text really ends in `;`, so an unterminated last
/// value keeps its trailing spaces.
fn trim_terminated(body: &str) -> &str {
    let trimmed = body.trim_end();
    if trimmed.ends_with(';') {
        trimmed
    } else {
        body
    }
}

/// Split the part after `WIFI:` into unescaped `(key, value)` pairs.
///
/// A value ends at the first unescaped `;`. Empty segments are skipped, which
/// also absorbs the closing `;;`. A missing terminator on the last field is
/// tolerated. Errors name the segment position, never its text, since the
/// text may be part of a password.
fn split_fields(body: &str) -> Result<Vec<(String, String)>> {
    let mut fields = Vec::new();
    let mut key: Option<String> = None;
    let mut current = String::new();
    let mut segment = 1;
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(next) if UNESCAPABLE.contains(&next) => current.push(next),
                Some(_) => {
                    return Err(Error::malformed(format!(
                        "invalid escape in {}",
                        describe(key.as_deref(), segment)
                    )));
                }
                None => return Err(Error::malformed("trailing backslash")),
            },
            ':' if key.is_none() => key = Some(std::mem::take(&mut current)),
            ';' => {
                finish_field(&mut fields, key.take(), std::mem::take(&mut current), segment)?;
                segment += 1;
            }
            _ => current.push(c),
        }
    }
    finish_field(&mut fields, key, current, segment)?;

    Ok(fields)
}

fn finish_field(
    fields: &mut Vec<(String, String)>,
    key: Option<String>,
    value: String,
    segment: usize,
) -> Result<()> {
    match key {
        Some(key) => fields.push((key, value)),
        None if value.is_empty() => {}
        None => {
            return Err(Error::malformed(format!("segment {segment} has no key")));
        }
    }
    Ok(())
}

/// Name of a field for error messages. Known keys are short and safe.
fn describe(key: Option<&str>, segment: usize) -> String {
    match key {
        Some(key @ ("T" | "S" | "P" | "H")) => format!("{key} field"),
        _ => format!("segment {segment}"),
    }
}
