//! Profile store backed by NetworkManager's `nmcli`.
//!
//! The CLI's terse output is its own little grammar (backslash-escaped `:`
//! in tabular rows, `field:value` lines in multiline mode). It is parsed here
//! and nowhere else.

use std::path::PathBuf;
use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;

use super::ProfileStore;
use crate::backend::error::{Error, Result};
use crate::backend::profile::{NetworkProfile, SecurityType};
use crate::backend::settings::Settings;

const WIFI_TYPE: &str = "802-11-wireless";

const FIELD_SSID: &str = "802-11-wireless.ssid";
const FIELD_HIDDEN: &str = "802-11-wireless.hidden";
const FIELD_KEY_MGMT: &str = "802-11-wireless-security.key-mgmt";
const FIELD_PSK: &str = "802-11-wireless-security.psk";
const FIELD_WEP_KEY: &str = "802-11-wireless-security.wep-key0";

/// nmcli exit status for "connection, device, or access point does not exist"
const EXIT_NOT_FOUND: i32 = 10;

#[derive(Debug, Clone)]
pub struct NmcliStore {
    program: PathBuf,
}

impl NmcliStore {
    pub fn new(settings: &Settings) -> Self {
        Self {
            program: settings.nmcli.clone(),
        }
    }

    async fn run<I, S>(&self, args: I) -> std::io::Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        Command::new(&self.program)
            // Keep messages and yes/no values unlocalized
            .env("LC_ALL", "C")
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
    }

    async fn wifi_connection_names(&self) -> Result<Vec<String>> {
        let output = self
            .run(["--terse", "--fields", "NAME,TYPE", "connection", "show"])
            .await?;
        if !output.status.success() {
            return Err(Error::CommandFailed(format!(
                "Failed to list connections: {}",
                stderr_message(&output)
            )));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_connection_list(&stdout))
    }
}

#[async_trait]
impl ProfileStore for NmcliStore {
    async fn list_profiles(&self) -> Result<Vec<NetworkProfile>> {
        let names = self.wifi_connection_names().await?;
        tracing::debug!("Found {} WiFi connections", names.len());

        let mut profiles = Vec::with_capacity(names.len());
        for name in names {
            match self.get_profile_detail(&name).await {
                Ok(profile) => profiles.push(profile),
                // Deleted between the two calls
                Err(Error::ProfileNotFound(_)) => {
                    tracing::warn!("Connection {} disappeared while listing", name);
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!("Loaded {} WiFi profiles", profiles.len());
        Ok(profiles)
    }

    async fn get_profile_detail(&self, name: &str) -> Result<NetworkProfile> {
        let fields = [FIELD_SSID, FIELD_HIDDEN, FIELD_KEY_MGMT, FIELD_PSK, FIELD_WEP_KEY].join(",");
        let output = self
            .run([
                "--show-secrets",
                "--mode",
                "multiline",
                "--terse",
                "--fields",
                fields.as_str(),
                "connection",
                "show",
                "id",
                name,
            ])
            .await?;

        if !output.status.success() {
            let message = stderr_message(&output);
            if is_not_found(output.status.code(), &message) {
                return Err(Error::ProfileNotFound(name.to_string()));
            }
            return Err(Error::CommandFailed(format!(
                "Failed to read connection {name}: {message}"
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_profile_detail(name, &stdout))
    }

    async fn create_profile(&self, profile: &NetworkProfile, activate: bool) -> Result<()> {
        let args = add_profile_args(profile, activate)?;
        let failed = |message: String| {
            if activate {
                Error::ConnectionFailed(message)
            } else {
                Error::ProfileSaveFailed(message)
            }
        };

        tracing::info!(
            "Creating profile {} for {} (activate={})",
            profile.name,
            profile.ssid,
            activate
        );
        let output = self.run(&args).await.map_err(|e| failed(e.to_string()))?;
        if !output.status.success() {
            return Err(failed(stderr_message(&output)));
        }

        if activate {
            let output = self
                .run(["connection", "up", "id", profile.name.as_str()])
                .await
                .map_err(|e| Error::ConnectionFailed(e.to_string()))?;
            if !output.status.success() {
                return Err(Error::ConnectionFailed(stderr_message(&output)));
            }
            tracing::info!("Activated profile {}", profile.name);
        }

        Ok(())
    }
}

fn stderr_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("nmcli exited with {}", output.status)
    } else {
        stderr.to_string()
    }
}

fn is_not_found(code: Option<i32>, stderr: &str) -> bool {
    code == Some(EXIT_NOT_FOUND) || stderr.to_lowercase().contains("no such connection")
}

/// Split one terse tabular row on unescaped `:`, resolving `\:` and `\\`.
fn split_terse_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(next) => current.push(next),
                None => current.push('\\'),
            },
            ':' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Names of WiFi connections in `nmcli -t -f NAME,TYPE connection show` output.
fn parse_connection_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let fields = split_terse_row(line);
            match fields.as_slice() {
                [name, kind, ..] if kind == WIFI_TYPE && !name.is_empty() => Some(name.clone()),
                _ => None,
            }
        })
        .collect()
}

/// Build a profile from multiline terse `field:value` output.
///
/// Values are not escaped in this mode, so each line splits at its first colon.
fn parse_profile_detail(name: &str, stdout: &str) -> NetworkProfile {
    let mut ssid = None;
    let mut hidden = false;
    let mut key_mgmt = None;
    let mut psk = None;
    let mut wep_key = None;

    for line in stdout.lines() {
        let Some((field, value)) = line.split_once(':') else {
            continue;
        };
        let value = match value {
            "" | "--" => None,
            v => Some(v.to_string()),
        };
        match field {
            FIELD_SSID => ssid = value,
            FIELD_HIDDEN => hidden = value.as_deref() == Some("yes"),
            FIELD_KEY_MGMT => key_mgmt = value,
            FIELD_PSK => psk = value,
            FIELD_WEP_KEY => wep_key = value,
            _ => {}
        }
    }

    let security = SecurityType::from_key_mgmt(key_mgmt.as_deref());
    let password = match security {
        SecurityType::WpaPersonal => psk,
        SecurityType::Wep => wep_key,
        _ => None,
    };

    NetworkProfile::new(
        name,
        ssid.unwrap_or_else(|| name.to_string()),
        security,
        password,
    )
    .with_hidden(hidden)
}

/// Arguments for `nmcli connection add`. Save-only profiles get autoconnect
/// off so they stay inactive.
fn add_profile_args(profile: &NetworkProfile, activate: bool) -> Result<Vec<String>> {
    let mut args: Vec<String> = [
        "connection",
        "add",
        "type",
        "wifi",
        "con-name",
        profile.name.as_str(),
        "ssid",
        profile.ssid.as_str(),
        "connection.autoconnect",
        if activate { "yes" } else { "no" },
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    if profile.hidden {
        args.extend(["802-11-wireless.hidden".into(), "yes".into()]);
    }

    let password = profile.password.clone().unwrap_or_default();
    match &profile.security {
        SecurityType::Open => {}
        SecurityType::WpaPersonal => args.extend([
            "wifi-sec.key-mgmt".into(),
            "wpa-psk".into(),
            "wifi-sec.psk".into(),
            password,
        ]),
        SecurityType::Wep => args.extend([
            "wifi-sec.key-mgmt".into(),
            "none".into(),
            "wifi-sec.wep-key0".into(),
            password,
        ]),
        other => return Err(Error::UnsupportedSecurityType(other.label().to_string())),
    }

    Ok(args)
}
