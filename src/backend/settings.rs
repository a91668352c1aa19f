//! Runtime settings: built-in defaults overlaid with `WLQR_*` environment
//! variables.

use std::path::PathBuf;

use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "WLQR_";

const DEFAULT_NMCLI: &str = "nmcli";
const DEFAULT_FFMPEG: &str = "ffmpeg";
const DEFAULT_CAMERA: &str = "/dev/video0";
const DEFAULT_QR_SCALE: u32 = 10;
const MAX_QR_SCALE: u32 = 40;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    /// NetworkManager CLI (`WLQR_NMCLI`)
    pub nmcli: PathBuf,
    /// Capture helper used for camera scanning (`WLQR_FFMPEG`)
    pub ffmpeg: PathBuf,
    /// V4L2 device to scan from (`WLQR_CAMERA`)
    #[serde(rename = "camera")]
    pub camera_device: PathBuf,
    /// Pixels per QR module in rendered images (`WLQR_QR_SCALE`)
    pub qr_scale: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            nmcli: DEFAULT_NMCLI.into(),
            ffmpeg: DEFAULT_FFMPEG.into(),
            camera_device: DEFAULT_CAMERA.into(),
            qr_scale: DEFAULT_QR_SCALE,
        }
    }
}

impl Settings {
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load settings, falling back to defaults when a variable doesn't parse.
    pub fn from_env() -> Self {
        Self::from_figment(&Self::figment())
    }

    fn from_figment(figment: &Figment) -> Self {
        match figment.extract::<Settings>() {
            Ok(settings) => settings.sanitized(),
            Err(e) => {
                tracing::warn!("Ignoring invalid {}* settings: {}", ENV_PREFIX, e);
                Self::default()
            }
        }
    }

    /// Blank paths mean "use the default"; the scale is kept renderable.
    fn sanitized(self) -> Self {
        let defaults = Self::default();
        let path = |value: PathBuf, default: PathBuf| {
            if value.as_os_str().to_string_lossy().trim().is_empty() {
                default
            } else {
                value
            }
        };

        Self {
            nmcli: path(self.nmcli, defaults.nmcli),
            ffmpeg: path(self.ffmpeg, defaults.ffmpeg),
            camera_device: path(self.camera_device, defaults.camera_device),
            qr_scale: self.qr_scale.clamp(1, MAX_QR_SCALE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_without_env() {
        Jail::expect_with(|_jail| {
            assert_eq!(Settings::from_env(), Settings::default());
            Ok(())
        });
    }

    #[test]
    fn reads_overrides() {
        Jail::expect_with(|jail| {
            jail.set_env("WLQR_NMCLI", "/usr/local/bin/nmcli");
            jail.set_env("WLQR_CAMERA", "/dev/video2");
            jail.set_env("WLQR_QR_SCALE", "6");

            let settings = Settings::from_env();
            assert_eq!(settings.nmcli, PathBuf::from("/usr/local/bin/nmcli"));
            assert_eq!(settings.camera_device, PathBuf::from("/dev/video2"));
            assert_eq!(settings.ffmpeg, PathBuf::from("ffmpeg"));
            assert_eq!(settings.qr_scale, 6);
            Ok(())
        });
    }

    #[test]
    fn bad_scale_falls_back_and_large_scale_is_clamped() {
        Jail::expect_with(|jail| {
            jail.set_env("WLQR_QR_SCALE", "big");
            assert_eq!(Settings::from_env().qr_scale, 10);
            jail.set_env("WLQR_QR_SCALE", "0");
            assert_eq!(Settings::from_env().qr_scale, 1);
            jail.set_env("WLQR_QR_SCALE", "500");
            assert_eq!(Settings::from_env().qr_scale, 40);
            Ok(())
        });
    }

    #[test]
    fn blank_paths_use_defaults() {
        let figment = Settings::figment().merge(Serialized::default("nmcli", "  "));
        assert_eq!(Settings::from_figment(&figment).nmcli, PathBuf::from("nmcli"));
    }
}
