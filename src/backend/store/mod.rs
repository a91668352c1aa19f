//! Access to the system's saved WiFi profiles.
//!
//! [`NmcliStore`] shells out to NetworkManager's CLI. Tests use the in-memory
//! store instead, so nothing here needs privileges when testing.

mod nmcli;
#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;

use super::error::Result;
use super::profile::NetworkProfile;

pub use nmcli::NmcliStore;

/// Read/create capability over the network manager's profile store.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// All saved WiFi profiles, with secrets.
    async fn list_profiles(&self) -> Result<Vec<NetworkProfile>>;

    /// One profile by connection name. Fails with `ProfileNotFound`.
    async fn get_profile_detail(&self, name: &str) -> Result<NetworkProfile>;

    /// Create a profile and, if `activate`, bring it up right away.
    ///
    /// Fails with `ConnectionFailed` when activation was requested and
    /// `ProfileSaveFailed` otherwise. Duplicate handling is up to the store.
    async fn create_profile(&self, profile: &NetworkProfile, activate: bool) -> Result<()>;
}
