//! In-memory profile store for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use super::ProfileStore;
use crate::backend::error::{Error, Result};
use crate::backend::profile::NetworkProfile;

#[derive(Debug, Default)]
pub struct MemoryStore {
    profiles: Mutex<Vec<NetworkProfile>>,
    /// Names of profiles that were brought up
    activated: Mutex<Vec<String>>,
    create_calls: Mutex<usize>,
    /// Make the next activation fail with this message
    fail_activation: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn with_profiles(profiles: Vec<NetworkProfile>) -> Self {
        Self {
            profiles: Mutex::new(profiles),
            ..Self::default()
        }
    }

    pub fn fail_next_activation(&self, message: &str) {
        *self.fail_activation.lock().unwrap() = Some(message.to_string());
    }

    pub fn profiles(&self) -> Vec<NetworkProfile> {
        self.profiles.lock().unwrap().clone()
    }

    pub fn activated(&self) -> Vec<String> {
        self.activated.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> usize {
        *self.create_calls.lock().unwrap()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn list_profiles(&self) -> Result<Vec<NetworkProfile>> {
        Ok(self.profiles())
    }

    async fn get_profile_detail(&self, name: &str) -> Result<NetworkProfile> {
        self.profiles
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .ok_or_else(|| Error::ProfileNotFound(name.to_string()))
    }

    async fn create_profile(&self, profile: &NetworkProfile, activate: bool) -> Result<()> {
        *self.create_calls.lock().unwrap() += 1;
        {
            let mut profiles = self.profiles.lock().unwrap();
            if profiles.iter().any(|p| p.name == profile.name) {
                let message = format!("connection '{}' already exists", profile.name);
                return Err(if activate {
                    Error::ConnectionFailed(message)
                } else {
                    Error::ProfileSaveFailed(message)
                });
            }
            profiles.push(profile.clone());
        }
        if activate {
            if let Some(message) = self.fail_activation.lock().unwrap().take() {
                return Err(Error::ConnectionFailed(message));
            }
            self.activated.lock().unwrap().push(profile.name.clone());
        }
        Ok(())
    }
}
