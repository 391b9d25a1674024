//! Host registry built from configuration
//!
//! The registry is constructed once at startup and handed to the executor,
//! the fleet poller and the HTTP state explicitly.

use super::types::SystemConfig;
use crate::types::{CommandSpec, HostIdentity};

#[derive(Debug, Clone, Default)]
pub struct HostRegistry {
    hosts: Vec<HostIdentity>,
    default_user: Option<String>,
}

impl HostRegistry {
    pub fn new(hosts: Vec<HostIdentity>, default_user: Option<String>) -> Self {
        Self {
            hosts,
            default_user,
        }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(config.hosts.clone(), config.ssh.default_user.clone())
    }

    pub fn get(&self, address: &str) -> Option<&HostIdentity> {
        self.hosts.iter().find(|h| h.address == address)
    }

    pub fn hosts(&self) -> &[HostIdentity] {
        &self.hosts
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Login user for a step: request override, then registry entry, then the default.
    pub fn resolve_user(&self, spec: &CommandSpec) -> Option<String> {
        spec.user
            .clone()
            .filter(|u| !u.is_empty())
            .or_else(|| self.get(&spec.host).and_then(|h| h.user.clone()))
            .or_else(|| self.default_user.clone())
    }
}
