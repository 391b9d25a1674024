//! Remote sessions
//!
//! A session is one authenticated SSH connection to one host that runs
//! exactly one command and is then torn down. The [`RemoteRunner`] trait is
//! the seam the command executor uses to reach hosts, so orchestration can be
//! exercised without a network.

mod ssh;

use async_trait::async_trait;

use crate::types::SessionError;

pub use ssh::{SshRunner, SshSettings};

/// Where and as whom a session connects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTarget {
    pub address: String,
    pub user: String,
}

/// Raw streams and exit status of a remote process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_status: u32,
}

/// Runs a single command on a remote host
#[async_trait]
pub trait RemoteRunner: Send + Sync {
    async fn run(
        &self,
        target: &SessionTarget,
        command: &str,
    ) -> std::result::Result<RemoteOutput, SessionError>;
}
