//! Parent and child network drivers.
//!
//! A parent driver runs outside the container: it prepares the link,
//! starts whatever forwards packets for it, and produces a
//! [`NetworkMessage`]. The message is shipped into the namespace, where
//! the matching child driver accepts it.

pub mod slirp4netns;

use std::fmt;
use std::path::Path;

use rootnet_common::error::RootnetError;
use rootnet_common::types::NetworkMessage;

use crate::cleanup::CleanupChain;

pub use slirp4netns::{Slirp4netnsChild, Slirp4netnsParent};

/// Successful result of [`ParentDriver::configure_network`].
#[derive(Debug)]
pub struct Configured {
    /// Addressing facts for the child namespace.
    pub message: NetworkMessage,
    /// Release actions the caller must run on teardown.
    pub cleanup: CleanupChain,
}

/// Failed [`ParentDriver::configure_network`] call.
///
/// Carries the cleanup owed for whatever was acquired before the failure.
#[derive(Debug)]
pub struct ConfigureError {
    /// What went wrong.
    pub error: RootnetError,
    /// Release actions the caller must still run.
    pub cleanup: CleanupChain,
}

impl ConfigureError {
    pub(crate) fn new(error: RootnetError, cleanup: CleanupChain) -> Self {
        Self { error, cleanup }
    }

    /// Runs the owed cleanup and returns the original error.
    #[must_use]
    pub fn cleanup_and_into_error(self) -> RootnetError {
        if let Err(e) = self.cleanup.run() {
            tracing::warn!(error = %e, "cleanup after failed configuration failed");
        }
        self.error
    }
}

impl fmt::Display for ConfigureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for ConfigureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Parent-side half of a user-mode network backend.
pub trait ParentDriver: Send + Sync {
    /// Effective link MTU, never zero.
    fn mtu(&self) -> u32;

    /// Sets up networking for the namespace of `pid`.
    ///
    /// `state_dir` is a per-container scratch directory the backend may use.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigureError`] carrying the cleanup owed so far.
    fn configure_network(&self, pid: u32, state_dir: &Path) -> Result<Configured, ConfigureError>;
}

/// Child-side half of a user-mode network backend.
pub trait ChildDriver: Send + Sync {
    /// Accepts the parent's message inside the namespace and returns the
    /// device to bring the namespace's networking up on.
    ///
    /// # Errors
    ///
    /// Returns an error if the message is unusable.
    fn configure_network_child(&self, message: &NetworkMessage) -> rootnet_common::error::Result<String>;
}
