//! Unified error types for the rootnet workspace.
//!
//! Every failure carries the context needed to diagnose it without
//! re-running: the binary path, the captured helper output, or the
//! underlying OS error.

use std::net::IpAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum RootnetError {
    /// The driver configuration is invalid. Raised before any process or
    /// device is touched.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the invalid configuration.
        message: String,
    },

    /// The helper binary could not be resolved on `PATH`.
    #[error("helper binary {binary:?} is not installed: {reason}")]
    NotInstalled {
        /// Binary name as configured.
        binary: String,
        /// Why resolution failed.
        reason: String,
    },

    /// The helper's self-description command failed.
    #[error(
        "command \"{} --help\" failed ({reason}), make sure slirp4netns v0.2.0+ is installed: {output:?}",
        .binary.display()
    )]
    InvocationFailed {
        /// Resolved path of the helper binary.
        binary: PathBuf,
        /// Combined stdout and stderr captured from the helper.
        output: String,
        /// Exit status or spawn error.
        reason: String,
    },

    /// The virtual network device could not be prepared in the target
    /// namespace.
    #[error("setting up device {device}: {reason}")]
    DevicePreparationFailed {
        /// Device name that was being prepared.
        device: String,
        /// Failing command and its diagnostics.
        reason: String,
    },

    /// The helper process could not be started.
    #[error("executing {command}: {source}")]
    ProcessStartFailed {
        /// Rendered command line.
        command: String,
        /// Underlying spawn error.
        source: std::io::Error,
    },

    /// A host offset does not fit in the address family.
    #[error("adding {offset} to {base} overflows the address family")]
    AddressComputation {
        /// Base network address.
        base: IpAddr,
        /// Host-part offset that was added.
        offset: u32,
    },

    /// The network message handed to the child carries no device name.
    #[error("could not determine the preconfigured device")]
    MissingDevice,

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, RootnetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_failed_includes_captured_output() {
        let err = RootnetError::InvocationFailed {
            binary: PathBuf::from("/usr/bin/slirp4netns"),
            output: "unknown option".into(),
            reason: "exit status: 1".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/usr/bin/slirp4netns --help"));
        assert!(msg.contains("unknown option"));
    }

    #[test]
    fn address_computation_names_base_and_offset() {
        let err = RootnetError::AddressComputation {
            base: "255.255.255.200".parse().unwrap(),
            offset: 100,
        };
        assert_eq!(
            err.to_string(),
            "adding 100 to 255.255.255.200 overflows the address family"
        );
    }

    #[test]
    fn serde_errors_convert() {
        let parse_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: RootnetError = parse_err.into();
        assert!(matches!(err, RootnetError::Serialization { .. }));
    }
}
