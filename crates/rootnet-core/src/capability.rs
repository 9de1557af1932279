//! Helper capability detection.
//!
//! Asks the installed helper to describe itself and records which of the
//! optional switches it mentions. The matching lives in
//! [`CapabilitySet::from_help_text`], so callers only ever see the set.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use rootnet_common::constants::HELP_FLAG;
use rootnet_common::error::{Result, RootnetError};
use rootnet_common::types::CapabilitySet;

/// Resolves `binary` on `PATH` without running it.
///
/// # Errors
///
/// Returns [`RootnetError::NotInstalled`] if the binary cannot be found or
/// is not executable, and [`RootnetError::ConfigValidation`] if the name is
/// empty.
pub fn resolve_binary(binary: &str) -> Result<PathBuf> {
    if binary.is_empty() {
        return Err(RootnetError::ConfigValidation {
            message: "got empty helper binary".into(),
        });
    }
    which::which(binary).map_err(|e| RootnetError::NotInstalled {
        binary: binary.to_string(),
        reason: e.to_string(),
    })
}

/// Detects which optional switches the helper `binary` supports.
///
/// The binary is resolved first; an unresolvable binary is never executed.
/// No result is cached, so callers should detect once and keep the set.
///
/// # Errors
///
/// Returns [`RootnetError::NotInstalled`] if resolution fails and
/// [`RootnetError::InvocationFailed`] if `--help` cannot be run or exits
/// non-zero.
pub fn detect_capabilities(binary: &str) -> Result<CapabilitySet> {
    let resolved = resolve_binary(binary)?;
    let help = describe(&resolved)?;
    let caps = CapabilitySet::from_help_text(&help);
    tracing::debug!(binary = %resolved.display(), caps = ?caps, "detected helper capabilities");
    Ok(caps)
}

/// Runs `<binary> --help` and returns its stdout and stderr as written,
/// both streams sharing one pipe.
fn describe(binary: &Path) -> Result<String> {
    let failed = |output: String, reason: String| RootnetError::InvocationFailed {
        binary: binary.to_path_buf(),
        output,
        reason,
    };

    let (mut reader, writer) = std::io::pipe().map_err(|e| failed(String::new(), e.to_string()))?;
    let stderr = writer
        .try_clone()
        .map_err(|e| failed(String::new(), e.to_string()))?;
    let mut cmd = Command::new(binary);
    let _ = cmd
        .arg(HELP_FLAG)
        .stdin(Stdio::null())
        .stdout(writer)
        .stderr(stderr);
    let mut child = cmd.spawn().map_err(|e| failed(String::new(), e.to_string()))?;
    // The command still holds the write ends; reading would never see EOF.
    drop(cmd);

    let mut raw = Vec::new();
    let read = reader.read_to_end(&mut raw);
    let status = child.wait();
    let combined = String::from_utf8_lossy(&raw).into_owned();

    let status = status.map_err(|e| failed(combined.clone(), e.to_string()))?;
    if let Err(e) = read {
        return Err(failed(combined, e.to_string()));
    }
    if !status.success() {
        return Err(failed(combined, status.to_string()));
    }
    Ok(combined)
}
