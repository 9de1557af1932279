//! # rootnet-core
//!
//! User-mode networking for rootless containers.
//!
//! This crate drives an external network-stack helper (`slirp4netns`):
//! - **Capabilities**: which optional switches the installed helper accepts.
//! - **Addressing**: the deterministic IP plan for the namespace side.
//! - **Supervision**: the helper runs bound to the caller's lifetime and is
//!   torn down through an ordered [`cleanup::CleanupChain`].
//! - **Drivers**: the parent side that launches the helper and the child
//!   side that accepts its result inside the namespace.
//!
//! The one `unsafe` block (the pre-exec hook in [`process`]) carries a
//! `// SAFETY:` note.

#![allow(unsafe_code)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod address;
pub mod capability;
pub mod cleanup;
pub mod device;
pub mod driver;
pub mod process;
