//! # rootnet-common
//!
//! Shared types, error definitions, configuration models, and constants
//! used across the rootnet workspace.
//!
//! This crate is the leaf of the dependency graph. It depends on no other
//! internal crate and carries the data that crosses process and namespace
//! boundaries: the driver configuration and the network message handed
//! from the parent to the child.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
