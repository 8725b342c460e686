//! Shared utilities for the Roster workspace.
//!
//! This crate holds helpers that are not tied to the HTTP service itself,
//! currently the build/version metadata reported by the health endpoint.

pub mod version_info;
