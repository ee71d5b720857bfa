//! Brads - an issue-tracking data model with pluggable storage backends.
//!
//! This crate defines the domain types and the [`IssueService`] contract for
//! an issue tracker (issues, comments, emoji reactions, audit events), plus
//! the filesystem-backed implementation in [`fs`]. External concerns -
//! resolving user references to display users and delivering notifications -
//! are consumed through the collaborator traits in [`users`] and [`notify`],
//! so backends stay portable across identity and notification providers.

#![forbid(unsafe_code)]

pub mod domain;
pub mod error;
pub mod fs;
pub mod notify;
pub mod service;
pub mod users;

pub use error::{Error, Result};
pub use service::IssueService;
