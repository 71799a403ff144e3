//! Identifier handling for bibliographic entries
//!
//! This crate provides:
//! - Cite key generation (`[auth:lower][year]`, e.g. `s2020`)
//! - Collision helpers for callers that need unique keys
//! - DOI normalization and resolver URL construction

pub mod cite_key;
pub mod doi;

pub use cite_key::*;
pub use doi::*;
