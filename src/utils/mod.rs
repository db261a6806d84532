//! Shared helpers for input limits and digests.

pub mod validation;
