//! # Anbar Support
//!
//! Shared utilities for the Anbar crates: rendering of resolution chains,
//! name shortening and suggestions used in error messages.

pub mod rendering;
