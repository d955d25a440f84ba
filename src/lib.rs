//! Libris application library
//!
//! The catalog and recommendation modules served by the `libris` binary and
//! driven directly by `libris-cli`.

pub mod modules;

/// Re-export commonly used types
pub use modules::*;
