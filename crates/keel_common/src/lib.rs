//! Shared foundational types for the Keel VHDL dependency analyzer.
//!
//! This crate provides VHDL language-version arithmetic and simulated-time
//! timeout specifications, both of which are used across the extractor,
//! resolver, and simulator backends.

#![warn(missing_docs)]

pub mod timespec;
pub mod version;

pub use timespec::{ParseTimeSpecError, TimeSpec, TimeUnit};
pub use version::{ParseVersionError, VhdlVersion};
