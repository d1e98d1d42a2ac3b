//! Lightweight VHDL design-unit extraction.
//!
//! This crate reads a single VHDL source file and extracts the sets of
//! entity, package, and component definitions and usages, together with the
//! pragmas and filename tags the dependency resolver needs. It deliberately
//! does not parse VHDL: comments are stripped and the remaining text is
//! scanned with a table of patterns, which is sufficient for dependency
//! analysis and keeps the extractor robust against language revisions.

#![warn(missing_docs)]

pub mod error;
pub mod file;
mod patterns;

pub use error::ExtractError;
pub use file::{ExtractOptions, VhdlFile};
