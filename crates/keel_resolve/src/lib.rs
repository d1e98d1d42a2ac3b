//! Dependency resolution and compile ordering for VHDL file sets.
//!
//! The [`Registry`] collects extracted files under a version/mode filter
//! policy and resolves design-unit references to files. [`Analysis`] computes
//! each file's strong (must-precede) and weak (must-exist) dependency sets
//! against the registry, and [`compile_order`] assembles a deterministic
//! linear order honoring every strong edge, detecting cycles, and marking
//! top-level files. [`PatternSet`] then selects test cases from the tops.

#![warn(missing_docs)]

pub mod error;
pub mod order;
pub mod registry;
pub mod resolver;
pub mod testcase;
pub mod unit;

pub use error::ResolveError;
pub use order::{compile_order, CompileOrder};
pub use registry::{FileId, Mode, Registry};
pub use resolver::{Analysis, FileDeps};
pub use testcase::{PatternSet, TestCase};
pub use unit::{UnitKind, UnitRef};
