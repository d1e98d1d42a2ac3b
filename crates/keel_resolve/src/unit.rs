//! Design-unit identification in the logical namespace.

use std::fmt;

/// The kind of a resolvable VHDL design unit.
///
/// Components are not design units of their own: a component declaration is
/// resolved to the entity it names.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum UnitKind {
    /// An instantiable entity.
    Entity,
    /// A package of declarations.
    Package,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::Entity => f.write_str("entity"),
            UnitKind::Package => f.write_str("package"),
        }
    }
}

/// Identifies a design unit as a (kind, library, name) triplet.
///
/// The derived ordering (kind, then library, then name) is relied on for
/// deterministic iteration over unit sets.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct UnitRef {
    /// The unit kind.
    pub kind: UnitKind,
    /// The library the unit lives in.
    pub library: String,
    /// The unit's VHDL identifier, lowercased.
    pub name: String,
}

impl UnitRef {
    /// Creates an entity reference.
    pub fn entity(library: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: UnitKind::Entity,
            library: library.into(),
            name: name.into(),
        }
    }

    /// Creates a package reference.
    pub fn package(library: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: UnitKind::Package,
            library: library.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for UnitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}.{}", self.kind, self.library, self.name)
    }
}
