//! The type query interface consumed by the location values.
//!
//! Types are interned in a [TypeEngine]; everything the code generator needs to know about a
//! type (its category, stack size, storage width and encoding, struct member layout) is asked
//! of the engine through a [TypeId].

mod encoding;
mod engine;
mod layout;
mod type_info;

pub use encoding::*;
pub use engine::*;
pub use layout::*;
pub use type_info::*;

use std::fmt;

/// A identifier to uniquely refer to our type terms
#[derive(PartialEq, Eq, Hash, Clone, Copy, Ord, PartialOrd)]
pub struct TypeId(usize);

impl TypeId {
    pub(crate) fn new(index: usize) -> TypeId {
        TypeId(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// Identifies a struct definition. Two struct types are the same struct exactly when their
/// `StructId`s are equal, regardless of data location.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Ord, PartialOrd, Debug)]
pub struct StructId(usize);

impl StructId {
    pub(crate) fn new(index: usize) -> StructId {
        StructId(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}
