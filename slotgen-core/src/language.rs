//! The declarations an access site can refer to.

use slotgen_types::Span;

use crate::type_system::TypeId;

/// Uniquely identifies a variable declaration across a compilation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(usize);

impl VariableId {
    pub fn new(raw: usize) -> Self {
        VariableId(raw)
    }

    pub fn to_usize(&self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mutability {
    Mutable,
    /// Assigned once by creation code and read-only afterwards.
    Immutable,
}

/// Where the value of a variable lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VariableLocation {
    /// Local variable on the operand stack.
    Stack,
    /// State variable in persistent storage.
    Storage,
    /// State variable in transient storage.
    Transient,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableDeclaration {
    pub id: VariableId,
    pub name: String,
    pub ty: TypeId,
    pub mutability: Mutability,
    pub location: VariableLocation,
    pub span: Span,
}

impl VariableDeclaration {
    pub fn is_immutable(&self) -> bool {
        self.mutability == Mutability::Immutable
    }
}
