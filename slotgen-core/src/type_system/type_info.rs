use super::{StructId, TypeId};

/// The data location a reference type points into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataLocation {
    Storage,
    Memory,
    CallData,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// A code tag within the current contract.
    Internal,
    /// An `(address, selector)` pair.
    External,
}

/// The closed set of type categories.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeInfo {
    Bool,
    Integer {
        bits: u16,
        signed: bool,
    },
    Address,
    FixedBytes(u8),
    FixedPoint {
        bits: u16,
        fractional_digits: u8,
        signed: bool,
    },
    Enum {
        name: String,
        variants: u32,
    },
    UserDefinedValue {
        name: String,
        underlying: TypeId,
    },
    Function {
        kind: FunctionKind,
    },
    /// `length` is `None` for dynamically sized arrays.
    Array {
        element: TypeId,
        length: Option<u64>,
        location: DataLocation,
    },
    Struct {
        decl: StructId,
        location: DataLocation,
    },
    Mapping {
        key: TypeId,
        value: TypeId,
    },
    Tuple(Vec<TypeId>),
}

impl TypeInfo {
    /// Value types are copied by value and fit into a bounded number of stack slots.
    pub fn is_value_type(&self) -> bool {
        !matches!(
            self,
            TypeInfo::Array { .. }
                | TypeInfo::Struct { .. }
                | TypeInfo::Mapping { .. }
                | TypeInfo::Tuple(_)
        )
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, TypeInfo::Mapping { .. })
    }

    pub fn location(&self) -> Option<DataLocation> {
        match self {
            TypeInfo::Array { location, .. } | TypeInfo::Struct { location, .. } => {
                Some(*location)
            }
            _ => None,
        }
    }
}
