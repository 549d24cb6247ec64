use rustc_hash::FxHashMap;
use std::sync::RwLock;

use crate::concurrent_slab::ConcurrentSlab;

use super::{
    layout::storage_offsets, Alignment, DataLocation, FunctionKind, MemberInfo, Signedness,
    StructDecl, StructId, StructMember, TypeId, TypeInfo, ValueEncoding, ValueRepr,
};

#[derive(Debug, Default)]
pub struct TypeEngine {
    slab: ConcurrentSlab<TypeInfo>,
    id_map: RwLock<FxHashMap<TypeInfo, TypeId>>,
    structs: ConcurrentSlab<StructDecl>,
}

impl TypeEngine {
    /// Inserts a [TypeInfo] into the [TypeEngine] and returns a [TypeId] referring to that
    /// [TypeInfo]. Structurally equal types always get the same [TypeId].
    pub fn insert(&self, ty: TypeInfo) -> TypeId {
        let mut id_map = self.id_map.write().unwrap();
        if let Some(type_id) = id_map.get(&ty) {
            return *type_id;
        }
        let type_id = TypeId::new(self.slab.insert(ty.clone()));
        id_map.insert(ty, type_id);
        type_id
    }

    /// Performs a lookup of `id` into the [TypeEngine].
    pub fn get(&self, id: TypeId) -> TypeInfo {
        self.slab.get(id.index())
    }

    /// Registers a struct definition and computes its storage layout.
    pub fn insert_struct(&self, name: impl Into<String>, members: Vec<StructMember>) -> StructId {
        let sizes = members
            .iter()
            .map(|member| (self.storage_size(member.ty), self.storage_bytes(member.ty)))
            .collect::<Vec<_>>();
        let (storage_offsets, storage_slots) = storage_offsets(&sizes);
        let decl = StructDecl {
            name: name.into(),
            members,
            storage_offsets,
            storage_slots,
        };
        StructId::new(self.structs.insert(decl))
    }

    pub fn get_struct(&self, id: StructId) -> StructDecl {
        self.structs.get(id.index())
    }

    pub fn bool(&self) -> TypeId {
        self.insert(TypeInfo::Bool)
    }

    pub fn uint(&self, bits: u16) -> TypeId {
        self.insert(TypeInfo::Integer {
            bits,
            signed: false,
        })
    }

    pub fn int(&self, bits: u16) -> TypeId {
        self.insert(TypeInfo::Integer { bits, signed: true })
    }

    pub fn fixed_bytes(&self, bytes: u8) -> TypeId {
        self.insert(TypeInfo::FixedBytes(bytes))
    }

    pub fn is_value_type(&self, id: TypeId) -> bool {
        self.get(id).is_value_type()
    }

    /// Number of operand stack slots a value of this type occupies.
    pub fn size_on_stack(&self, id: TypeId) -> usize {
        match self.get(id) {
            TypeInfo::Function {
                kind: FunctionKind::External,
            } => 2,
            TypeInfo::Array {
                length: None,
                location: DataLocation::CallData,
                ..
            } => 2,
            TypeInfo::Tuple(components) => components
                .iter()
                .map(|component| self.size_on_stack(*component))
                .sum(),
            _ => 1,
        }
    }

    /// Number of bytes a value of this type takes inside a storage slot. Reference types always
    /// take a full word.
    pub fn storage_bytes(&self, id: TypeId) -> u8 {
        match self.get(id) {
            TypeInfo::Bool => 1,
            TypeInfo::Integer { bits, .. } | TypeInfo::FixedPoint { bits, .. } => (bits / 8) as u8,
            TypeInfo::Address => 20,
            TypeInfo::FixedBytes(bytes) => bytes,
            TypeInfo::Enum { variants, .. } => enum_storage_bytes(variants),
            TypeInfo::UserDefinedValue { underlying, .. } => self.storage_bytes(underlying),
            TypeInfo::Function {
                kind: FunctionKind::Internal,
            } => 8,
            TypeInfo::Function {
                kind: FunctionKind::External,
            } => 24,
            TypeInfo::Array { .. }
            | TypeInfo::Struct { .. }
            | TypeInfo::Mapping { .. }
            | TypeInfo::Tuple(_) => 32,
        }
    }

    /// Number of storage slots a value of this type occupies.
    pub fn storage_size(&self, id: TypeId) -> u64 {
        match self.get(id) {
            TypeInfo::Array {
                element,
                length: Some(length),
                ..
            } => {
                let element_bytes = self.storage_bytes(element);
                let element_slots = self.storage_size(element);
                if element_slots == 1 && element_bytes < 32 {
                    length.div_ceil(32 / element_bytes as u64)
                } else {
                    length * element_slots
                }
            }
            TypeInfo::Struct { decl, .. } => self.get_struct(decl).storage_slots(),
            _ => 1,
        }
    }

    /// The packed encoding of a value type: its byte width and the alignment, signedness and
    /// representation rules that apply when it shares a word with other values.
    pub fn storage_encoding(&self, id: TypeId) -> ValueEncoding {
        let bytes = self.storage_bytes(id);
        match self.get(id) {
            TypeInfo::Bool | TypeInfo::Address => {
                ValueEncoding::plain(bytes, Alignment::Right, Signedness::NotApplicable)
            }
            TypeInfo::Integer { signed, .. } => ValueEncoding::plain(
                bytes,
                Alignment::Right,
                if signed {
                    Signedness::Signed
                } else {
                    Signedness::Unsigned
                },
            ),
            TypeInfo::Enum { .. } => {
                ValueEncoding::plain(bytes, Alignment::Right, Signedness::Unsigned)
            }
            TypeInfo::FixedBytes(_) => {
                ValueEncoding::plain(bytes, Alignment::Left, Signedness::NotApplicable)
            }
            TypeInfo::FixedPoint { signed, .. } => ValueEncoding {
                bytes,
                alignment: Alignment::Right,
                signedness: if signed {
                    Signedness::Signed
                } else {
                    Signedness::Unsigned
                },
                repr: ValueRepr::FixedPoint,
            },
            TypeInfo::UserDefinedValue { underlying, .. } => self.storage_encoding(underlying),
            TypeInfo::Function { kind } => ValueEncoding {
                bytes,
                alignment: Alignment::Right,
                signedness: Signedness::NotApplicable,
                repr: match kind {
                    FunctionKind::Internal => ValueRepr::InternalFunction,
                    FunctionKind::External => ValueRepr::ExternalFunction,
                },
            },
            TypeInfo::Array { .. }
            | TypeInfo::Struct { .. }
            | TypeInfo::Mapping { .. }
            | TypeInfo::Tuple(_) => {
                debug_assert!(false, "Storage encoding requested for a reference type.");
                ValueEncoding::plain(32, Alignment::Right, Signedness::NotApplicable)
            }
        }
    }

    /// Number of bytes a value takes in linear memory. Padded values always take a full word;
    /// reference types are stored as a pointer word.
    pub fn memory_encoded_size(&self, id: TypeId, padded: bool) -> u8 {
        if padded || !self.is_value_type(id) {
            return 32;
        }
        self.storage_bytes(id)
    }

    /// The same type seen through another data location. Value types and mappings are returned
    /// unchanged.
    pub fn located(&self, id: TypeId, location: DataLocation) -> TypeId {
        match self.get(id) {
            TypeInfo::Array {
                element, length, ..
            } => {
                let element = self.located(element, location);
                self.insert(TypeInfo::Array {
                    element,
                    length,
                    location,
                })
            }
            TypeInfo::Struct { decl, .. } => self.insert(TypeInfo::Struct { decl, location }),
            _ => id,
        }
    }

    /// Members of a struct type in declaration order, with their types relocated to the data
    /// location of `id`.
    pub fn struct_members(&self, id: TypeId) -> Vec<MemberInfo> {
        let TypeInfo::Struct { decl, location } = self.get(id) else {
            panic!("Internal compiler error: member layout requested for a non-struct type.");
        };
        let decl = self.get_struct(decl);
        let mut memory_offset = 0u64;
        decl.members
            .iter()
            .zip(decl.storage_offsets.iter())
            .map(|(member, storage)| {
                let member_memory_offset = if self.get(member.ty).is_mapping() {
                    None
                } else {
                    let offset = memory_offset;
                    memory_offset += 32;
                    Some(offset)
                };
                MemberInfo {
                    name: member.name.clone(),
                    ty: self.located(member.ty, location),
                    storage: *storage,
                    memory_offset: member_memory_offset,
                }
            })
            .collect()
    }

    /// Whether both types are struct types of the same struct definition.
    pub fn same_struct(&self, a: TypeId, b: TypeId) -> bool {
        match (self.get(a), self.get(b)) {
            (TypeInfo::Struct { decl: a, .. }, TypeInfo::Struct { decl: b, .. }) => a == b,
            _ => false,
        }
    }

    /// A human readable name of the type, for diagnostics and logs.
    pub fn display(&self, id: TypeId) -> String {
        match self.get(id) {
            TypeInfo::Bool => "bool".into(),
            TypeInfo::Integer { bits, signed } => {
                format!("{}int{bits}", if signed { "" } else { "u" })
            }
            TypeInfo::Address => "address".into(),
            TypeInfo::FixedBytes(bytes) => format!("bytes{bytes}"),
            TypeInfo::FixedPoint {
                bits,
                fractional_digits,
                signed,
            } => format!(
                "{}fixed{bits}x{fractional_digits}",
                if signed { "" } else { "u" }
            ),
            TypeInfo::Enum { name, .. } => format!("enum {name}"),
            TypeInfo::UserDefinedValue { name, .. } => name,
            TypeInfo::Function { kind } => match kind {
                FunctionKind::Internal => "function internal".into(),
                FunctionKind::External => "function external".into(),
            },
            TypeInfo::Array {
                element,
                length,
                location,
            } => {
                let length = length.map(|len| len.to_string()).unwrap_or_default();
                format!(
                    "{}[{length}] {}",
                    self.display(element),
                    location_str(location)
                )
            }
            TypeInfo::Struct { decl, location } => format!(
                "struct {} {}",
                self.get_struct(decl).name,
                location_str(location)
            ),
            TypeInfo::Mapping { key, value } => {
                format!("mapping({} => {})", self.display(key), self.display(value))
            }
            TypeInfo::Tuple(components) => format!(
                "({})",
                components
                    .iter()
                    .map(|component| self.display(*component))
                    .collect::<Vec<_>>()
                    .join(",")
            ),
        }
    }
}

fn location_str(location: DataLocation) -> &'static str {
    match location {
        DataLocation::Storage => "storage",
        DataLocation::Memory => "memory",
        DataLocation::CallData => "calldata",
    }
}

/// Smallest number of bytes that can hold every variant index.
fn enum_storage_bytes(variants: u32) -> u8 {
    let max = variants.saturating_sub(1);
    let bits = u32::BITS - max.leading_zeros();
    bits.div_ceil(8).max(1) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn struct_type(
        engine: &TypeEngine,
        members: &[(&str, TypeId)],
        location: DataLocation,
    ) -> TypeId {
        let decl = engine.insert_struct(
            "S",
            members
                .iter()
                .map(|(name, ty)| StructMember {
                    name: name.to_string(),
                    ty: *ty,
                })
                .collect(),
        );
        engine.insert(TypeInfo::Struct { decl, location })
    }

    #[test]
    fn insert_interns_structurally_equal_types() {
        let engine = TypeEngine::default();
        let a = engine.uint(64);
        let b = engine.insert(TypeInfo::Integer {
            bits: 64,
            signed: false,
        });
        assert_eq!(a, b);
        assert_ne!(a, engine.int(64));
    }

    #[test]
    fn storage_widths() {
        let engine = TypeEngine::default();
        assert_eq!(engine.storage_bytes(engine.bool()), 1);
        assert_eq!(engine.storage_bytes(engine.uint(128)), 16);
        assert_eq!(engine.storage_bytes(engine.insert(TypeInfo::Address)), 20);
        assert_eq!(
            engine.storage_bytes(engine.insert(TypeInfo::Enum {
                name: "E".into(),
                variants: 300,
            })),
            2
        );
        let external = engine.insert(TypeInfo::Function {
            kind: FunctionKind::External,
        });
        assert_eq!(engine.storage_bytes(external), 24);
        assert_eq!(engine.size_on_stack(external), 2);
    }

    #[test]
    fn encoding_axes_come_from_the_category() {
        let engine = TypeEngine::default();
        let bytes4 = engine.storage_encoding(engine.fixed_bytes(4));
        assert_eq!(bytes4.alignment, Alignment::Left);
        assert_eq!(bytes4.bytes, 4);
        let int16 = engine.storage_encoding(engine.int(16));
        assert_eq!(int16.alignment, Alignment::Right);
        assert!(int16.is_signed());
        let udvt = engine.insert(TypeInfo::UserDefinedValue {
            name: "Price".into(),
            underlying: engine.int(16),
        });
        assert_eq!(engine.storage_encoding(udvt), int16);
    }

    #[test]
    fn packed_static_arrays_share_slots() {
        let engine = TypeEngine::default();
        let array = engine.insert(TypeInfo::Array {
            element: engine.uint(64),
            length: Some(5),
            location: DataLocation::Storage,
        });
        assert_eq!(engine.storage_size(array), 2);
    }

    #[test]
    fn struct_members_are_relocated() {
        let engine = TypeEngine::default();
        let inner = engine.insert(TypeInfo::Array {
            element: engine.uint(256),
            length: None,
            location: DataLocation::Storage,
        });
        let mapping = engine.insert(TypeInfo::Mapping {
            key: engine.uint(256),
            value: engine.uint(256),
        });
        let storage = struct_type(
            &engine,
            &[("a", engine.uint(8)), ("m", mapping), ("xs", inner)],
            DataLocation::Storage,
        );
        let TypeInfo::Struct { decl, .. } = engine.get(storage) else {
            unreachable!()
        };
        let memory = engine.insert(TypeInfo::Struct {
            decl,
            location: DataLocation::Memory,
        });
        let members = engine.struct_members(memory);
        assert_eq!(engine.get(members[2].ty).location(), Some(DataLocation::Memory));
        assert_eq!(members[1].ty, mapping);
        assert_eq!(members[1].memory_offset, None);
        assert_eq!(members[2].memory_offset, Some(32));
        assert_eq!(members[2].storage.slot, 2);
        assert!(engine.same_struct(storage, memory));
        assert_eq!(engine.display(memory), "struct S memory");
    }
}
