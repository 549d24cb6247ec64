use slotgen_types::U256;

use super::TypeId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructMember {
    pub name: String,
    /// The declared type; reference types are declared with storage location.
    pub ty: TypeId,
}

/// A struct definition with its storage layout computed once on insertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructDecl {
    pub name: String,
    pub members: Vec<StructMember>,
    pub(crate) storage_offsets: Vec<StorageOffset>,
    pub(crate) storage_slots: u64,
}

impl StructDecl {
    /// Number of storage slots a value of this struct occupies.
    pub fn storage_slots(&self) -> u64 {
        self.storage_slots
    }
}

/// Position of a member relative to the first slot of its struct.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StorageOffset {
    pub slot: u64,
    pub byte: u8,
}

/// A member of a struct type seen through a particular data location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberInfo {
    pub name: String,
    /// The member type relocated to the data location of the containing struct.
    pub ty: TypeId,
    pub storage: StorageOffset,
    /// Byte offset within the memory representation; `None` for mappings, which have no memory
    /// representation.
    pub memory_offset: Option<u64>,
}

impl MemberInfo {
    pub fn storage_slot(&self) -> U256 {
        U256::from(self.storage.slot)
    }
}

/// Assigns `(slot, byte)` offsets to a sequence of members of the given `(slots, bytes)` sizes.
///
/// A member starts a new slot when it does not fit into what is left of the current one; a
/// member that needs more than one slot (or a full word) always ends its last slot. Returns the
/// offsets and the total number of slots used.
pub(crate) fn storage_offsets(sizes: &[(u64, u8)]) -> (Vec<StorageOffset>, u64) {
    let mut offsets = Vec::with_capacity(sizes.len());
    let mut slot = 0u64;
    let mut byte = 0u8;
    for &(slots, bytes) in sizes {
        debug_assert!(slots >= 1, "Invalid storage size.");
        if byte as u16 + bytes as u16 > 32 {
            slot += 1;
            byte = 0;
        }
        offsets.push(StorageOffset { slot, byte });
        if slots == 1 && byte as u16 + bytes as u16 <= 32 {
            byte += bytes;
            if byte == 32 {
                slot += 1;
                byte = 0;
            }
        } else {
            slot += slots;
            byte = 0;
        }
    }
    if byte > 0 {
        slot += 1;
    }
    (offsets, slot)
}
