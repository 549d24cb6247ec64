#![allow(clippy::assign_op_pattern, clippy::ptr_offset_with_cast, clippy::manual_range_contains)]

use uint::construct_uint;

construct_uint! {
    /// A 256-bit machine word, used for storage keys, stored values and immediates.
    pub struct U256(4);
}

impl U256 {
    /// The word as 32 big-endian bytes.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        self.to_big_endian(&mut bytes);
        bytes
    }

    /// Reads a word from up to 32 big-endian bytes.
    pub fn from_be_slice(bytes: &[u8]) -> Self {
        U256::from_big_endian(bytes)
    }
}
