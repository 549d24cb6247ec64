//! The bit-packing codec.
//!
//! A value narrower than a word occupies `width` bytes starting at byte `offset` (counted from
//! the least significant end) of a storage word. The functions here define that encoding on
//! concrete words; the emitters at the bottom produce the instruction sequences that compute the
//! same thing on the machine.

use slotgen_error::error::CompileError;
use slotgen_types::{constants::WORD_BYTES, Span, U256};

use crate::type_system::{Alignment, Signedness, TypeId, ValueEncoding, ValueRepr};

use super::{CompilerContext, EvmInstruction, Symbol};

/// `1 << 248`, the multiplier that moves a byte into the most significant position.
pub const TOP_BYTE_MULTIPLIER: U256 = U256([0, 0, 0, 1 << 56]);

/// Where a packed value lives inside its word and how its bits are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackedField {
    pub width: u8,
    pub offset: u8,
    pub alignment: Alignment,
    pub signedness: Signedness,
}

impl PackedField {
    pub fn new(encoding: &ValueEncoding, offset: u8) -> Self {
        debug_assert!(
            (1..=WORD_BYTES).contains(&encoding.bytes)
                && offset as u16 + encoding.bytes as u16 <= WORD_BYTES as u16,
            "Packed field straddles a word boundary."
        );
        PackedField {
            width: encoding.bytes,
            offset,
            alignment: encoding.alignment,
            signedness: encoding.signedness,
        }
    }

    pub fn is_full_word(&self) -> bool {
        self.width == WORD_BYTES
    }

    /// The bits of the word owned by this field.
    pub fn mask(&self) -> U256 {
        field_mask(self.width, self.offset)
    }
}

/// `256^offset`
pub fn byte_multiplier(offset: u8) -> U256 {
    U256::one() << (8 * offset as usize)
}

/// A mask of the `width` least significant bytes.
pub fn low_bytes_mask(width: u8) -> U256 {
    if width >= WORD_BYTES {
        U256::MAX
    } else {
        (U256::one() << (8 * width as usize)) - 1
    }
}

pub fn field_mask(width: u8, offset: u8) -> U256 {
    low_bytes_mask(width) << (8 * offset as usize)
}

/// Replicates bit `8 * width - 1` of `value` into all higher bits.
pub fn sign_extend(value: U256, width: u8) -> U256 {
    if width >= WORD_BYTES {
        return value;
    }
    let low = low_bytes_mask(width);
    if value.bit(8 * width as usize - 1) {
        value | !low
    } else {
        value & low
    }
}

/// Moves the `width` least significant bytes to the most significant end.
pub fn left_align(value: U256, width: u8) -> U256 {
    if width >= WORD_BYTES {
        value
    } else {
        value << (256 - 8 * width as usize)
    }
}

/// Moves the `width` most significant bytes to the least significant end.
pub fn right_align(value: U256, width: u8) -> U256 {
    if width >= WORD_BYTES {
        value
    } else {
        value >> (256 - 8 * width as usize)
    }
}

/// Reads the canonical stack form of `field` out of `word`.
pub fn decode(word: U256, field: &PackedField) -> U256 {
    let raw = (word >> (8 * field.offset as usize)) & low_bytes_mask(field.width);
    match (field.alignment, field.signedness) {
        (Alignment::Left, _) => left_align(raw, field.width),
        (Alignment::Right, Signedness::Signed) => sign_extend(raw, field.width),
        (Alignment::Right, _) => raw,
    }
}

/// Replaces the bytes of `field` in `word` with `value`, leaving every other byte untouched.
pub fn encode(word: U256, value: U256, field: &PackedField) -> U256 {
    let raw = match field.alignment {
        Alignment::Left => right_align(value, field.width),
        Alignment::Right => value & low_bytes_mask(field.width),
    };
    (word & !field.mask()) | (raw << (8 * field.offset as usize))
}

impl CompilerContext<'_> {
    /// `offset` → `256^offset`
    pub(crate) fn emit_byte_multiplier(&mut self) {
        self.push(0x100u16);
        self.emit(EvmInstruction::Exp);
    }

    /// `word multiplier` → `word` with the `width` bytes selected by `multiplier` cleared.
    pub(crate) fn emit_clear_bytes(&mut self, width: u8) {
        self.push(low_bytes_mask(width));
        self.emit(EvmInstruction::Mul);
        self.emit(EvmInstruction::Not);
        self.emit(EvmInstruction::And);
    }

    /// `shifted_word` → `value`, turning a word whose low bytes hold a packed value into the
    /// canonical stack form of that value.
    pub(crate) fn emit_packed_read_fixup(
        &mut self,
        encoding: &ValueEncoding,
        span: &Span,
    ) -> Result<(), CompileError> {
        let cleaned = match encoding.repr {
            ValueRepr::FixedPoint => {
                return Err(CompileError::Unimplemented(
                    "Packed storage encoding of fixed point types is not implemented yet.",
                    span.clone(),
                ))
            }
            ValueRepr::ExternalFunction => {
                self.split_external_function_type(false);
                true
            }
            ValueRepr::InternalFunction => {
                self.emit(EvmInstruction::Dup(1));
                self.emit(EvmInstruction::IsZero);
                self.emit(EvmInstruction::PushSymbol(Symbol::uninitialized_function()));
                self.emit(EvmInstruction::Mul);
                self.emit(EvmInstruction::Or);
                false
            }
            ValueRepr::Plain => match (encoding.alignment, encoding.signedness) {
                (Alignment::Left, _) => {
                    self.left_shift(256 - 8 * encoding.bytes as usize);
                    true
                }
                (Alignment::Right, Signedness::Signed) => {
                    self.push(encoding.bytes - 1);
                    self.emit(EvmInstruction::SignExtend);
                    true
                }
                (Alignment::Right, _) => false,
            },
        };
        if !cleaned {
            self.push(low_bytes_mask(encoding.bytes));
            self.emit(EvmInstruction::And);
        }
        Ok(())
    }

    /// `value` → `raw`, turning the stack form of a `source` value into the low-aligned bytes
    /// of a packed `target` field.
    pub(crate) fn emit_packed_write_fixup(
        &mut self,
        source: TypeId,
        target: TypeId,
        span: &Span,
    ) -> Result<(), CompileError> {
        let encoding = self.engine().storage_encoding(target);
        match encoding.repr {
            ValueRepr::FixedPoint => {
                return Err(CompileError::Unimplemented(
                    "Packed storage encoding of fixed point types is not implemented yet.",
                    span.clone(),
                ))
            }
            ValueRepr::ExternalFunction => self.combine_external_function_type(false),
            ValueRepr::InternalFunction => {
                self.push(low_bytes_mask(encoding.bytes));
                self.emit(EvmInstruction::And);
            }
            ValueRepr::Plain if encoding.alignment == Alignment::Left => {
                self.right_shift(256 - 8 * encoding.bytes as usize);
            }
            ValueRepr::Plain => self.convert_type(source, target, true, true, span)?,
        }
        Ok(())
    }
}
