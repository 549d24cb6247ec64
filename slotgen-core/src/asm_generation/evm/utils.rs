//! Stack shuffling and value conversion helpers shared by the location values.

use slotgen_error::error::CompileError;
use slotgen_types::{Span, U256};

use crate::type_system::{
    Alignment, DataLocation, FunctionKind, Signedness, TypeId, TypeInfo, ValueRepr,
};

use super::{packing::low_bytes_mask, CompilerContext, EvmInstruction, Symbol};

impl CompilerContext<'_> {
    /// Copies the `item_size` slots starting `stack_depth` slots below the top onto the top.
    pub fn copy_to_stack_top(
        &mut self,
        stack_depth: usize,
        item_size: usize,
        span: &Span,
    ) -> Result<(), CompileError> {
        for _ in 0..item_size {
            self.dup(stack_depth, span)?;
        }
        Ok(())
    }

    /// Moves the item of `item_size` slots found directly below the top `stack_depth` slots to
    /// the top.
    pub fn move_to_stack_top(
        &mut self,
        stack_depth: usize,
        item_size: usize,
        span: &Span,
    ) -> Result<(), CompileError> {
        self.move_into_stack(item_size, stack_depth, span)
    }

    /// Moves the top `item_size` slots below the `stack_depth` slots underneath them.
    pub fn move_into_stack(
        &mut self,
        stack_depth: usize,
        item_size: usize,
        span: &Span,
    ) -> Result<(), CompileError> {
        if stack_depth <= item_size {
            for _ in 0..stack_depth {
                self.rotate_stack_down(stack_depth + item_size, span)?;
            }
        } else {
            for _ in 0..item_size {
                self.rotate_stack_up(stack_depth + item_size, span)?;
            }
        }
        Ok(())
    }

    /// Rotates the top `items` slots so that the top slot ends up at the bottom of the range.
    pub fn rotate_stack_up(&mut self, items: usize, span: &Span) -> Result<(), CompileError> {
        for i in 1..items {
            self.swap(items - i, span)?;
        }
        Ok(())
    }

    /// Rotates the top `items` slots so that the bottom slot of the range ends up on top.
    pub fn rotate_stack_down(&mut self, items: usize, span: &Span) -> Result<(), CompileError> {
        for i in 1..items {
            self.swap(i, span)?;
        }
        Ok(())
    }

    pub fn pop_stack_slots(&mut self, amount: usize) {
        for _ in 0..amount {
            self.emit(EvmInstruction::Pop);
        }
    }

    pub fn pop_stack_element(&mut self, ty: TypeId) {
        let size = self.engine().size_on_stack(ty);
        self.pop_stack_slots(size);
    }

    /// `value` → `value << bits`
    pub fn left_shift(&mut self, bits: usize) {
        debug_assert!(bits < 256, "Invalid shift.");
        if bits != 0 {
            self.push(bits);
            self.emit(EvmInstruction::Shl);
        }
    }

    /// `value` → `value >> bits`
    pub fn right_shift(&mut self, bits: usize) {
        debug_assert!(bits < 256, "Invalid shift.");
        if bits != 0 {
            self.push(bits);
            self.emit(EvmInstruction::Shr);
        }
    }

    /// `word` → `address selector`, where `word` holds the address followed by the selector,
    /// either in the top 24 bytes (`left_aligned`) or the low 24 bytes.
    pub fn split_external_function_type(&mut self, left_aligned: bool) {
        if left_aligned {
            self.emit(EvmInstruction::Dup(1));
            self.right_shift(64 + 32);
            self.emit(EvmInstruction::Swap(1));
            self.right_shift(64);
        } else {
            self.emit(EvmInstruction::Dup(1));
            self.right_shift(32);
            self.push(low_bytes_mask(20));
            self.emit(EvmInstruction::And);
            self.emit(EvmInstruction::Swap(1));
        }
        self.push(low_bytes_mask(4));
        self.emit(EvmInstruction::And);
    }

    /// `address selector` → `word`, the inverse of [Self::split_external_function_type].
    pub fn combine_external_function_type(&mut self, left_aligned: bool) {
        self.push(low_bytes_mask(4));
        self.emit(EvmInstruction::And);
        self.emit(EvmInstruction::Swap(1));
        if !left_aligned {
            self.push(low_bytes_mask(20));
            self.emit(EvmInstruction::And);
        }
        self.left_shift(32);
        self.emit(EvmInstruction::Or);
        if left_aligned {
            self.left_shift(64);
        }
    }

    /// Converts the value of type `source` on top of the stack to `target`.
    pub fn convert_type(
        &mut self,
        source: TypeId,
        target: TypeId,
        cleanup: bool,
        chop_sign_bits: bool,
        span: &Span,
    ) -> Result<(), CompileError> {
        let primitives = self.primitives();
        primitives.convert_type(self, source, target, cleanup, chop_sign_bits, span)
    }

    /// Brings a value type on top of the stack into its canonical form: unused high bits cleared,
    /// signed values sign extended, byte sequences cleared below their width.
    pub fn cleanup_value(&mut self, ty: TypeId) {
        let encoding = self.engine().storage_encoding(ty);
        if encoding.repr == ValueRepr::ExternalFunction || encoding.is_full_word() {
            return;
        }
        if self.engine().get(ty) == TypeInfo::Bool {
            self.emit(EvmInstruction::IsZero);
            self.emit(EvmInstruction::IsZero);
            return;
        }
        match (encoding.alignment, encoding.signedness) {
            (Alignment::Left, _) => {
                self.push(!(U256::MAX >> (8 * encoding.bytes as usize)));
                self.emit(EvmInstruction::And);
            }
            (Alignment::Right, Signedness::Signed) => {
                self.push(encoding.bytes - 1);
                self.emit(EvmInstruction::SignExtend);
            }
            (Alignment::Right, _) => {
                self.push(low_bytes_mask(encoding.bytes));
                self.emit(EvmInstruction::And);
            }
        }
    }

    /// Pushes the zero value of `ty`, one word per stack slot.
    pub fn push_zero_value(&mut self, ty: TypeId, span: &Span) -> Result<(), CompileError> {
        match self.engine().get(ty) {
            TypeInfo::Function {
                kind: FunctionKind::Internal,
            } => {
                self.emit(EvmInstruction::PushSymbol(Symbol::uninitialized_function()));
                Ok(())
            }
            TypeInfo::Tuple(components) => {
                for component in components {
                    self.push_zero_value(component, span)?;
                }
                Ok(())
            }
            TypeInfo::Mapping { .. }
            | TypeInfo::Array {
                location: DataLocation::Storage,
                ..
            }
            | TypeInfo::Struct {
                location: DataLocation::Storage,
                ..
            } => panic!(
                "Internal compiler error: requested a zero value of storage type `{}`.",
                self.engine().display(ty)
            ),
            TypeInfo::Array {
                location: DataLocation::Memory,
                ..
            }
            | TypeInfo::Struct {
                location: DataLocation::Memory,
                ..
            } => {
                let primitives = self.primitives();
                primitives.push_zero_reference(self, ty, span)
            }
            _ => {
                for _ in 0..self.engine().size_on_stack(ty) {
                    self.push(0u8);
                }
                Ok(())
            }
        }
    }

    /// `address` → `value`, reading a value of type `ty` from memory.
    pub fn load_from_memory_dynamic(&mut self, ty: TypeId, padded: bool) {
        let bytes = self.engine().memory_encoded_size(ty, padded);
        let encoding = self.engine().storage_encoding(ty);
        self.emit(EvmInstruction::MLoad);
        if encoding.repr == ValueRepr::ExternalFunction {
            self.split_external_function_type(true);
        } else if bytes != 32 {
            let shift = (32 - bytes as usize) * 8;
            self.right_shift(shift);
            match (encoding.alignment, encoding.signedness) {
                (Alignment::Left, _) => self.left_shift(shift),
                (Alignment::Right, Signedness::Signed) => {
                    self.push(bytes - 1);
                    self.emit(EvmInstruction::SignExtend);
                }
                _ => (),
            }
        }
    }

    /// `address value` → `address + size`, writing the value of type `ty` to memory. Reference
    /// types write their pointer word.
    pub fn store_in_memory_dynamic(
        &mut self,
        ty: TypeId,
        padded: bool,
        span: &Span,
    ) -> Result<(), CompileError> {
        let info = self.engine().get(ty);
        if !info.is_value_type() {
            if info.location() != Some(DataLocation::Memory) {
                return Err(CompileError::Unimplemented(
                    "Only in-memory reference type can be stored.",
                    span.clone(),
                ));
            }
            self.emit(EvmInstruction::Dup(2));
            self.emit(EvmInstruction::MStore);
            self.push(32u8);
            self.emit(EvmInstruction::Add);
            return Ok(());
        }
        let bytes = self.engine().memory_encoded_size(ty, padded);
        let encoding = self.engine().storage_encoding(ty);
        if encoding.repr == ValueRepr::ExternalFunction {
            self.combine_external_function_type(true);
        } else {
            self.convert_type(ty, ty, true, false, span)?;
            if bytes != 32 && !padded && encoding.alignment != Alignment::Left {
                self.left_shift((32 - bytes as usize) * 8);
            }
        }
        self.emit(EvmInstruction::Dup(2));
        self.emit(EvmInstruction::MStore);
        self.push(bytes);
        self.emit(EvmInstruction::Add);
        Ok(())
    }
}
