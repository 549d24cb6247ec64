use slotgen_error::error::CompileError;
use slotgen_types::Span;

use crate::{
    asm_generation::evm::{CompilerContext, EvmInstruction},
    type_system::{Alignment, TypeEngine, TypeId},
};

use super::LValue;

/// A value in linear memory, addressed by one word holding its byte address.
///
/// Padded values fill a whole word. Non-padded cells hold a single byte and are written with
/// `MSTORE8`. Reference types keep only their pointer word in the cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryItem {
    data_type: TypeId,
    padded: bool,
}

impl MemoryItem {
    pub fn new(data_type: TypeId, padded: bool) -> Self {
        MemoryItem { data_type, padded }
    }

    pub fn padded(data_type: TypeId) -> Self {
        Self::new(data_type, true)
    }
}

impl LValue for MemoryItem {
    fn retrieve_value(
        self,
        ctx: &mut CompilerContext<'_>,
        _span: &Span,
        remove: bool,
    ) -> Result<(), CompileError> {
        // address
        if !remove {
            ctx.emit(EvmInstruction::Dup(1));
        }
        if ctx.engine().is_value_type(self.data_type) {
            ctx.load_from_memory_dynamic(self.data_type, self.padded);
        } else {
            ctx.emit(EvmInstruction::MLoad);
        }
        Ok(())
    }

    fn store_value(
        self,
        ctx: &mut CompilerContext<'_>,
        source_ty: TypeId,
        span: &Span,
        move_value: bool,
    ) -> Result<(), CompileError> {
        let engine = ctx.engine();
        if !engine.is_value_type(self.data_type) {
            if source_ty != self.data_type {
                return Err(CompileError::Unimplemented(
                    "Conversion not implemented for assignment to memory.",
                    span.clone(),
                ));
            }
            debug_assert_eq!(engine.size_on_stack(self.data_type), 1);
            // value address
            if !move_value {
                ctx.emit(EvmInstruction::Dup(2));
                ctx.emit(EvmInstruction::Swap(1));
            }
            ctx.emit(EvmInstruction::MStore);
            return Ok(());
        }

        debug_assert!(engine.is_value_type(source_ty), "Value type expected.");
        let size = engine.size_on_stack(self.data_type);
        // value.. address
        ctx.move_into_stack(engine.size_on_stack(source_ty), 1, span)?;
        ctx.convert_type(source_ty, self.data_type, true, false, span)?;
        if !move_value {
            ctx.move_to_stack_top(size, 1, span)?;
            ctx.copy_to_stack_top(1 + size, size, span)?;
        }
        // [value] address value
        if self.padded {
            ctx.store_in_memory_dynamic(self.data_type, true, span)?;
            ctx.emit(EvmInstruction::Pop);
        } else {
            debug_assert_eq!(
                engine.memory_encoded_size(self.data_type, false),
                1,
                "Invalid non-padded type."
            );
            if engine.storage_encoding(self.data_type).alignment == Alignment::Left {
                ctx.push(0u8);
                ctx.emit(EvmInstruction::Byte);
            }
            ctx.emit(EvmInstruction::Swap(1));
            ctx.emit(EvmInstruction::MStore8);
        }
        Ok(())
    }

    fn set_to_zero(
        self,
        ctx: &mut CompilerContext<'_>,
        span: &Span,
        remove_reference: bool,
    ) -> Result<(), CompileError> {
        if !remove_reference {
            ctx.emit(EvmInstruction::Dup(1));
        }
        if self.padded {
            ctx.push_zero_value(self.data_type, span)?;
            ctx.store_in_memory_dynamic(self.data_type, true, span)?;
            ctx.emit(EvmInstruction::Pop);
        } else {
            ctx.push(0u8);
            ctx.emit(EvmInstruction::Swap(1));
            ctx.emit(EvmInstruction::MStore8);
        }
        Ok(())
    }

    fn size_on_stack(&self, engine: &TypeEngine) -> usize {
        engine.size_on_stack(self.data_type)
    }

    fn reference_size(&self) -> usize {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        asm_generation::evm::{test_vm::*, CodeKind, UtilityRoutines},
        type_system::{DataLocation, FunctionKind, TypeInfo},
    };
    use pretty_assertions::assert_eq;
    use slotgen_types::U256;

    fn context(engine: &TypeEngine) -> CompilerContext<'_> {
        CompilerContext::new(engine, &UtilityRoutines, CodeKind::Runtime)
    }

    #[test]
    fn padded_int_round_trip() {
        let engine = TypeEngine::default();
        let int16 = engine.int(16);
        let mut ctx = context(&engine);
        let minus_three = U256::MAX - 2;
        ctx.push(minus_three);
        ctx.push(0x80u8);
        MemoryItem::padded(int16)
            .store_value(&mut ctx, int16, &Span::dummy(), false)
            .unwrap();
        ctx.push(0x80u8);
        MemoryItem::padded(int16)
            .retrieve_value(&mut ctx, &Span::dummy(), true)
            .unwrap();
        let vm = TestVm::run_section(ctx.section());
        assert_eq!(vm.stack, vec![minus_three, minus_three]);
        assert_eq!(vm.mload(0x80), minus_three);
    }

    #[test]
    fn non_padded_byte_writes_a_single_byte() {
        let engine = TypeEngine::default();
        let bytes1 = engine.fixed_bytes(1);
        let mut ctx = context(&engine);
        ctx.push(U256::from(0xabu8) << 248);
        ctx.push(0x81u8);
        MemoryItem::new(bytes1, false)
            .store_value(&mut ctx, bytes1, &Span::dummy(), true)
            .unwrap();
        ctx.push(0x81u8);
        MemoryItem::new(bytes1, false)
            .retrieve_value(&mut ctx, &Span::dummy(), false)
            .unwrap();
        let mut vm = TestVm::new();
        vm.mstore(0x80, U256::MAX);
        vm.run(ctx.section().ops());
        assert_eq!(&vm.memory[0x80..0x83], &[0xff, 0xab, 0xff]);
        assert_eq!(
            vm.stack,
            vec![U256::from(0x81u8), U256::from(0xabu8) << 248]
        );
    }

    #[test]
    fn non_padded_zero_clears_a_single_byte() {
        let engine = TypeEngine::default();
        let uint8 = engine.uint(8);
        let mut ctx = context(&engine);
        ctx.push(0x82u8);
        MemoryItem::new(uint8, false)
            .set_to_zero(&mut ctx, &Span::dummy(), false)
            .unwrap();
        assert!(ctx.section().ops().contains(&EvmInstruction::MStore8));
        let mut vm = TestVm::new();
        vm.mstore(0x80, U256::MAX);
        vm.run(ctx.section().ops());
        assert_eq!(&vm.memory[0x80..0x84], &[0xff, 0xff, 0x00, 0xff]);
        assert_eq!(vm.stack, vec![U256::from(0x82u8)]);
    }

    #[test]
    fn external_functions_are_stored_left_aligned() {
        let engine = TypeEngine::default();
        let external = engine.insert(TypeInfo::Function {
            kind: FunctionKind::External,
        });
        let address = U256::from(0x1234_5678u64);
        let selector = U256::from(0xdead_beefu32);
        let mut ctx = context(&engine);
        ctx.push(address);
        ctx.push(selector);
        ctx.push(0u8);
        MemoryItem::padded(external)
            .store_value(&mut ctx, external, &Span::dummy(), true)
            .unwrap();
        ctx.push(0u8);
        MemoryItem::padded(external)
            .retrieve_value(&mut ctx, &Span::dummy(), true)
            .unwrap();
        let vm = TestVm::run_section(ctx.section());
        assert_eq!(vm.mload(0), ((address << 32) | selector) << 64);
        assert_eq!(vm.stack, vec![address, selector]);
    }

    #[test]
    fn reference_cells_hold_the_pointer() {
        let engine = TypeEngine::default();
        let array = engine.insert(TypeInfo::Array {
            element: engine.uint(256),
            length: None,
            location: DataLocation::Memory,
        });
        let mut ctx = context(&engine);
        ctx.push(0x200u16);
        ctx.push(0x40u8);
        MemoryItem::padded(array)
            .store_value(&mut ctx, array, &Span::dummy(), false)
            .unwrap();
        let vm = TestVm::run_section(ctx.section());
        assert_eq!(vm.mload(0x40), U256::from(0x200u16));
        assert_eq!(vm.stack, vec![U256::from(0x200u16)]);
    }

    #[test]
    fn cross_type_reference_assignment_is_unimplemented() {
        let engine = TypeEngine::default();
        let uints = engine.insert(TypeInfo::Array {
            element: engine.uint(256),
            length: None,
            location: DataLocation::Memory,
        });
        let bools = engine.insert(TypeInfo::Array {
            element: engine.bool(),
            length: None,
            location: DataLocation::Memory,
        });
        let mut ctx = context(&engine);
        ctx.push(0x200u16);
        ctx.push(0x40u8);
        let err = MemoryItem::padded(uints)
            .store_value(&mut ctx, bools, &Span::dummy(), true)
            .unwrap_err();
        assert!(err.is_unimplemented());
    }

    #[test]
    fn zero_clears_the_cell_and_can_keep_the_address() {
        let engine = TypeEngine::default();
        let mut ctx = context(&engine);
        ctx.push(0x20u8);
        MemoryItem::padded(engine.uint(64))
            .set_to_zero(&mut ctx, &Span::dummy(), false)
            .unwrap();
        let mut vm = TestVm::new();
        vm.mstore(0x20, U256::MAX);
        vm.run(ctx.section().ops());
        assert_eq!(vm.mload(0x20), U256::zero());
        assert_eq!(vm.stack, vec![U256::from(0x20u8)]);
    }
}
