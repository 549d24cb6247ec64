use slotgen_error::error::CompileError;
use slotgen_types::Span;

use crate::{
    asm_generation::evm::{packing::TOP_BYTE_MULTIPLIER, CompilerContext, EvmInstruction},
    type_system::{TypeEngine, TypeId},
};

use super::LValue;

/// One byte of a short byte array kept inside a single storage word, addressed by the word's
/// slot and the element index. Index 0 is the most significant byte of the word.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageByteArrayElement {
    data_type: TypeId,
}

impl StorageByteArrayElement {
    pub fn new(engine: &TypeEngine) -> Self {
        StorageByteArrayElement {
            data_type: engine.fixed_bytes(1),
        }
    }
}

impl LValue for StorageByteArrayElement {
    fn retrieve_value(
        self,
        ctx: &mut CompilerContext<'_>,
        _span: &Span,
        remove: bool,
    ) -> Result<(), CompileError> {
        // slot index
        if remove {
            ctx.emit(EvmInstruction::Swap(1));
            ctx.emit(EvmInstruction::SLoad);
            ctx.emit(EvmInstruction::Swap(1));
        } else {
            ctx.emit(EvmInstruction::Dup(2));
            ctx.emit(EvmInstruction::SLoad);
            ctx.emit(EvmInstruction::Dup(2));
        }
        ctx.emit(EvmInstruction::Byte);
        ctx.push(TOP_BYTE_MULTIPLIER);
        ctx.emit(EvmInstruction::Mul);
        Ok(())
    }

    fn store_value(
        self,
        ctx: &mut CompilerContext<'_>,
        _source_ty: TypeId,
        _span: &Span,
        move_value: bool,
    ) -> Result<(), CompileError> {
        // value slot index
        ctx.push(31u8);
        ctx.emit(EvmInstruction::Sub);
        ctx.emit_byte_multiplier();
        // value slot multiplier
        ctx.emit(EvmInstruction::Dup(2));
        ctx.emit(EvmInstruction::SLoad);
        ctx.emit(EvmInstruction::Dup(2));
        ctx.emit_clear_bytes(1);
        ctx.emit(EvmInstruction::Swap(1));
        // value slot cleared_word multiplier
        ctx.push(TOP_BYTE_MULTIPLIER);
        ctx.emit(EvmInstruction::Dup(5));
        ctx.emit(EvmInstruction::Div);
        ctx.emit(EvmInstruction::Mul);
        ctx.emit(EvmInstruction::Or);
        // value slot updated_word
        ctx.emit(EvmInstruction::Swap(1));
        ctx.emit(EvmInstruction::SStore);
        if move_value {
            ctx.emit(EvmInstruction::Pop);
        }
        Ok(())
    }

    fn set_to_zero(
        self,
        ctx: &mut CompilerContext<'_>,
        _span: &Span,
        remove_reference: bool,
    ) -> Result<(), CompileError> {
        debug_assert!(remove_reference, "Byte array elements are always cleared by reference.");
        // slot index
        ctx.push(31u8);
        ctx.emit(EvmInstruction::Sub);
        ctx.emit_byte_multiplier();
        ctx.emit(EvmInstruction::Dup(2));
        ctx.emit(EvmInstruction::SLoad);
        // slot multiplier word
        ctx.emit(EvmInstruction::Swap(1));
        ctx.emit_clear_bytes(1);
        ctx.emit(EvmInstruction::Swap(1));
        ctx.emit(EvmInstruction::SStore);
        Ok(())
    }

    fn size_on_stack(&self, engine: &TypeEngine) -> usize {
        engine.size_on_stack(self.data_type)
    }

    fn reference_size(&self) -> usize {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm_generation::evm::{test_vm::*, CodeKind, UtilityRoutines};
    use slotgen_types::U256;

    fn write_byte(index: u8, byte: u8) -> TestVm {
        let engine = TypeEngine::default();
        let mut ctx = CompilerContext::new(&engine, &UtilityRoutines, CodeKind::Runtime);
        ctx.push(U256::from(byte) << 248);
        ctx.push(7u8);
        ctx.push(index);
        StorageByteArrayElement::new(&engine)
            .store_value(&mut ctx, engine.fixed_bytes(1), &Span::dummy(), true)
            .unwrap();
        ctx.push(7u8);
        ctx.push(index);
        StorageByteArrayElement::new(&engine)
            .retrieve_value(&mut ctx, &Span::dummy(), true)
            .unwrap();
        TestVm::run_section(ctx.section())
    }

    #[test]
    fn index_zero_is_the_most_significant_byte() {
        let vm = write_byte(0, 0xab);
        assert_eq!(vm.sload(7u8), U256::from(0xabu8) << 248);
        assert_eq!(vm.stack, vec![U256::from(0xabu8) << 248]);
    }

    #[test]
    fn index_thirty_one_is_the_least_significant_byte() {
        let vm = write_byte(31, 0xcd);
        assert_eq!(vm.sload(7u8), U256::from(0xcdu8));
        assert_eq!(vm.stack, vec![U256::from(0xcdu8) << 248]);
    }

    #[test]
    fn zero_clears_one_byte_and_keeps_the_value_on_store() {
        let engine = TypeEngine::default();
        let mut ctx = CompilerContext::new(&engine, &UtilityRoutines, CodeKind::Runtime);
        ctx.push(1u8);
        ctx.push(2u8);
        StorageByteArrayElement::new(&engine)
            .set_to_zero(&mut ctx, &Span::dummy(), true)
            .unwrap();
        ctx.push(U256::from(0x11u8) << 248);
        ctx.push(1u8);
        ctx.push(3u8);
        StorageByteArrayElement::new(&engine)
            .store_value(&mut ctx, engine.fixed_bytes(1), &Span::dummy(), false)
            .unwrap();
        let mut vm = TestVm::new();
        vm.storage.insert(U256::one(), U256::MAX);
        vm.run(ctx.section().ops());
        let expected = !(U256::from(0xffu8) << (8 * 29)) & !(U256::from(0xeeu8) << (8 * 28));
        assert_eq!(vm.sload(1u8), expected);
        assert_eq!(vm.stack, vec![U256::from(0x11u8) << 248]);
    }
}
