use slotgen_error::error::CompileError;
use slotgen_types::Span;

use crate::{
    asm_generation::evm::{CodeKind, CompilerContext, EvmInstruction, Symbol},
    language::VariableDeclaration,
    type_system::{TypeEngine, TypeId},
};

use super::LValue;

/// An immutable variable. Creation code reads and writes the memory cell bound to it; runtime
/// code reads placeholders the linker replaces with the final value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImmutableItem {
    variable: VariableDeclaration,
}

impl ImmutableItem {
    pub fn new(variable: &VariableDeclaration) -> Self {
        debug_assert!(variable.is_immutable(), "`{}` is not immutable.", variable.name);
        ImmutableItem {
            variable: variable.clone(),
        }
    }

    fn data_type(&self) -> TypeId {
        self.variable.ty
    }

    fn reject_reference_type(
        &self,
        ctx: &CompilerContext<'_>,
        span: &Span,
    ) -> Result<(), CompileError> {
        if !ctx.engine().is_value_type(self.data_type()) {
            return Err(CompileError::Unimplemented(
                "Immutable variables of reference type are not supported yet.",
                span.clone(),
            ));
        }
        Ok(())
    }

    fn push_memory_offset(&self, ctx: &mut CompilerContext<'_>) {
        debug_assert_eq!(
            ctx.code_kind(),
            CodeKind::Creation,
            "Immutables can only be written by creation code."
        );
        let Some(offset) = ctx.immutable_memory_offset(self.variable.id) else {
            panic!(
                "Internal compiler error: immutable `{}` has no memory cell.",
                self.variable.name
            );
        };
        ctx.push(offset);
    }
}

impl LValue for ImmutableItem {
    fn retrieve_value(
        self,
        ctx: &mut CompilerContext<'_>,
        span: &Span,
        _remove: bool,
    ) -> Result<(), CompileError> {
        self.reject_reference_type(ctx, span)?;
        match ctx.code_kind() {
            CodeKind::Creation => {
                self.push_memory_offset(ctx);
                ctx.load_from_memory_dynamic(self.data_type(), true);
            }
            CodeKind::Runtime => {
                for name in ctx.immutable_slot_names(&self.variable) {
                    ctx.emit(EvmInstruction::PushSymbol(Symbol::Immutable(name)));
                }
            }
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
        self.reject_reference_type(ctx, span)?;
        debug_assert!(ctx.engine().is_value_type(source_ty), "Value type expected.");
        let size = ctx.engine().size_on_stack(self.data_type());
        ctx.convert_type(source_ty, self.data_type(), true, false, span)?;
        self.push_memory_offset(ctx);
        if move_value {
            ctx.move_into_stack(size, 1, span)?;
        } else {
            ctx.copy_to_stack_top(size + 1, size, span)?;
        }
        // [value] offset value
        ctx.store_in_memory_dynamic(self.data_type(), true, span)?;
        ctx.emit(EvmInstruction::Pop);
        Ok(())
    }

    fn set_to_zero(
        self,
        ctx: &mut CompilerContext<'_>,
        span: &Span,
        _remove_reference: bool,
    ) -> Result<(), CompileError> {
        self.reject_reference_type(ctx, span)?;
        self.push_memory_offset(ctx);
        ctx.push_zero_value(self.data_type(), span)?;
        ctx.store_in_memory_dynamic(self.data_type(), true, span)?;
        ctx.emit(EvmInstruction::Pop);
        Ok(())
    }

    fn size_on_stack(&self, engine: &TypeEngine) -> usize {
        engine.size_on_stack(self.data_type())
    }

    fn reference_size(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        asm_generation::evm::{test_vm::*, UtilityRoutines},
        language::{Mutability, VariableId, VariableLocation},
        type_system::{DataLocation, FunctionKind, TypeInfo},
    };
    use pretty_assertions::assert_eq;
    use slotgen_types::U256;

    fn immutable(id: usize, ty: TypeId) -> VariableDeclaration {
        VariableDeclaration {
            id: VariableId::new(id),
            name: format!("i{id}"),
            ty,
            mutability: Mutability::Immutable,
            location: VariableLocation::Stack,
            span: Span::dummy(),
        }
    }

    #[test]
    fn creation_code_uses_the_memory_cell() {
        let engine = TypeEngine::default();
        let decl = immutable(4, engine.uint(64));
        let mut ctx = CompilerContext::new(&engine, &UtilityRoutines, CodeKind::Creation);
        ctx.add_immutable(decl.id, 0x80);
        ctx.push(U256::MAX);
        ImmutableItem::new(&decl)
            .store_value(&mut ctx, engine.uint(256), &Span::dummy(), false)
            .unwrap();
        ImmutableItem::new(&decl)
            .retrieve_value(&mut ctx, &Span::dummy(), true)
            .unwrap();
        let vm = TestVm::run_section(ctx.section());
        let truncated = U256::from(u64::MAX);
        assert_eq!(vm.mload(0x80), truncated);
        assert_eq!(vm.stack, vec![truncated, truncated]);
    }

    #[test]
    fn zero_writes_the_memory_cell() {
        let engine = TypeEngine::default();
        let decl = immutable(4, engine.bool());
        let mut ctx = CompilerContext::new(&engine, &UtilityRoutines, CodeKind::Creation);
        ctx.add_immutable(decl.id, 0x20);
        ImmutableItem::new(&decl)
            .set_to_zero(&mut ctx, &Span::dummy(), true)
            .unwrap();
        let mut vm = TestVm::new();
        vm.mstore(0x20, U256::one());
        vm.run(ctx.section().ops());
        assert_eq!(vm.mload(0x20), U256::zero());
        assert!(vm.stack.is_empty());
    }

    #[test]
    fn runtime_code_reads_one_placeholder_per_slot() {
        let engine = TypeEngine::default();
        let external = engine.insert(TypeInfo::Function {
            kind: FunctionKind::External,
        });
        let single = immutable(2, engine.uint(8));
        let double = immutable(3, external);
        let mut ctx = CompilerContext::new(&engine, &UtilityRoutines, CodeKind::Runtime);
        ImmutableItem::new(&single)
            .retrieve_value(&mut ctx, &Span::dummy(), true)
            .unwrap();
        ImmutableItem::new(&double)
            .retrieve_value(&mut ctx, &Span::dummy(), true)
            .unwrap();
        assert_eq!(
            ctx.section().ops(),
            &[
                EvmInstruction::PushSymbol(Symbol::Immutable("2".into())),
                EvmInstruction::PushSymbol(Symbol::Immutable("3_0".into())),
                EvmInstruction::PushSymbol(Symbol::Immutable("3_1".into())),
            ]
        );
    }

    #[test]
    fn reference_typed_immutables_are_unimplemented() {
        let engine = TypeEngine::default();
        let array = engine.insert(TypeInfo::Array {
            element: engine.uint(8),
            length: None,
            location: DataLocation::Memory,
        });
        let decl = immutable(1, array);
        let mut ctx = CompilerContext::new(&engine, &UtilityRoutines, CodeKind::Runtime);
        let err = ImmutableItem::new(&decl)
            .retrieve_value(&mut ctx, &Span::dummy(), true)
            .unwrap_err();
        assert!(matches!(err, CompileError::Unimplemented(..)));
        assert!(ctx.section().is_empty());
    }
}
