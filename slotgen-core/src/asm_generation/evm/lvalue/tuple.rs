use slotgen_error::error::CompileError;
use slotgen_types::Span;

use crate::{
    asm_generation::evm::CompilerContext,
    type_system::{TypeEngine, TypeId, TypeInfo},
};

use super::{LValue, LocationValue};

/// The destination of a tuple assignment. `None` components discard the matching source value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TupleObject {
    components: Vec<Option<LocationValue>>,
}

impl TupleObject {
    pub fn new(components: Vec<Option<LocationValue>>) -> Self {
        TupleObject { components }
    }
}

impl LValue for TupleObject {
    fn retrieve_value(
        self,
        _ctx: &mut CompilerContext<'_>,
        _span: &Span,
        _remove: bool,
    ) -> Result<(), CompileError> {
        panic!("Internal compiler error: tried to retrieve the value of a tuple destination.");
    }

    /// The source components sit below the addressing operands of every present destination.
    /// Components are assigned right to left so the operands still needed stay in place.
    fn store_value(
        self,
        ctx: &mut CompilerContext<'_>,
        source_ty: TypeId,
        span: &Span,
        _move_value: bool,
    ) -> Result<(), CompileError> {
        let engine = ctx.engine();
        let TypeInfo::Tuple(value_types) = engine.get(source_ty) else {
            panic!(
                "Internal compiler error: tuple assigned from `{}`.",
                engine.display(source_ty)
            );
        };
        assert_eq!(
            value_types.len(),
            self.components.len(),
            "Internal compiler error: tuple arity mismatch."
        );
        let mut value_pos = self.reference_size() as isize;
        for (lvalue, value_ty) in self.components.into_iter().zip(value_types).rev() {
            let value_size = engine.size_on_stack(value_ty);
            value_pos += value_size as isize;
            let Some(lvalue) = lvalue else {
                continue;
            };
            let stack_height = ctx.stack_height() as isize;
            let reference_size = lvalue.reference_size();
            ctx.copy_to_stack_top(value_pos as usize, value_size, span)?;
            ctx.move_to_stack_top(value_size, reference_size, span)?;
            lvalue.store_value(ctx, value_ty, span, true)?;
            value_pos += ctx.stack_height() as isize - stack_height;
        }
        // the value of a tuple assignment is empty
        ctx.pop_stack_element(source_ty);
        Ok(())
    }

    fn set_to_zero(
        self,
        _ctx: &mut CompilerContext<'_>,
        _span: &Span,
        _remove_reference: bool,
    ) -> Result<(), CompileError> {
        panic!("Internal compiler error: tried to delete a tuple destination.");
    }

    fn size_on_stack(&self, engine: &TypeEngine) -> usize {
        self.components
            .iter()
            .flatten()
            .map(|lvalue| lvalue.size_on_stack(engine))
            .sum()
    }

    fn reference_size(&self) -> usize {
        self.components
            .iter()
            .flatten()
            .map(LValue::reference_size)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        asm_generation::evm::{
            lvalue::{StackVariable, StorageItem},
            test_vm::*,
            CodeKind, EvmInstruction, UtilityRoutines,
        },
        language::{Mutability, VariableDeclaration, VariableId, VariableLocation},
    };
    use pretty_assertions::assert_eq;
    use slotgen_types::U256;

    #[test]
    fn discarded_components_emit_no_write() {
        let engine = TypeEngine::default();
        let uint = engine.uint(256);
        let pair = engine.insert(TypeInfo::Tuple(vec![uint, uint]));
        let mut ctx = CompilerContext::new(&engine, &UtilityRoutines, CodeKind::Runtime);
        // (_, b) = (x, y) with b in storage slot 5
        ctx.push(0x0au8);
        ctx.push(0x0bu8);
        ctx.push(5u8);
        ctx.push(0u8);
        let destination = TupleObject::new(vec![
            None,
            Some(StorageItem::persistent(&engine, uint).into()),
        ]);
        destination
            .store_value(&mut ctx, pair, &Span::dummy(), true)
            .unwrap();
        let vm = TestVm::run_section(ctx.section());
        assert!(vm.stack.is_empty());
        assert_eq!(vm.storage_writes, vec![U256::from(5u8)]);
        assert_eq!(vm.sload(5u8), U256::from(0x0bu8));
        assert_eq!(ctx.stack_height(), 0);
    }

    #[test]
    fn components_are_assigned_to_their_own_destinations() {
        let engine = TypeEngine::default();
        let uint8 = engine.uint(8);
        let uint = engine.uint(256);
        let triple = engine.insert(TypeInfo::Tuple(vec![uint, uint8, uint]));
        let local = VariableDeclaration {
            id: VariableId::new(0),
            name: "a".into(),
            ty: uint,
            mutability: Mutability::Mutable,
            location: VariableLocation::Stack,
            span: Span::dummy(),
        };
        let mut ctx = CompilerContext::new(&engine, &UtilityRoutines, CodeKind::Runtime);
        ctx.push(0u8);
        ctx.add_local_variable(local.id, 1);
        // (a, s.x, s.y) = (1, 2, 3) with s.x at (9, 4) and s.y at slot 10
        ctx.push(1u8);
        ctx.push(2u8);
        ctx.push(3u8);
        let stack_variable = StackVariable::new(&ctx, &local);
        ctx.push(9u8);
        ctx.push(4u8);
        ctx.push(10u8);
        ctx.push(0u8);
        let destination = TupleObject::new(vec![
            Some(stack_variable.into()),
            Some(StorageItem::persistent(&engine, uint8).into()),
            Some(StorageItem::persistent(&engine, uint).into()),
        ]);
        assert_eq!(destination.reference_size(), 4);
        destination
            .store_value(&mut ctx, triple, &Span::dummy(), true)
            .unwrap();
        assert_eq!(ctx.stack_height(), 1);
        assert!(!ctx
            .section()
            .ops()
            .iter()
            .any(|op| matches!(op, EvmInstruction::Swap(n) if *n > 16)));
        let vm = TestVm::run_section(ctx.section());
        assert_eq!(vm.stack, vec![U256::one()]);
        assert_eq!(vm.sload(9u8), U256::from(2u8) << 32);
        assert_eq!(vm.sload(10u8), U256::from(3u8));
        assert_eq!(vm.storage_writes, vec![U256::from(10u8), U256::from(9u8)]);
    }

    #[test]
    #[should_panic(expected = "retrieve the value of a tuple")]
    fn tuples_cannot_be_read() {
        let engine = TypeEngine::default();
        let mut ctx = CompilerContext::new(&engine, &UtilityRoutines, CodeKind::Runtime);
        let _ = TupleObject::new(vec![None]).retrieve_value(&mut ctx, &Span::dummy(), true);
    }
}
