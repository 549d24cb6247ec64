use slotgen_error::error::CompileError;
use slotgen_types::Span;

use crate::{
    asm_generation::evm::{CompilerContext, EvmInstruction},
    language::VariableDeclaration,
    type_system::{TypeEngine, TypeId},
};

use super::LValue;

/// A local variable living on the operand stack, addressed by its distance from the top.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackVariable {
    data_type: TypeId,
    base_stack_offset: usize,
    size: usize,
}

impl StackVariable {
    pub fn new(ctx: &CompilerContext<'_>, decl: &VariableDeclaration) -> Self {
        let Some(base_stack_offset) = ctx.base_stack_offset_of_variable(decl.id) else {
            panic!(
                "Internal compiler error: variable `{}` is not on the stack.",
                decl.name
            );
        };
        tracing::debug!(variable = %decl.name, base_stack_offset, "stack variable");
        StackVariable {
            data_type: decl.ty,
            base_stack_offset,
            size: ctx.engine().size_on_stack(decl.ty),
        }
    }
}

impl LValue for StackVariable {
    fn retrieve_value(
        self,
        ctx: &mut CompilerContext<'_>,
        span: &Span,
        _remove: bool,
    ) -> Result<(), CompileError> {
        let stack_pos = ctx.base_to_current_stack_offset(self.base_stack_offset);
        debug_assert!(stack_pos + 1 >= self.size, "Size and stack pos mismatch.");
        ctx.copy_to_stack_top(stack_pos + 1, self.size, span)
    }

    fn store_value(
        self,
        ctx: &mut CompilerContext<'_>,
        _source_ty: TypeId,
        span: &Span,
        move_value: bool,
    ) -> Result<(), CompileError> {
        // value sits on top, the variable `stack_diff` slots below it
        let stack_diff = ctx.base_to_current_stack_offset(self.base_stack_offset) + 1 - self.size;
        if stack_diff > 0 {
            for _ in 0..self.size {
                ctx.swap(stack_diff, span)?;
                ctx.emit(EvmInstruction::Pop);
            }
        }
        if !move_value {
            self.retrieve_value(ctx, span, true)?;
        }
        Ok(())
    }

    fn set_to_zero(
        self,
        ctx: &mut CompilerContext<'_>,
        span: &Span,
        _remove_reference: bool,
    ) -> Result<(), CompileError> {
        ctx.push_zero_value(self.data_type, span)?;
        let data_type = self.data_type;
        self.store_value(ctx, data_type, span, true)
    }

    fn size_on_stack(&self, _engine: &TypeEngine) -> usize {
        self.size
    }

    fn reference_size(&self) -> usize {
        0
    }
}
