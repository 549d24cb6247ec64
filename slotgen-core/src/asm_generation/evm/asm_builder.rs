use etk_asm::ops::AbstractOp;
use slotgen_error::{
    error::CompileError,
    handler::{ErrorEmitted, Handler},
};
use slotgen_types::Span;

use crate::{build_config::BuildConfig, type_system::TypeEngine};

use super::{CodeKind, CompilerContext, CompositePrimitives, EvmAsmSection, Lowering};

/// Collects the sections of every successfully compiled unit.
///
/// A unit is the code for one statement or expression that accesses location values. A unit
/// that fails is reported to the [Handler] and dropped, and compilation continues with the next
/// one, so a single "stack too deep" does not hide the errors of the rest of the program.
pub struct EvmAsmBuilder<'eng> {
    config: BuildConfig,
    engine: &'eng TypeEngine,
    primitives: &'eng dyn CompositePrimitives,
    units: Vec<CompiledUnit>,
}

struct CompiledUnit {
    code_kind: CodeKind,
    span: Span,
    section: EvmAsmSection,
}

impl<'eng> EvmAsmBuilder<'eng> {
    pub fn new(
        config: BuildConfig,
        engine: &'eng TypeEngine,
        primitives: &'eng dyn CompositePrimitives,
    ) -> Self {
        Self {
            config,
            engine,
            primitives,
            units: Vec::new(),
        }
    }

    /// Diagnostics raised after the unit is compiled, during lowering, point at `span`.
    pub fn compile_unit(
        &mut self,
        handler: &Handler,
        code_kind: CodeKind,
        span: &Span,
        f: impl FnOnce(&mut CompilerContext<'eng>) -> Result<(), CompileError>,
    ) -> Result<(), ErrorEmitted> {
        let mut ctx = CompilerContext::new(self.engine, self.primitives, code_kind);
        if let Err(err) = f(&mut ctx) {
            tracing::debug!(error = %err, "dropping unit");
            return Err(handler.emit_err(err));
        }
        let section = ctx.into_section();
        if self.config.print_intermediate_asm {
            tracing::info!("unit {} ({code_kind:?}):\n{section}", self.units.len());
        }
        self.units.push(CompiledUnit {
            code_kind,
            span: span.clone(),
            section,
        });
        Ok(())
    }

    pub fn sections(&self) -> impl Iterator<Item = &EvmAsmSection> {
        self.units.iter().map(|unit| &unit.section)
    }

    /// Lowers the sections of `code_kind` in compilation order.
    pub fn finalize(&self, code_kind: CodeKind) -> Result<Vec<AbstractOp>, CompileError> {
        let mut lowering = Lowering::new();
        let mut ops = Vec::new();
        for unit in self.units.iter().filter(|unit| unit.code_kind == code_kind) {
            ops.extend(lowering.lower_section(&unit.section, &unit.span)?);
        }
        if self.config.print_finalized_asm {
            let listing = ops
                .iter()
                .map(|op| format!("    {op:?}"))
                .collect::<Vec<_>>()
                .join("\n");
            tracing::info!("{code_kind:?} code:\n{listing}");
        }
        Ok(ops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm_generation::evm::{EvmInstruction, UtilityRoutines};

    #[test]
    fn failing_units_are_dropped() {
        let engine = TypeEngine::default();
        let handler = Handler::default();
        let mut builder = EvmAsmBuilder::new(BuildConfig::default(), &engine, &UtilityRoutines);
        builder
            .compile_unit(&handler, CodeKind::Runtime, &Span::dummy(), |ctx| {
                ctx.push(1u8);
                ctx.emit(EvmInstruction::Pop);
                Ok(())
            })
            .unwrap();
        let result = builder.compile_unit(&handler, CodeKind::Runtime, &Span::dummy(), |ctx| {
            ctx.push(1u8);
            ctx.dup(17, &Span::dummy())
        });
        assert!(result.is_err());
        builder
            .compile_unit(&handler, CodeKind::Creation, &Span::dummy(), |ctx| {
                ctx.push(2u8);
                ctx.emit(EvmInstruction::Pop);
                Ok(())
            })
            .unwrap();
        assert_eq!(handler.error_count(), 1);
        assert_eq!(builder.sections().count(), 2);
        assert_eq!(builder.finalize(CodeKind::Runtime).unwrap().len(), 2);
        assert_eq!(builder.finalize(CodeKind::Creation).unwrap().len(), 2);
    }
}
