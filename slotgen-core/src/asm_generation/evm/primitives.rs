use slotgen_error::error::CompileError;
use slotgen_types::Span;

use crate::type_system::{DataLocation, TypeEngine, TypeId, TypeInfo};

use super::{packing::low_bytes_mask, CompilerContext, EvmInstruction};

/// Memory address of the permanently zero word used as the empty dynamic memory array.
pub const ZERO_SLOT: u8 = 0x60;

/// Whole-value routines the location values delegate to for arrays, calldata structs and type
/// conversions.
pub trait CompositePrimitives {
    /// `source_ref.. target_ref` → `target_ref`, copying the array `source` into the storage
    /// array `target`.
    fn copy_array_to_storage(
        &self,
        ctx: &mut CompilerContext<'_>,
        target: TypeId,
        source: TypeId,
        span: &Span,
    ) -> Result<(), CompileError>;

    /// `slot byte_offset` → ``, clearing the storage array `ty`.
    fn clear_array(
        &self,
        ctx: &mut CompilerContext<'_>,
        ty: TypeId,
        span: &Span,
    ) -> Result<(), CompileError>;

    /// `source_ref target_ref` → ``, copying a calldata struct into a storage struct.
    fn copy_struct_from_calldata(
        &self,
        ctx: &mut CompilerContext<'_>,
        target: TypeId,
        source: TypeId,
        span: &Span,
    ) -> Result<(), CompileError>;

    /// `value` → `converted`. With `chop_sign_bits` a signed result is masked to its width.
    fn convert_type(
        &self,
        ctx: &mut CompilerContext<'_>,
        source: TypeId,
        target: TypeId,
        cleanup: bool,
        chop_sign_bits: bool,
        span: &Span,
    ) -> Result<(), CompileError>;

    /// `` → `pointer`, a freshly zeroed value of the memory reference type `ty`.
    fn push_zero_reference(
        &self,
        ctx: &mut CompilerContext<'_>,
        ty: TypeId,
        span: &Span,
    ) -> Result<(), CompileError>;
}

/// Composite primitives implemented as calls into shared utility routines, with value type
/// conversions done inline.
#[derive(Clone, Copy, Debug, Default)]
pub struct UtilityRoutines;

impl UtilityRoutines {
    fn routine_name(engine: &TypeEngine, prefix: &str, types: &[TypeId]) -> String {
        let mut name = prefix.to_string();
        for ty in types {
            name.push('_');
            name.extend(engine.display(*ty).chars().map(|c| {
                if c.is_ascii_alphanumeric() {
                    c
                } else {
                    '_'
                }
            }));
        }
        name
    }

    fn call(ctx: &mut CompilerContext<'_>, name: String, inputs: usize, outputs: usize) {
        tracing::debug!(%name, inputs, outputs, "utility routine call");
        ctx.emit(EvmInstruction::CallUtility {
            name,
            inputs,
            outputs,
        });
    }
}

impl CompositePrimitives for UtilityRoutines {
    fn copy_array_to_storage(
        &self,
        ctx: &mut CompilerContext<'_>,
        target: TypeId,
        source: TypeId,
        _span: &Span,
    ) -> Result<(), CompileError> {
        let engine = ctx.engine();
        let name = Self::routine_name(engine, "copy_array_to_storage", &[source, target]);
        Self::call(ctx, name, engine.size_on_stack(source) + 1, 1);
        Ok(())
    }

    fn clear_array(
        &self,
        ctx: &mut CompilerContext<'_>,
        ty: TypeId,
        _span: &Span,
    ) -> Result<(), CompileError> {
        let name = Self::routine_name(ctx.engine(), "clear_storage_array", &[ty]);
        Self::call(ctx, name, 2, 0);
        Ok(())
    }

    fn copy_struct_from_calldata(
        &self,
        ctx: &mut CompilerContext<'_>,
        target: TypeId,
        source: TypeId,
        _span: &Span,
    ) -> Result<(), CompileError> {
        let name = Self::routine_name(ctx.engine(), "update_storage_value", &[source, target]);
        Self::call(ctx, name, 2, 0);
        Ok(())
    }

    fn convert_type(
        &self,
        ctx: &mut CompilerContext<'_>,
        source: TypeId,
        target: TypeId,
        cleanup: bool,
        chop_sign_bits: bool,
        _span: &Span,
    ) -> Result<(), CompileError> {
        let engine = ctx.engine();
        match (engine.is_value_type(source), engine.is_value_type(target)) {
            (true, true) => {
                if cleanup {
                    ctx.cleanup_value(target);
                }
                let encoding = engine.storage_encoding(target);
                if chop_sign_bits && encoding.is_signed() && !encoding.is_full_word() {
                    ctx.push(low_bytes_mask(encoding.bytes));
                    ctx.emit(EvmInstruction::And);
                }
            }
            (false, false) if source == target => (),
            (false, false) => {
                let name = Self::routine_name(engine, "convert", &[source, target]);
                Self::call(
                    ctx,
                    name,
                    engine.size_on_stack(source),
                    engine.size_on_stack(target),
                );
            }
            _ => panic!(
                "Internal compiler error: invalid conversion from `{}` to `{}`.",
                engine.display(source),
                engine.display(target)
            ),
        }
        Ok(())
    }

    fn push_zero_reference(
        &self,
        ctx: &mut CompilerContext<'_>,
        ty: TypeId,
        _span: &Span,
    ) -> Result<(), CompileError> {
        match ctx.engine().get(ty) {
            TypeInfo::Array {
                length: None,
                location: DataLocation::Memory,
                ..
            } => ctx.push(ZERO_SLOT),
            _ => {
                let name = Self::routine_name(ctx.engine(), "allocate_and_zero", &[ty]);
                Self::call(ctx, name, 0, 1);
            }
        }
        Ok(())
    }
}
