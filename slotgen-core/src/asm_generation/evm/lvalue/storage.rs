use slotgen_error::error::CompileError;
use slotgen_types::{Span, U256};

use crate::{
    asm_generation::evm::{CompilerContext, EvmInstruction},
    language::{VariableDeclaration, VariableLocation},
    type_system::{DataLocation, TypeEngine, TypeId, TypeInfo},
};

use super::{LValue, MemoryItem};

/// The storage address space a [StorageItem] reads and writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageKind {
    Persistent,
    /// Same addressing and encoding as persistent storage, cleared after every transaction.
    /// Only value types can live here.
    Transient,
}

impl StorageKind {
    fn load(self) -> EvmInstruction {
        match self {
            StorageKind::Persistent => EvmInstruction::SLoad,
            StorageKind::Transient => EvmInstruction::TLoad,
        }
    }

    fn store(self) -> EvmInstruction {
        match self {
            StorageKind::Persistent => EvmInstruction::SStore,
            StorageKind::Transient => EvmInstruction::TStore,
        }
    }
}

/// A value in storage, addressed by its slot and the byte offset within that slot.
///
/// Value types narrower than a word share their slot with neighbours and are read and written
/// through the packing codec. Arrays and structs are addressed by their first slot and copied
/// or cleared as a whole.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageItem {
    data_type: TypeId,
    kind: StorageKind,
}

impl StorageItem {
    /// Assumes the storage reference is already on the stack.
    pub fn new(engine: &TypeEngine, data_type: TypeId, kind: StorageKind) -> Self {
        debug_assert!(
            !engine.is_value_type(data_type) || engine.storage_size(data_type) == 1,
            "Invalid storage size."
        );
        StorageItem { data_type, kind }
    }

    pub fn persistent(engine: &TypeEngine, data_type: TypeId) -> Self {
        Self::new(engine, data_type, StorageKind::Persistent)
    }

    /// Pushes the slot and byte offset of a state variable and addresses it.
    pub fn for_state_variable(ctx: &mut CompilerContext<'_>, decl: &VariableDeclaration) -> Self {
        let Some((slot, byte_offset)) = ctx.storage_location_of_variable(decl.id) else {
            panic!(
                "Internal compiler error: `{}` has no storage location.",
                decl.name
            );
        };
        let kind = match decl.location {
            VariableLocation::Transient => StorageKind::Transient,
            VariableLocation::Storage => StorageKind::Persistent,
            VariableLocation::Stack => panic!(
                "Internal compiler error: `{}` is not a state variable.",
                decl.name
            ),
        };
        tracing::debug!(variable = %decl.name, %slot, byte_offset, ?kind, "storage item");
        ctx.push(slot);
        ctx.push(byte_offset);
        Self::new(ctx.engine(), decl.ty, kind)
    }

    pub fn kind(&self) -> StorageKind {
        self.kind
    }

    fn reject_transient_reference(&self, span: &Span) -> Result<(), CompileError> {
        if self.kind == StorageKind::Transient {
            return Err(CompileError::UnimplementedWithHelp(
                "Transient storage reference types are not supported yet.",
                "keep arrays and structs in persistent storage",
                span.clone(),
            ));
        }
        Ok(())
    }

    // slot byte_offset
    fn push_member_reference(ctx: &mut CompilerContext<'_>, slot: U256, byte: u8) {
        ctx.push(slot);
        ctx.emit(EvmInstruction::Dup(3));
        ctx.emit(EvmInstruction::Add);
        ctx.push(byte);
    }

    fn store_struct(
        self,
        ctx: &mut CompilerContext<'_>,
        source_ty: TypeId,
        span: &Span,
        move_value: bool,
    ) -> Result<(), CompileError> {
        let engine = ctx.engine();
        // source_ref target_ref target_offset
        ctx.emit(EvmInstruction::Pop);
        if !engine.same_struct(self.data_type, source_ty) {
            panic!(
                "Internal compiler error: struct assignment from `{}` to `{}` with conversion.",
                engine.display(source_ty),
                engine.display(self.data_type)
            );
        }
        let source_location = engine.get(source_ty).location();
        if source_location == Some(DataLocation::CallData) {
            ctx.emit(EvmInstruction::Dup(2));
            ctx.emit(EvmInstruction::Dup(2));
            let primitives = ctx.primitives();
            primitives.copy_struct_from_calldata(ctx, self.data_type, source_ty, span)?;
        } else {
            let members = engine.struct_members(self.data_type);
            let source_members = engine.struct_members(source_ty);
            for (member, source_member) in members.iter().zip(source_members.iter()) {
                if engine.get(member.ty).is_mapping() {
                    continue;
                }
                // source_ref target_ref
                match (source_location, source_member.memory_offset) {
                    (Some(DataLocation::Storage), _) => {
                        Self::push_member_reference(
                            ctx,
                            source_member.storage_slot(),
                            source_member.storage.byte,
                        );
                        StorageItem::persistent(engine, source_member.ty)
                            .retrieve_value(ctx, span, true)?;
                    }
                    (Some(DataLocation::Memory), Some(offset)) => {
                        ctx.push(offset);
                        ctx.emit(EvmInstruction::Dup(3));
                        ctx.emit(EvmInstruction::Add);
                        MemoryItem::padded(source_member.ty).retrieve_value(ctx, span, true)?;
                    }
                    _ => panic!(
                        "Internal compiler error: cannot copy member `{}` from `{}`.",
                        member.name,
                        engine.display(source_ty)
                    ),
                }
                // source_ref target_ref source_value..
                let stack_size = engine.size_on_stack(source_member.ty);
                ctx.dup(1 + stack_size, span)?;
                ctx.push(member.storage_slot());
                ctx.emit(EvmInstruction::Add);
                ctx.push(member.storage.byte);
                // source_ref target_ref source_value.. target_member_ref target_member_offset
                StorageItem::persistent(engine, member.ty).store_value(
                    ctx,
                    source_member.ty,
                    span,
                    true,
                )?;
            }
        }
        // source_ref target_ref
        if move_value {
            ctx.pop_stack_slots(2);
        } else {
            ctx.emit(EvmInstruction::Swap(1));
            ctx.emit(EvmInstruction::Pop);
        }
        Ok(())
    }
}

impl LValue for StorageItem {
    fn retrieve_value(
        self,
        ctx: &mut CompilerContext<'_>,
        span: &Span,
        remove: bool,
    ) -> Result<(), CompileError> {
        let engine = ctx.engine();
        // slot byte_offset
        if !engine.is_value_type(self.data_type) {
            self.reject_transient_reference(span)?;
            if remove {
                ctx.emit(EvmInstruction::Pop);
            } else {
                ctx.emit(EvmInstruction::Dup(2));
            }
            return Ok(());
        }
        if !remove {
            ctx.copy_to_stack_top(2, 2, span)?;
        }
        let encoding = engine.storage_encoding(self.data_type);
        if encoding.is_full_word() {
            ctx.emit(EvmInstruction::Pop);
            ctx.emit(self.kind.load());
        } else {
            ctx.emit(EvmInstruction::Swap(1));
            ctx.emit(self.kind.load());
            ctx.emit(EvmInstruction::Swap(1));
            ctx.emit_byte_multiplier();
            // word multiplier
            ctx.emit(EvmInstruction::Swap(1));
            ctx.emit(EvmInstruction::Div);
            ctx.emit_packed_read_fixup(&encoding, span)?;
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
        // value.. slot byte_offset
        if !engine.is_value_type(self.data_type) {
            self.reject_transient_reference(span)?;
            return match engine.get(self.data_type) {
                TypeInfo::Array { .. } => {
                    debug_assert!(
                        matches!(engine.get(source_ty), TypeInfo::Array { .. }),
                        "Wrong type conversion for assignment."
                    );
                    ctx.emit(EvmInstruction::Pop);
                    let primitives = ctx.primitives();
                    primitives.copy_array_to_storage(ctx, self.data_type, source_ty, span)?;
                    if move_value {
                        ctx.emit(EvmInstruction::Pop);
                    }
                    Ok(())
                }
                TypeInfo::Struct { .. } => self.store_struct(ctx, source_ty, span, move_value),
                _ => panic!(
                    "Internal compiler error: invalid non-value type `{}` for assignment.",
                    engine.display(self.data_type)
                ),
            };
        }

        let encoding = engine.storage_encoding(self.data_type);
        if encoding.is_full_word() {
            debug_assert_eq!(engine.size_on_stack(self.data_type), 1, "Invalid stack size.");
            ctx.emit(EvmInstruction::Pop);
            if !move_value {
                ctx.emit(EvmInstruction::Dup(2));
                ctx.emit(EvmInstruction::Swap(1));
            }
            ctx.emit(EvmInstruction::Swap(1));
            ctx.convert_type(source_ty, self.data_type, true, false, span)?;
            ctx.emit(EvmInstruction::Swap(1));
            ctx.emit(self.kind.store());
        } else {
            let size = engine.size_on_stack(self.data_type);
            ctx.emit_byte_multiplier();
            // value slot multiplier
            ctx.emit(EvmInstruction::Dup(2));
            ctx.emit(self.kind.load());
            ctx.emit(EvmInstruction::Dup(2));
            ctx.emit_clear_bytes(encoding.bytes);
            ctx.emit(EvmInstruction::Swap(1));
            // value slot cleared_word multiplier
            ctx.copy_to_stack_top(3 + size, size, span)?;
            ctx.emit_packed_write_fixup(source_ty, self.data_type, span)?;
            ctx.emit(EvmInstruction::Mul);
            ctx.emit(EvmInstruction::Or);
            // value slot updated_word
            ctx.emit(EvmInstruction::Swap(1));
            ctx.emit(self.kind.store());
            if move_value {
                ctx.pop_stack_element(self.data_type);
            }
        }
        Ok(())
    }

    fn set_to_zero(
        self,
        ctx: &mut CompilerContext<'_>,
        span: &Span,
        remove_reference: bool,
    ) -> Result<(), CompileError> {
        let engine = ctx.engine();
        // slot byte_offset
        match engine.get(self.data_type) {
            TypeInfo::Array { .. } => {
                self.reject_transient_reference(span)?;
                if !remove_reference {
                    ctx.copy_to_stack_top(2, 2, span)?;
                }
                let primitives = ctx.primitives();
                primitives.clear_array(ctx, self.data_type, span)?;
            }
            TypeInfo::Struct { .. } => {
                self.reject_transient_reference(span)?;
                for member in engine.struct_members(self.data_type) {
                    if engine.get(member.ty).is_mapping() {
                        continue;
                    }
                    Self::push_member_reference(ctx, member.storage_slot(), member.storage.byte);
                    StorageItem::persistent(engine, member.ty).set_to_zero(ctx, span, true)?;
                }
                if remove_reference {
                    ctx.pop_stack_slots(2);
                }
            }
            TypeInfo::Mapping { .. } => panic!(
                "Internal compiler error: cannot delete mapping `{}`.",
                engine.display(self.data_type)
            ),
            info => {
                debug_assert!(
                    info.is_value_type(),
                    "Clearing of unsupported type `{}` requested.",
                    engine.display(self.data_type)
                );
                if !remove_reference {
                    ctx.copy_to_stack_top(2, 2, span)?;
                }
                let encoding = engine.storage_encoding(self.data_type);
                if encoding.is_full_word() {
                    ctx.emit(EvmInstruction::Pop);
                    ctx.push(0u8);
                    ctx.emit(EvmInstruction::Swap(1));
                    ctx.emit(self.kind.store());
                } else {
                    ctx.emit_byte_multiplier();
                    ctx.emit(EvmInstruction::Dup(2));
                    ctx.emit(self.kind.load());
                    // slot multiplier word
                    ctx.emit(EvmInstruction::Swap(1));
                    ctx.emit_clear_bytes(encoding.bytes);
                    ctx.emit(EvmInstruction::Swap(1));
                    ctx.emit(self.kind.store());
                }
            }
        }
        Ok(())
    }

    fn size_on_stack(&self, engine: &TypeEngine) -> usize {
        engine.size_on_stack(self.data_type)
    }

    fn reference_size(&self) -> usize {
        2
    }
}
