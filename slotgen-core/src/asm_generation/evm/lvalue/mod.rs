//! Location values: the places a value can be read from, written to or cleared.
//!
//! A location value is created for one access site, right after the expression compiler has
//! pushed its addressing operands, and is consumed by exactly one access.

mod byte_array;
mod immutable;
mod memory;
mod stack;
mod storage;
mod tuple;

pub use byte_array::StorageByteArrayElement;
pub use immutable::ImmutableItem;
pub use memory::MemoryItem;
pub use stack::StackVariable;
pub use storage::{StorageItem, StorageKind};
pub use tuple::TupleObject;

use slotgen_error::error::CompileError;
use slotgen_types::Span;

use crate::type_system::{TypeEngine, TypeId};

use super::CompilerContext;

/// The operations every location value supports.
///
/// Stack comments in the implementations list the operand stack bottom to top, starting with
/// the slots the operation consumes.
pub trait LValue {
    /// Pushes the value stored at this location. With `remove` the addressing operands are
    /// consumed, otherwise they stay below the value.
    fn retrieve_value(
        self,
        ctx: &mut CompilerContext<'_>,
        span: &Span,
        remove: bool,
    ) -> Result<(), CompileError>;

    /// Writes the value of type `source_ty` found above the addressing operands. Without
    /// `move_value` a copy of the written value is left on the stack.
    fn store_value(
        self,
        ctx: &mut CompilerContext<'_>,
        source_ty: TypeId,
        span: &Span,
        move_value: bool,
    ) -> Result<(), CompileError>;

    /// Writes the zero value of the location's type. With `remove_reference` the addressing
    /// operands are consumed.
    fn set_to_zero(
        self,
        ctx: &mut CompilerContext<'_>,
        span: &Span,
        remove_reference: bool,
    ) -> Result<(), CompileError>;

    /// Stack slots taken by the value.
    fn size_on_stack(&self, engine: &TypeEngine) -> usize;

    /// Stack slots taken by the addressing operands.
    fn reference_size(&self) -> usize;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LocationValue {
    Stack(StackVariable),
    Memory(MemoryItem),
    Storage(StorageItem),
    Immutable(ImmutableItem),
    ByteArrayElement(StorageByteArrayElement),
    Tuple(TupleObject),
}

impl LocationValue {
    fn kind_str(&self) -> &'static str {
        match self {
            LocationValue::Stack(_) => "stack",
            LocationValue::Memory(_) => "memory",
            LocationValue::Storage(item) => match item.kind() {
                StorageKind::Persistent => "storage",
                StorageKind::Transient => "transient",
            },
            LocationValue::Immutable(_) => "immutable",
            LocationValue::ByteArrayElement(_) => "byte array element",
            LocationValue::Tuple(_) => "tuple",
        }
    }
}

impl LValue for LocationValue {
    fn retrieve_value(
        self,
        ctx: &mut CompilerContext<'_>,
        span: &Span,
        remove: bool,
    ) -> Result<(), CompileError> {
        tracing::debug!(location = self.kind_str(), remove, "retrieve value");
        match self {
            LocationValue::Stack(lv) => lv.retrieve_value(ctx, span, remove),
            LocationValue::Memory(lv) => lv.retrieve_value(ctx, span, remove),
            LocationValue::Storage(lv) => lv.retrieve_value(ctx, span, remove),
            LocationValue::Immutable(lv) => lv.retrieve_value(ctx, span, remove),
            LocationValue::ByteArrayElement(lv) => lv.retrieve_value(ctx, span, remove),
            LocationValue::Tuple(lv) => lv.retrieve_value(ctx, span, remove),
        }
    }

    fn store_value(
        self,
        ctx: &mut CompilerContext<'_>,
        source_ty: TypeId,
        span: &Span,
        move_value: bool,
    ) -> Result<(), CompileError> {
        tracing::debug!(
            location = self.kind_str(),
            source = %ctx.engine().display(source_ty),
            move_value,
            "store value"
        );
        match self {
            LocationValue::Stack(lv) => lv.store_value(ctx, source_ty, span, move_value),
            LocationValue::Memory(lv) => lv.store_value(ctx, source_ty, span, move_value),
            LocationValue::Storage(lv) => lv.store_value(ctx, source_ty, span, move_value),
            LocationValue::Immutable(lv) => lv.store_value(ctx, source_ty, span, move_value),
            LocationValue::ByteArrayElement(lv) => {
                lv.store_value(ctx, source_ty, span, move_value)
            }
            LocationValue::Tuple(lv) => lv.store_value(ctx, source_ty, span, move_value),
        }
    }

    fn set_to_zero(
        self,
        ctx: &mut CompilerContext<'_>,
        span: &Span,
        remove_reference: bool,
    ) -> Result<(), CompileError> {
        tracing::debug!(location = self.kind_str(), remove_reference, "set to zero");
        match self {
            LocationValue::Stack(lv) => lv.set_to_zero(ctx, span, remove_reference),
            LocationValue::Memory(lv) => lv.set_to_zero(ctx, span, remove_reference),
            LocationValue::Storage(lv) => lv.set_to_zero(ctx, span, remove_reference),
            LocationValue::Immutable(lv) => lv.set_to_zero(ctx, span, remove_reference),
            LocationValue::ByteArrayElement(lv) => lv.set_to_zero(ctx, span, remove_reference),
            LocationValue::Tuple(lv) => lv.set_to_zero(ctx, span, remove_reference),
        }
    }

    fn size_on_stack(&self, engine: &TypeEngine) -> usize {
        match self {
            LocationValue::Stack(lv) => lv.size_on_stack(engine),
            LocationValue::Memory(lv) => lv.size_on_stack(engine),
            LocationValue::Storage(lv) => lv.size_on_stack(engine),
            LocationValue::Immutable(lv) => lv.size_on_stack(engine),
            LocationValue::ByteArrayElement(lv) => lv.size_on_stack(engine),
            LocationValue::Tuple(lv) => lv.size_on_stack(engine),
        }
    }

    fn reference_size(&self) -> usize {
        match self {
            LocationValue::Stack(lv) => lv.reference_size(),
            LocationValue::Memory(lv) => lv.reference_size(),
            LocationValue::Storage(lv) => lv.reference_size(),
            LocationValue::Immutable(lv) => lv.reference_size(),
            LocationValue::ByteArrayElement(lv) => lv.reference_size(),
            LocationValue::Tuple(lv) => lv.reference_size(),
        }
    }
}

impl From<StackVariable> for LocationValue {
    fn from(lv: StackVariable) -> Self {
        LocationValue::Stack(lv)
    }
}

impl From<MemoryItem> for LocationValue {
    fn from(lv: MemoryItem) -> Self {
        LocationValue::Memory(lv)
    }
}

impl From<StorageItem> for LocationValue {
    fn from(lv: StorageItem) -> Self {
        LocationValue::Storage(lv)
    }
}

impl From<ImmutableItem> for LocationValue {
    fn from(lv: ImmutableItem) -> Self {
        LocationValue::Immutable(lv)
    }
}

impl From<StorageByteArrayElement> for LocationValue {
    fn from(lv: StorageByteArrayElement) -> Self {
        LocationValue::ByteArrayElement(lv)
    }
}

impl From<TupleObject> for LocationValue {
    fn from(lv: TupleObject) -> Self {
        LocationValue::Tuple(lv)
    }
}
