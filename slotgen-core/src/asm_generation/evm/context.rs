use rustc_hash::FxHashMap;
use slotgen_error::error::CompileError;
use slotgen_types::{constants::STACK_ADDRESSING_WINDOW, Span, U256};

use crate::{
    language::{VariableDeclaration, VariableId},
    type_system::TypeEngine,
};

use super::{CompositePrimitives, EvmAsmSection, EvmInstruction};

/// Which code a unit is compiled into. This fixes how immutable variables are addressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CodeKind {
    /// Initialisation code. Immutables live in memory cells bound by the initialiser.
    Creation,
    /// Deployed code. Immutables are linker placeholders replaced by their value.
    Runtime,
}

/// The state shared by all location values of one compiled unit: the output section, the
/// simulated operand stack and the bindings of every variable that can be addressed.
pub struct CompilerContext<'eng> {
    engine: &'eng TypeEngine,
    primitives: &'eng dyn CompositePrimitives,
    code_kind: CodeKind,
    section: EvmAsmSection,
    // Stack height at which the deepest slot of a local variable lives.
    local_variables: FxHashMap<VariableId, usize>,
    state_variables: FxHashMap<VariableId, (U256, u8)>,
    immutables: FxHashMap<VariableId, u64>,
}

impl<'eng> CompilerContext<'eng> {
    pub fn new(
        engine: &'eng TypeEngine,
        primitives: &'eng dyn CompositePrimitives,
        code_kind: CodeKind,
    ) -> Self {
        Self {
            engine,
            primitives,
            code_kind,
            section: EvmAsmSection::new(),
            local_variables: FxHashMap::default(),
            state_variables: FxHashMap::default(),
            immutables: FxHashMap::default(),
        }
    }

    pub fn engine(&self) -> &'eng TypeEngine {
        self.engine
    }

    pub fn primitives(&self) -> &'eng dyn CompositePrimitives {
        self.primitives
    }

    pub fn code_kind(&self) -> CodeKind {
        self.code_kind
    }

    pub fn stack_height(&self) -> usize {
        self.section.stack_height()
    }

    pub fn section(&self) -> &EvmAsmSection {
        &self.section
    }

    pub fn into_section(self) -> EvmAsmSection {
        self.section
    }

    pub fn emit(&mut self, op: EvmInstruction) {
        tracing::trace!(height = self.section.stack_height(), "{op}");
        self.section.append(op);
    }

    pub fn push(&mut self, value: impl Into<U256>) {
        self.emit(EvmInstruction::Push(value.into()));
    }

    /// Emits `DUP<depth>`, failing when `depth` is outside the addressing window.
    pub fn dup(&mut self, depth: usize, span: &Span) -> Result<(), CompileError> {
        let n = Self::check_depth(depth, span)?;
        self.emit(EvmInstruction::Dup(n));
        Ok(())
    }

    /// Emits `SWAP<depth>`, failing when `depth` is outside the addressing window.
    pub fn swap(&mut self, depth: usize, span: &Span) -> Result<(), CompileError> {
        let n = Self::check_depth(depth, span)?;
        self.emit(EvmInstruction::Swap(n));
        Ok(())
    }

    fn check_depth(depth: usize, span: &Span) -> Result<u8, CompileError> {
        debug_assert!(depth >= 1, "Stack instructions address at least one slot.");
        if depth > STACK_ADDRESSING_WINDOW {
            return Err(CompileError::StackTooDeep {
                depth,
                span: span.clone(),
            });
        }
        Ok(depth as u8)
    }

    /// Binds a local variable to the `size` slots on top of the stack.
    pub fn add_local_variable(&mut self, id: VariableId, size: usize) {
        debug_assert!(size <= self.stack_height(), "Variable is not on the stack.");
        let base = self.stack_height() - size;
        self.local_variables.insert(id, base);
    }

    pub fn base_stack_offset_of_variable(&self, id: VariableId) -> Option<usize> {
        self.local_variables.get(&id).copied()
    }

    /// Distance from the current top of the stack to the slot at stack height `base`, zero for
    /// the topmost slot.
    pub fn base_to_current_stack_offset(&self, base: usize) -> usize {
        debug_assert!(base < self.stack_height(), "Slot is above the stack top.");
        self.stack_height() - base - 1
    }

    pub fn add_state_variable(&mut self, id: VariableId, slot: U256, byte_offset: u8) {
        self.state_variables.insert(id, (slot, byte_offset));
    }

    pub fn storage_location_of_variable(&self, id: VariableId) -> Option<(U256, u8)> {
        self.state_variables.get(&id).copied()
    }

    /// Binds an immutable to the memory cell its initialiser writes.
    pub fn add_immutable(&mut self, id: VariableId, memory_offset: u64) {
        self.immutables.insert(id, memory_offset);
    }

    pub fn immutable_memory_offset(&self, id: VariableId) -> Option<u64> {
        self.immutables.get(&id).copied()
    }

    /// Names of the linker placeholders of an immutable, one per stack slot of its value.
    pub fn immutable_slot_names(&self, decl: &VariableDeclaration) -> Vec<String> {
        let id = decl.id.to_usize();
        match self.engine.size_on_stack(decl.ty) {
            1 => vec![id.to_string()],
            size => (0..size).map(|i| format!("{id}_{i}")).collect(),
        }
    }
}
