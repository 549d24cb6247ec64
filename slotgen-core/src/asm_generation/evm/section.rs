use std::fmt;

use super::EvmInstruction;

/// An append-only listing of instructions together with the operand stack height they leave.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct EvmAsmSection {
    ops: Vec<EvmInstruction>,
    stack_height: usize,
}

impl EvmAsmSection {
    pub fn new() -> Self {
        Self::default()
    }

    /// A section that starts with `stack_height` slots already on the stack.
    pub fn with_stack_height(stack_height: usize) -> Self {
        Self {
            ops: Vec::new(),
            stack_height,
        }
    }

    pub fn append(&mut self, op: EvmInstruction) {
        let (consumed, produced) = op.stack_effect();
        debug_assert!(
            consumed <= self.stack_height,
            "Stack underflow: `{op}` needs {consumed} slots, {} available.",
            self.stack_height
        );
        self.stack_height = self.stack_height.saturating_sub(consumed) + produced;
        self.ops.push(op);
    }

    pub fn stack_height(&self) -> usize {
        self.stack_height
    }

    pub fn ops(&self) -> &[EvmInstruction] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl fmt::Display for EvmAsmSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in &self.ops {
            writeln!(f, "    {op}")?;
        }
        Ok(())
    }
}
