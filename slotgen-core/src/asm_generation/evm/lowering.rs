use etk_asm::ops::*;
use etk_ops::london::*;
use num_bigint::{BigInt, Sign};
use slotgen_error::error::CompileError;
use slotgen_types::Span;

use super::{EvmAsmSection, EvmInstruction, Symbol};

/// Lowers abstract instruction sections to assembler ops.
///
/// Utility calls become a jump to the routine's label with a fresh return label pushed below
/// the arguments, so labels are unique across every section lowered by one `Lowering`.
#[derive(Default, Debug)]
pub struct Lowering {
    // Monotonically increasing unique identifier for label generation.
    label_idx: usize,
}

impl Lowering {
    pub fn new() -> Self {
        Self::default()
    }

    /// `span` is the source of the unit the section was compiled from.
    pub fn lower_section(
        &mut self,
        section: &EvmAsmSection,
        span: &Span,
    ) -> Result<Vec<AbstractOp>, CompileError> {
        let mut ops = Vec::with_capacity(section.len());
        for instruction in section.ops() {
            self.lower_instruction(instruction, span, &mut ops)?;
        }
        Ok(ops)
    }

    fn get_label(&mut self) -> String {
        let next_val = self.label_idx;
        self.label_idx += 1;
        format!("utility_return_{next_val}")
    }

    fn lower_instruction(
        &mut self,
        instruction: &EvmInstruction,
        span: &Span,
        ops: &mut Vec<AbstractOp>,
    ) -> Result<(), CompileError> {
        let op = match instruction {
            EvmInstruction::Push(value) => {
                ops.push(AbstractOp::Push(Imm::from(Terminal::Number(
                    BigInt::from_bytes_be(Sign::Plus, &value.to_be_bytes()),
                ))));
                return Ok(());
            }
            EvmInstruction::PushSymbol(Symbol::Tag(name)) => {
                ops.push(AbstractOp::Push(Imm::with_label(name.as_str())));
                return Ok(());
            }
            // Immutable placeholders are always a full word so the linker can patch them in place.
            EvmInstruction::PushSymbol(Symbol::Immutable(name)) => {
                Op::Push32(Push32(Imm::with_label(format!("immutable_{name}"))))
            }
            EvmInstruction::Pop => Op::Pop(Pop),
            EvmInstruction::Dup(n) => dup_op(*n),
            EvmInstruction::Swap(n) => swap_op(*n),
            EvmInstruction::Add => Op::Add(Add),
            EvmInstruction::Sub => Op::Sub(Sub),
            EvmInstruction::Mul => Op::Mul(Mul),
            EvmInstruction::Div => Op::Div(Div),
            EvmInstruction::Exp => Op::Exp(Exp),
            EvmInstruction::SignExtend => Op::SignExtend(SignExtend),
            EvmInstruction::And => Op::And(And),
            EvmInstruction::Or => Op::Or(Or),
            EvmInstruction::Not => Op::Not(Not),
            EvmInstruction::IsZero => Op::IsZero(IsZero),
            EvmInstruction::Byte => Op::Byte(Byte),
            EvmInstruction::Shl => Op::Shl(Shl),
            EvmInstruction::Shr => Op::Shr(Shr),
            EvmInstruction::MLoad => Op::MLoad(MLoad),
            EvmInstruction::MStore => Op::MStore(MStore),
            EvmInstruction::MStore8 => Op::MStore8(MStore8),
            EvmInstruction::SLoad => Op::SLoad(SLoad),
            EvmInstruction::SStore => Op::SStore(SStore),
            EvmInstruction::TLoad | EvmInstruction::TStore => {
                return Err(CompileError::UnimplementedWithHelp(
                    "Transient storage opcodes are not available in the london instruction set.",
                    "use persistent storage for this variable",
                    span.clone(),
                ));
            }
            EvmInstruction::CallUtility { name, inputs, .. } => {
                // args.. -> args.. return_label -> return_label args..
                let return_label = self.get_label();
                ops.push(AbstractOp::Push(Imm::with_label(return_label.as_str())));
                for i in 1..=*inputs {
                    ops.push(AbstractOp::new(swap_op((*inputs - i + 1) as u8)));
                }
                ops.push(AbstractOp::Push(Imm::with_label(name.as_str())));
                ops.push(AbstractOp::new(Op::Jump(Jump)));
                ops.push(AbstractOp::Label(return_label));
                Op::JumpDest(JumpDest)
            }
        };
        ops.push(AbstractOp::new(op));
        Ok(())
    }
}

fn dup_op(n: u8) -> Op<Abstract> {
    match n {
        1 => Op::Dup1(Dup1),
        2 => Op::Dup2(Dup2),
        3 => Op::Dup3(Dup3),
        4 => Op::Dup4(Dup4),
        5 => Op::Dup5(Dup5),
        6 => Op::Dup6(Dup6),
        7 => Op::Dup7(Dup7),
        8 => Op::Dup8(Dup8),
        9 => Op::Dup9(Dup9),
        10 => Op::Dup10(Dup10),
        11 => Op::Dup11(Dup11),
        12 => Op::Dup12(Dup12),
        13 => Op::Dup13(Dup13),
        14 => Op::Dup14(Dup14),
        15 => Op::Dup15(Dup15),
        16 => Op::Dup16(Dup16),
        _ => panic!("Internal compiler error: dup{n} is out of range."),
    }
}

fn swap_op(n: u8) -> Op<Abstract> {
    match n {
        1 => Op::Swap1(Swap1),
        2 => Op::Swap2(Swap2),
        3 => Op::Swap3(Swap3),
        4 => Op::Swap4(Swap4),
        5 => Op::Swap5(Swap5),
        6 => Op::Swap6(Swap6),
        7 => Op::Swap7(Swap7),
        8 => Op::Swap8(Swap8),
        9 => Op::Swap9(Swap9),
        10 => Op::Swap10(Swap10),
        11 => Op::Swap11(Swap11),
        12 => Op::Swap12(Swap12),
        13 => Op::Swap13(Swap13),
        14 => Op::Swap14(Swap14),
        15 => Op::Swap15(Swap15),
        16 => Op::Swap16(Swap16),
        _ => panic!("Internal compiler error: swap{n} is out of range."),
    }
}
