use std::fmt;

use slotgen_types::U256;

/// A value that is only known when the final bytecode is linked.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// A runtime-code placeholder for one word of an immutable variable.
    Immutable(String),
    /// A code tag, e.g. the uninitialised-function panic routine.
    Tag(String),
}

impl Symbol {
    /// The code tag an internal function value points at before it is assigned.
    pub fn uninitialized_function() -> Self {
        Symbol::Tag("uninitialized_function".into())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Immutable(name) => write!(f, "immutable(\"{name}\")"),
            Symbol::Tag(name) => write!(f, "tag({name})"),
        }
    }
}

/// The abstract instructions a location value emits.
///
/// Operands are taken from the top of the stack first: `Sub` computes `top - second`, `Shl`
/// shifts `second` by `top` bits, `MStore` writes `second` at offset `top`, `SStore` writes
/// `second` under key `top`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EvmInstruction {
    Push(U256),
    PushSymbol(Symbol),
    Pop,
    /// Duplicates the `n`-th stack slot, `1..=16`.
    Dup(u8),
    /// Exchanges the top slot with the slot `n` below it, `1..=16`.
    Swap(u8),
    Add,
    Sub,
    Mul,
    Div,
    Exp,
    SignExtend,
    And,
    Or,
    Not,
    IsZero,
    Byte,
    Shl,
    Shr,
    MLoad,
    MStore,
    MStore8,
    SLoad,
    SStore,
    TLoad,
    TStore,
    /// A call into a shared utility routine (composite copy, clearing or allocation).
    CallUtility {
        name: String,
        inputs: usize,
        outputs: usize,
    },
}

impl EvmInstruction {
    /// Number of stack slots consumed and produced.
    pub fn stack_effect(&self) -> (usize, usize) {
        use EvmInstruction::*;
        match self {
            Push(_) | PushSymbol(_) => (0, 1),
            Pop => (1, 0),
            Dup(n) => (*n as usize, *n as usize + 1),
            Swap(n) => (*n as usize + 1, *n as usize + 1),
            Add | Sub | Mul | Div | Exp | SignExtend | And | Or | Byte | Shl | Shr => (2, 1),
            Not | IsZero | MLoad | SLoad | TLoad => (1, 1),
            MStore | MStore8 | SStore | TStore => (2, 0),
            CallUtility {
                inputs, outputs, ..
            } => (*inputs, *outputs),
        }
    }
}

impl fmt::Display for EvmInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use EvmInstruction::*;
        match self {
            Push(value) => write!(f, "push {value:#x}"),
            PushSymbol(symbol) => write!(f, "push {symbol}"),
            Pop => write!(f, "pop"),
            Dup(n) => write!(f, "dup{n}"),
            Swap(n) => write!(f, "swap{n}"),
            Add => write!(f, "add"),
            Sub => write!(f, "sub"),
            Mul => write!(f, "mul"),
            Div => write!(f, "div"),
            Exp => write!(f, "exp"),
            SignExtend => write!(f, "signextend"),
            And => write!(f, "and"),
            Or => write!(f, "or"),
            Not => write!(f, "not"),
            IsZero => write!(f, "iszero"),
            Byte => write!(f, "byte"),
            Shl => write!(f, "shl"),
            Shr => write!(f, "shr"),
            MLoad => write!(f, "mload"),
            MStore => write!(f, "mstore"),
            MStore8 => write!(f, "mstore8"),
            SLoad => write!(f, "sload"),
            SStore => write!(f, "sstore"),
            TLoad => write!(f, "tload"),
            TStore => write!(f, "tstore"),
            CallUtility { name, .. } => write!(f, "call {name}"),
        }
    }
}
