/// Number of bytes in a machine word.
pub const WORD_BYTES: u8 = 32;

/// How many operand stack slots, counted from the top, the `DUPn`/`SWAPn`
/// instructions can reach.
pub const STACK_ADDRESSING_WINDOW: usize = 16;
