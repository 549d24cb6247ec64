mod asm_builder;
pub use asm_builder::*;
mod context;
pub use context::*;
mod instruction;
pub use instruction::*;
mod lowering;
pub use lowering::*;
pub mod lvalue;
pub mod packing;
mod primitives;
pub use primitives::*;
mod section;
pub use section::*;
mod utils;

#[cfg(test)]
pub(crate) mod test_vm;
