//! Location values for a 256-bit word stack machine.
//!
//! A [LocationValue](asm_generation::evm::lvalue::LocationValue) is built for one access site
//! (a local variable, a storage slot, a memory cell, an immutable, a byte of a packed byte array
//! or a tuple of those) and then asked exactly once to retrieve, store or zero the value it
//! designates, emitting the instructions that do so into the current
//! [EvmAsmSection](asm_generation::evm::EvmAsmSection).

pub mod asm_generation;
pub mod build_config;
mod concurrent_slab;
pub mod language;
pub mod type_system;

pub use build_config::BuildConfig;
pub use slotgen_error::error::CompileError;
pub use slotgen_types::{Span, Spanned, U256};
