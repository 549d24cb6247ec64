//! A small interpreter for instruction listings, used by the unit tests to check emitted code
//! by executing it.

use rustc_hash::FxHashMap;
use slotgen_types::U256;

use super::{packing::sign_extend, EvmAsmSection, EvmInstruction, Symbol};

/// Value the uninitialised-function tag resolves to.
pub(crate) const UNINITIALIZED_FUNCTION: u64 = 0x51;

#[derive(Debug, Default)]
pub(crate) struct TestVm {
    pub stack: Vec<U256>,
    pub memory: Vec<u8>,
    pub storage: FxHashMap<U256, U256>,
    pub transient: FxHashMap<U256, U256>,
    /// Keys of persistent storage writes, in execution order.
    pub storage_writes: Vec<U256>,
    pub immutables: FxHashMap<String, U256>,
    pub utility_calls: Vec<String>,
}

impl TestVm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run_section(section: &EvmAsmSection) -> Self {
        let mut vm = Self::new();
        vm.run(section.ops());
        vm
    }

    pub fn sload(&self, key: impl Into<U256>) -> U256 {
        self.storage.get(&key.into()).copied().unwrap_or_default()
    }

    pub fn mload(&self, offset: usize) -> U256 {
        let mut word = [0u8; 32];
        for (i, byte) in word.iter_mut().enumerate() {
            *byte = self.memory.get(offset + i).copied().unwrap_or_default();
        }
        U256::from_be_slice(&word)
    }

    pub fn mstore(&mut self, offset: usize, value: U256) {
        self.grow(offset + 32);
        self.memory[offset..offset + 32].copy_from_slice(&value.to_be_bytes());
    }

    fn grow(&mut self, len: usize) {
        if self.memory.len() < len {
            self.memory.resize(len, 0);
        }
    }

    fn pop(&mut self) -> U256 {
        self.stack.pop().expect("stack underflow")
    }

    fn binary(&mut self, f: impl FnOnce(U256, U256) -> U256) {
        let a = self.pop();
        let b = self.pop();
        self.stack.push(f(a, b));
    }

    pub fn run(&mut self, ops: &[EvmInstruction]) {
        use EvmInstruction::*;
        for op in ops {
            match op {
                Push(value) => self.stack.push(*value),
                PushSymbol(Symbol::Tag(_)) => self.stack.push(U256::from(UNINITIALIZED_FUNCTION)),
                PushSymbol(Symbol::Immutable(name)) => {
                    let value = *self
                        .immutables
                        .get(name)
                        .unwrap_or_else(|| panic!("unlinked immutable {name}"));
                    self.stack.push(value);
                }
                Pop => {
                    self.pop();
                }
                Dup(n) => {
                    let value = self.stack[self.stack.len() - *n as usize];
                    self.stack.push(value);
                }
                Swap(n) => {
                    let top = self.stack.len() - 1;
                    self.stack.swap(top, top - *n as usize);
                }
                Add => self.binary(|a, b| a.overflowing_add(b).0),
                Sub => self.binary(|a, b| a.overflowing_sub(b).0),
                Mul => self.binary(|a, b| a.overflowing_mul(b).0),
                Div => self.binary(|a, b| if b.is_zero() { b } else { a / b }),
                Exp => self.binary(|a, b| a.overflowing_pow(b).0),
                SignExtend => self.binary(|b, x| {
                    if b < U256::from(31u8) {
                        sign_extend(x, b.low_u32() as u8 + 1)
                    } else {
                        x
                    }
                }),
                And => self.binary(|a, b| a & b),
                Or => self.binary(|a, b| a | b),
                Not => {
                    let a = self.pop();
                    self.stack.push(!a);
                }
                IsZero => {
                    let a = self.pop();
                    self.stack.push(U256::from(a.is_zero() as u8));
                }
                Byte => self.binary(|i, x| {
                    if i < U256::from(32u8) {
                        U256::from(x.byte(31 - i.low_u32() as usize))
                    } else {
                        U256::zero()
                    }
                }),
                Shl => self.binary(|shift, value| {
                    if shift < U256::from(256u16) {
                        value << shift.low_u32() as usize
                    } else {
                        U256::zero()
                    }
                }),
                Shr => self.binary(|shift, value| {
                    if shift < U256::from(256u16) {
                        value >> shift.low_u32() as usize
                    } else {
                        U256::zero()
                    }
                }),
                MLoad => {
                    let offset = self.pop().as_usize();
                    self.grow(offset + 32);
                    let value = self.mload(offset);
                    self.stack.push(value);
                }
                MStore => {
                    let offset = self.pop().as_usize();
                    let value = self.pop();
                    self.mstore(offset, value);
                }
                MStore8 => {
                    let offset = self.pop().as_usize();
                    let value = self.pop();
                    self.grow(offset + 1);
                    self.memory[offset] = value.byte(0);
                }
                SLoad => {
                    let key = self.pop();
                    let value = self.sload(key);
                    self.stack.push(value);
                }
                SStore => {
                    let key = self.pop();
                    let value = self.pop();
                    self.storage_writes.push(key);
                    self.storage.insert(key, value);
                }
                TLoad => {
                    let key = self.pop();
                    let value = self.transient.get(&key).copied().unwrap_or_default();
                    self.stack.push(value);
                }
                TStore => {
                    let key = self.pop();
                    let value = self.pop();
                    self.transient.insert(key, value);
                }
                CallUtility {
                    name,
                    inputs,
                    outputs,
                } => {
                    for _ in 0..*inputs {
                        self.pop();
                    }
                    for _ in 0..*outputs {
                        self.stack.push(U256::zero());
                    }
                    self.utility_calls.push(name.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operands_are_taken_from_the_top() {
        let mut vm = TestVm::new();
        vm.run(&[
            EvmInstruction::Push(U256::from(3u8)),
            EvmInstruction::Push(U256::from(10u8)),
            EvmInstruction::Sub,
            EvmInstruction::Push(U256::from(0xff00u16)),
            EvmInstruction::Push(U256::from(30u8)),
            EvmInstruction::Byte,
        ]);
        assert_eq!(vm.stack, vec![U256::from(7u8), U256::from(0xffu8)]);
    }
}
