//! The Core War execution engine: shared memory, process state, instruction
//! semantics and the two-player round-robin scheduler that drives them.

#[macro_use]
extern crate log;

#[cfg(test)]
mod test;

pub mod binary;
mod decode;
pub mod instr;
pub mod machine;
pub mod memory;
pub mod operand;
pub mod process;
mod stack;

pub use instr::{Fault, Instr};
pub use machine::{Machine, MachineConfig, MachineError, Outcome};
pub use memory::Memory;
pub use operand::Operand;
pub use process::Process;
