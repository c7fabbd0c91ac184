//! Instruction semantics: decoding a word into a tagged [`Instr`] and executing it.

use cw_util::to_signed;

use crate::decode::decode;
use crate::memory::Memory;
use crate::operand::Operand;
use crate::process::Process;

/// A process-local failure. Never propagates past the scheduler: the process
/// that caused it is simply removed from its cohort this turn.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    #[error("executed DIE")]
    Die,
    #[error("wrote through a read-only operand")]
    WriteToImmediate,
    #[error("decoded an undefined opcode {0}")]
    UndefinedOpcode(u32),
}

#[derive(Debug, Clone, Copy)]
pub enum Instr {
    Fork,
    Mov(Operand, Operand),
    Not(Operand, Operand),
    And(Operand, Operand),
    Or(Operand, Operand),
    Ls(Operand, Operand),
    As(Operand, Operand),
    Add(Operand, Operand),
    Sub(Operand, Operand),
    Cmp(Operand, Operand),
    Lt(Operand, Operand),
    Pop(Operand),
    Push(Operand),
    Jmp(Operand),
    Bz(Operand),
    Die,
}

impl Instr {
    pub fn decode(word: u32) -> Result<Self, Fault> {
        let d = decode(word);
        let a = Operand::from_raw(d.a);
        let b = Operand::from_raw(d.b);
        match d.opcode {
            0 => Ok(Instr::Fork),
            1 => Ok(Instr::Mov(a, b)),
            2 => Ok(Instr::Not(a, b)),
            3 => Ok(Instr::And(a, b)),
            4 => Ok(Instr::Or(a, b)),
            5 => Ok(Instr::Ls(a, b)),
            6 => Ok(Instr::As(a, b)),
            7 => Ok(Instr::Add(a, b)),
            8 => Ok(Instr::Sub(a, b)),
            9 => Ok(Instr::Cmp(a, b)),
            10 => Ok(Instr::Lt(a, b)),
            11 => Ok(Instr::Pop(a)),
            12 => Ok(Instr::Push(a)),
            13 => Ok(Instr::Jmp(a)),
            14 => Ok(Instr::Bz(a)),
            15 => Ok(Instr::Die),
            // The opcode field is 4 bits and every one of the 16 codes is
            // assigned above; this arm exists only to keep the match total
            // against a 32-bit value that a future opcode table might widen.
            other => Err(Fault::UndefinedOpcode(other)),
        }
    }

    /// Execute one instruction. `Ok(Some(child))` means a new process was
    /// spawned and should be appended to the same cohort as `process`.
    pub fn exec(self, memory: &mut Memory, process: &mut Process) -> Result<Option<Process>, Fault> {
        match self {
            Instr::Fork => {
                process.z = false;
                process.pc = advance(process.pc, memory.size());
                Ok(Some(process.fork_child(process.pc)))
            }
            Instr::Mov(a, b) => {
                let val = a.read(memory, process);
                b.write(memory, process, val)?;
                process.pc = advance(process.pc, memory.size());
                Ok(None)
            }
            Instr::Not(a, b) => self.result_producing(memory, process, a, b, |x, _| !x),
            Instr::And(a, b) => self.result_producing(memory, process, a, b, |x, y| x & y),
            Instr::Or(a, b) => self.result_producing(memory, process, a, b, |x, y| x | y),
            Instr::Ls(a, b) => self.result_producing(memory, process, a, b, |x, y| {
                logical_shift(to_signed(x, 32), y)
            }),
            Instr::As(a, b) => self.result_producing(memory, process, a, b, |x, y| {
                arithmetic_shift(to_signed(x, 32), y)
            }),
            Instr::Add(a, b) => self.result_producing(memory, process, a, b, u32::wrapping_add),
            Instr::Sub(a, b) => self.result_producing(memory, process, a, b, u32::wrapping_sub),
            Instr::Cmp(a, b) => {
                process.z = a.read(memory, process) == b.read(memory, process);
                process.pc = advance(process.pc, memory.size());
                Ok(None)
            }
            Instr::Lt(a, b) => {
                let lhs = to_signed(a.read(memory, process), 32);
                let rhs = to_signed(b.read(memory, process), 32);
                process.z = lhs < rhs;
                process.pc = advance(process.pc, memory.size());
                Ok(None)
            }
            Instr::Pop(a) => {
                let val = process.stack.pop();
                a.write(memory, process, val)?;
                process.pc = advance(process.pc, memory.size());
                Ok(None)
            }
            Instr::Push(a) => {
                let val = a.read(memory, process);
                process.stack.push(val);
                process.pc = advance(process.pc, memory.size());
                Ok(None)
            }
            Instr::Jmp(a) => {
                let off = to_signed(a.read(memory, process), 32);
                process.pc = wrap_add(process.pc, off, memory.size() as i64);
                Ok(None)
            }
            Instr::Bz(a) => {
                if process.z {
                    let off = to_signed(a.read(memory, process), 32);
                    // The branch target wraps modulo 2^12, not the core size,
                    // a quirk kept for compatibility with existing programs.
                    process.pc = wrap_add(process.pc, off, 1 << 12);
                } else {
                    process.pc = advance(process.pc, memory.size());
                }
                Ok(None)
            }
            Instr::Die => Err(Fault::Die),
        }
    }

    /// Shared shape of the eight "result-producing" opcodes: read both
    /// operands, combine with `f`, write the result to `b`, advance the PC,
    /// and set `Z` from the result.
    fn result_producing(
        self,
        memory: &mut Memory,
        process: &mut Process,
        a: Operand,
        b: Operand,
        f: impl FnOnce(u32, u32) -> u32,
    ) -> Result<Option<Process>, Fault> {
        let lhs = a.read(memory, process);
        let rhs = b.read(memory, process);
        let res = f(lhs, rhs);
        b.write(memory, process, res)?;
        process.pc = advance(process.pc, memory.size());
        process.z = res == 0;
        Ok(None)
    }
}

fn advance(pc: u32, mem_size: u32) -> u32 {
    (pc + 1) % mem_size
}

fn wrap_add(pc: u32, offset: i64, modulus: i64) -> u32 {
    (pc as i64 + offset).rem_euclid(modulus) as u32
}

/// Logical shift of `w` by signed amount `a`: right when `a >= 0`, left when negative.
fn logical_shift(a: i64, w: u32) -> u32 {
    if a >= 0 {
        if a >= 32 {
            0
        } else {
            w >> a as u32
        }
    } else {
        let shift = (-a) as u32;
        if shift >= 32 {
            0
        } else {
            w << shift
        }
    }
}

/// Arithmetic (sign-preserving) shift of `w` by signed amount `a`: right when
/// `a >= 0`, left when negative.
fn arithmetic_shift(a: i64, w: u32) -> u32 {
    if a >= 0 {
        if a >= 32 {
            if (w as i32) < 0 {
                u32::MAX
            } else {
                0
            }
        } else {
            ((w as i32) >> a as u32) as u32
        }
    } else {
        let shift = (-a) as u32;
        if shift >= 32 {
            0
        } else {
            w << shift
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn logical_shift_right_clears_the_sign_bit() {
        assert_eq!(logical_shift(1, 0x8000_0000), 0x4000_0000);
    }

    #[test]
    fn arithmetic_shift_right_extends_the_sign_bit() {
        assert_eq!(arithmetic_shift(1, 0x8000_0000), 0xc000_0000);
        assert_eq!(arithmetic_shift(4, 0x8000_0000), 0xf800_0000);
    }

    #[test]
    fn shift_past_width_saturates() {
        assert_eq!(logical_shift(40, 0xffff_ffff), 0);
        assert_eq!(arithmetic_shift(40, 0x8000_0000), u32::MAX);
        assert_eq!(arithmetic_shift(40, 0x7fff_ffff), 0);
    }

    #[test]
    fn every_opcode_decodes() {
        for op in 0..16_u32 {
            assert!(Instr::decode(op).is_ok());
        }
    }

    #[test]
    fn fork_clears_parent_z_and_sets_child_z() {
        let mut memory = Memory::new();
        let mut process = Process::new(0);
        process.z = true;
        let child = Instr::Fork.exec(&mut memory, &mut process).unwrap().unwrap();
        assert!(!process.z);
        assert!(child.z);
        assert_eq!(process.pc, child.pc);
    }

    #[test]
    fn die_is_a_fault() {
        let mut memory = Memory::new();
        let mut process = Process::new(0);
        assert_eq!(Instr::Die.exec(&mut memory, &mut process), Err(Fault::Die));
    }
}
