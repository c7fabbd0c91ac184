use cw_util::{of_signed, BitSet};

use crate::ins::{Ins, InsTy, Mode, Operand, OperandSrc};
use crate::Error;

use std::collections::HashMap;

/// A builder struct for the 32-bit instruction word (§3 of the layout this mirrors):
/// opcode in bits 0-3, operand-A mode in 4-5, operand-B mode in 6-7, operand-A
/// value in 8-19, operand-B value in 20-31.
#[derive(Clone, Copy)]
struct InsBuilder(u32);

impl InsBuilder {
    fn op(val: u32) -> Self {
        Self(0_u32.set_bit_range(0, 3, val))
    }

    fn mode_a(self, mode: Mode) -> Self {
        Self(self.0.set_bit_range(4, 5, mode.code()))
    }

    fn mode_b(self, mode: Mode) -> Self {
        Self(self.0.set_bit_range(6, 7, mode.code()))
    }

    fn val_a(self, val: u32) -> Self {
        Self(self.0.set_bit_range(8, 19, val))
    }

    fn val_b(self, val: u32) -> Self {
        Self(self.0.set_bit_range(20, 31, val))
    }
}

struct CodeGen<'a> {
    code: Vec<u32>,
    labels: HashMap<&'a str, u32>,
}

impl<'a> CodeGen<'a> {
    fn new() -> Self {
        Self {
            code: Vec::new(),
            labels: HashMap::new(),
        }
    }

    /// Resolve an operand's 12-bit field: a literal passes through unchanged, a label
    /// reference becomes the PC-relative word offset from the instruction holding it.
    fn operand_val(&self, line: usize, here: u32, op: &Operand<'a>) -> Result<u32, Error> {
        match op.src {
            OperandSrc::Num(n) => Ok(of_signed(n as i64, 12)),
            OperandSrc::Label(id) => {
                let dest = *self
                    .labels
                    .get(id)
                    .ok_or_else(|| Error::new(line, format!("unresolved label '{id}'")))?;
                Ok(of_signed(dest as i64 - here as i64, 12))
            }
        }
    }

    fn gen_word(&mut self, word: InsBuilder) {
        self.code.push(word.0);
    }

    fn assemble_unary(&mut self, line: usize, here: u32, op_code: u32, a: &Operand<'a>) -> Result<(), Error> {
        let val = self.operand_val(line, here, a)?;
        self.gen_word(InsBuilder::op(op_code).mode_a(a.mode).val_a(val));
        Ok(())
    }

    fn assemble_binary(
        &mut self,
        line: usize,
        here: u32,
        op_code: u32,
        a: &Operand<'a>,
        b: &Operand<'a>,
    ) -> Result<(), Error> {
        let val_a = self.operand_val(line, here, a)?;
        let val_b = self.operand_val(line, here, b)?;
        self.gen_word(
            InsBuilder::op(op_code)
                .mode_a(a.mode)
                .mode_b(b.mode)
                .val_a(val_a)
                .val_b(val_b),
        );
        Ok(())
    }

    fn assemble_ins(&mut self, ins: &Ins<'a>, here: u32) -> Result<(), Error> {
        match &ins.ty {
            InsTy::Fork => self.gen_word(InsBuilder::op(0)),
            InsTy::Mov(a, b) => self.assemble_binary(ins.line, here, 1, a, b)?,
            InsTy::Not(a, b) => self.assemble_binary(ins.line, here, 2, a, b)?,
            InsTy::And(a, b) => self.assemble_binary(ins.line, here, 3, a, b)?,
            InsTy::Or(a, b) => self.assemble_binary(ins.line, here, 4, a, b)?,
            InsTy::Ls(a, b) => self.assemble_binary(ins.line, here, 5, a, b)?,
            InsTy::As(a, b) => self.assemble_binary(ins.line, here, 6, a, b)?,
            InsTy::Add(a, b) => self.assemble_binary(ins.line, here, 7, a, b)?,
            InsTy::Sub(a, b) => self.assemble_binary(ins.line, here, 8, a, b)?,
            InsTy::Cmp(a, b) => self.assemble_binary(ins.line, here, 9, a, b)?,
            InsTy::Lt(a, b) => self.assemble_binary(ins.line, here, 10, a, b)?,
            InsTy::Pop(a) => self.assemble_unary(ins.line, here, 11, a)?,
            InsTy::Push(a) => self.assemble_unary(ins.line, here, 12, a)?,
            InsTy::Jmp(a) => self.assemble_unary(ins.line, here, 13, a)?,
            InsTy::Bz(a) => self.assemble_unary(ins.line, here, 14, a)?,
            InsTy::Die => self.gen_word(InsBuilder::op(15)),
            InsTy::Label(_) => (),
        }
        Ok(())
    }
}

/// Assemble a parsed instruction stream into a word-oriented program image.
///
/// Runs two passes: the first walks the stream to record every label's address
/// (summing [`InsTy::size`] as it goes), the second emits one 32-bit word per
/// real instruction, resolving label references to PC-relative offsets.
pub fn gen_words<'a>(ins: &[Ins<'a>]) -> Result<Vec<u32>, Error> {
    let mut gen = CodeGen::new();
    let mut addr = 0_u32;

    for ins in ins {
        if let InsTy::Label(id) = ins.ty {
            if gen.labels.insert(id, addr).is_some() {
                return Err(Error::new(ins.line, format!("label '{id}' redeclared")));
            }
        } else {
            addr += ins.ty.size();
        }
    }

    let mut addr = 0_u32;
    for ins in ins {
        if matches!(ins.ty, InsTy::Label(_)) {
            continue;
        }
        gen.assemble_ins(ins, addr)?;
        addr += ins.ty.size();
    }

    Ok(gen.code)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parse::parse;

    #[test]
    fn fork_and_die_are_single_words() {
        let ins = parse("FORK\nDIE").unwrap();
        let words = gen_words(&ins).unwrap();
        assert_eq!(words, vec![0, 15]);
    }

    #[test]
    fn backward_branch_is_negative_offset() {
        let ins = parse(
            r#"
&loop:  ADD $-1 r1
        JMP $&loop
            "#,
        )
        .unwrap();
        let words = gen_words(&ins).unwrap();
        let jmp = words[1];
        let val_a = cw_util::extract(jmp, 8, 12);
        assert_eq!(cw_util::to_signed(val_a, 12), -1);
    }

    #[test]
    fn unresolved_label_is_an_error() {
        let ins = parse("JMP $&nowhere").unwrap();
        assert!(gen_words(&ins).is_err());
    }
}
