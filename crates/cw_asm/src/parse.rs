use crate::ins::{Ins, InsTy, Operand, OperandSrc};
use crate::lex::{self, Tok, TokTy};
use crate::Error;

/// Parse a full program into a flat, address-ordered instruction list.
///
/// Labels are kept as zero-size markers in the returned stream; [`crate::gen`]
/// resolves them to PC-relative offsets once every instruction's size is known.
pub fn parse(input: &str) -> Result<Vec<Ins>, Error> {
    Parser::new(lex::tokenize(input)).parse()
}

struct Parser<'a, Iter: Iterator<Item = Result<Tok<'a>, Error>>> {
    line: usize,
    input: Iter,
}

impl<'a, Iter: Iterator<Item = Result<Tok<'a>, Error>>> Parser<'a, Iter> {
    fn new(input: Iter) -> Self {
        Self { line: 1, input }
    }

    fn err(&self, msg: impl Into<String>) -> Error {
        Error::new(self.line, msg)
    }

    fn expect_some(&mut self) -> Result<Tok<'a>, Error> {
        let tok = self
            .input
            .next()
            .unwrap_or_else(|| Err(self.err("unexpected end of input")))?;
        self.line = tok.line;
        Ok(tok)
    }

    /// Parse a single operand, given by an addressing-mode prefix plus a value.
    fn operand(&mut self) -> Result<Operand<'a>, Error> {
        let tok = self.expect_some()?;
        match tok.ty {
            TokTy::Num(mode, n) => Ok(Operand::new(mode, OperandSrc::Num(n))),
            TokTy::LabelRef(mode, label) => Ok(Operand::new(mode, OperandSrc::Label(label))),
            _ => Err(self.err("expected an operand")),
        }
    }

    /// Parse a two-operand instruction, requiring the second operand to be writable.
    fn binary(&mut self, mnemonic: &str) -> Result<(Operand<'a>, Operand<'a>), Error> {
        let a = self.operand()?;
        let b = self.operand()?;
        if !b.mode.is_writable() {
            return Err(self.err(format!(
                "{mnemonic}'s second operand must be a writable address, not {}",
                b.mode
            )));
        }
        Ok((a, b))
    }

    pub fn parse(&mut self) -> Result<Vec<Ins<'a>>, Error> {
        let mut out = Vec::with_capacity(64);

        while let Some(tok) = self.input.next() {
            let tok = tok?;
            self.line = tok.line;
            let ty = match tok.ty {
                TokTy::Label(id) => InsTy::Label(id),
                TokTy::Eof => unreachable!("tokenize() stops before yielding Eof"),
                TokTy::Num(..) | TokTy::LabelRef(..) => {
                    return Err(self.err("expected a label or an instruction mnemonic"));
                }
                TokTy::Id(id) => match id {
                    "FORK" => InsTy::Fork,
                    "DIE" => InsTy::Die,
                    "MOV" => {
                        let (a, b) = self.binary("MOV")?;
                        InsTy::Mov(a, b)
                    }
                    "NOT" => {
                        let (a, b) = self.binary("NOT")?;
                        InsTy::Not(a, b)
                    }
                    "AND" => {
                        let (a, b) = self.binary("AND")?;
                        InsTy::And(a, b)
                    }
                    "OR" => {
                        let (a, b) = self.binary("OR")?;
                        InsTy::Or(a, b)
                    }
                    "LS" => {
                        let (a, b) = self.binary("LS")?;
                        InsTy::Ls(a, b)
                    }
                    "AS" => {
                        let (a, b) = self.binary("AS")?;
                        InsTy::As(a, b)
                    }
                    "ADD" => {
                        let (a, b) = self.binary("ADD")?;
                        InsTy::Add(a, b)
                    }
                    "SUB" => {
                        let (a, b) = self.binary("SUB")?;
                        InsTy::Sub(a, b)
                    }
                    "CMP" => InsTy::Cmp(self.operand()?, self.operand()?),
                    "LT" => InsTy::Lt(self.operand()?, self.operand()?),
                    "POP" => {
                        let a = self.operand()?;
                        if !a.mode.is_writable() {
                            return Err(self.err(format!(
                                "POP's operand must be a writable address, not {}",
                                a.mode
                            )));
                        }
                        InsTy::Pop(a)
                    }
                    "PUSH" => InsTy::Push(self.operand()?),
                    "JMP" => InsTy::Jmp(self.operand()?),
                    "BZ" => InsTy::Bz(self.operand()?),
                    other => return Err(self.err(format!("unknown mnemonic '{other}'"))),
                },
            };
            out.push(Ins::new(tok.line, ty));
        }

        Ok(out)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ins::Mode;

    #[test]
    fn binary_rejects_immediate_destination() {
        let err = parse("ADD $1 $2").unwrap_err();
        assert!(err.message.contains("writable"));
    }

    #[test]
    fn fork_and_die_take_no_operands() {
        let ins = parse("FORK\nDIE").unwrap();
        assert!(matches!(ins[0].ty, InsTy::Fork));
        assert!(matches!(ins[1].ty, InsTy::Die));
    }

    #[test]
    fn countdown_loop() {
        let ins = parse(
            r#"
            MOV $127 r1
&loop:      ADD $-1 r1
            BZ  $&end
            JMP $&loop
&end:       DIE
            "#,
        )
        .unwrap();
        assert!(matches!(ins[0].ty, InsTy::Mov(..)));
        assert!(matches!(ins[1].ty, InsTy::Label("loop")));
        assert!(matches!(ins[2].ty, InsTy::Add(..)));
        match ins[3].ty {
            InsTy::Bz(op) => assert!(matches!(op.src, crate::ins::OperandSrc::Label("end"))),
            _ => panic!("expected BZ"),
        }
        match ins[0].ty {
            InsTy::Mov(a, b) => {
                assert!(matches!(a.mode, Mode::Immediate));
                assert!(matches!(b.mode, Mode::Register));
            }
            _ => panic!("expected MOV"),
        }
    }
}
