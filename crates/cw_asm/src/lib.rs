//! A small assembler for the Core War instruction set. Turns labeled source text
//! into the word stream `cw_core` expects as a program image.

mod gen;
mod lex;
mod parse;
pub mod ins;

pub use ins::{Ins, InsTy, Mode, Operand, OperandSrc};

use std::fmt;

#[derive(thiserror::Error, Debug)]
pub struct Error {
    pub line: usize,
    pub message: String,
}

impl Error {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.line, self.message)
    }
}

/// Assemble `input` into a stream of 32-bit instruction words.
pub fn assemble(input: &str) -> Result<Vec<u32>, Error> {
    gen::gen_words(&parse::parse(input)?)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn countdown_program_assembles_to_five_words() {
        let words = assemble(
            r#"
            MOV $127 r1
&loop:      ADD $-1 r1
            BZ  $&end
            JMP $&loop
&end:       DIE
            "#,
        )
        .unwrap();
        assert_eq!(words.len(), 5);
    }
}
