use crate::ins::Mode;
use crate::Error;

use std::str::Chars;

/// The type of token and the data associated with it.
#[derive(Debug, PartialEq, Eq)]
pub enum TokTy<'a> {
    /// `&name:` anchored at the start of a line.
    Label(&'a str),
    /// A mnemonic, e.g. `ADD`.
    Id(&'a str),
    /// An addressing-mode prefix followed by a literal, e.g. `$-1`.
    Num(Mode, i32),
    /// An addressing-mode prefix followed by a label reference, e.g. `$&loop`.
    LabelRef(Mode, &'a str),
    Eof,
}

pub struct Tok<'a> {
    pub ty: TokTy<'a>,
    pub line: usize,
}

impl<'a> Tok<'a> {
    fn new(line: usize, ty: TokTy<'a>) -> Self {
        Self { line, ty }
    }
}

#[derive(Clone)]
struct Lexer<'a> {
    chars: Chars<'a>,
    line: usize,
}

fn is_id_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_id_con(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t')
}

fn mode_of(c: char) -> Option<Mode> {
    match c {
        '$' => Some(Mode::Immediate),
        '@' => Some(Mode::Relative),
        '#' => Some(Mode::Computed),
        'r' => Some(Mode::Register),
        _ => None,
    }
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Lexer<'a> {
        Self {
            chars: input.chars(),
            line: 1,
        }
    }

    fn err(&self, msg: impl Into<String>) -> Error {
        Error::new(self.line, msg)
    }

    /// Peek one character ahead.
    fn first(&self) -> char {
        self.chars.clone().next().unwrap_or('\0')
    }

    /// If the whole input has been consumed.
    fn is_done(&mut self) -> bool {
        self.chars.as_str().is_empty()
    }

    /// Consume a single character.
    fn eat(&mut self) -> Option<char> {
        self.chars.next()
    }

    /// Consume a single character if it matches `c`.
    fn eat_char(&mut self, c: char) -> bool {
        if self.first() == c {
            self.eat();
            true
        } else {
            false
        }
    }

    /// Consume characters while `pred` holds. Returns the amount consumed.
    fn eat_while(&mut self, mut pred: impl FnMut(char) -> bool) -> usize {
        let mut eaten = 0;
        while pred(self.first()) && !self.is_done() {
            self.eat();
            eaten += 1;
        }
        eaten
    }

    /// Consume whitespace and `;` comments, tracking line numbers.
    fn eat_whitespace(&mut self) {
        loop {
            self.eat_while(is_whitespace);
            match self.first() {
                ';' => {
                    self.eat_while(|c| c != '\n');
                }
                '\n' => {
                    self.line += 1;
                    self.eat();
                }
                _ => break,
            }
        }
    }

    /// Consume an identifier, returning a slice of the source.
    fn eat_id(&mut self) -> &'a str {
        let as_str = self.chars.as_str();
        let eaten = if is_id_start(self.first()) {
            self.eat();
            1
        } else {
            0
        };
        let eaten = eaten + self.eat_while(is_id_con);
        &as_str[..eaten]
    }

    /// Consume a (possibly negative) decimal integer.
    fn eat_num(&mut self) -> Result<i32, Error> {
        let neg = self.eat_char('-');
        if !self.first().is_ascii_digit() {
            return Err(self.err("expected a number"));
        }
        let as_str = self.chars.as_str();
        let eaten = self.eat_while(|c| c.is_ascii_digit());
        let val: i32 = as_str[..eaten]
            .parse()
            .map_err(|err| self.err(format!("invalid number: {err}")))?;
        Ok(if neg { -val } else { val })
    }

    fn tok(&self, ty: TokTy<'a>) -> Tok<'a> {
        Tok::new(self.line, ty)
    }

    /// Scan an operand, given that its addressing-mode prefix has just been seen.
    fn eat_operand(&mut self, mode: Mode) -> Result<TokTy<'a>, Error> {
        self.eat();
        if self.eat_char('&') {
            let id = self.eat_id();
            if id.is_empty() {
                return Err(self.err("expected a label name after '&'"));
            }
            Ok(TokTy::LabelRef(mode, id))
        } else {
            let num = self.eat_num()?;
            Ok(TokTy::Num(mode, num))
        }
    }

    /// Scan the next token. Returns `TokTy::Eof` once the input is exhausted.
    fn next_tok(&mut self) -> Result<Tok<'a>, Error> {
        self.eat_whitespace();
        let c = self.first();
        if c == '&' {
            self.eat();
            let id = self.eat_id();
            if id.is_empty() {
                return Err(self.err("expected a label name after '&'"));
            }
            if !self.eat_char(':') {
                return Err(self.err("expected ':' after label definition"));
            }
            return Ok(self.tok(TokTy::Label(id)));
        }
        if is_id_start(c) {
            return Ok(self.tok(TokTy::Id(self.eat_id())));
        }
        if let Some(mode) = mode_of(c) {
            let ty = self.eat_operand(mode)?;
            return Ok(self.tok(ty));
        }
        if c == '\0' {
            return Ok(self.tok(TokTy::Eof));
        }
        Err(self.err(format!("invalid token '{c}'")))
    }
}

/// Make an iterator of tokens from an input string.
pub fn tokenize(input: &str) -> impl Iterator<Item = Result<Tok, Error>> + Clone + '_ {
    let mut lexer = Lexer::new(input);
    std::iter::from_fn(move || match lexer.next_tok() {
        Ok(t) if t.ty == TokTy::Eof => None,
        t => Some(t),
    })
}

#[test]
fn comment() {
    let input = r#"
        ; Comment comment comment.
        ADD $-1 r1 ; trailing comment
        ; Comment comment comment.
    "#;
    let expected = [
        TokTy::Id("ADD"),
        TokTy::Num(Mode::Immediate, -1),
        TokTy::Num(Mode::Register, 1),
    ];
    let res: Vec<TokTy> = tokenize(input).map(|t| t.unwrap().ty).collect();
    for (got, exp) in res.iter().zip(expected) {
        assert_eq!(*got, exp);
    }
}

#[test]
fn labels_and_refs() {
    let input = r#"
        MOV $127 r1
&loop:  ADD $-1 r1
        BZ  $&end
        JMP $&loop
&end:   DIE
    "#;
    let toks: Vec<TokTy> = tokenize(input).map(|t| t.unwrap().ty).collect();
    assert_eq!(toks[0], TokTy::Id("MOV"));
    assert_eq!(toks[1], TokTy::Num(Mode::Immediate, 127));
    assert_eq!(toks[2], TokTy::Num(Mode::Register, 1));
    assert_eq!(toks[3], TokTy::Label("loop"));
    assert_eq!(toks[4], TokTy::Id("ADD"));
    assert!(matches!(toks[8], TokTy::LabelRef(Mode::Immediate, "end")));
}
