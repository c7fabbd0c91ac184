//! Splitting a raw instruction word into its opcode and two raw operand fields.

use cw_util::extract;

/// An addressing mode tag plus its raw (un-sign-extended) 12-bit field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawOperand {
    pub mode: u32,
    pub value: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub opcode: u32,
    pub a: RawOperand,
    pub b: RawOperand,
}

/// Split `word` into an opcode and two raw operands, per the bit layout:
/// opcode in bits 0-3, operand-A mode in 4-5, operand-B mode in 6-7,
/// operand-A value in 8-19, operand-B value in 20-31.
pub fn decode(word: u32) -> Decoded {
    Decoded {
        opcode: extract(word, 0, 4),
        a: RawOperand {
            mode: extract(word, 4, 2),
            value: extract(word, 8, 12),
        },
        b: RawOperand {
            mode: extract(word, 6, 2),
            value: extract(word, 20, 12),
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_every_field() {
        // opcode=5, modeA=2, valA=0b1010, modeB=1, valB=0b11
        let word = 5 | (2 << 4) | (1 << 6) | (0b1010 << 8) | (0b11 << 20);
        let d = decode(word);
        assert_eq!(d.opcode, 5);
        assert_eq!(d.a.mode, 2);
        assert_eq!(d.a.value, 0b1010);
        assert_eq!(d.b.mode, 1);
        assert_eq!(d.b.value, 0b11);
    }
}
