pub mod bit;

pub use bit::{bit_clear, bit_set, bit_toggle, extract, of_signed, to_signed, Bit, BitSet};
