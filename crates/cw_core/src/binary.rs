//! Conversions between the engine's word-oriented program image and the
//! little-endian binary file format the CLI's compiled-binary inputs use.

use crate::machine::MachineError;

/// Parse a little-endian byte stream into a word-oriented program image.
/// The engine treats code and data uniformly, so every word is just a word.
pub fn from_bytes(bytes: &[u8]) -> Result<Vec<u32>, MachineError> {
    if bytes.len() % 4 != 0 {
        return Err(MachineError::MisalignedBinary { len: bytes.len() });
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes(chunk.try_into().unwrap()))
        .collect())
}

/// Serialize a program image into its little-endian binary file form.
pub fn to_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_through_bytes() {
        let words = vec![0x0102_0304, 0xdead_beef, 0];
        let bytes = to_bytes(&words);
        assert_eq!(from_bytes(&bytes).unwrap(), words);
    }

    #[test]
    fn little_endian_byte_order() {
        let bytes = to_bytes(&[0x0102_0304]);
        assert_eq!(bytes, vec![0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn rejects_a_length_not_a_multiple_of_four() {
        assert!(matches!(
            from_bytes(&[1, 2, 3]),
            Err(MachineError::MisalignedBinary { len: 3 })
        ));
    }
}
