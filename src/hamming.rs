//! Decoding of Hamming(8,4)-protected bytes, as used for the page number and subcode digits of a
//! teletext page header.
//!
//! Each protected byte carries four data bits (in bit positions 6, 4, 2 and 0) interleaved with
//! four parity bits.  Decoding here recovers the data nibble by lookup table; uncorrectable
//! double-bit errors are _not_ detected, which is a simplification relative to the full
//! ETS 300 706 scheme -- every input byte decodes to some nibble.

const fn build_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let byte = i as u8;
        table[i] = ((byte >> 6) & 1)
            | (((byte >> 4) & 1) << 1)
            | (((byte >> 2) & 1) << 2)
            | ((byte & 1) << 3);
        i += 1;
    }
    table
}

static HAMMING_8_4: [u8; 256] = build_table();

/// Decodes one Hamming(8,4)-protected byte into its 4-bit data value.
pub fn decode(value: u8) -> u8 {
    HAMMING_8_4[usize::from(value)]
}

/// Places the bits of the given nibble into the data-bit positions of a Hamming(8,4) byte,
/// leaving the parity bits zero.  Test fixture helper.
#[cfg(test)]
pub(crate) fn encode(nibble: u8) -> u8 {
    ((nibble & 1) << 6) | ((nibble & 0b10) << 3) | (nibble & 0b100) | (nibble >> 3)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn total() {
        for value in 0..=255u8 {
            assert!(decode(value) <= 0xf);
        }
    }

    #[test]
    fn round_trip() {
        for nibble in 0..=0xfu8 {
            assert_eq!(nibble, decode(encode(nibble)));
        }
    }

    #[test]
    fn parity_bits_ignored() {
        for nibble in 0..=0xfu8 {
            let byte = encode(nibble);
            for parity_pos in [7, 5, 3, 1] {
                assert_eq!(nibble, decode(byte | 1 << parity_pos));
            }
        }
    }
}
