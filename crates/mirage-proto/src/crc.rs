//! CRC-32 (ISO-HDLC / "zip" variant) over payload bytes.
//!
//! Polynomial `0xEDB88320` (reflected), initial value `0xFFFFFFFF`, final XOR
//! `0xFFFFFFFF`. This is the same parameterization used by zlib/PNG/zip, just
//! implemented directly rather than pulled in from a crate: the whole
//! algorithm is a 256-entry table and an XOR loop, and the exact
//! parameterization (poly/init/final-xor) must match the wire contract in
//! the protocol description §4.1 bit-for-bit, which is easier to audit in eight lines here
//! than to verify against a general-purpose crate's feature flags.

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ 0xEDB8_8320 } else { crc >> 1 };
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

const TABLE: [u32; 256] = build_table();

/// Compute the CRC-32 of `data`.
///
/// Covers payload bytes only — never the frame header (see the protocol description §4.1:
/// "Header validation must happen before CRC").
#[must_use]
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ TABLE[index];
    }
    crc ^ 0xFFFF_FFFF
}

#[cfg(test)]
mod tests {
    use super::crc32;

    #[test]
    fn empty_input() {
        assert_eq!(crc32(&[]), 0);
    }

    #[test]
    fn known_vector() {
        // "123456789" is the standard CRC-32/ISO-HDLC check vector.
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn single_bit_flip_changes_crc() {
        let payload = b"mirage video transport payload bytes".to_vec();
        let mut flipped = payload.clone();
        flipped[0] ^= 0x01;
        assert_ne!(crc32(&payload), crc32(&flipped));
    }

    #[test]
    fn appending_a_byte_changes_crc() {
        let payload = b"some payload".to_vec();
        let mut extended = payload.clone();
        extended.push(0);
        assert_ne!(crc32(&payload), crc32(&extended));
    }
}
