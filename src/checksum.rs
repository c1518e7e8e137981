/// Internet checksum (RFC 792 / RFC 1071) over an arbitrary buffer.
///
/// Bytes are paired big-endian into 16-bit words. An odd trailing byte is the
/// high byte of a zero-padded word. Carries are folded back into the low 16
/// bits until none remain, and the one's complement is returned.
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum: u64 = 0;
    let mut words = data.chunks_exact(2);
    for word in &mut words {
        sum += u64::from(u16::from_be_bytes([word[0], word[1]]));
    }
    if let [last] = words.remainder() {
        sum += u64::from(*last) << 8;
    }

    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}

/// A message carrying its own checksum sums to zero.
pub fn verify(data: &[u8]) -> bool {
    checksum(data) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_buffer_even_length() {
        for len in [0usize, 2, 8, 64, 1500] {
            assert_eq!(checksum(&vec![0u8; len]), 0xffff, "len {}", len);
        }
    }

    #[test]
    fn odd_length_pads_high_byte() {
        // 0x0102 + 0x0300 = 0x0402
        assert_eq!(checksum(&[0x01, 0x02, 0x03]), !0x0402);
        // 0xffff + 0xff00 = 0x1feff -> 0xfeff + 0x1 = 0xff00
        assert_eq!(checksum(&[0xff, 0xff, 0xff]), 0x00ff);
        assert_eq!(checksum(&[0xab]), !0xab00);
    }

    #[test]
    fn rfc1071_example() {
        // RFC 1071 section 3: words 0001 f203 f4f5 f6f7 sum to 0xddf2.
        let data = [0x00, 0x01, 0xf2, 0x03, 0xf4, 0xf5, 0xf6, 0xf7];
        assert_eq!(checksum(&data), !0xddf2);
    }

    #[test]
    fn echo_request_header() {
        let mut msg = [0x08, 0x00, 0x00, 0x00, 0x00, 0x05, 0x00, 0x05];
        let sum = checksum(&msg);
        assert_eq!(sum, !0x0810);
        msg[2..4].copy_from_slice(&sum.to_be_bytes());
        assert!(verify(&msg));
    }

    proptest! {
        #[test]
        fn written_back_checksum_verifies(mut data in proptest::collection::vec(any::<u8>(), 4..2048)) {
            data[2] = 0;
            data[3] = 0;
            let sum = checksum(&data);
            data[2..4].copy_from_slice(&sum.to_be_bytes());
            prop_assert_eq!(checksum(&data), 0);
        }

        #[test]
        fn corrupted_word_fails_verification(mut data in proptest::collection::vec(any::<u8>(), 8..256), flip in 1u8..=255) {
            data[2] = 0;
            data[3] = 0;
            let sum = checksum(&data);
            data[2..4].copy_from_slice(&sum.to_be_bytes());
            data[0] ^= flip;
            prop_assert!(!verify(&data));
        }
    }
}
