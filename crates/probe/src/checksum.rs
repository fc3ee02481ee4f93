/// Internet checksum (RFC 1071) over an ICMP header plus payload.
///
/// One's complement sum of big-endian 16-bit words with carry folding,
/// complemented at the end. An odd trailing byte contributes the high byte
/// of a final word, so the wire result matches implementations that sum
/// host-order words and byte-swap once at the end.
pub fn checksum16(data: &[u8]) -> u16 {
    let mut sum = 0u32;
    let mut words = data.chunks_exact(2);
    for word in words.by_ref() {
        sum += u32::from(u16::from_be_bytes([word[0], word[1]]));
    }
    if let Some(&odd) = words.remainder().first() {
        sum += u32::from(odd) << 8;
    }
    while sum > 0xffff {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}
