//! IPv4 header checksum

/// One's-complement checksum of an IPv4 header
///
/// Sums the header as big-endian 16-bit words, folds the carries back in
/// twice and complements the result. The checksum field itself must be zero
/// when computing; a trailing odd byte is padded with zero.
pub fn ipv4_checksum(header: &[u8]) -> u16 {
    !fold(word_sum(header))
}

/// Raw 32-bit sum of big-endian words
pub fn word_sum(data: &[u8]) -> u32 {
    let mut chunks = data.chunks_exact(2);
    let mut sum: u32 = chunks
        .by_ref()
        .map(|pair| u32::from(u16::from_be_bytes([pair[0], pair[1]])))
        .sum();
    if let [last] = chunks.remainder() {
        sum += u32::from(*last) << 8;
    }
    sum
}

/// End-around carry fold to 16 bits
pub fn fold(sum: u32) -> u16 {
    let once = (sum & 0xFFFF) + (sum >> 16);
    let twice = (once & 0xFFFF) + (once >> 16);
    twice as u16
}
