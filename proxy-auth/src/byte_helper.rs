pub(crate) fn u16_to_bytes(num: u16) -> [u8; 2] {
    [(num & 0xFF) as u8, ((num >> 8) & 0xFF) as u8]
}

pub(crate) fn u32_to_bytes(num: u32) -> [u8; 4] {
    [
        (num & 0xFF) as u8,
        ((num >> 8) & 0xFF) as u8,
        ((num >> 16) & 0xFF) as u8,
        ((num >> 24) & 0xFF) as u8,
    ]
}

pub(crate) fn bytes_to_u64(bytes: &[u8]) -> u64 {
    (bytes[0] as u64) |
    ((bytes[1] as u64) << 8) |
    ((bytes[2] as u64) << 16) |
    ((bytes[3] as u64) << 24) |
    ((bytes[4] as u64) << 32) |
    ((bytes[5] as u64) << 40) |
    ((bytes[6] as u64) << 48) |
    ((bytes[7] as u64) << 56)
}

pub(crate) fn u64_to_bytes(num: u64) -> [u8; 8] {
    [
        (num & 0xFF) as u8,
        ((num >> 8) & 0xFF) as u8,
        ((num >> 16) & 0xFF) as u8,
        ((num >> 24) & 0xFF) as u8,
        ((num >> 32) & 0xFF) as u8,
        ((num >> 40) & 0xFF) as u8,
        ((num >> 48) & 0xFF) as u8,
        ((num >> 56) & 0xFF) as u8,
    ]
}

/// UTF-16LE encoding used for every "unicode" string on the NTLM wire.
pub(crate) fn to_utf16_bytes(text: &str) -> Vec<u8> {
    text.encode_utf16().map(u16_to_bytes).collect::<Vec<[u8; 2]>>().concat()
}

pub(crate) fn from_utf16_bytes(bytes: &[u8]) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect::<Vec<u16>>();
    String::from_utf16_lossy(&units)
}
