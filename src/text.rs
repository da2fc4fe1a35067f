/// Heuristic check that `data` is UTF-8 text rather than binary.
/// Any NUL byte marks the content as binary; otherwise the bytes must decode
/// as strict UTF-8.
pub fn is_text(data: &[u8]) -> bool {
    if data.contains(&0) {
        return false;
    }
    std::str::from_utf8(data).is_ok()
}

/// Decode bytes as UTF-8, replacing invalid sequences with U+FFFD.
pub fn decode_lossy(data: &[u8]) -> String {
    String::from_utf8_lossy(data).into_owned()
}
