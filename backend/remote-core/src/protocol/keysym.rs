/// Keysym the server expects for `key`.
///
/// The server identifies letter keys by their lower-case ASCII code, so `'W'`
/// and `'w'` both map to 119. Non-ASCII characters pass through as their code
/// point.
pub fn keysym(key: char) -> u32 {
    u32::from(key.to_ascii_lowercase())
}
