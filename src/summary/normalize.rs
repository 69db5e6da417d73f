/// Canonical ranking key: surrounding whitespace removed, lower-cased
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
