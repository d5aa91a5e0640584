//! Pasted text → candidate lines

/// Split pasted text into trimmed, non-empty lines, keeping their order
///
/// Handles `\n` and `\r\n` endings. Never fails; blank input yields no lines.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
