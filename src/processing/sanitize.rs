//! Text clean-up applied around provider calls.

/// Drop markdown markers the speech engine would read aloud (`#`, `*`, `-`).
pub fn strip_speech_markup(text: &str) -> String {
    text.chars()
        .filter(|ch| !matches!(ch, '#' | '*' | '-'))
        .collect()
}

/// Remove emphasis and quoting (`*`, `"`) from a generated heading and trim it.
pub fn clean_heading(raw: &str) -> String {
    raw.chars()
        .filter(|ch| !matches!(ch, '*' | '"'))
        .collect::<String>()
        .trim()
        .to_string()
}
