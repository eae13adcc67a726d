//! Cleans raw model output before it is committed as an artifact.

use crate::placement::bare_tag;
use regex::Regex;
use std::sync::OnceLock;

fn reasoning_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Greedy: runs to the last closing tag.
    RE.get_or_init(|| Regex::new(r"(?is)^\s*<think>.*</think>\s*").expect("static regex is valid"))
}

/// Removes a leading `<think>...</think>` block and the whitespace after it.
pub fn strip_reasoning(text: &str) -> &str {
    match reasoning_block().find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

/// Drops every line that is the bare tag or starts with the tag marker.
///
/// The canonical `#label/path` line is always rewritten at commit time, so any
/// tag line the model echoes is noise. Kept lines keep their own line endings.
pub fn strip_tag_lines(text: &str, tag_label: &str) -> String {
    let bare = bare_tag(tag_label);
    let marker = format!("{bare}/");
    text.split_inclusive('\n')
        .filter(|line| {
            let line = line.trim();
            line != bare && !line.starts_with(&marker)
        })
        .collect()
}

pub fn sanitize(text: &str, tag_label: &str) -> String {
    let text = strip_reasoning(text);
    strip_tag_lines(text, tag_label).trim().to_string()
}
