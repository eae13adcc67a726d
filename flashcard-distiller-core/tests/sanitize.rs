use flashcard_distiller_core::sanitize::{sanitize, strip_reasoning, strip_tag_lines};

#[test]
fn test_reasoning_block_is_removed() {
    assert_eq!(
        sanitize("<think>scratch</think>\n\nFront :: Back", "flashcards"),
        "Front :: Back"
    );
}

#[test]
fn test_reasoning_block_is_case_insensitive_and_multiline() {
    let raw = "  <THINK>\nline one\nline two\n</Think>\n\nQ :: A";
    assert_eq!(sanitize(raw, "flashcards"), "Q :: A");
}

#[test]
fn test_reasoning_removal_is_greedy() {
    let raw = "<think>a</think>middle<think>b</think>\nQ :: A";
    assert_eq!(strip_reasoning(raw), "Q :: A");
}

#[test]
fn test_reasoning_block_not_at_start_is_kept() {
    let raw = "Q :: A\n<think>late</think>";
    assert_eq!(strip_reasoning(raw), raw);
}

#[test]
fn test_echoed_bare_tag_is_removed() {
    assert_eq!(
        sanitize("#flashcards\nFront :: Back", "flashcards"),
        "Front :: Back"
    );
}

#[test]
fn test_echoed_path_tag_lines_are_removed() {
    let raw = "#flashcards/Books/Fables\n\nQ1 :: A1\n#flashcards\nQ2 :: A2";
    assert_eq!(strip_tag_lines(raw, "flashcards"), "\nQ1 :: A1\nQ2 :: A2");
    assert_eq!(sanitize(raw, "flashcards"), "Q1 :: A1\nQ2 :: A2");
}

#[test]
fn test_other_tags_are_kept() {
    let raw = "#flashcardsextra\n#biology\nQ :: A";
    assert_eq!(sanitize(raw, "flashcards"), raw);
}

#[test]
fn test_only_noise_sanitizes_to_empty() {
    assert_eq!(sanitize("<think>nothing useful</think>\n#flashcards\n  ", "flashcards"), "");
}

#[test]
fn test_kept_lines_keep_their_line_endings() {
    let raw = "#flashcards\r\nQ1 :: A1\r\nQ2 :: A2\r\n";
    assert_eq!(strip_tag_lines(raw, "flashcards"), "Q1 :: A1\r\nQ2 :: A2\r\n");
    assert_eq!(sanitize(raw, "flashcards"), "Q1 :: A1\r\nQ2 :: A2");
}
