use flashcard_distiller_core::generation::{
    extract_text, select_provider, GenerationRequest, GenerationResult, ProviderInfo,
    StreamAccumulator,
};
use serde_json::json;

fn providers(ids: &[&str]) -> Vec<ProviderInfo> {
    ids.iter()
        .map(|id| ProviderInfo {
            id: id.to_string(),
            name: format!("Provider {id}"),
        })
        .collect()
}

fn structured(value: serde_json::Value) -> GenerationResult {
    GenerationResult::from(value)
}

#[test]
fn test_prompt_joins_instructions_and_note_with_blank_line() {
    let request = GenerationRequest {
        provider_id: "p".into(),
        prompt_text: "Make cards".into(),
        source_content: "Note body".into(),
    };
    assert_eq!(request.prompt(), "Make cards\n\nNote body");
}

#[test]
fn test_accumulator_keeps_latest_cumulative_text() {
    let acc = StreamAccumulator::new();
    assert_eq!(acc.latest(), None);
    let writer = acc.clone();
    writer.update("Q");
    writer.update("Q :: A");
    assert_eq!(acc.latest().as_deref(), Some("Q :: A"));
}

#[test]
fn test_extract_prefers_non_empty_string_result() {
    let result = GenerationResult::Plain("Q :: A".into());
    assert_eq!(
        extract_text(&result, Some("streamed")).as_deref(),
        Some("Q :: A")
    );
}

#[test]
fn test_extract_falls_back_to_stream_buffer() {
    let result = GenerationResult::Plain("   ".into());
    assert_eq!(
        extract_text(&result, Some("Q :: A")).as_deref(),
        Some("Q :: A")
    );

    let object = structured(json!({ "text": "from field" }));
    assert_eq!(
        extract_text(&object, Some("from stream")).as_deref(),
        Some("from stream"),
        "a non-empty stream buffer wins over structured fields"
    );
}

#[test]
fn test_extract_checks_fields_in_order() {
    let result = structured(json!({
        "message": "third",
        "content": "",
        "response": "second",
    }));
    assert_eq!(extract_text(&result, None).as_deref(), Some("second"));
}

#[test]
fn test_extract_reads_openai_style_choices() {
    let result = structured(json!({
        "id": "cmpl-1",
        "choices": [{ "message": { "role": "assistant", "content": "Q :: A" } }]
    }));
    assert_eq!(extract_text(&result, None).as_deref(), Some("Q :: A"));
}

#[test]
fn test_extract_dumps_structure_without_text_field() {
    let result = structured(json!({ "status": "ok", "tokens": 3 }));
    let dumped = extract_text(&result, None).expect("structure should be dumped");
    assert!(dumped.contains("\"status\""), "got: {dumped}");
    assert!(dumped.contains("\"tokens\""), "got: {dumped}");
}

#[test]
fn test_extract_stringifies_other_values() {
    let result = GenerationResult::Opaque(json!(42));
    assert_eq!(extract_text(&result, None).as_deref(), Some("42"));
}

#[test]
fn test_extract_empty_results_yield_none() {
    assert_eq!(extract_text(&GenerationResult::Empty, None), None);
    assert_eq!(extract_text(&GenerationResult::Plain(String::new()), None), None);
    assert_eq!(extract_text(&GenerationResult::Streamed("\n".into()), Some(" ")), None);
}

#[test]
fn test_select_provider_precedence() {
    let available = providers(&["a", "b", "c"]);

    let chosen = select_provider("b", Some("c"), &available).map(|p| p.id.as_str());
    assert_eq!(chosen, Some("b"), "configured provider wins");

    let chosen = select_provider("gone", Some("c"), &available).map(|p| p.id.as_str());
    assert_eq!(chosen, Some("c"), "missing configured provider falls back to default");

    let chosen = select_provider("", Some("gone"), &available).map(|p| p.id.as_str());
    assert_eq!(chosen, Some("a"), "unresolvable default falls back to first");

    assert_eq!(select_provider("", None, &[]), None);
}
