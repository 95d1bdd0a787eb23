//! Integration tests for ragprompt
//!
//! These tests exercise the public library API end to end: template
//! resolution, rendering properties and full prompt assembly.

use proptest::prelude::*;
use ragprompt::{
    AssembleOptions, Config, MissingVariablePolicy, PromptAssembler, PromptError, PromptKind, PromptLoader,
    RetrievedChunk, TemplateSource, Variables, placeholders,
};
use tempfile::TempDir;

// =============================================================================
// Rendering Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_document_contains_text_and_number(n in 1usize..100_000, text in "[^{}]{0,200}") {
        let loader = PromptLoader::embedded_only().unwrap();
        let block = loader.render_document(n, &text).unwrap();
        let header = format!("Document #{}:", n);
        prop_assert!(block.contains(&text));
        prop_assert!(block.contains(&header));
        prop_assert!(placeholders(&block).unwrap().is_empty());
    }

    #[test]
    fn prop_chunk_text_is_opaque(text in any::<String>()) {
        let loader = PromptLoader::embedded_only().unwrap();
        let block = loader.render_document(1, &text).unwrap();
        prop_assert_eq!(block, format!("---\nDocument #1:\n{}\n---\n", text));
    }

    #[test]
    fn prop_footer_contains_query_verbatim(query in any::<String>()) {
        let loader = PromptLoader::embedded_only().unwrap();
        let footer = loader.render_footer(&query).unwrap();
        let expected = format!("Question: {}\n\nAnswer:", query);
        prop_assert!(footer.ends_with(&expected));
    }
}

#[test]
fn test_system_prompt_is_invariant() {
    let first = PromptLoader::embedded_only().unwrap().render_system().unwrap();
    let loader = PromptLoader::embedded_only().unwrap();
    for _ in 0..5 {
        assert_eq!(loader.render_system().unwrap(), first);
    }
}

// =============================================================================
// Assembly
// =============================================================================

#[test]
fn test_four_fragments_in_order() {
    let loader = PromptLoader::embedded_only().unwrap();
    let system = loader.render_system().unwrap();
    let doc1 = loader.render_document(1, "X is the 24th letter.").unwrap();
    let doc2 = loader.render_document(2, "X can mean unknown.").unwrap();
    let footer = loader.render_footer("What is X?").unwrap();

    let chunks = vec![
        RetrievedChunk::new("X is the 24th letter."),
        RetrievedChunk::new("X can mean unknown."),
    ];
    let prompt = PromptAssembler::new(&loader).assemble("What is X?", &chunks).unwrap();
    let text = prompt.text();

    let mut cursor = 0;
    for fragment in [&system, &doc1, &doc2, &footer] {
        let found = text[cursor..].find(fragment.as_str()).expect("fragment present after previous one");
        cursor += found + fragment.len();
    }
    assert_eq!(cursor, text.len());
    assert_eq!(text, format!("{}\n\n{}{}{}", system, doc1, doc2, footer));
}

#[test]
fn test_assembly_respects_config_limits() {
    let yaml = "assembly:\n  max-documents: 1\n  separator: \"\\n---8<---\\n\"\n";
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    let loader = PromptLoader::embedded_only().unwrap();

    let chunks: Vec<RetrievedChunk> = ["one", "two", "three"].into_iter().map(RetrievedChunk::from).collect();
    let prompt = PromptAssembler::new(&loader)
        .with_options(AssembleOptions::from(&config.assembly))
        .assemble("q", &chunks)
        .unwrap();

    assert_eq!(prompt.document_count(), 1);
    assert!(prompt.text().contains("\n---8<---\n---\nDocument #1:\none\n"));
}

// =============================================================================
// Overrides and Policies
// =============================================================================

#[test]
fn test_override_chain_end_to_end() {
    let temp = TempDir::new().unwrap();
    let repo = temp.path().join("prompts");
    let user = temp.path().join(".ragprompt/prompts");
    std::fs::create_dir_all(&repo).unwrap();
    std::fs::create_dir_all(&user).unwrap();
    std::fs::write(repo.join("system.pmt"), "Repo system.").unwrap();
    std::fs::write(repo.join("footer.pmt"), "Repo footer: {{query}}").unwrap();
    std::fs::write(user.join("footer.pmt"), "User footer: {{query}}").unwrap();

    let loader = PromptLoader::new(temp.path()).unwrap();
    assert_eq!(loader.render_system().unwrap(), "Repo system.");
    assert_eq!(loader.render_footer("why?").unwrap(), "User footer: why?");
    assert_eq!(loader.source(PromptKind::Document), Some(&TemplateSource::Embedded));
    assert_eq!(
        loader.source(PromptKind::Footer),
        Some(&TemplateSource::User(user.join("footer.pmt")))
    );
}

#[test]
fn test_missing_variable_never_silent() {
    let temp = TempDir::new().unwrap();
    let user = temp.path().join(".ragprompt/prompts");
    std::fs::create_dir_all(&user).unwrap();
    std::fs::write(user.join("footer.pmt"), "[{{lang}}] {{query}}").unwrap();

    let strict = PromptLoader::new(temp.path()).unwrap();
    let err = strict.render_footer("q").unwrap_err();
    assert!(matches!(
        err,
        PromptError::MissingVariable { ref template, ref variable } if template == "footer" && variable == "lang"
    ));

    let preserve = PromptLoader::new(temp.path())
        .unwrap()
        .with_policy(MissingVariablePolicy::Preserve);
    assert_eq!(preserve.render_footer("q").unwrap(), "[{{lang}}] q");

    let vars = Variables::new().with("lang", "en").with("query", "q");
    assert_eq!(strict.render(PromptKind::Footer, &vars).unwrap(), "[en] q");
}

#[test]
fn test_preserve_never_drops_nested_placeholders() {
    let temp = TempDir::new().unwrap();
    let user = temp.path().join(".ragprompt/prompts");
    std::fs::create_dir_all(&user).unwrap();
    std::fs::write(user.join("footer.pmt"), "Q: {{query}} by {{user.name}} in {{doc-lang}}").unwrap();

    let loader = PromptLoader::new(temp.path())
        .unwrap()
        .with_policy(MissingVariablePolicy::Preserve);
    let footer = loader.render_footer("q").unwrap();
    assert_eq!(footer, "Q: q by {{user.name}} in {{doc-lang}}");
    let left: Vec<String> = placeholders(&footer).unwrap().into_iter().collect();
    assert_eq!(left, vec!["doc-lang".to_string(), "user.name".to_string()]);
}

#[test]
fn test_loader_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<PromptLoader>();

    let loader = std::sync::Arc::new(PromptLoader::embedded_only().unwrap());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let loader = loader.clone();
            std::thread::spawn(move || loader.render_footer(&format!("question {}", i)).unwrap())
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert!(handle.join().unwrap().contains(&format!("Question: question {}", i)));
    }
}
