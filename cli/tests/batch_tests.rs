use async_trait::async_trait;
use plainly_cli::{collect_inputs, load_glossary, read_document, readability_of, render_page, simplify_files};
use plainly_core::{
    GenerationConfig, GenerationError, ModelRegistry, Orchestrator, Settings, SimplificationLevel,
    SimplificationResult, TextGenerator,
};
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

/// Lowercases whatever it is asked to rewrite.
struct Lowercase;

#[async_trait]
impl TextGenerator for Lowercase {
    fn name(&self) -> &str {
        "lowercase"
    }

    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, GenerationError> {
        let input = prompt.strip_prefix(config.instruction.as_str()).unwrap_or(prompt);
        Ok(input.trim().to_lowercase())
    }
}

fn orchestrator(settings: &Settings) -> Orchestrator {
    Orchestrator::new(&ModelRegistry::new(Arc::new(Lowercase), Arc::new(Lowercase)), settings)
}

#[test]
fn collects_text_files_in_order() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("b.txt"), "B.").unwrap();
    fs::write(dir.path().join("nested/a.md"), "A.").unwrap();
    fs::write(dir.path().join("skip.json"), "{}").unwrap();

    let files = collect_inputs(dir.path()).unwrap();
    let names: Vec<String> = files.iter().map(|p| p.file_name().unwrap().to_string_lossy().into_owned()).collect();
    assert_eq!(names, vec!["b.txt", "a.md"]);
    assert!(collect_inputs(&dir.path().join("missing")).is_err());
}

#[test]
fn glossary_file_overlays_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("terms.json");
    fs::write(&path, r#"{"escrow": "money held by someone neutral", "tort": "a civil wrong"}"#).unwrap();

    let with_defaults = load_glossary(Some(&path), true).unwrap();
    let only_file = load_glossary(Some(&path), false).unwrap();
    assert_eq!(only_file.len(), 2);
    assert!(with_defaults.len() > only_file.len());
    assert_eq!(with_defaults.get("tort").unwrap().definition, "a civil wrong");
}

#[tokio::test]
async fn batch_writes_jsonl_and_html() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("lease.txt"), "The Lessee shall indemnify the Lessor.").unwrap();
    fs::write(input.join("huge.txt"), "word ".repeat(500)).unwrap();
    let output = dir.path().join("out/results.jsonl");
    let html = dir.path().join("html");

    let mut settings = Settings::default();
    settings.limits.max_document_chars = 1_000;
    let files = collect_inputs(&input).unwrap();
    let glossary = Arc::new(load_glossary(None, true).unwrap());

    let summary = simplify_files(&orchestrator(&settings), &files, SimplificationLevel::Basic, glossary, &output, Some(&html))
        .await
        .unwrap();
    assert_eq!(summary.documents, 2);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.complete, 1);

    let lines: Vec<SimplificationResult> = fs::read_to_string(&output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].simplified_text, "the lessee shall indemnify the lessor.");
    assert_eq!(lines[0].annotations.len(), 1);

    let page = fs::read_to_string(html.join("lease.html")).unwrap();
    assert!(page.contains("<span class=\"legal-term\""));
    assert_eq!(page, render_page(&lines[0]));
}

#[test]
fn readability_includes_interpretations() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("doc.txt");
    fs::write(&path, "You pay rent. We fix the roof.").unwrap();
    let out = readability_of(&read_document(&path).unwrap());
    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["word_count"], 7);
    assert_eq!(json["grade_interpretation"], out.grade_interpretation);
}
