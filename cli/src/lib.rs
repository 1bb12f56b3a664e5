use anyhow::{Context, Result};
use plainly_core::{
    analyze, entries_from_json, Document, GlossarySnapshot, Orchestrator, ReadabilityReport,
    SimplificationLevel, SimplificationResult,
};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

const TEXT_EXTENSIONS: &[&str] = &["txt", "text", "md"];

/// Files to process: `input` itself, or every text file under it in path order.
pub fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        anyhow::bail!("input path {} does not exist", input.display());
    }
    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file())
        .filter(|p| p.extension().and_then(|s| s.to_str()).map_or(false, |ext| TEXT_EXTENSIONS.contains(&ext)))
        .collect();
    files.sort();
    Ok(files)
}

pub fn read_document(path: &Path) -> Result<Document> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(Document::new(text).with_source(path.display().to_string()))
}

/// The built-in dictionary (unless `defaults` is false) with the entries of
/// `path` laid over it.
pub fn load_glossary(path: Option<&Path>, defaults: bool) -> Result<GlossarySnapshot> {
    let base = if defaults { GlossarySnapshot::legal_defaults() } else { GlossarySnapshot::empty() };
    let Some(path) = path else {
        return Ok(base);
    };
    let raw = fs::read_to_string(path).with_context(|| format!("reading glossary {}", path.display()))?;
    let entries = entries_from_json(&raw).with_context(|| format!("parsing glossary {}", path.display()))?;
    let snapshot = base.overlay(entries);
    tracing::info!(path = %path.display(), terms = snapshot.len(), "glossary loaded");
    Ok(snapshot)
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub documents: usize,
    pub complete: usize,
    pub partial: usize,
    pub rejected: usize,
}

/// Simplify every file and write one JSON result per line to `output`.
/// Documents the pipeline rejects are logged and skipped.
pub async fn simplify_files(
    orchestrator: &Orchestrator,
    files: &[PathBuf],
    level: SimplificationLevel,
    glossary: Arc<GlossarySnapshot>,
    output: &Path,
    html_dir: Option<&Path>,
) -> Result<BatchSummary> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    if let Some(dir) = html_dir {
        fs::create_dir_all(dir)?;
    }
    let mut out = BufWriter::new(File::create(output).with_context(|| format!("creating {}", output.display()))?);
    let mut summary = BatchSummary::default();

    for file in files {
        let doc = read_document(file)?;
        summary.documents += 1;
        let result = match orchestrator.run(&doc, level, glossary.clone()).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "document rejected");
                summary.rejected += 1;
                continue;
            }
        };
        if result.is_complete() {
            summary.complete += 1;
        } else {
            summary.partial += 1;
        }

        serde_json::to_writer(&mut out, &result)?;
        out.write_all(b"\n")?;
        if let Some(dir) = html_dir {
            let stem = file.file_stem().and_then(|s| s.to_str()).unwrap_or("document");
            fs::write(dir.join(format!("{stem}.html")), render_page(&result))?;
        }
    }
    out.flush()?;
    tracing::info!(
        documents = summary.documents,
        complete = summary.complete,
        partial = summary.partial,
        rejected = summary.rejected,
        output = %output.display(),
        "batch complete"
    );
    Ok(summary)
}

/// A standalone HTML page with the highlighted text and the summary.
pub fn render_page(result: &SimplificationResult) -> String {
    let title = result.source.as_deref().unwrap_or("Simplified document");
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n\
         <h1>{title}</h1>\n<h2>Summary</h2>\n<p>{summary}</p>\n<h2>Simplified ({level})</h2>\n\
         <div class=\"simplified\" style=\"white-space: pre-wrap\">{body}</div>\n\
         <p>Grade level {before} &rarr; {after}</p>\n</body>\n</html>\n",
        title = html_escape::encode_text(title),
        summary = html_escape::encode_text(&result.summary),
        level = result.level,
        body = result.highlighted_html(),
        before = result.original_readability.flesch_kincaid_grade,
        after = result.simplified_readability.flesch_kincaid_grade,
    )
}

#[derive(Debug, Serialize)]
pub struct ReadabilityOutput {
    #[serde(flatten)]
    pub report: ReadabilityReport,
    pub grade_interpretation: &'static str,
    pub ease_interpretation: &'static str,
}

pub fn readability_of(doc: &Document) -> ReadabilityOutput {
    let report = analyze(doc.normalized());
    ReadabilityOutput {
        report,
        grade_interpretation: report.grade_interpretation(),
        ease_interpretation: report.ease_interpretation(),
    }
}
