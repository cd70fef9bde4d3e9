//! Integration tests for docmint-extractor
//!
//! These tests run the ingest, chunk, extract and persist cycle against a
//! temporary corpus and a scripted model.

use docmint_domain::DocumentFormat;
use docmint_extractor::{
    ExtractorConfig, Ingestor, JsonlSink, Pipeline, TabularCorpus, TextChunker, Workflow,
    DEFAULT_KNOWN_PROJECTS,
};
use docmint_llm::{ExtractionClient, MockProvider, RetryPolicy};
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &[u8]) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn known_projects() -> Vec<String> {
    DEFAULT_KNOWN_PROJECTS.iter().map(|s| s.to_string()).collect()
}

fn fast_client(provider: MockProvider) -> ExtractionClient<MockProvider> {
    let policy = RetryPolicy {
        max_attempts: Some(1),
        initial_delay_ms: 1,
        max_delay_ms: 1,
        multiplier: 1.0,
    };
    ExtractionClient::new(provider, policy)
}

fn read_jsonl(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_short_markdown_file_becomes_one_labelled_segment() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "yosys_hq/docs/synth.md",
        b"# synth\n\nThe `synth` command runs a generic synthesis script.\n",
    );

    let ingestor = Ingestor::new(dir.path(), known_projects());
    let documents: Vec<_> = ingestor.documents().collect();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].format, DocumentFormat::LightweightMarkup);

    let segments = TextChunker::new(4096, 512).chunk_document(&documents[0]);
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].source_label, "yosys_hq");
    assert!(segments[0].text.contains("generic synthesis script"));
}

#[test]
fn test_bad_files_are_skipped_not_fatal() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "klayout/broken.pdf", b"%PDF-1.4 truncated garbage");
    write(dir.path(), "klayout/empty.html", b"<html><body>   </body></html>");
    write(dir.path(), "klayout/ok.html", b"<html><body><p>Layer maps.</p></body></html>");
    write(dir.path(), "klayout/notes.txt", b"ignored extension");

    let ingestor = Ingestor::new(dir.path(), known_projects());
    assert_eq!(ingestor.discover().len(), 3);

    let results: Vec<_> = ingestor.scan().collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(results.iter().filter(|r| r.is_err()).count(), 2);

    let documents: Vec<_> = ingestor.documents().collect();
    assert_eq!(documents[0].source_label, "klayout");
    assert_eq!(documents[0].text, "Layer maps.");
}

#[tokio::test]
async fn test_corpus_run_writes_jsonl_with_provenance() {
    let dir = TempDir::new().unwrap();
    let corpus = dir.path().join("data");
    write(&corpus, "OpenSTA/report_checks.md", b"Use report_checks to list timing paths.");
    write(&corpus, "misc/readme.md", b"Unrelated project notes.");
    let output = dir.path().join("out");

    let provider = MockProvider::new(
        "```json\n[{\"type\": \"Terminology explanation\", \"query\": \"q\", \"answer\": \"a\"}]\n```",
    );
    let config = ExtractorConfig {
        output_dir: output.clone(),
        shuffle_seed: Some(1),
        ..ExtractorConfig::default()
    };
    let sink = JsonlSink::for_workflow(&config.output_dir, Workflow::Qa).unwrap();
    let pipeline = Pipeline::new(Workflow::Qa, fast_client(provider.clone()), sink, config.clone()).unwrap();

    let report = pipeline.run_corpus(&Ingestor::new(&corpus, config.known_projects.clone())).await;

    assert_eq!(report.documents_loaded, 2);
    assert_eq!(report.segments_total, 2);
    assert_eq!(report.records_written, 2);
    assert_eq!(provider.call_count(), 2);

    let lines = read_jsonl(&output.join("qa_dataset.jsonl"));
    assert_eq!(lines.len(), 2);
    let mut sources: Vec<&str> = lines.iter().map(|l| l["source"].as_str().unwrap()).collect();
    sources.sort();
    assert_eq!(sources, vec!["OpenSTA", "unknown"]);
    for line in &lines {
        assert!(!line["reference"].as_str().unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_tabular_rows_run_through_code_workflow() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "OpenROAD/Prompt-Script/api.csv",
        b"prompt,code\n\"Read lef\",\"tech.readLef(p)\"\n\"Read def\",\"design.readDef(p)\"\n",
    );

    let corpus = TabularCorpus::load(dir.path(), DEFAULT_KNOWN_PROJECTS);
    let provider = MockProvider::new(
        "```json\n{\"definition_description\": \"d\", \"functionality_description\": \"f\", \
         \"inputs\": {\"p\": \"path\"}, \"outputs\": \"o\", \"code_paradigm\": \"c\"}\n```",
    );
    let output = dir.path().join("processed");
    let sink = JsonlSink::for_workflow(&output, Workflow::Code).unwrap();
    let pipeline = Pipeline::new(
        Workflow::Code,
        fast_client(provider),
        sink,
        ExtractorConfig::default(),
    )
    .unwrap();

    let report = pipeline.run_segments(corpus.code.clone()).await;
    assert_eq!(report.records_written, 2);

    let lines = read_jsonl(&output.join("script_format.jsonl"));
    assert_eq!(lines.len(), 2);
    assert!(lines
        .iter()
        .all(|l| l["source"] == "OpenROAD" && l["reference"].as_str().unwrap().starts_with("query: ")));
}
