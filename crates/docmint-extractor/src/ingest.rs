//! Corpus ingestion: discover files, read them into text, label their source
//!
//! Each supported file becomes one [`Document`]. A file that cannot be read or
//! yields no text is reported as [`ExtractorError::Ingestion`] and never stops
//! the rest of the corpus from loading.

use crate::error::ExtractorError;
use docmint_domain::{Document, DocumentFormat};
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Pick the source label for a path
///
/// Returns the known project whose name occurs in the path. When several
/// names occur (`OpenROAD` inside `OpenROAD_flow_script`) the longest wins;
/// equal lengths keep list order. No match yields an empty label.
pub fn infer_source_label<S: AsRef<str>>(path: &Path, known_projects: &[S]) -> String {
    let path = path.to_string_lossy();
    let mut best: Option<&str> = None;

    for project in known_projects {
        let project = project.as_ref();
        if project.is_empty() || !path.contains(project) {
            continue;
        }
        if best.map_or(true, |current| project.len() > current.len()) {
            best = Some(project);
        }
    }

    best.unwrap_or_default().to_string()
}

/// Render HTML to text, keeping only the `<body>` content
pub fn html_to_text(html: &str) -> String {
    let document = scraper::Html::parse_document(html);
    let mut content = String::new();

    let body = scraper::Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next());

    let pieces: Box<dyn Iterator<Item = &str>> = match body {
        Some(body) => Box::new(body.text()),
        None => Box::new(document.root_element().text()),
    };

    for text in pieces {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !content.is_empty() {
            content.push('\n');
        }
        content.push_str(trimmed);
    }

    content
}

/// Text nodes of an HTML fragment, trimmed and without empty runs
fn html_fragment_text(html: &str) -> Vec<String> {
    scraper::Html::parse_fragment(html)
        .root_element()
        .text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .collect()
}

/// Render markdown to plain text, dropping markup
///
/// Block boundaries become newlines (a blank line after paragraphs,
/// headings and code blocks) so the chunker still sees the structure.
/// Embedded HTML loses its tags but keeps its text.
pub fn markdown_to_text(markdown: &str) -> String {
    let mut text = String::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::Html(html) => {
                for line in html_fragment_text(&html) {
                    text.push_str(&line);
                    text.push('\n');
                }
            }
            Event::InlineHtml(html) => text.push_str(&html_fragment_text(&html).join(" ")),
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            Event::Start(Tag::Item) => {
                if !text.is_empty() && !text.ends_with('\n') {
                    text.push('\n');
                }
            }
            Event::End(
                TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::CodeBlock | TagEnd::HtmlBlock,
            ) => {
                let trimmed_len = text.trim_end_matches('\n').len();
                text.truncate(trimmed_len);
                text.push_str("\n\n");
            }
            Event::End(TagEnd::Item) => {
                if !text.ends_with('\n') {
                    text.push('\n');
                }
            }
            _ => {}
        }
    }

    text.trim().to_string()
}

/// Extract text from PDF bytes
///
/// The decoder is isolated with `catch_unwind`; some malformed PDFs make it panic.
pub fn pdf_to_text(bytes: &[u8]) -> Result<String, String> {
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Ok(text
            .replace('\0', "")
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n")),
        Ok(Err(e)) => Err(format!("PDF extraction failed: {}", e)),
        Err(_) => Err("PDF decoder panicked".to_string()),
    }
}

/// Discovers and loads documents under a root directory
pub struct Ingestor {
    root: PathBuf,
    known_projects: Vec<String>,
}

impl Ingestor {
    /// Create a new ingestor
    pub fn new(root: impl Into<PathBuf>, known_projects: Vec<String>) -> Self {
        Self {
            root: root.into(),
            known_projects,
        }
    }

    /// Root directory being scanned
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Supported files under the root, sorted by path
    pub fn discover(&self) -> Vec<(PathBuf, DocumentFormat)> {
        let mut files: Vec<_> = WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable directory entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                DocumentFormat::from_path(entry.path()).map(|format| (entry.into_path(), format))
            })
            .collect();

        files.sort_by(|a, b| a.0.cmp(&b.0));
        debug!("Discovered {} documents under {}", files.len(), self.root.display());
        files
    }

    /// Load one file
    pub fn load(&self, path: &Path, format: DocumentFormat) -> Result<Document, ExtractorError> {
        let text = match format {
            DocumentFormat::Markup => {
                let bytes = std::fs::read(path).map_err(|e| ExtractorError::ingestion(path, e.to_string()))?;
                html_to_text(&String::from_utf8_lossy(&bytes))
            }
            DocumentFormat::LightweightMarkup => {
                let raw = std::fs::read_to_string(path)
                    .map_err(|e| ExtractorError::ingestion(path, e.to_string()))?;
                markdown_to_text(&raw)
            }
            DocumentFormat::PortableDocument => {
                let bytes = std::fs::read(path).map_err(|e| ExtractorError::ingestion(path, e.to_string()))?;
                pdf_to_text(&bytes).map_err(|reason| ExtractorError::ingestion(path, reason))?
            }
        };

        if text.trim().is_empty() {
            return Err(ExtractorError::ingestion(path, "no text content"));
        }

        let label = infer_source_label(path, &self.known_projects);
        Ok(Document::new(text, label, format, path))
    }

    /// Lazily load every discovered file, reporting failures per file
    pub fn scan(&self) -> impl Iterator<Item = Result<Document, ExtractorError>> + '_ {
        self.discover()
            .into_iter()
            .map(move |(path, format)| self.load(&path, format))
    }

    /// Lazily load every readable document, logging and dropping failures
    pub fn documents(&self) -> impl Iterator<Item = Document> + '_ {
        self.scan().filter_map(|result| match result {
            Ok(document) => Some(document),
            Err(e) => {
                warn!("{}", e);
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_KNOWN_PROJECTS;

    #[test]
    fn test_label_single_match() {
        let label = infer_source_label(
            Path::new("data/yosys_hq/docs/index.md"),
            DEFAULT_KNOWN_PROJECTS,
        );
        assert_eq!(label, "yosys_hq");
    }

    #[test]
    fn test_label_no_match_is_empty() {
        let label = infer_source_label(Path::new("data/misc/notes.md"), DEFAULT_KNOWN_PROJECTS);
        assert_eq!(label, "");
    }

    #[test]
    fn test_label_prefers_longest_match() {
        let label = infer_source_label(
            Path::new("data/OpenROAD_flow_script/flow.html"),
            DEFAULT_KNOWN_PROJECTS,
        );
        assert_eq!(label, "OpenROAD_flow_script");

        let label = infer_source_label(Path::new("data/OpenROAD/gui.html"), DEFAULT_KNOWN_PROJECTS);
        assert_eq!(label, "OpenROAD");
    }

    #[test]
    fn test_label_is_case_sensitive() {
        let label = infer_source_label(Path::new("data/openroad/gui.html"), DEFAULT_KNOWN_PROJECTS);
        assert_eq!(label, "");
    }

    #[test]
    fn test_html_to_text_reads_body_only() {
        let html = "<html><head><title>Title</title></head>\
                    <body><h1>Placement</h1><p>Run <code>global_placement</code> first.</p></body></html>";
        let text = html_to_text(html);

        assert!(text.contains("Placement"));
        assert!(text.contains("global_placement"));
        assert!(!text.contains("Title"));
    }

    #[test]
    fn test_markdown_to_text_strips_markup() {
        let md = "# Synthesis\n\nUse **`synth -top`** to [synthesize](http://x).\n\n- one\n- two\n";
        let text = markdown_to_text(md);

        assert!(text.starts_with("Synthesis\n\n"));
        assert!(text.contains("Use synth -top to synthesize."));
        assert!(!text.contains('*'));
        assert!(!text.contains("http://x"));
        assert!(text.contains("one\ntwo"));
    }

    #[test]
    fn test_markdown_code_block_kept_as_text() {
        let md = "Example:\n\n```tcl\nread_verilog top.v\n```\n";
        let text = markdown_to_text(md);
        assert!(text.contains("read_verilog top.v"));
    }

    #[test]
    fn test_markdown_keeps_text_inside_html_blocks() {
        let md = "# Install\n\n<details>\n<summary>Build steps</summary>\n\
                  Run make install to build yosys.\n</details>\n\nAfter.\n";
        let text = markdown_to_text(md);

        assert!(text.starts_with("Install"));
        assert!(text.contains("Build steps"));
        assert!(text.contains("Run make install to build yosys."));
        assert!(text.ends_with("After."));
        assert!(!text.contains('<'));
    }

    #[test]
    fn test_markdown_inline_html_keeps_text() {
        let text = markdown_to_text("Press <kbd>Ctrl</kbd> to zoom.\n");
        assert_eq!(text, "Press Ctrl to zoom.");
    }

    #[test]
    fn test_discover_is_sorted_by_path() {
        let dir = tempfile::TempDir::new().unwrap();
        for relative in ["b/z.md", "a/page.html", "b/a.pdf", "c.md"] {
            let path = dir.path().join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "text").unwrap();
        }

        let ingestor = Ingestor::new(dir.path(), Vec::new());
        let paths: Vec<PathBuf> = ingestor.discover().into_iter().map(|(path, _)| path).collect();

        let expected: Vec<PathBuf> = ["a/page.html", "b/a.pdf", "b/z.md", "c.md"]
            .iter()
            .map(|relative| dir.path().join(relative))
            .collect();
        assert_eq!(paths, expected);
    }

    #[test]
    fn test_pdf_garbage_is_an_error() {
        assert!(pdf_to_text(b"definitely not a pdf").is_err());
    }
}
