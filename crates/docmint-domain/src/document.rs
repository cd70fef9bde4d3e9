//! Document module - normalized source files and the segments cut from them

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Source format of an ingested file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    /// HTML pages
    Markup,

    /// Markdown files
    LightweightMarkup,

    /// PDF files
    PortableDocument,
}

impl DocumentFormat {
    /// Every supported format, in discovery order
    pub const ALL: [DocumentFormat; 3] = [
        DocumentFormat::Markup,
        DocumentFormat::LightweightMarkup,
        DocumentFormat::PortableDocument,
    ];

    /// Get the format name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Markup => "markup",
            DocumentFormat::LightweightMarkup => "lightweight_markup",
            DocumentFormat::PortableDocument => "portable_document",
        }
    }

    /// File extensions (lowercase, without the dot) recognized for this format
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            DocumentFormat::Markup => &["html", "htm"],
            DocumentFormat::LightweightMarkup => &["md", "markdown"],
            DocumentFormat::PortableDocument => &["pdf"],
        }
    }

    /// Detect the format from a file extension
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.extensions().contains(&extension.as_str()))
    }

    /// Detect the format of a path from its extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// Raw text of one source file
///
/// Created by the ingestor and consumed only by the chunker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Plain text extracted from the file
    pub text: String,

    /// Project/tool the file is attributed to (empty when unknown)
    pub source_label: String,

    /// Format the text was extracted from
    pub format: DocumentFormat,

    /// Path the document was loaded from
    pub path: PathBuf,
}

impl Document {
    /// Create a new document
    pub fn new(
        text: impl Into<String>,
        source_label: impl Into<String>,
        format: DocumentFormat,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            text: text.into(),
            source_label: source_label.into(),
            format,
            path: path.into(),
        }
    }

    /// Length of the text in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A bounded slice of a document's text
///
/// Segments are immutable and independent units of work. Adjacent segments of
/// the same document share `overlap` characters: the first `overlap` characters
/// of a segment repeat the last `overlap` characters of its predecessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment text, an exact substring of the document
    pub text: String,

    /// Source label inherited from the document
    pub source_label: String,

    /// Character offset of the segment start within the document
    #[serde(default)]
    pub offset: usize,

    /// Characters shared with the previous segment of the same document
    #[serde(default)]
    pub overlap: usize,
}

impl Segment {
    /// Create a standalone segment (no document offset, no overlap)
    pub fn new(text: impl Into<String>, source_label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_label: source_label.into(),
            offset: 0,
            overlap: 0,
        }
    }

    /// Length of the text in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Text after the shared overlap window
    pub fn fresh_text(&self) -> &str {
        match self.text.char_indices().nth(self.overlap) {
            Some((byte_idx, _)) => &self.text[byte_idx..],
            None => "",
        }
    }

    /// Whether the segment holds nothing but whitespace
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
