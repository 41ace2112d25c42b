use serde::{Deserialize, Serialize};

/// Returned in place of content when no page yielded usable text.
pub const NO_CONTENT_SENTINEL: &str = "No content could be extracted from the search results.";

/// Line placed between per-source blocks.
pub const SOURCE_SEPARATOR: &str = "\n---\n";

/// One organic search hit. Missing provider fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

/// Cleaned text of a single fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub source_title: String,
    /// Fragments, each followed by a blank line.
    pub body_text: String,
}

impl ExtractedDocument {
    pub fn to_block(&self) -> String {
        format!("Source: {}\n{}", self.source_title, self.body_text)
    }
}

/// Text handed to the summarizer, plus how many sources contributed to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedContent {
    pub text: String,
    pub sources_attempted: usize,
    pub sources_used: usize,
}

impl AggregatedContent {
    /// Join documents in order; falls back to [`NO_CONTENT_SENTINEL`].
    pub fn from_documents(docs: &[ExtractedDocument], sources_attempted: usize) -> Self {
        let text = if docs.is_empty() {
            NO_CONTENT_SENTINEL.to_string()
        } else {
            docs.iter()
                .map(ExtractedDocument::to_block)
                .collect::<Vec<_>>()
                .join(SOURCE_SEPARATOR)
        };
        Self {
            text,
            sources_attempted,
            sources_used: docs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sources_used == 0
    }
}
