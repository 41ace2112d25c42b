//! Web discovery and acquisition.
//!
//! - SerpAPI client (`serpapi`) for discovery
//! - HTML text extraction with `scraper` (`extract`)
//! - Bounded, order-preserving page fetcher (`fetch`)

pub mod extract;
pub mod fetch;
pub mod serpapi;
pub mod types;

pub use fetch::{ContentFetcher, FetchError, FetchSettings};
pub use serpapi::{SearchClient, SearchError, SearchOutcome};
pub use types::{AggregatedContent, ExtractedDocument, NO_CONTENT_SENTINEL, SearchResult};
