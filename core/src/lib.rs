//! In-memory inverted index with TF-IDF ranked search and boolean queries.

pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod persist;
pub mod query;
pub mod registry;
pub mod tokenizer;

pub use config::EngineConfig;
pub use engine::{SearchEngine, SearchExtra, SearchMode, SearchResult};
pub use error::{Result, SearchError};
pub use index::{DocId, DocSet, InvertedIndex, Posting, TermEntry};
pub use registry::DocumentRegistry;
