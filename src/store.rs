//! External collaborator contracts - paper store and knowledge base
//!
//! The core treats both as narrow read-only lookups. [`MemoryStore`] backs
//! tests and local demos; a real deployment plugs in its own store behind
//! the same traits.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures of a store collaborator
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// A stored research paper, as returned by the paper store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperRecord {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(default, rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

/// Read-only paper lookup
#[async_trait]
pub trait PaperStore: Send + Sync {
    /// Fetch a paper by id; `None` when it does not exist
    async fn get_paper(&self, paper_id: &str) -> Result<Option<PaperRecord>, StoreError>;
}

/// One ranked concept snippet from the knowledge base
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptSnippet {
    pub content: String,
    pub field: String,
    pub difficulty: String,
}

/// Free-text concept search over the knowledge base
///
/// Used only by the explanation surface; the orchestration core never
/// consumes it.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ConceptSnippet>, StoreError>;
}

/// In-memory store implementing both collaborator contracts
#[derive(Default)]
pub struct MemoryStore {
    papers: RwLock<HashMap<String, PaperRecord>>,
    concepts: RwLock<Vec<ConceptSnippet>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_paper(&self, paper_id: impl Into<String>, paper: PaperRecord) {
        self.papers.write().insert(paper_id.into(), paper);
    }

    pub fn insert_concept(&self, snippet: ConceptSnippet) {
        self.concepts.write().push(snippet);
    }
}

#[async_trait]
impl PaperStore for MemoryStore {
    async fn get_paper(&self, paper_id: &str) -> Result<Option<PaperRecord>, StoreError> {
        Ok(self.papers.read().get(paper_id).cloned())
    }
}

#[async_trait]
impl KnowledgeBase for MemoryStore {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ConceptSnippet>, StoreError> {
        let terms: Vec<String> = query
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();

        // Rank by the number of query terms the snippet mentions.
        let mut ranked: Vec<(usize, ConceptSnippet)> = self
            .concepts
            .read()
            .iter()
            .filter_map(|snippet| {
                let haystack = snippet.content.to_lowercase();
                let hits = terms.iter().filter(|t| haystack.contains(t.as_str())).count();
                (hits > 0).then(|| (hits, snippet.clone()))
            })
            .collect();

        ranked.sort_by(|a, b| b.0.cmp(&a.0));
        ranked.truncate(limit);

        Ok(ranked.into_iter().map(|(_, snippet)| snippet).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_paper() -> PaperRecord {
        PaperRecord {
            title: "On Test Papers".into(),
            content: "lorem ipsum".into(),
            authors: Some(vec!["A. Author".into()]),
            abstract_text: None,
            field: Some("physics".into()),
            keywords: None,
        }
    }

    #[tokio::test]
    async fn test_paper_lookup() {
        let store = MemoryStore::new();
        store.insert_paper("p1", sample_paper());

        let found = store.get_paper("p1").await.unwrap();
        assert_eq!(found.unwrap().title, "On Test Papers");
        assert!(store.get_paper("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_knowledge_search_ranks_and_limits() {
        let store = MemoryStore::new();
        store.insert_concept(ConceptSnippet {
            content: "quantum field theory basics".into(),
            field: "physics".into(),
            difficulty: "intro".into(),
        });
        store.insert_concept(ConceptSnippet {
            content: "quantum entanglement and quantum measurement".into(),
            field: "physics".into(),
            difficulty: "advanced".into(),
        });
        store.insert_concept(ConceptSnippet {
            content: "classical mechanics".into(),
            field: "physics".into(),
            difficulty: "intro".into(),
        });

        let results = store.search("quantum measurement", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        // Two term hits outrank one.
        assert!(results[0].content.contains("entanglement"));

        let limited = store.search("quantum", 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_paper_record_abstract_field_name() {
        let mut paper = sample_paper();
        paper.abstract_text = Some("short".into());
        let json = serde_json::to_value(&paper).unwrap();
        assert_eq!(json.get("abstract").unwrap(), "short");
    }
}
