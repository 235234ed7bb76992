//! Candidate Vocabulary
//!
//! Ordered list of crop names eligible for batch ranking, loaded once at
//! startup from a JSON array of strings. Order is the default tie-break and
//! display order.

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CandidateError {
    #[error("candidate_items.json not found at {path:?}. Create it with the list of crops (items).")]
    NotFound { path: PathBuf },

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("candidate_items.json must be a JSON list of strings: {0}")]
    Format(#[from] serde_json::Error),

    #[error("candidate list is empty")]
    Empty,

    #[error("duplicate candidate item: '{0}'")]
    Duplicate(String),
}

/// Static, ordered, duplicate-free list of crop names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateVocabulary {
    items: Vec<String>,
}

impl CandidateVocabulary {
    /// Build from an ordered list, rejecting empty lists and duplicates
    pub fn new(items: Vec<String>) -> Result<Self, CandidateError> {
        if items.is_empty() {
            return Err(CandidateError::Empty);
        }

        let mut seen = FxHashSet::default();
        for item in &items {
            if !seen.insert(item.as_str()) {
                return Err(CandidateError::Duplicate(item.clone()));
            }
        }

        Ok(Self { items })
    }

    pub fn from_json_str(json: &str) -> Result<Self, CandidateError> {
        let items: Vec<String> = serde_json::from_str(json)?;
        Self::new(items)
    }

    /// Load the vocabulary from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CandidateError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CandidateError::NotFound { path: path.to_path_buf() });
        }

        let contents = fs::read_to_string(path).map_err(|source| CandidateError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let vocab = Self::from_json_str(&contents)?;
        tracing::info!("Loaded {} candidate items from {:?}", vocab.len(), path);
        Ok(vocab)
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
