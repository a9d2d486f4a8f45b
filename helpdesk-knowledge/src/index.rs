//! Keyword-overlap retrieval over the support corpus.
//!
//! The index is built once and never mutated, so it can be shared across
//! request tasks behind an `Arc` without locking.

use std::collections::HashSet;
use std::path::Path;

use helpdesk_core::KnowledgeSettings;
use tracing::{debug, info};

use crate::corpus::split_sections;
use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::tokenize::{DEFAULT_STOPWORDS, Tokenizer};

/// One titled block of the corpus, the unit of retrieval.
#[derive(Debug, Clone)]
pub struct KnowledgeSection {
    title: String,
    body: String,
    tokens: HashSet<String>,
    position: usize,
}

impl KnowledgeSection {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn tokens(&self) -> &HashSet<String> {
        &self.tokens
    }

    /// Zero-based order of the section in the corpus
    pub fn position(&self) -> usize {
        self.position
    }

    /// Section text as it is handed to the prompt
    pub fn text(&self) -> String {
        if self.body.is_empty() {
            self.title.clone()
        } else {
            format!("{}\n{}", self.title, self.body)
        }
    }
}

/// A retrieved section with its ranking score.
#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    pub section: &'a KnowledgeSection,
    /// Ranking score (raw overlap unless normalization is enabled)
    pub score: f32,
    /// Number of distinct query tokens found in the section
    pub overlap: usize,
}

/// Retrieval tuning.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub max_results: usize,
    pub min_overlap: usize,
    pub normalize_scores: bool,
    pub stopwords: Vec<String>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            max_results: 3,
            min_overlap: 1,
            normalize_scores: false,
            stopwords: DEFAULT_STOPWORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl From<&KnowledgeSettings> for IndexOptions {
    fn from(settings: &KnowledgeSettings) -> Self {
        let defaults = Self::default();
        Self {
            max_results: settings.max_results,
            // An overlap of zero would return every section for any query
            min_overlap: settings.min_overlap.max(1),
            normalize_scores: settings.normalize_scores,
            stopwords: settings.stopwords.clone().unwrap_or(defaults.stopwords),
        }
    }
}

/// Immutable searchable corpus.
#[derive(Debug, Clone)]
pub struct KnowledgeIndex {
    sections: Vec<KnowledgeSection>,
    tokenizer: Tokenizer,
    options: IndexOptions,
}

impl KnowledgeIndex {
    /// Build an index from corpus text.
    pub fn from_text(text: &str, options: IndexOptions) -> Self {
        let tokenizer = Tokenizer::new(&options.stopwords);
        let sections = split_sections(text)
            .into_iter()
            .enumerate()
            .map(|(position, raw)| {
                let mut tokens = tokenizer.tokens(&raw.title);
                tokens.extend(tokenizer.tokens(&raw.body));
                KnowledgeSection {
                    title: raw.title,
                    body: raw.body,
                    tokens,
                    position,
                }
            })
            .collect();

        Self {
            sections,
            tokenizer,
            options,
        }
    }

    /// Read and index a corpus file.
    pub async fn load(path: &Path, options: IndexOptions) -> KnowledgeResult<Self> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                KnowledgeError::CorpusNotFound(path.to_path_buf())
            } else {
                KnowledgeError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        let index = Self::from_text(&text, options);
        info!(
            "Loaded {} knowledge sections from {}",
            index.len(),
            path.display()
        );
        Ok(index)
    }

    /// An index with no sections; every search comes back empty.
    pub fn empty(options: IndexOptions) -> Self {
        Self::from_text("", options)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn sections(&self) -> &[KnowledgeSection] {
        &self.sections
    }

    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// Rank sections by shared tokens with the query.
    ///
    /// Results are ordered by score descending with ties kept in corpus
    /// order, hold at most `max_results` entries, and exclude sections whose
    /// raw overlap is below `min_overlap`. An empty result is not an error.
    pub fn search(&self, query: &str) -> Vec<SearchHit<'_>> {
        let query_tokens = self.tokenizer.tokens(query);
        if query_tokens.is_empty() || self.options.max_results == 0 {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit<'_>> = self
            .sections
            .iter()
            .filter_map(|section| {
                let overlap = query_tokens.intersection(&section.tokens).count();
                if overlap < self.options.min_overlap {
                    return None;
                }
                let score = if self.options.normalize_scores {
                    overlap as f32 / (section.tokens.len() as f32).sqrt()
                } else {
                    overlap as f32
                };
                Some(SearchHit {
                    section,
                    score,
                    overlap,
                })
            })
            .collect();

        // Stable sort keeps corpus order among equal scores
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(self.options.max_results);

        debug!(
            "Knowledge search matched {} section(s) for {} query token(s)",
            hits.len(),
            query_tokens.len()
        );
        hits
    }
}
