//! Support knowledge corpus: sectioning, tokenization and keyword retrieval.

pub mod corpus;
pub mod errors;
pub mod index;
pub mod tokenize;

pub use errors::{KnowledgeError, KnowledgeResult};
pub use index::{IndexOptions, KnowledgeIndex, KnowledgeSection, SearchHit};
pub use tokenize::{DEFAULT_STOPWORDS, Tokenizer};
