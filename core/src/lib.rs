pub mod builder;
pub mod error;
pub mod eval;
pub mod index;
pub mod query;
pub mod store;
pub mod tokenizer;

pub use builder::{build, IndexBuilder, RawDocument};
pub use error::{Result, SearchError};
pub use eval::evaluate;
pub use index::{DocId, Document, IndexStats, InvertedIndex};
pub use query::{parse, QueryExpr};
pub use tokenizer::{StemLanguage, StopWords, Tokenizer, TokenizerConfig};
