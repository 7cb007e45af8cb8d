pub mod config;
pub mod corpus;
pub mod error;
pub mod vocab;

pub use config::{BatchingConfig, CorpusConfig, DataConfig, load_data_config};
pub use corpus::{BatchIter, Corpus, PaddedBatch};
pub use error::CorpusError;
pub use vocab::Vocabulary;
