use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::CorpusError;

pub const PAD: &str = "<pad>";
pub const START: &str = "<s>";
pub const END: &str = "</s>";
pub const UNK: &str = "<unk>";

/// Ids of the reserved symbols when a vocabulary is built from scratch.
pub const PAD_ID: u32 = 0;
pub const START_ID: u32 = 1;
pub const END_ID: u32 = 2;
pub const UNK_ID: u32 = 3;

/// Bidirectional mapping between token strings and dense integer ids.
///
/// Ids are assigned sequentially by [`Vocabulary::add`]; the inverse mapping
/// is a dense `Vec`, so every assigned id in `0..len` resolves to exactly one
/// token. A freshly created vocabulary always carries the four reserved
/// symbols at ids 0 through 3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    token_to_id: HashMap<String, u32>,
    id_to_token: Vec<String>,
    unk_id: u32,
}

impl Vocabulary {
    pub fn new() -> Self {
        let mut vocab = Self {
            token_to_id: HashMap::new(),
            id_to_token: Vec::new(),
            unk_id: UNK_ID,
        };
        for symbol in [PAD, START, END, UNK] {
            vocab.add(symbol);
        }
        vocab
    }

    /// Wrap an externally supplied token mapping.
    ///
    /// The mapping must contain `<unk>` (its id becomes the lookup fallback)
    /// and its ids must cover `0..len` with no gaps or duplicates.
    pub fn from_mapping(mapping: HashMap<String, u32>) -> Result<Self, CorpusError> {
        let unk_id = *mapping.get(UNK).ok_or(CorpusError::MissingUnknown)?;

        let mut id_to_token = vec![String::new(); mapping.len()];
        let mut assigned = vec![false; mapping.len()];
        for (token, &id) in &mapping {
            let slot = id as usize;
            if slot >= mapping.len() {
                return Err(CorpusError::SparseMapping { id });
            }
            if assigned[slot] {
                return Err(CorpusError::DuplicateId { id });
            }
            assigned[slot] = true;
            id_to_token[slot] = token.clone();
        }

        Ok(Self {
            token_to_id: mapping,
            id_to_token,
            unk_id,
        })
    }

    /// Build a vocabulary from a whitespace-tokenized text file, adding every
    /// token in file order.
    pub fn from_corpus_file(path: impl AsRef<Path>) -> Result<Self, CorpusError> {
        let file = File::open(path.as_ref())?;
        let mut vocab = Self::new();
        for line in BufReader::new(file).lines() {
            for token in line?.split_whitespace() {
                vocab.add(token);
            }
        }
        Ok(vocab)
    }

    /// Assign the next sequential id to a novel token, or return the existing
    /// id. Idempotent.
    pub fn add(&mut self, token: &str) -> u32 {
        if let Some(&id) = self.token_to_id.get(token) {
            return id;
        }
        let id = self.id_to_token.len() as u32;
        self.token_to_id.insert(token.to_owned(), id);
        self.id_to_token.push(token.to_owned());
        id
    }

    /// Resolve a token to its id, falling back to the unknown id. Total.
    pub fn lookup(&self, token: &str) -> u32 {
        self.token_to_id
            .get(token)
            .copied()
            .unwrap_or(self.unk_id)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.token_to_id.contains_key(token)
    }

    /// Strict inverse lookup; fails on an id that was never assigned.
    pub fn resolve_id(&self, id: u32) -> Result<&str, CorpusError> {
        self.id_to_token
            .get(id as usize)
            .map(String::as_str)
            .ok_or(CorpusError::UnassignedId { id })
    }

    /// Number of distinct known tokens, reserved symbols included.
    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_token.is_empty()
    }

    pub fn pad_id(&self) -> u32 {
        self.lookup(PAD)
    }

    pub fn start_id(&self) -> u32 {
        self.lookup(START)
    }

    pub fn end_id(&self) -> u32 {
        self.lookup(END)
    }

    pub fn unk_id(&self) -> u32 {
        self.unk_id
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}
