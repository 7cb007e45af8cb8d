pub mod batch;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::error::CorpusError;
use crate::vocab::Vocabulary;

pub use batch::{BatchIter, PaddedBatch};

/// Id-assignment state while scanning a corpus file.
///
/// Both variants funnel through the same [`Vocabulary`] id counter, so the
/// reserved symbols sit at the same ids regardless of which path built the
/// vocabulary. A growing vocabulary never produces `<unk>` (every novel token
/// gets its own id); a frozen one resolves through `lookup` and never mutates.
enum VocabSource {
    Growing(Vocabulary),
    Frozen(Arc<Vocabulary>),
}

impl VocabSource {
    fn resolve(&mut self, token: &str) -> u32 {
        match self {
            VocabSource::Growing(vocab) => vocab.add(token),
            VocabSource::Frozen(vocab) => vocab.lookup(token),
        }
    }

    fn finish(self) -> Arc<Vocabulary> {
        match self {
            VocabSource::Growing(vocab) => Arc::new(vocab),
            VocabSource::Frozen(vocab) => vocab,
        }
    }
}

/// A corpus of token-id sequences, one per accepted input line.
///
/// Immutable once loaded; the batching methods in [`batch`] are pure reads
/// over `sequences`.
pub struct Corpus {
    sequences: Vec<Vec<u32>>,
    vocabulary: Arc<Vocabulary>,
    dropped: usize,
}

impl Corpus {
    /// Load a whitespace-tokenized corpus file.
    ///
    /// Empty lines are dropped, as are lines with more than `max_length`
    /// tokens when a limit is set; both are counted in [`Corpus::dropped`].
    /// Without a supplied vocabulary, a fresh one grows as the file is
    /// scanned, assigning ids in first-seen order after the reserved symbols.
    /// With one, tokens resolve through `lookup` and unknowns map to `<unk>`.
    pub fn from_file(
        path: impl AsRef<Path>,
        max_length: Option<usize>,
        vocabulary: Option<Arc<Vocabulary>>,
    ) -> Result<Self, CorpusError> {
        let path = path.as_ref();
        let file = File::open(path)?;

        let mut source = match vocabulary {
            Some(shared) => VocabSource::Frozen(shared),
            None => VocabSource::Growing(Vocabulary::new()),
        };

        let mut sequences = Vec::new();
        let mut dropped = 0usize;

        for line in BufReader::new(file).lines() {
            let line = line?;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.is_empty() {
                dropped += 1;
                continue;
            }
            if let Some(limit) = max_length {
                if tokens.len() > limit {
                    dropped += 1;
                    continue;
                }
            }
            let ids = tokens
                .iter()
                .map(|token| source.resolve(token))
                .collect::<Vec<u32>>();
            sequences.push(ids);
        }

        let vocabulary = source.finish();
        debug!(
            path = %path.display(),
            sequences = sequences.len(),
            dropped,
            vocab_size = vocabulary.len(),
            "loaded corpus"
        );

        Ok(Self {
            sequences,
            vocabulary,
            dropped,
        })
    }

    pub fn sequences(&self) -> &[Vec<u32>] {
        &self.sequences
    }

    /// Number of accepted sequences.
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Shared handle to the vocabulary this corpus was resolved against.
    pub fn vocabulary(&self) -> Arc<Vocabulary> {
        Arc::clone(&self.vocabulary)
    }

    /// Count of input lines rejected during loading (empty or over-length).
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use tempfile::tempdir;

    #[test]
    fn blank_lines_are_dropped_and_counted() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("corpus.txt");
        fs::write(&path, "a b c\nd e\n\nf\ng h i j\n").expect("write corpus");

        let corpus = Corpus::from_file(&path, None, None).expect("load corpus");
        assert_eq!(corpus.len(), 4);
        assert_eq!(corpus.dropped(), 1);
    }

    #[test]
    fn over_length_lines_are_dropped() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("corpus.txt");
        fs::write(&path, "a b\n\na b c d e\n").expect("write corpus");

        let corpus = Corpus::from_file(&path, Some(3), None).expect("load corpus");
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.dropped(), 2);
        assert_eq!(corpus.sequences()[0].len(), 2);
    }

    #[test]
    fn growing_vocabulary_assigns_first_seen_order() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("corpus.txt");
        fs::write(&path, "b a\na c\n").expect("write corpus");

        let corpus = Corpus::from_file(&path, None, None).expect("load corpus");
        let vocab = corpus.vocabulary();
        // reserved symbols take 0..4, then b, a, c in first-seen order
        assert_eq!(vocab.lookup("b"), 4);
        assert_eq!(vocab.lookup("a"), 5);
        assert_eq!(vocab.lookup("c"), 6);
        let expected: Vec<Vec<u32>> = vec![vec![4, 5], vec![5, 6]];
        assert_eq!(corpus.sequences(), expected.as_slice());
    }

    #[test]
    fn frozen_vocabulary_maps_novel_tokens_to_unknown() {
        let dir = tempdir().expect("tempdir");
        let known = dir.path().join("known.txt");
        fs::write(&known, "a b\n").expect("write corpus");
        let other = dir.path().join("other.txt");
        fs::write(&other, "a z\n").expect("write corpus");

        let first = Corpus::from_file(&known, None, None).expect("load corpus");
        let vocab = first.vocabulary();
        let second = Corpus::from_file(&other, None, Some(Arc::clone(&vocab))).expect("load corpus");

        let expected: Vec<Vec<u32>> = vec![vec![vocab.lookup("a"), vocab.unk_id()]];
        assert_eq!(second.sequences(), expected.as_slice());
        // the shared vocabulary did not grow
        assert!(!vocab.contains("z"));
    }

    #[test]
    fn missing_file_propagates_io_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("absent.txt");
        assert!(matches!(
            Corpus::from_file(&path, None, None),
            Err(CorpusError::Io(_))
        ));
    }
}
