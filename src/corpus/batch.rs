use std::cmp::Reverse;

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor, TensorData};
use rand::prelude::*;

use super::Corpus;

/// One padded rectangular batch plus the true length of each sequence,
/// counting the prepended `<s>` and appended `</s>` symbols.
#[derive(Debug, Clone)]
pub struct PaddedBatch<B: Backend> {
    pub tokens: Tensor<B, 2, Int>,
    pub lengths: Vec<usize>,
}

impl<B: Backend> PaddedBatch<B> {
    pub fn batch_size(&self) -> usize {
        self.lengths.len()
    }
}

impl Corpus {
    /// Pad a batch of raw id sequences into one rectangular tensor.
    ///
    /// Every sequence gets `</s>` appended and the whole batch gets a leading
    /// `<s>` row; shorter sequences are right-padded with `<pad>` up to the
    /// batch maximum. The layout is time-major `(max_len + 1, batch_size)`
    /// unless `batch_first` asks for the transpose. This is the only place a
    /// batch is materialized on a device.
    pub fn pad_batch<B: Backend>(
        &self,
        batch: &[&[u32]],
        batch_first: bool,
        device: &B::Device,
    ) -> PaddedBatch<B> {
        let vocab = self.vocabulary();
        let start = vocab.start_id() as i64;
        let end = vocab.end_id() as i64;
        let pad = vocab.pad_id() as i64;

        let batch_size = batch.len();
        // lengths after the </s> append
        let lengths: Vec<usize> = batch.iter().map(|seq| seq.len() + 1).collect();
        let max_len = lengths.iter().copied().max().unwrap_or(0);

        let mut values = Vec::with_capacity((max_len + 1) * batch_size);
        values.extend(std::iter::repeat(start).take(batch_size));
        for t in 0..max_len {
            for (seq, &len) in batch.iter().zip(&lengths) {
                let value = if t < seq.len() {
                    seq[t] as i64
                } else if t < len {
                    end
                } else {
                    pad
                };
                values.push(value);
            }
        }

        let mut tokens = Tensor::<B, 2, Int>::from_data(
            TensorData::new(values, [max_len + 1, batch_size]),
            device,
        );
        if batch_first {
            tokens = tokens.swap_dims(0, 1);
        }

        let lengths = lengths.into_iter().map(|len| len + 1).collect();
        PaddedBatch { tokens, lengths }
    }

    /// Lazy batch iteration over the whole corpus.
    ///
    /// Draws one permutation of the sequence indices up front (identity order
    /// when `shuffle` is false), slices it into chunks of `batch_size` (the
    /// last chunk may be short), and sorts each chunk by descending length so
    /// downstream pack/unpack style processing can rely on the order. Every
    /// index is covered exactly once; calling again reshuffles.
    pub fn iter_batches<'a, B: Backend, R: Rng>(
        &'a self,
        batch_size: usize,
        batch_first: bool,
        shuffle: bool,
        rng: &mut R,
        device: &'a B::Device,
    ) -> BatchIter<'a, B> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        if shuffle {
            order.shuffle(rng);
        }
        BatchIter {
            corpus: self,
            order,
            cursor: 0,
            batch_size: batch_size.max(1),
            batch_first,
            device,
        }
    }

    /// Eager length-bucketed batching.
    ///
    /// Sorts the corpus by ascending sequence length and cuts the sorted order
    /// at every length change, then chunks each same-length run by
    /// `batch_size`. Every batch holds sequences of one fixed pre-padding
    /// length, so no pad symbol is ever wasted relative to batch mates.
    pub fn fixed_length_batches<B: Backend>(
        &self,
        batch_size: usize,
        batch_first: bool,
        device: &B::Device,
    ) -> Vec<PaddedBatch<B>> {
        let batch_size = batch_size.max(1);
        let mut sort_idx: Vec<usize> = (0..self.len()).collect();
        sort_idx.sort_by_key(|&idx| self.sequences()[idx].len());

        let mut batches = Vec::new();
        let mut total = 0usize;
        let mut run_start = 0usize;
        while run_start < sort_idx.len() {
            let run_len = self.sequences()[sort_idx[run_start]].len();
            let mut run_end = run_start + 1;
            while run_end < sort_idx.len() && self.sequences()[sort_idx[run_end]].len() == run_len {
                run_end += 1;
            }

            let mut curr = run_start;
            while curr < run_end {
                let next = (curr + batch_size).min(run_end);
                let chunk: Vec<&[u32]> = sort_idx[curr..next]
                    .iter()
                    .map(|&idx| self.sequences()[idx].as_slice())
                    .collect();
                let batch = self.pad_batch::<B>(&chunk, batch_first, device);
                assert!(
                    batch.lengths.iter().all(|&len| len == batch.lengths[0]),
                    "fixed-length batch contains mixed lengths"
                );
                total += batch.batch_size();
                batches.push(batch);
                curr = next;
            }
            run_start = run_end;
        }

        assert_eq!(
            total,
            self.len(),
            "batched sequence count does not match corpus size"
        );
        batches
    }

    /// Pad a single batch drawn from the first `nsample` indices of a
    /// permutation (identity order when `shuffle` is false), sorted by
    /// descending length. Intended for held-out inspection, not full
    /// coverage.
    pub fn sample<B: Backend, R: Rng>(
        &self,
        nsample: usize,
        batch_first: bool,
        shuffle: bool,
        rng: &mut R,
        device: &B::Device,
    ) -> PaddedBatch<B> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        if shuffle {
            order.shuffle(rng);
        }
        order.truncate(nsample);

        let mut chunk: Vec<&[u32]> = order
            .iter()
            .map(|&idx| self.sequences()[idx].as_slice())
            .collect();
        chunk.sort_by_key(|seq| Reverse(seq.len()));
        self.pad_batch::<B>(&chunk, batch_first, device)
    }
}

pub struct BatchIter<'a, B: Backend> {
    corpus: &'a Corpus,
    order: Vec<usize>,
    cursor: usize,
    batch_size: usize,
    batch_first: bool,
    device: &'a B::Device,
}

impl<B: Backend> Iterator for BatchIter<'_, B> {
    type Item = PaddedBatch<B>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.order.len() {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let mut chunk: Vec<&[u32]> = self.order[self.cursor..end]
            .iter()
            .map(|&idx| self.corpus.sequences()[idx].as_slice())
            .collect();
        self.cursor = end;

        chunk.sort_by_key(|seq| Reverse(seq.len()));
        Some(self.corpus.pad_batch::<B>(&chunk, self.batch_first, self.device))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.order.len() - self.cursor).div_ceil(self.batch_size);
        (remaining, Some(remaining))
    }
}

impl<B: Backend> ExactSizeIterator for BatchIter<'_, B> {}
