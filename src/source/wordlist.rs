//! Word-list source: candidates drawn from a fixed list loaded from one column of a CSV or plain text file.

use anyhow::Context;
use rand::Rng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

use crate::source::rander::stream_rng;
use crate::source::{CandidateSource, SourceFactory};
use crate::{Candidate, SourceError};

/// How workers walk the list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WordMode {
    /// Uniform draws with replacement. Never exhausts.
    #[default]
    Sample,
    /// Worker `i` of `W` emits items `i, i+W, i+2W, ...` and then reports exhaustion.
    Stride,
}

/// Load entries from column `column` of a CSV (or plain one-per-line) file. Fields are trimmed;
/// empty fields and rows without that column are dropped. With `skip_header`, the first row is
/// treated as a header (e.g. `name`).
pub fn load_word_list(
    path: &Path,
    skip_header: bool,
    column: usize,
) -> crate::Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(skip_header)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("open word list {}", path.display()))?;
    let mut words = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("read word list {} row {}", path.display(), row + 1))?;
        if let Some(field) = record.get(column)
            && !field.is_empty()
        {
            words.push(field.to_string());
        }
    }
    log::debug!(
        "Loaded {} words from {} (column {})",
        words.len(),
        path.display(),
        column
    );
    Ok(words)
}

enum Cursor {
    Sample(Xoshiro256PlusPlus),
    Stride { next: usize, step: usize },
}

pub struct WordListSource {
    words: Arc<[String]>,
    cursor: Cursor,
    uppercase: bool,
}

impl CandidateSource for WordListSource {
    fn next_candidate(&mut self) -> Result<Candidate, SourceError> {
        if self.words.is_empty() {
            return Err(SourceError::Exhausted);
        }
        let word = match &mut self.cursor {
            Cursor::Sample(rng) => &self.words[rng.random_range(0..self.words.len())],
            Cursor::Stride { next, step } => {
                let Some(word) = self.words.get(*next) else {
                    return Err(SourceError::Exhausted);
                };
                *next += *step;
                word
            }
        };
        Ok(if self.uppercase {
            word.to_uppercase()
        } else {
            word.clone()
        })
    }
}

/// Builds a [`WordListSource`] per worker sharing one immutable list.
#[derive(Clone, Debug)]
pub struct WordListFactory {
    words: Arc<[String]>,
    mode: WordMode,
    seed: u64,
    uppercase: bool,
}

impl WordListFactory {
    pub fn new(words: Vec<String>, mode: WordMode, seed: u64) -> Self {
        Self {
            words: words.into(),
            mode,
            seed,
            uppercase: false,
        }
    }

    pub fn uppercase(mut self, uppercase: bool) -> Self {
        self.uppercase = uppercase;
        self
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl SourceFactory for WordListFactory {
    type Source = WordListSource;

    fn build(&self, worker: usize, workers: usize) -> Result<WordListSource, SourceError> {
        let cursor = match self.mode {
            WordMode::Sample => Cursor::Sample(stream_rng(self.seed, worker)),
            WordMode::Stride => Cursor::Stride {
                next: worker,
                step: workers.max(1),
            },
        };
        Ok(WordListSource {
            words: Arc::clone(&self.words),
            cursor,
            uppercase: self.uppercase,
        })
    }
}
