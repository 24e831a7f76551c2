//! Random 8.3 filenames: a 1-8 char name and an optional 0-3 char extension, uppercase.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::source::{CandidateSource, SourceFactory};
use crate::utils::config::RandomNameConsts;
use crate::{Candidate, SourceError};

fn sample_chars<R: Rng + ?Sized>(rng: &mut R, alphabet: &[u8], len: usize) -> String {
    (0..len)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
        .collect()
}

/// One 8.3 name, `NAME.EXT`, or just `NAME` when the drawn extension is empty.
pub fn generate_83_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let name_len =
        rng.random_range(RandomNameConsts::NAME_MIN_LEN..=RandomNameConsts::NAME_MAX_LEN);
    let mut name = sample_chars(rng, RandomNameConsts::NAME_CHARS, name_len);
    let ext_len = rng.random_range(0..=RandomNameConsts::EXT_MAX_LEN);
    if ext_len > 0 {
        name.push('.');
        name.push_str(&sample_chars(rng, RandomNameConsts::EXT_CHARS, ext_len));
    }
    name
}

/// Seeded xoshiro RNG for worker `stream`: the seed's stream advanced by `stream` jumps
/// (2^128 steps each), so workers sharing a seed never replay each other.
pub(crate) fn stream_rng(seed: u64, stream: usize) -> Xoshiro256PlusPlus {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    for _ in 0..stream {
        rng.jump();
    }
    rng
}

/// Random 8.3 name source. Never fails.
pub struct RandomNameSource {
    rng: Xoshiro256PlusPlus,
}

impl RandomNameSource {
    pub fn new(seed: u64, stream: usize) -> Self {
        Self {
            rng: stream_rng(seed, stream),
        }
    }
}

impl CandidateSource for RandomNameSource {
    fn next_candidate(&mut self) -> Result<Candidate, SourceError> {
        Ok(generate_83_name(&mut self.rng))
    }
}

/// Builds a [`RandomNameSource`] per worker from one seed.
#[derive(Clone, Copy, Debug)]
pub struct RandomNameFactory {
    seed: u64,
}

impl RandomNameFactory {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl SourceFactory for RandomNameFactory {
    type Source = RandomNameSource;

    fn build(&self, worker: usize, _workers: usize) -> Result<RandomNameSource, SourceError> {
        Ok(RandomNameSource::new(self.seed, worker))
    }
}
