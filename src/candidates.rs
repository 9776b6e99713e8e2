//! Candidate retrieval, the first phase of detection.
//!
//! An index answers "which later records could possibly match this one?".
//! [`Exhaustive`] answers with every later record and is exact. The other
//! indexes trade recall for throughput and say so in their docs.

use crate::detect::DetectError;
use crate::record::{Record, RecordStore};
use rand::prelude::*;
use rustc_hash::{FxHashMap, FxHasher};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Source of comparison candidates for an anchor.
pub trait CandidateIndex: Sync {
    /// Indices strictly greater than `anchor`, ascending, without repeats.
    fn candidates(&self, anchor: usize) -> Vec<usize>;

    fn name(&self) -> &'static str;
}

/// Candidate retrieval strategy, as carried in a run configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Strategy {
    #[default]
    Exhaustive,
    #[serde(rename_all = "camelCase")]
    PrefixBlocking { prefix_len: usize },
    #[serde(rename_all = "camelCase")]
    MinHash {
        num_perm: usize,
        num_bands: usize,
        #[serde(default)]
        seed: u64,
    },
}

impl Strategy {
    /// Checks the strategy parameters without building anything.
    pub fn validate(&self) -> Result<(), DetectError> {
        match *self {
            Strategy::Exhaustive => Ok(()),
            Strategy::PrefixBlocking { prefix_len: 0 } => Err(DetectError::InvalidStrategy(
                "prefixLen must be at least 1".to_string(),
            )),
            Strategy::PrefixBlocking { .. } => Ok(()),
            Strategy::MinHash {
                num_perm,
                num_bands,
                ..
            } => {
                if num_bands == 0 || num_perm == 0 || num_perm % num_bands != 0 {
                    Err(DetectError::InvalidStrategy(format!(
                        "numBands ({num_bands}) must be non-zero and divide numPerm ({num_perm})"
                    )))
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Builds the index over a store snapshot.
    pub fn build(&self, store: &RecordStore) -> Result<Box<dyn CandidateIndex>, DetectError> {
        self.validate()?;
        Ok(match *self {
            Strategy::Exhaustive => Box::new(Exhaustive::new(store)),
            Strategy::PrefixBlocking { prefix_len } => {
                Box::new(PrefixBlocking::new(store, prefix_len))
            }
            Strategy::MinHash {
                num_perm,
                num_bands,
                seed,
            } => Box::new(MinHashLsh::new(store, num_perm, num_bands, seed)),
        })
    }
}

/// Every later record is a candidate. O(n²) comparisons, full recall.
pub struct Exhaustive {
    len: usize,
}

impl Exhaustive {
    pub fn new(store: &RecordStore) -> Self {
        Exhaustive { len: store.len() }
    }
}

impl CandidateIndex for Exhaustive {
    fn candidates(&self, anchor: usize) -> Vec<usize> {
        (anchor + 1..self.len).collect()
    }

    fn name(&self) -> &'static str {
        "exhaustive"
    }
}

/// Inverted index from keys to the ascending list of records carrying them.
#[derive(Default)]
struct Buckets {
    keys: Vec<Vec<u64>>,
    postings: FxHashMap<u64, Vec<usize>>,
}

impl Buckets {
    fn insert(&mut self, index: usize, mut keys: Vec<u64>) {
        keys.sort_unstable();
        keys.dedup();
        for &key in &keys {
            self.postings.entry(key).or_default().push(index);
        }
        self.keys.push(keys);
    }

    fn query(&self, anchor: usize) -> Vec<usize> {
        let Some(keys) = self.keys.get(anchor) else {
            return Vec::new();
        };
        let mut found: Vec<usize> = keys
            .iter()
            .filter_map(|key| self.postings.get(key))
            .flat_map(|posting| {
                let start = posting.partition_point(|&i| i <= anchor);
                posting[start..].iter().copied()
            })
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }
}

///
/// Blocks records on token prefixes: two records are candidates when any
/// token of any field shares its first `prefix_len` characters.
///
/// Recall limit: a true match is missed when OCR corrupted the opening
/// characters of every token on one side.
///
pub struct PrefixBlocking {
    buckets: Buckets,
}

impl PrefixBlocking {
    pub fn new(store: &RecordStore, prefix_len: usize) -> Self {
        let mut buckets = Buckets::default();
        for record in store.all() {
            let keys = record
                .fields()
                .iter()
                .flat_map(|field| field.split_whitespace())
                .map(|token| {
                    let prefix: String = token.chars().take(prefix_len).collect();
                    calculate_hash(&prefix)
                })
                .collect();
            buckets.insert(record.index(), keys);
        }
        PrefixBlocking { buckets }
    }
}

impl CandidateIndex for PrefixBlocking {
    fn candidates(&self, anchor: usize) -> Vec<usize> {
        self.buckets.query(anchor)
    }

    fn name(&self) -> &'static str {
        "prefix-blocking"
    }
}

struct MinHash {
    hash_values: Vec<u32>,
}

impl MinHash {
    fn new<'s>(items: impl IntoIterator<Item = &'s str>, permutations: &[(u64, u64)]) -> Self {
        let mut hash_values = vec![u32::MAX; permutations.len()];
        for item in items {
            let item_hash = calculate_hash(&item);
            for (i, &(a, b)) in permutations.iter().enumerate() {
                hash_values[i] = hash_values[i].min(permute_hash(item_hash, a, b));
            }
        }
        MinHash { hash_values }
    }
}

///
/// Locality-sensitive hashing over character trigrams of the joined fields.
/// Records sharing any band of their MinHash signature are candidates.
///
/// Recall limit: matching is probabilistic. Pairs with low trigram Jaccard
/// similarity can score well under [`wratio`](crate::fuzz::wratio) (for
/// example reordered tokens) and still share no band. Permutations come
/// from a seeded generator, so a given seed always yields the same result.
///
pub struct MinHashLsh {
    buckets: Buckets,
}

impl MinHashLsh {
    ///
    /// ## Arguments
    ///
    /// * `store` - The records to index.
    /// * `num_perm` - Number of permutations in each MinHash signature.
    /// * `num_bands` - Number of bands the signature is split into (must
    ///   divide `num_perm`).
    /// * `seed` - Seed for the permutation generator.
    ///
    pub fn new(store: &RecordStore, num_perm: usize, num_bands: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let permutations: Vec<(u64, u64)> = (0..num_perm).map(|_| (rng.gen(), rng.gen())).collect();
        let band_size = num_perm / num_bands.max(1);
        let mut buckets = Buckets::default();
        for record in store.all() {
            let shingles = shingles(record);
            let minhash = MinHash::new(shingles.iter().map(String::as_str), &permutations);
            let keys = (0..num_bands)
                .map(|band| {
                    let start = band * band_size;
                    calculate_band_hash(band, &minhash.hash_values[start..start + band_size])
                })
                .collect();
            buckets.insert(record.index(), keys);
        }
        MinHashLsh { buckets }
    }
}

impl CandidateIndex for MinHashLsh {
    fn candidates(&self, anchor: usize) -> Vec<usize> {
        self.buckets.query(anchor)
    }

    fn name(&self) -> &'static str {
        "minhash-lsh"
    }
}

// Character trigrams of the space-joined fields, padded so that one- and
// two-character names still produce a shingle.
fn shingles(record: &Record) -> Vec<String> {
    let joined: Vec<char> = format!(" {} ", record.fields().join(" ")).chars().collect();
    joined
        .windows(3)
        .map(|w| w.iter().collect::<String>())
        .collect()
}

#[inline]
fn calculate_hash<T: Hash>(t: &T) -> u64 {
    let mut s = FxHasher::default();
    t.hash(&mut s);
    s.finish()
}

#[inline]
fn permute_hash(hash: u64, a: u64, b: u64) -> u32 {
    ((a.wrapping_mul(hash).wrapping_add(b)) >> 32) as u32
}

// The band number is mixed in so equal values in different bands do not
// collide in the shared bucket map.
#[inline]
fn calculate_band_hash(band: usize, values: &[u32]) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write_usize(band);
    for &value in values {
        hasher.write_u32(value);
    }
    hasher.finish()
}
