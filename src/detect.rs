//! Duplicate detection over a [`RecordStore`] snapshot.
//!
//! Detection runs in two phases. Scoring is parallel: every anchor's
//! candidates come from a [`CandidateIndex`] and are scored against it with
//! rayon, reading only the immutable store. Claiming is sequential, in
//! anchor order, so the output never depends on thread scheduling.

use crate::candidates::{CandidateIndex, Strategy};
use crate::record::{Record, RecordStore};
use crate::score::{FieldMode, Scorer, Similarity, MAX_SCORE};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, VecDeque};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error, PartialEq)]
pub enum DetectError {
    #[error("threshold must be within [0, 100], got {0}")]
    ThresholdOutOfRange(f64),
    #[error("limit must be at least 1 when set")]
    InvalidLimit,
    #[error("invalid candidate strategy: {0}")]
    InvalidStrategy(String),
}

/// Rule deciding which qualifying pairs are reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClaimPolicy {
    ///
    /// Builds clusters from every qualifying pair and reports a spanning
    /// forest of each: clusters are walked breadth-first from their lowest
    /// index, best-scoring neighbour first, and every newly reached record
    /// is reported once against the record it was reached from.
    ///
    /// Output has `records - clusters` pairs, so it only shrinks as the
    /// threshold rises.
    ///
    #[default]
    Cluster,
    ///
    /// Anchors are taken in index order and skipped once claimed. Each
    /// anchor claims every unclaimed candidate that qualifies, best score
    /// first. A claimed record never becomes an anchor, so members of a
    /// cluster that only match through a claimed record go unreported, and
    /// a higher threshold can report more pairs than a lower one.
    ///
    FirstAnchor,
}

/// Per-run detection settings.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectConfig {
    /// Inclusive minimum score in `[0, 100]`.
    pub threshold: f64,
    #[serde(default)]
    pub policy: ClaimPolicy,
    /// Keep only the best `limit` qualifying candidates per anchor. This is
    /// a deliberate recall limit; `None` keeps all of them.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl DetectConfig {
    pub fn new(threshold: f64) -> Self {
        DetectConfig {
            threshold,
            policy: ClaimPolicy::default(),
            limit: None,
        }
    }

    pub fn with_policy(mut self, policy: ClaimPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Rejects an out-of-range threshold instead of clamping it.
    pub fn validate(&self) -> Result<(), DetectError> {
        if !(0.0..=MAX_SCORE).contains(&self.threshold) {
            return Err(DetectError::ThresholdOutOfRange(self.threshold));
        }
        if self.limit == Some(0) {
            return Err(DetectError::InvalidLimit);
        }
        Ok(())
    }
}

/// Two records judged to be the same voter. `b` is reported as a
/// duplicate of `a`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DuplicatePair<'a> {
    pub a: &'a Record,
    pub b: &'a Record,
    pub score: f64,
}

/// Result of one detection run.
#[derive(Debug)]
pub struct Detection<'a> {
    pairs: Vec<DuplicatePair<'a>>,
    records: &'a [Record],
    comparisons: usize,
}

impl<'a> Detection<'a> {
    pub fn pairs(&self) -> &[DuplicatePair<'a>] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of candidate pairs that were scored.
    pub fn comparisons(&self) -> usize {
        self.comparisons
    }

    ///
    /// Groups of records connected by reported pairs, ordered by their
    /// lowest index, members ascending. Records without a duplicate are
    /// left out.
    ///
    pub fn clusters(&self) -> Vec<Vec<&'a Record>> {
        let mut uf = UnionFind::new(self.records.len());
        for pair in &self.pairs {
            uf.union(pair.a.index(), pair.b.index());
        }
        let mut groups: BTreeMap<usize, Vec<&'a Record>> = BTreeMap::new();
        for record in self.records {
            groups
                .entry(uf.find(record.index()))
                .or_default()
                .push(record);
        }
        let mut clusters: Vec<Vec<&'a Record>> =
            groups.into_values().filter(|g| g.len() > 1).collect();
        clusters.sort_by_key(|g| g[0].index());
        clusters
    }
}

/// Scorer, candidate strategy and settings for repeated runs.
#[derive(Clone, Debug)]
pub struct Detector {
    scorer: Scorer,
    strategy: Strategy,
    config: DetectConfig,
}

impl Detector {
    pub fn new(config: DetectConfig) -> Self {
        Detector {
            scorer: Scorer::default(),
            strategy: Strategy::default(),
            config,
        }
    }

    pub fn with_mode(mut self, mode: FieldMode) -> Self {
        self.scorer = Scorer::new(mode);
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn validate(&self) -> Result<(), DetectError> {
        self.config.validate()?;
        self.strategy.validate()
    }

    pub fn run<'a>(&self, store: &'a RecordStore) -> Result<Detection<'a>, DetectError> {
        self.validate()?;
        let start = Instant::now();
        let index = self.strategy.build(store)?;
        debug!(
            index = index.name(),
            elapsed_secs = start.elapsed().as_secs_f64(),
            "candidate index built"
        );
        detect(store, &self.scorer, index.as_ref(), &self.config)
    }
}

#[derive(Clone, Copy, Debug)]
struct Match {
    candidate: usize,
    score: f64,
}

// Best score first, lower index on ties.
fn by_rank(x: &Match, y: &Match) -> Ordering {
    y.score
        .total_cmp(&x.score)
        .then(x.candidate.cmp(&y.candidate))
}

///
/// Finds duplicate pairs among the records of `store`.
///
/// ## Arguments
///
/// * `store` - The records to check. An empty store yields no pairs.
/// * `scorer` - Symmetric record similarity in `[0, 100]`.
/// * `index` - Candidate retrieval; only its candidates are scored.
/// * `config` - Threshold, claim policy and optional per-anchor limit.
///
/// ## Errors
///
/// Fails before any scoring when `config` is invalid.
///
pub fn detect<'a, S>(
    store: &'a RecordStore,
    scorer: &S,
    index: &dyn CandidateIndex,
    config: &DetectConfig,
) -> Result<Detection<'a>, DetectError>
where
    S: Similarity + ?Sized,
{
    config.validate()?;
    let records = store.all();
    let start = Instant::now();

    let scored: Vec<(Vec<Match>, usize)> = records
        .par_iter()
        .map(|anchor| {
            let candidates = index.candidates(anchor.index());
            let compared = candidates.len();
            let mut found: Vec<Match> = candidates
                .into_iter()
                .filter(|&j| j != anchor.index())
                .filter_map(|j| {
                    let score = scorer.similarity(anchor, &records[j]);
                    (score >= config.threshold).then_some(Match {
                        candidate: j,
                        score,
                    })
                })
                .collect();
            found.sort_by(by_rank);
            if let Some(limit) = config.limit {
                found.truncate(limit);
            }
            (found, compared)
        })
        .collect();

    let comparisons: usize = scored.iter().map(|(_, compared)| compared).sum();
    let matches: Vec<Vec<Match>> = scored.into_iter().map(|(found, _)| found).collect();
    debug!(
        comparisons,
        elapsed_secs = start.elapsed().as_secs_f64(),
        "candidates scored"
    );

    let pairs = match config.policy {
        ClaimPolicy::Cluster => claim_clusters(records, &matches),
        ClaimPolicy::FirstAnchor => claim_first_anchor(records, &matches),
    };
    info!(
        records = records.len(),
        comparisons,
        duplicates = pairs.len(),
        threshold = config.threshold,
        policy = ?config.policy,
        "detection complete"
    );
    Ok(Detection {
        pairs,
        records,
        comparisons,
    })
}

// Every index below the anchor has already been claimed or used as an
// anchor, so only later candidates can still be claimed.
fn claim_first_anchor<'a>(
    records: &'a [Record],
    matches: &[Vec<Match>],
) -> Vec<DuplicatePair<'a>> {
    let mut claimed = vec![false; records.len()];
    let mut pairs = Vec::new();
    for (anchor, found) in matches.iter().enumerate() {
        if claimed[anchor] {
            continue;
        }
        for m in found {
            if claimed[m.candidate] || m.candidate <= anchor {
                continue;
            }
            claimed[m.candidate] = true;
            pairs.push(DuplicatePair {
                a: &records[anchor],
                b: &records[m.candidate],
                score: m.score,
            });
        }
    }
    pairs
}

fn claim_clusters<'a>(records: &'a [Record], matches: &[Vec<Match>]) -> Vec<DuplicatePair<'a>> {
    let mut adjacency: Vec<Vec<Match>> = vec![Vec::new(); records.len()];
    for (anchor, found) in matches.iter().enumerate() {
        for m in found {
            adjacency[anchor].push(*m);
            adjacency[m.candidate].push(Match {
                candidate: anchor,
                score: m.score,
            });
        }
    }
    for neighbours in &mut adjacency {
        neighbours.sort_by(by_rank);
    }

    let mut reached = vec![false; records.len()];
    let mut queue = VecDeque::new();
    let mut pairs = Vec::new();
    for root in 0..records.len() {
        if reached[root] || adjacency[root].is_empty() {
            continue;
        }
        reached[root] = true;
        queue.push_back(root);
        while let Some(current) = queue.pop_front() {
            for m in &adjacency[current] {
                if reached[m.candidate] {
                    continue;
                }
                reached[m.candidate] = true;
                pairs.push(DuplicatePair {
                    a: &records[current],
                    b: &records[m.candidate],
                    score: m.score,
                });
                queue.push_back(m.candidate);
            }
        }
    }
    pairs
}

struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, x: usize, y: usize) {
        let root_x = self.find(x);
        let root_y = self.find(y);
        if root_x == root_y {
            return;
        }
        match self.rank[root_x].cmp(&self.rank[root_y]) {
            Ordering::Less => self.parent[root_x] = root_y,
            Ordering::Greater => self.parent[root_y] = root_x,
            Ordering::Equal => {
                self.parent[root_y] = root_x;
                self.rank[root_x] += 1;
            }
        }
    }
}
