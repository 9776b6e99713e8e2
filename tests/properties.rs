use proptest::prelude::*;
use std::collections::HashSet;
use voter_dedup_service::candidates::Strategy as Candidates;
use voter_dedup_service::detect::{ClaimPolicy, DetectConfig, Detector};
use voter_dedup_service::normalize::normalize;
use voter_dedup_service::record::{Provenance, RecordStore};
use voter_dedup_service::score::{FieldMode, Scorer};

// Small alphabet so that near-duplicates are common; the occasional
// punctuation-only line normalizes to nothing.
fn arb_lines() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            9 => "[a-d]{1,4}( [a-d]{1,4}){0,3}",
            1 => "[-=.]{3,6}",
        ],
        0..14,
    )
}

fn store_of(lines: &[String], mode: FieldMode) -> RecordStore {
    let mut store = RecordStore::new();
    for (i, line) in lines.iter().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let fields = match mode {
            FieldMode::Single => vec![line.clone()],
            FieldMode::Multi => vec![
                tokens.iter().take(2).copied().collect::<Vec<_>>().join(" "),
                tokens.iter().skip(2).copied().collect::<Vec<_>>().join(" "),
            ],
        };
        store.add(line.as_str(), &fields, Provenance::new("p.txt", i + 1));
    }
    store
}

fn arb_mode() -> impl Strategy<Value = FieldMode> {
    prop_oneof![Just(FieldMode::Single), Just(FieldMode::Multi)]
}

fn arb_policy() -> impl Strategy<Value = ClaimPolicy> {
    prop_oneof![Just(ClaimPolicy::Cluster), Just(ClaimPolicy::FirstAnchor)]
}

fn arb_limit() -> impl Strategy<Value = Option<usize>> {
    prop::option::of(1usize..4)
}

fn arb_candidates() -> impl Strategy<Value = Candidates> {
    prop_oneof![
        Just(Candidates::Exhaustive),
        (1usize..4).prop_map(|prefix_len| Candidates::PrefixBlocking { prefix_len }),
        (any::<u64>(), prop_oneof![Just(4usize), Just(8)]).prop_map(|(seed, num_bands)| {
            Candidates::MinHash {
                num_perm: 32,
                num_bands,
                seed,
            }
        }),
    ]
}

fn detector(
    threshold: f64,
    policy: ClaimPolicy,
    limit: Option<usize>,
    mode: FieldMode,
    candidates: &Candidates,
) -> Detector {
    let mut config = DetectConfig::new(threshold).with_policy(policy);
    config.limit = limit;
    Detector::new(config)
        .with_mode(mode)
        .with_strategy(candidates.clone())
}

proptest! {
    #[test]
    fn score_is_symmetric(a in "[a-zA-Z .,]{0,16}", b in "[a-zA-Z .,]{0,16}", mode in arb_mode()) {
        let store = store_of(&[a, b], mode);
        let scorer = Scorer::new(mode);
        let (x, y) = (&store.all()[0], &store.all()[1]);
        prop_assert_eq!(scorer.score(x, y), scorer.score(y, x));
    }

    #[test]
    fn score_is_bounded(a in "[a-d ]{0,12}", b in "[a-d ]{0,12}", mode in arb_mode()) {
        let store = store_of(&[a, b], mode);
        let score = Scorer::new(mode).score(&store.all()[0], &store.all()[1]);
        prop_assert!((0.0..=100.0).contains(&score), "score {}", score);
    }

    #[test]
    fn self_score_is_maximal(a in "[a-zA-Z][a-zA-Z .,]{0,15}", mode in arb_mode()) {
        let store = store_of(&[a], mode);
        let record = &store.all()[0];
        prop_assert_eq!(Scorer::new(mode).score(record, record), 100.0);
    }

    #[test]
    fn empty_keys_score_zero(a in "[-=., ]{0,8}", b in "[a-zA-Z .,-]{0,16}", mode in arb_mode()) {
        let store = store_of(&[a, b], mode);
        let scorer = Scorer::new(mode);
        let (x, y) = (&store.all()[0], &store.all()[1]);
        prop_assert_eq!(scorer.score(x, y), 0.0);
        prop_assert_eq!(scorer.score(x, x), 0.0);
    }

    #[test]
    fn no_self_or_repeated_pairs(
        lines in arb_lines(),
        threshold in 0.0..=100.0f64,
        policy in arb_policy(),
        limit in arb_limit(),
        mode in arb_mode(),
        candidates in arb_candidates(),
    ) {
        let store = store_of(&lines, mode);
        let detection = detector(threshold, policy, limit, mode, &candidates)
            .run(&store)
            .unwrap();
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        for pair in detection.pairs() {
            prop_assert_ne!(pair.a.index(), pair.b.index());
            prop_assert!(pair.score >= threshold);
            if threshold > 0.0 {
                prop_assert!(!normalize(pair.a.raw_text()).is_empty(), "empty key matched: {:?}", pair);
                prop_assert!(!normalize(pair.b.raw_text()).is_empty(), "empty key matched: {:?}", pair);
            }
            let key = (pair.a.index().min(pair.b.index()), pair.a.index().max(pair.b.index()));
            prop_assert!(seen.insert(key), "pair {:?} reported twice", key);
            prop_assert!(reported.insert(pair.b.index()), "record {} reported twice", pair.b.index());
        }
    }

    #[test]
    fn raising_threshold_never_adds_pairs(
        lines in arb_lines(),
        t1 in 0.0..=100.0f64,
        t2 in 0.0..=100.0f64,
        limit in arb_limit(),
        mode in arb_mode(),
        candidates in arb_candidates(),
    ) {
        let (low, high) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
        let store = store_of(&lines, mode);
        let at_low = detector(low, ClaimPolicy::Cluster, limit, mode, &candidates)
            .run(&store)
            .unwrap();
        let at_high = detector(high, ClaimPolicy::Cluster, limit, mode, &candidates)
            .run(&store)
            .unwrap();
        prop_assert!(at_low.len() >= at_high.len());
    }

    #[test]
    fn detection_is_deterministic(
        lines in arb_lines(),
        threshold in 50.0..=100.0f64,
        policy in arb_policy(),
        limit in arb_limit(),
        candidates in arb_candidates(),
    ) {
        let store = store_of(&lines, FieldMode::Single);
        let detector = detector(threshold, policy, limit, FieldMode::Single, &candidates);
        let key = |store: &RecordStore| -> Vec<(usize, usize, u64)> {
            detector
                .run(store)
                .unwrap()
                .pairs()
                .iter()
                .map(|p| (p.a.index(), p.b.index(), p.score.to_bits()))
                .collect()
        };
        prop_assert_eq!(key(&store), key(&store));
    }

    #[test]
    fn blocking_reports_subset_of_exhaustive_clusters(lines in arb_lines(), threshold in 60.0..=100.0f64) {
        let store = store_of(&lines, FieldMode::Single);
        let exhaustive = Detector::new(DetectConfig::new(threshold)).run(&store).unwrap();
        let blocked = Detector::new(DetectConfig::new(threshold))
            .with_strategy(Candidates::PrefixBlocking { prefix_len: 1 })
            .run(&store)
            .unwrap();
        prop_assert!(blocked.len() <= exhaustive.len());
        prop_assert!(blocked.comparisons() <= exhaustive.comparisons());
    }
}

#[test]
fn empty_input_yields_nothing_for_any_threshold() {
    let store = RecordStore::new();
    for threshold in [0.0, 42.5, 100.0] {
        for policy in [ClaimPolicy::Cluster, ClaimPolicy::FirstAnchor] {
            let config = DetectConfig::new(threshold).with_policy(policy);
            assert!(Detector::new(config).run(&store).unwrap().is_empty());
        }
    }
}
