use prefix_lab_core::{CorpusSeed, DatasetKind};
use prefix_lab_workflow::*;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rstest::rstest;

// ===== Class Balance =====

#[rstest]
#[case(DatasetKind::Imdb, vec![1000, 1000], vec!["Negative", "Positive"])]
#[case(DatasetKind::News, vec![500, 500, 500, 500], vec!["Tech", "Sports", "Business", "Politics"])]
fn test_pre_noise_balance(
    #[case] dataset: DatasetKind,
    #[case] expected: Vec<usize>,
    #[case] names: Vec<&str>,
) {
    let generator = CorpusGenerator::new(CorpusSeed::Fixed(5));
    let (corpus, stats) = generator.generate_with_stats(dataset).unwrap();

    assert_eq!(stats.intended_counts, expected);
    assert_eq!(corpus.len(), expected.iter().sum::<usize>());
    assert_eq!(corpus.label_names(), names.as_slice());
}

#[test]
fn test_observed_label_counts_match_transitions() {
    let generator = CorpusGenerator::new(CorpusSeed::Fixed(8));
    let (corpus, stats) = generator.generate_with_stats(DatasetKind::News).unwrap();

    let column_sums: Vec<usize> = (0..4)
        .map(|col| stats.transitions.iter().map(|row| row[col]).sum())
        .collect();
    assert_eq!(corpus.label_counts(), column_sums);
    assert_eq!(stats.mislabeled(), stats.noise_events);
}

// ===== Label Noise =====

fn pooled_mislabel_rate(dataset: DatasetKind, corpora: u64) -> f64 {
    let (mislabeled, total) = (0..corpora).fold((0, 0), |(m, t), seed| {
        let mut rng = StdRng::seed_from_u64(seed);
        let (_, stats) = generate_with_rng(dataset, &mut rng).unwrap();
        (m + stats.mislabeled(), t + stats.total())
    });
    mislabeled as f64 / total as f64
}

#[test]
fn test_sentiment_noise_rate_converges() {
    // 10 corpora of 2000 documents.
    let rate = pooled_mislabel_rate(DatasetKind::Imdb, 10);
    assert!((rate - SENTIMENT_NOISE_RATE).abs() < 0.01, "rate {}", rate);
}

#[test]
fn test_news_noise_rate_converges() {
    let rate = pooled_mislabel_rate(DatasetKind::News, 10);
    assert!((rate - NEWS_NOISE_RATE).abs() < 0.01, "rate {}", rate);
}

#[test]
fn test_news_noise_never_keeps_the_label() {
    let generator = CorpusGenerator::new(CorpusSeed::Fixed(21));
    let (_, stats) = generator.generate_with_stats(DatasetKind::News).unwrap();

    // Every noise event lands off the diagonal.
    let diagonal: usize = (0..4).map(|i| stats.transitions[i][i]).sum();
    assert_eq!(diagonal + stats.noise_events, stats.total());
    assert!(stats.noise_events > 0);
}

#[test]
fn test_noisy_news_labels_spread_over_other_categories() {
    let mut rng = StdRng::seed_from_u64(99);
    let (_, stats) = generate_with_rng(DatasetKind::News, &mut rng).unwrap();
    for (i, row) in stats.transitions.iter().enumerate() {
        for (j, &count) in row.iter().enumerate() {
            if i != j {
                assert!(count > 0, "no noise from {} to {}", i, j);
            }
        }
    }
}

// ===== Seeding =====

#[test]
fn test_fixed_seed_reproduces_corpus() {
    let generator = CorpusGenerator::new(CorpusSeed::Fixed(1234));
    let a = generator.generate("imdb").unwrap();
    let b = generator.generate("imdb").unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_entropy_seed_varies_corpus() {
    let generator = CorpusGenerator::default();
    let a = generator.generate("news").unwrap();
    let b = generator.generate("news").unwrap();
    assert_ne!(a.texts(), b.texts());
}

#[test]
fn test_unknown_dataset_falls_back_to_sentiment() {
    let corpus = CorpusGenerator::new(CorpusSeed::Fixed(1)).generate("yelp").unwrap();
    assert_eq!(corpus.label_names(), ["Negative", "Positive"]);
}
