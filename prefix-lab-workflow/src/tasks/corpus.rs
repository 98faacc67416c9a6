use prefix_lab_core::{CoreError, Corpus, CorpusSeed, DatasetKind, Document, Result};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

// ===== Vocabulary Pools =====

const POSITIVE_WORDS: &[&str] = &[
    "excellent", "amazing", "wonderful", "great", "good", "nice", "enjoyed",
    "loved", "fantastic", "brilliant", "outstanding", "superb", "impressive",
];

const NEGATIVE_WORDS: &[&str] = &[
    "terrible", "awful", "horrible", "bad", "worst", "disappointing",
    "boring", "waste", "poor", "dreadful", "pathetic", "mediocre", "weak",
];

const NEUTRAL_WORDS: &[&str] = &[
    "movie", "film", "story", "plot", "character", "scene", "acting",
    "director", "cast", "performance", "script", "watched", "thought",
    "seemed", "overall", "experience", "shows", "features", "minutes",
];

const AMBIGUOUS_WORDS: &[&str] = &[
    "interesting", "different", "unique", "unexpected", "surprising",
    "unusual", "average", "okay", "fine", "decent", "alright",
];

const NEWS_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "tech",
        &[
            "technology", "software", "computer", "digital", "internet", "app",
            "smartphone", "laptop", "programming", "coding", "data", "ai",
        ],
    ),
    (
        "sports",
        &[
            "game", "team", "player", "score", "match", "win", "lose",
            "championship", "league", "season", "coach", "football", "basketball",
        ],
    ),
    (
        "business",
        &[
            "company", "market", "stock", "economy", "financial", "profit",
            "revenue", "investment", "trade", "business", "corporate", "earnings",
        ],
    ),
    (
        "politics",
        &[
            "government", "election", "policy", "political", "vote",
            "president", "congress", "senate", "democrat", "republican", "bill",
        ],
    ),
];

const COMMON_NEWS_WORDS: &[&str] = &[
    "said", "reported", "according", "announced", "today", "yesterday",
    "official", "spokesperson", "statement", "news", "update", "latest",
];

// ===== Generation Schemes =====

/// Pool weights before and after a positional cutoff.
///
/// Tokens at index `< cutoff` draw their pool from `early`, the rest from
/// `late`. Weight order matches the pool order of the scheme using it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionalSchedule<const N: usize> {
    pub cutoff: usize,
    pub early: [f64; N],
    pub late: [f64; N],
}

/// Pools: own class, neutral, ambiguous, opposite class.
pub const SENTIMENT_SCHEDULE: PositionalSchedule<4> = PositionalSchedule {
    cutoff: 10,
    early: [0.35, 0.40, 0.15, 0.10],
    late: [0.25, 0.45, 0.20, 0.10],
};

/// Pools: own category, common, other categories.
pub const NEWS_SCHEDULE: PositionalSchedule<3> = PositionalSchedule {
    cutoff: 12,
    early: [0.30, 0.50, 0.20],
    late: [0.20, 0.55, 0.25],
};

pub const SENTIMENT_NOISE_RATE: f64 = 0.08;
pub const NEWS_NOISE_RATE: f64 = 0.10;
pub const SENTIMENT_DOCS_PER_CLASS: usize = 1000;
pub const NEWS_DOCS_PER_CATEGORY: usize = 500;

/// What happened during one generation call.
///
/// `transitions[intended][assigned]` counts documents generated for
/// `intended` and labeled `assigned`; off-diagonal entries are noise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationStats {
    pub dataset: DatasetKind,
    pub intended_counts: Vec<usize>,
    pub noise_events: usize,
    pub transitions: Vec<Vec<usize>>,
}

impl GenerationStats {
    fn new(dataset: DatasetKind, n_classes: usize) -> Self {
        Self {
            dataset,
            intended_counts: vec![0; n_classes],
            noise_events: 0,
            transitions: vec![vec![0; n_classes]; n_classes],
        }
    }

    fn record(&mut self, intended: usize, assigned: usize, noisy: bool) {
        self.intended_counts[intended] += 1;
        self.transitions[intended][assigned] += 1;
        if noisy {
            self.noise_events += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.intended_counts.iter().sum()
    }

    pub fn mislabeled(&self) -> usize {
        self.transitions
            .iter()
            .enumerate()
            .map(|(i, row)| row.iter().sum::<usize>() - row[i])
            .sum()
    }

    pub fn mislabel_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.mislabeled() as f64 / total as f64,
        }
    }
}

/// Builds synthetic labeled corpora with controlled early signal and label noise.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorpusGenerator {
    seed: CorpusSeed,
}

impl CorpusGenerator {
    pub fn new(seed: CorpusSeed) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> CorpusSeed {
        self.seed
    }

    /// Generate the corpus for `dataset_id`; unknown ids get the sentiment corpus.
    pub fn generate(&self, dataset_id: &str) -> Result<Corpus> {
        let (corpus, _) = self.generate_with_stats(DatasetKind::resolve(dataset_id))?;
        Ok(corpus)
    }

    pub fn generate_with_stats(&self, dataset: DatasetKind) -> Result<(Corpus, GenerationStats)> {
        let mut rng = match self.seed {
            CorpusSeed::Entropy => StdRng::from_entropy(),
            CorpusSeed::Fixed(seed) => StdRng::seed_from_u64(seed),
        };
        let (corpus, stats) = generate_with_rng(dataset, &mut rng)?;

        tracing::debug!(
            dataset = dataset.id(),
            documents = corpus.len(),
            mislabeled = stats.mislabeled(),
            reproducible = self.seed.is_reproducible(),
            "Generated corpus"
        );

        Ok((corpus, stats))
    }
}

/// Generate a corpus from a caller-owned random source.
pub fn generate_with_rng<R: Rng + ?Sized>(
    dataset: DatasetKind,
    rng: &mut R,
) -> Result<(Corpus, GenerationStats)> {
    match dataset {
        DatasetKind::Imdb => generate_sentiment(rng),
        DatasetKind::News => generate_news(rng),
    }
}

struct PoolSampler<'a, const N: usize> {
    pools: [&'a [&'a str]; N],
    early: WeightedIndex<f64>,
    late: WeightedIndex<f64>,
    cutoff: usize,
}

impl<'a, const N: usize> PoolSampler<'a, N> {
    fn new(pools: [&'a [&'a str]; N], schedule: &PositionalSchedule<N>) -> Result<Self> {
        if let Some(empty) = pools.iter().position(|p| p.is_empty()) {
            return Err(CoreError::Generation(format!("word pool {} is empty", empty)));
        }
        let weights = |w: &[f64; N]| {
            WeightedIndex::new(w.iter().copied())
                .map_err(|e| CoreError::Generation(format!("invalid pool weights: {}", e)))
        };
        Ok(Self {
            pools,
            early: weights(&schedule.early)?,
            late: weights(&schedule.late)?,
            cutoff: schedule.cutoff,
        })
    }

    fn document<R: Rng + ?Sized>(&self, length: usize, rng: &mut R) -> String {
        let words: Vec<&str> = (0..length)
            .map(|position| {
                let dist = if position < self.cutoff { &self.early } else { &self.late };
                let pool = self.pools[dist.sample(rng)];
                pool[rng.gen_range(0..pool.len())]
            })
            .collect();
        words.join(" ")
    }
}

fn generate_sentiment<R: Rng + ?Sized>(rng: &mut R) -> Result<(Corpus, GenerationStats)> {
    // Label 0 is negative, label 1 is positive.
    let samplers = [
        PoolSampler::new(
            [NEGATIVE_WORDS, NEUTRAL_WORDS, AMBIGUOUS_WORDS, POSITIVE_WORDS],
            &SENTIMENT_SCHEDULE,
        )?,
        PoolSampler::new(
            [POSITIVE_WORDS, NEUTRAL_WORDS, AMBIGUOUS_WORDS, NEGATIVE_WORDS],
            &SENTIMENT_SCHEDULE,
        )?,
    ];

    let mut stats = GenerationStats::new(DatasetKind::Imdb, 2);
    let mut documents = Vec::with_capacity(2 * SENTIMENT_DOCS_PER_CLASS);

    // Positive reviews first, then negative.
    for intended in [1usize, 0] {
        for _ in 0..SENTIMENT_DOCS_PER_CLASS {
            let length = rng.gen_range(30..=120);
            let text = samplers[intended].document(length, rng);

            let noisy = rng.gen_bool(SENTIMENT_NOISE_RATE);
            let label = if noisy { 1 - intended } else { intended };
            stats.record(intended, label, noisy);
            documents.push(Document::new(text, label));
        }
    }

    documents.shuffle(rng);
    let corpus = Corpus::new(documents, vec!["Negative".to_string(), "Positive".to_string()])?;
    Ok((corpus, stats))
}

fn generate_news<R: Rng + ?Sized>(rng: &mut R) -> Result<(Corpus, GenerationStats)> {
    let n_categories = NEWS_CATEGORIES.len();
    let mut stats = GenerationStats::new(DatasetKind::News, n_categories);
    let mut documents = Vec::with_capacity(n_categories * NEWS_DOCS_PER_CATEGORY);

    for (intended, (_, own_words)) in NEWS_CATEGORIES.iter().enumerate() {
        let other_words: Vec<&str> = NEWS_CATEGORIES
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != intended)
            .flat_map(|(_, (_, words))| words.iter().copied())
            .collect();
        let sampler = PoolSampler::new([*own_words, COMMON_NEWS_WORDS, &other_words], &NEWS_SCHEDULE)?;

        for _ in 0..NEWS_DOCS_PER_CATEGORY {
            let length = rng.gen_range(40..=100);
            let text = sampler.document(length, rng);

            let noisy = rng.gen_bool(NEWS_NOISE_RATE);
            let label = if noisy {
                // Uniform over the other categories.
                let offset = rng.gen_range(1..n_categories);
                (intended + offset) % n_categories
            } else {
                intended
            };
            stats.record(intended, label, noisy);
            documents.push(Document::new(text, label));
        }
    }

    documents.shuffle(rng);
    let label_names = NEWS_CATEGORIES
        .iter()
        .map(|(name, _)| capitalize(name))
        .collect();
    let corpus = Corpus::new(documents, label_names)?;
    Ok((corpus, stats))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
