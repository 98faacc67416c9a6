use prefix_lab_core::{CoreError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

pub const DEFAULT_SPLIT_SEED: u64 = 42;
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Train and test row indices into the source corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl DataSplit {
    pub fn select<T: Clone>(indices: &[usize], items: &[T]) -> Vec<T> {
        indices.iter().map(|&i| items[i].clone()).collect()
    }
}

/// Number of test rows for `n` samples: `ceil(test_fraction * n)`.
pub fn test_size(n: usize, test_fraction: f64) -> usize {
    // The epsilon keeps exact products such as 0.2 * 2000 from rounding up.
    (test_fraction * n as f64 - 1e-9).ceil().max(0.0) as usize
}

/// Partition row indices so each class keeps its share in both splits.
///
/// Per-class test counts start at the floor of their proportional share and
/// the leftover rows go to the classes with the largest remainders. The same
/// labels and seed always give the same split.
pub fn stratified_split(
    labels: &[usize],
    n_classes: usize,
    test_fraction: f64,
    seed: u64,
) -> Result<DataSplit> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(CoreError::Validation(format!(
            "test fraction {} must lie strictly between 0 and 1",
            test_fraction
        )));
    }

    let n = labels.len();
    let n_test = test_size(n, test_fraction);
    if n_test == 0 || n_test >= n {
        return Err(CoreError::Validation(format!(
            "cannot split {} samples with test fraction {}",
            n, test_fraction
        )));
    }

    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (idx, &label) in labels.iter().enumerate() {
        let bucket = by_class.get_mut(label).ok_or_else(|| {
            CoreError::Validation(format!("label {} outside {} classes", label, n_classes))
        })?;
        bucket.push(idx);
    }

    let allocation = allocate(&by_class, n, n_test);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n - n_test);
    let mut test = Vec::with_capacity(n_test);

    for (mut members, take) in by_class.into_iter().zip(allocation) {
        members.shuffle(&mut rng);
        test.extend_from_slice(&members[..take]);
        train.extend_from_slice(&members[take..]);
    }

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    Ok(DataSplit { train, test })
}

/// Largest-remainder allocation of `n_test` rows across classes.
fn allocate(by_class: &[Vec<usize>], n: usize, n_test: usize) -> Vec<usize> {
    let shares: Vec<f64> = by_class
        .iter()
        .map(|members| members.len() as f64 * n_test as f64 / n as f64)
        .collect();

    let mut allocation: Vec<usize> = shares.iter().map(|s| s.floor() as usize).collect();
    let mut leftover = n_test - allocation.iter().sum::<usize>();

    let mut order: Vec<usize> = (0..by_class.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = shares[a] - shares[a].floor();
        let rb = shares[b] - shares[b].floor();
        rb.total_cmp(&ra)
            .then_with(|| by_class[b].len().cmp(&by_class[a].len()))
            .then_with(|| a.cmp(&b))
    });

    for class in order.into_iter().cycle() {
        if leftover == 0 {
            break;
        }
        if allocation[class] < by_class[class].len() {
            allocation[class] += 1;
            leftover -= 1;
        }
    }

    allocation
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_size_rounds_up() {
        assert_eq!(test_size(2000, 0.2), 400);
        assert_eq!(test_size(11, 0.2), 3);
        assert_eq!(test_size(5, 0.2), 1);
    }

    #[test]
    fn test_allocation_by_largest_remainder() {
        // 7 and 4 samples, 3 test rows: shares 1.909 and 1.091.
        let by_class = vec![(0..7).collect::<Vec<_>>(), (7..11).collect()];
        assert_eq!(allocate(&by_class, 11, 3), vec![2, 1]);
    }

    #[test]
    fn test_split_is_a_partition() {
        let labels: Vec<usize> = (0..50).map(|i| i % 3).collect();
        let split = stratified_split(&labels, 3, 0.2, 7).unwrap();

        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
        assert_eq!(split.test.len(), 10);
    }

    #[test]
    fn test_invalid_fraction_rejected() {
        assert!(stratified_split(&[0, 1, 0, 1], 2, 0.0, 1).is_err());
        assert!(stratified_split(&[0, 1, 0, 1], 2, 1.0, 1).is_err());
    }

    #[test]
    fn test_out_of_range_label_rejected() {
        assert!(stratified_split(&[0, 1, 5, 1, 0], 2, 0.2, 1).is_err());
    }
}
