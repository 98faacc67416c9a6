use prefix_lab_core::{CoreError, ModelKind, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::vectorize::SparseMatrix;

/// A trainable text classifier over TF-IDF features.
pub trait Classifier: Send {
    /// Fit on `x` with labels in `0..n_classes`.
    fn fit(&mut self, x: &SparseMatrix, y: &[usize], n_classes: usize) -> Result<()>;

    fn predict(&self, x: &SparseMatrix) -> Result<Vec<usize>>;
}

pub fn build_classifier(kind: ModelKind) -> Box<dyn Classifier> {
    match kind {
        ModelKind::Logistic => Box::new(LogisticRegression::default()),
        ModelKind::NaiveBayes => Box::new(MultinomialNaiveBayes::default()),
        ModelKind::Svm => Box::new(LinearSvm::default()),
    }
}

fn check_training_input(x: &SparseMatrix, y: &[usize], n_classes: usize) -> Result<()> {
    if x.n_rows() != y.len() {
        return Err(CoreError::Training(format!(
            "{} feature rows for {} labels",
            x.n_rows(),
            y.len()
        )));
    }
    if x.n_rows() == 0 {
        return Err(CoreError::Training("no training samples".to_string()));
    }
    if let Some(&bad) = y.iter().find(|&&label| label >= n_classes) {
        return Err(CoreError::Training(format!(
            "label {} outside {} classes",
            bad, n_classes
        )));
    }
    Ok(())
}

fn check_features(x: &SparseMatrix, expected: usize) -> Result<()> {
    if x.n_features != expected {
        return Err(CoreError::Training(format!(
            "model fit on {} features, got {}",
            expected, x.n_features
        )));
    }
    Ok(())
}

fn not_fitted() -> CoreError {
    CoreError::Training("classifier used before fit".to_string())
}

fn sparse_dot(row: &[(usize, f64)], dense: &[f64]) -> f64 {
    row.iter().map(|&(j, v)| v * dense[j]).sum()
}

/// Index of the largest score; the lowest index wins ties.
fn argmax(scores: &[f64]) -> usize {
    let mut best = 0;
    for (idx, &score) in scores.iter().enumerate().skip(1) {
        if score > scores[best] {
            best = idx;
        }
    }
    best
}

// ===== Logistic Regression =====

/// Multinomial softmax regression with an L2 penalty on the weights.
///
/// Minimises mean cross-entropy plus `||W||² / (2·C·n)` by
/// Nesterov-accelerated full-batch gradient descent. The intercept is not
/// penalised.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    pub c: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub learning_rate: f64,
    fitted: Option<LinearWeights>,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-4,
            learning_rate: 1.0,
            fitted: None,
        }
    }
}

/// Per-class weight rows and intercepts.
#[derive(Debug, Clone, PartialEq)]
struct LinearWeights {
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
}

impl LinearWeights {
    fn zeros(n_classes: usize, n_features: usize) -> Self {
        Self {
            weights: vec![vec![0.0; n_features]; n_classes],
            bias: vec![0.0; n_classes],
        }
    }

    fn scores(&self, row: &[(usize, f64)]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(w, b)| sparse_dot(row, w) + b)
            .collect()
    }

    fn n_features(&self) -> usize {
        self.weights.first().map_or(0, Vec::len)
    }

    /// `self + scale * (a - b)`, elementwise.
    fn extrapolate(a: &Self, b: &Self, scale: f64) -> Self {
        let weights = a
            .weights
            .iter()
            .zip(&b.weights)
            .map(|(ra, rb)| ra.iter().zip(rb).map(|(x, y)| x + scale * (x - y)).collect())
            .collect();
        let bias = a
            .bias
            .iter()
            .zip(&b.bias)
            .map(|(x, y)| x + scale * (x - y))
            .collect();
        Self { weights, bias }
    }
}

impl LogisticRegression {
    /// Gradient of the regularised objective at `params`.
    fn gradient(&self, params: &LinearWeights, x: &SparseMatrix, y: &[usize], l2: f64) -> LinearWeights {
        let n = x.n_rows() as f64;
        let n_classes = params.bias.len();
        let mut grad = LinearWeights::zeros(n_classes, x.n_features);

        for (row, &label) in x.rows.iter().zip(y) {
            let probs = softmax(&params.scores(row));
            for (class, p) in probs.into_iter().enumerate() {
                let residual = (p - if class == label { 1.0 } else { 0.0 }) / n;
                grad.bias[class] += residual;
                for &(j, v) in row {
                    grad.weights[class][j] += residual * v;
                }
            }
        }

        for (g_row, w_row) in grad.weights.iter_mut().zip(&params.weights) {
            for (g, w) in g_row.iter_mut().zip(w_row) {
                *g += l2 * w;
            }
        }
        grad
    }
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn max_abs(grad: &LinearWeights) -> f64 {
    grad.weights
        .iter()
        .flatten()
        .chain(&grad.bias)
        .fold(0.0, |acc, g| acc.max(g.abs()))
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: &SparseMatrix, y: &[usize], n_classes: usize) -> Result<()> {
        check_training_input(x, y, n_classes)?;
        if self.c <= 0.0 {
            return Err(CoreError::Training("C must be positive".to_string()));
        }

        let l2 = 1.0 / (self.c * x.n_rows() as f64);
        let mut current = LinearWeights::zeros(n_classes, x.n_features);
        let mut previous = current.clone();
        let mut converged = false;

        for iter in 0..self.max_iter {
            let momentum = iter as f64 / (iter as f64 + 3.0);
            let lookahead = LinearWeights::extrapolate(&current, &previous, momentum);
            let grad = self.gradient(&lookahead, x, y, l2);

            if max_abs(&grad) < self.tol {
                current = lookahead;
                converged = true;
                tracing::debug!(iterations = iter, "Logistic regression converged");
                break;
            }

            let mut next = lookahead;
            for (w_row, g_row) in next.weights.iter_mut().zip(&grad.weights) {
                for (w, g) in w_row.iter_mut().zip(g_row) {
                    *w -= self.learning_rate * g;
                }
            }
            for (b, g) in next.bias.iter_mut().zip(&grad.bias) {
                *b -= self.learning_rate * g;
            }

            previous = std::mem::replace(&mut current, next);
        }

        if !converged {
            tracing::debug!(max_iter = self.max_iter, "Logistic regression hit iteration limit");
        }

        self.fitted = Some(current);
        Ok(())
    }

    fn predict(&self, x: &SparseMatrix) -> Result<Vec<usize>> {
        let params = self.fitted.as_ref().ok_or_else(not_fitted)?;
        check_features(x, params.n_features())?;
        Ok(x.rows.iter().map(|row| argmax(&params.scores(row))).collect())
    }
}

// ===== Multinomial Naive Bayes =====

#[derive(Debug, Clone)]
pub struct MultinomialNaiveBayes {
    pub alpha: f64,
    fitted: Option<NaiveBayesParams>,
}

#[derive(Debug, Clone, PartialEq)]
struct NaiveBayesParams {
    class_log_prior: Vec<f64>,
    feature_log_prob: Vec<Vec<f64>>,
}

impl Default for MultinomialNaiveBayes {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            fitted: None,
        }
    }
}

impl Classifier for MultinomialNaiveBayes {
    fn fit(&mut self, x: &SparseMatrix, y: &[usize], n_classes: usize) -> Result<()> {
        check_training_input(x, y, n_classes)?;
        if x.rows.iter().flatten().any(|&(_, v)| v < 0.0) {
            return Err(CoreError::Training(
                "negative feature values are not allowed for naive Bayes".to_string(),
            ));
        }

        let mut class_count = vec![0.0; n_classes];
        let mut feature_count = vec![vec![0.0; x.n_features]; n_classes];
        for (row, &label) in x.rows.iter().zip(y) {
            class_count[label] += 1.0;
            for &(j, v) in row {
                feature_count[label][j] += v;
            }
        }

        let n = x.n_rows() as f64;
        // Classes absent from training get a -inf prior and are never predicted.
        let class_log_prior = class_count
            .iter()
            .map(|&c| if c > 0.0 { (c / n).ln() } else { f64::NEG_INFINITY })
            .collect();

        let smoothing_total = self.alpha * x.n_features as f64;
        let feature_log_prob = feature_count
            .into_iter()
            .map(|counts| {
                let denom = (counts.iter().sum::<f64>() + smoothing_total).ln();
                counts
                    .into_iter()
                    .map(|c| (c + self.alpha).ln() - denom)
                    .collect()
            })
            .collect();

        self.fitted = Some(NaiveBayesParams {
            class_log_prior,
            feature_log_prob,
        });
        Ok(())
    }

    fn predict(&self, x: &SparseMatrix) -> Result<Vec<usize>> {
        let params = self.fitted.as_ref().ok_or_else(not_fitted)?;
        let n_features = params.feature_log_prob.first().map_or(0, Vec::len);
        check_features(x, n_features)?;

        Ok(x.rows
            .iter()
            .map(|row| {
                let scores: Vec<f64> = params
                    .class_log_prior
                    .iter()
                    .zip(&params.feature_log_prob)
                    .map(|(prior, log_prob)| prior + sparse_dot(row, log_prob))
                    .collect();
                argmax(&scores)
            })
            .collect())
    }
}

// ===== Linear SVM =====

/// L2-regularised squared-hinge linear SVM trained by dual coordinate descent.
///
/// Two classes train a single decision function for class 1; more classes
/// train one-vs-rest. Each sample carries a constant bias feature of 1.0.
#[derive(Debug, Clone)]
pub struct LinearSvm {
    pub c: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub seed: u64,
    fitted: Option<LinearWeights>,
}

impl Default for LinearSvm {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-3,
            seed: 42,
            fitted: None,
        }
    }
}

const SVM_BIAS: f64 = 1.0;

impl LinearSvm {
    /// Solve one binary problem where `positive[i]` marks the +1 samples.
    fn solve_binary(&self, x: &SparseMatrix, positive: &[bool], rng: &mut StdRng) -> (Vec<f64>, f64) {
        let n = x.n_rows();
        let diag = 1.0 / (2.0 * self.c);
        let mut w = vec![0.0; x.n_features];
        let mut b = 0.0;
        let mut alpha = vec![0.0; n];

        let q_diag: Vec<f64> = x
            .rows
            .iter()
            .map(|row| row.iter().map(|(_, v)| v * v).sum::<f64>() + SVM_BIAS * SVM_BIAS + diag)
            .collect();

        let mut order: Vec<usize> = (0..n).collect();
        for epoch in 0..self.max_iter {
            order.shuffle(rng);
            let mut max_pg = f64::NEG_INFINITY;
            let mut min_pg = f64::INFINITY;

            for &i in &order {
                let yi = if positive[i] { 1.0 } else { -1.0 };
                let row = x.row(i);
                let g = yi * (sparse_dot(row, &w) + b * SVM_BIAS) - 1.0 + diag * alpha[i];
                let pg = if alpha[i] == 0.0 { g.min(0.0) } else { g };

                max_pg = max_pg.max(pg);
                min_pg = min_pg.min(pg);

                if pg.abs() > 1e-12 {
                    let old = alpha[i];
                    alpha[i] = (old - g / q_diag[i]).max(0.0);
                    let step = (alpha[i] - old) * yi;
                    for &(j, v) in row {
                        w[j] += step * v;
                    }
                    b += step * SVM_BIAS;
                }
            }

            if max_pg - min_pg <= self.tol {
                tracing::debug!(epochs = epoch + 1, "Linear SVM converged");
                return (w, b);
            }
        }

        tracing::debug!(max_iter = self.max_iter, "Linear SVM hit epoch limit");
        (w, b)
    }
}

impl Classifier for LinearSvm {
    fn fit(&mut self, x: &SparseMatrix, y: &[usize], n_classes: usize) -> Result<()> {
        check_training_input(x, y, n_classes)?;
        if self.c <= 0.0 {
            return Err(CoreError::Training("C must be positive".to_string()));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut params = LinearWeights::zeros(n_classes, x.n_features);

        if n_classes == 2 {
            let positive: Vec<bool> = y.iter().map(|&label| label == 1).collect();
            let (w, b) = self.solve_binary(x, &positive, &mut rng);
            // Class 0 scores the negated decision function.
            params.weights[0] = w.iter().map(|v| -v).collect();
            params.bias[0] = -b;
            params.weights[1] = w;
            params.bias[1] = b;
        } else {
            for class in 0..n_classes {
                let positive: Vec<bool> = y.iter().map(|&label| label == class).collect();
                let (w, b) = self.solve_binary(x, &positive, &mut rng);
                params.weights[class] = w;
                params.bias[class] = b;
            }
        }

        self.fitted = Some(params);
        Ok(())
    }

    fn predict(&self, x: &SparseMatrix) -> Result<Vec<usize>> {
        let params = self.fitted.as_ref().ok_or_else(not_fitted)?;
        check_features(x, params.n_features())?;
        Ok(x.rows.iter().map(|row| argmax(&params.scores(row))).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two separable classes on features 0 and 1.
    fn toy() -> (SparseMatrix, Vec<usize>) {
        let rows = vec![
            vec![(0, 1.0)],
            vec![(0, 0.9), (2, 0.1)],
            vec![(0, 0.8), (2, 0.2)],
            vec![(1, 1.0)],
            vec![(1, 0.9), (2, 0.1)],
            vec![(1, 0.8), (2, 0.2)],
        ];
        (SparseMatrix { rows, n_features: 3 }, vec![0, 0, 0, 1, 1, 1])
    }

    fn three_class() -> (SparseMatrix, Vec<usize>) {
        let rows = vec![
            vec![(0, 1.0)],
            vec![(0, 0.95), (3, 0.3)],
            vec![(1, 1.0)],
            vec![(1, 0.95), (3, 0.3)],
            vec![(2, 1.0)],
            vec![(2, 0.95), (3, 0.3)],
        ];
        (SparseMatrix { rows, n_features: 4 }, vec![0, 0, 1, 1, 2, 2])
    }

    #[test]
    fn test_every_model_fits_separable_data() {
        for kind in ModelKind::ALL {
            let (x, y) = toy();
            let mut model = build_classifier(kind);
            model.fit(&x, &y, 2).unwrap();
            assert_eq!(model.predict(&x).unwrap(), y, "{:?}", kind);
        }
    }

    #[test]
    fn test_every_model_handles_three_classes() {
        for kind in ModelKind::ALL {
            let (x, y) = three_class();
            let mut model = build_classifier(kind);
            model.fit(&x, &y, 3).unwrap();
            assert_eq!(model.predict(&x).unwrap(), y, "{:?}", kind);
        }
    }

    #[test]
    fn test_predict_before_fit_is_error() {
        let (x, _) = toy();
        for kind in ModelKind::ALL {
            assert!(build_classifier(kind).predict(&x).is_err());
        }
    }

    #[test]
    fn test_naive_bayes_rejects_negative_features() {
        let x = SparseMatrix {
            rows: vec![vec![(0, -0.5)], vec![(1, 1.0)]],
            n_features: 2,
        };
        let mut nb = MultinomialNaiveBayes::default();
        assert!(matches!(nb.fit(&x, &[0, 1], 2), Err(CoreError::Training(_))));
    }

    #[test]
    fn test_label_count_mismatch_is_error() {
        let (x, _) = toy();
        let mut model = LogisticRegression::default();
        assert!(model.fit(&x, &[0, 1], 2).is_err());
    }

    #[test]
    fn test_feature_width_mismatch_is_error() {
        let (x, y) = toy();
        let mut model = LinearSvm::default();
        model.fit(&x, &y, 2).unwrap();
        let other = SparseMatrix {
            rows: vec![vec![(0, 1.0)]],
            n_features: 7,
        };
        assert!(model.predict(&other).is_err());
    }

    #[test]
    fn test_empty_row_predicts_a_valid_class() {
        let (x, y) = toy();
        let mut model = LogisticRegression::default();
        model.fit(&x, &y, 2).unwrap();
        let blank = SparseMatrix {
            rows: vec![vec![]],
            n_features: 3,
        };
        assert!(model.predict(&blank).unwrap()[0] < 2);
    }

    #[test]
    fn test_svm_is_deterministic() {
        let (x, y) = three_class();
        let mut a = LinearSvm::default();
        let mut b = LinearSvm::default();
        a.fit(&x, &y, 3).unwrap();
        b.fit(&x, &y, 3).unwrap();
        assert_eq!(a.fitted, b.fitted);
    }

    #[test]
    fn test_argmax_prefers_lowest_index_on_ties() {
        assert_eq!(argmax(&[0.5, 0.5, 0.1]), 0);
        assert_eq!(argmax(&[0.1, 0.7, 0.7]), 1);
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let p = softmax(&[1000.0, 999.0, -5.0]);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }
}
