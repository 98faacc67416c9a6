use crate::error::Result;

/// A pure computation over a prepared input, such as scoring predictions
/// against ground truth.
pub trait MetricCalculator {
    type Input;
    type Output;

    fn calculate(&self, input: Self::Input) -> Result<Self::Output>;
}
