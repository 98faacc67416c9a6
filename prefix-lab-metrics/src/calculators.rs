pub mod classification;

pub use classification::*;

use serde::{Deserialize, Serialize};

/// Predicted and true label indices for one evaluated split, aligned 1:1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelInput {
    pub predicted: Vec<usize>,
    pub actual: Vec<usize>,
}

impl LabelInput {
    pub fn new(predicted: Vec<usize>, actual: Vec<usize>) -> Self {
        Self { predicted, actual }
    }
}
