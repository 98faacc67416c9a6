use serde::{Deserialize, Serialize};

/// Classifier families available to an experiment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Logistic,
    NaiveBayes,
    Svm,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [ModelKind::Logistic, ModelKind::NaiveBayes, ModelKind::Svm];

    /// Map an identifier to a model kind. Unknown identifiers fall back to
    /// `Logistic`.
    pub fn resolve(id: &str) -> Self {
        match id {
            "naive_bayes" => ModelKind::NaiveBayes,
            "svm" => ModelKind::Svm,
            _ => ModelKind::Logistic,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            ModelKind::Logistic => "logistic",
            ModelKind::NaiveBayes => "naive_bayes",
            ModelKind::Svm => "svm",
        }
    }

    pub fn info(&self) -> ModelInfo {
        let (name, description) = match self {
            ModelKind::Logistic => ("Logistic Regression", "Fast linear classifier"),
            ModelKind::NaiveBayes => ("Naive Bayes", "Probabilistic classifier"),
            ModelKind::Svm => ("Support Vector Machine", "Margin-based linear classifier"),
        };
        ModelInfo {
            id: self.id().to_string(),
            name: name.to_string(),
            description: description.to_string(),
        }
    }

    pub fn catalog() -> Vec<ModelInfo> {
        Self::ALL.iter().map(ModelKind::info).collect()
    }
}

impl Default for ModelKind {
    fn default() -> Self {
        ModelKind::Logistic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_ids() {
        for kind in ModelKind::ALL {
            assert_eq!(ModelKind::resolve(kind.id()), kind);
        }
    }

    #[test]
    fn test_resolve_unknown_falls_back_to_logistic() {
        assert_eq!(ModelKind::resolve("random_forest"), ModelKind::Logistic);
        assert_eq!(ModelKind::resolve("SVM"), ModelKind::Logistic);
    }
}
