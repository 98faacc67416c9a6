use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    pub label: usize,
}

impl Document {
    pub fn new(text: impl Into<String>, label: usize) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

/// A labeled document set. Every label indexes `label_names`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Corpus {
    documents: Vec<Document>,
    label_names: Vec<String>,
}

impl Corpus {
    pub fn new(documents: Vec<Document>, label_names: Vec<String>) -> Result<Self> {
        if let Some(doc) = documents.iter().find(|d| d.label >= label_names.len()) {
            return Err(CoreError::Validation(format!(
                "document label {} out of range for {} label names",
                doc.label,
                label_names.len()
            )));
        }
        Ok(Self {
            documents,
            label_names,
        })
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn texts(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.text.clone()).collect()
    }

    pub fn labels(&self) -> Vec<usize> {
        self.documents.iter().map(|d| d.label).collect()
    }

    /// Number of documents carrying each label, indexed by label.
    pub fn label_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.label_names.len()];
        for doc in &self.documents {
            counts[doc.label] += 1;
        }
        counts
    }
}

// ===== Dataset Catalog =====

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Imdb,
    News,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatasetInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub samples: usize,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 2] = [DatasetKind::Imdb, DatasetKind::News];

    /// Map an identifier to a dataset. Unknown identifiers fall back to `Imdb`.
    pub fn resolve(id: &str) -> Self {
        match id {
            "news" => DatasetKind::News,
            _ => DatasetKind::Imdb,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            DatasetKind::Imdb => "imdb",
            DatasetKind::News => "news",
        }
    }

    pub fn info(&self) -> DatasetInfo {
        let (name, description) = match self {
            DatasetKind::Imdb => (
                "IMDb Movie Reviews",
                "Binary sentiment classification (positive/negative)",
            ),
            DatasetKind::News => (
                "News Category Dataset",
                "Multi-class news article classification",
            ),
        };
        DatasetInfo {
            id: self.id().to_string(),
            name: name.to_string(),
            description: description.to_string(),
            samples: 2000,
        }
    }

    pub fn catalog() -> Vec<DatasetInfo> {
        Self::ALL.iter().map(DatasetKind::info).collect()
    }
}
