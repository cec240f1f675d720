use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use nk_core::{Error, Result};

use crate::features::Vocabulary;
use crate::model::LinearClassifier;

/// The paired (vocabulary, classifier) artifact from one training generation,
/// serialized as a single JSON file. Loaded once at process start, shared via
/// `Arc`, never mutated. Pairing vocabulary and classifier in one file makes
/// a generation mismatch impossible to construct by mixing files; `validate`
/// still rejects artifacts whose shapes disagree internally.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub generation: String,
    pub vocabulary: Vocabulary,
    pub classifier: LinearClassifier,
}

impl ModelArtifact {
    pub fn new(
        generation: impl Into<String>,
        vocabulary: Vocabulary,
        classifier: LinearClassifier,
    ) -> Result<Self> {
        let artifact = Self {
            generation: generation.into(),
            vocabulary,
            classifier,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn validate(&self) -> Result<()> {
        if self.generation.trim().is_empty() {
            return Err(Error::ModelMismatch(
                "artifact has no generation tag".to_string(),
            ));
        }
        self.vocabulary.validate()?;
        self.classifier.validate(self.vocabulary.dimension())
    }

    /// Load and validate an artifact. Refusing to score with a mismatched
    /// artifact beats producing silently wrong predictions, so any validation
    /// failure here is fatal.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        let artifact: Self = serde_json::from_str(&raw)?;
        artifact.validate()?;
        info!(
            generation = %artifact.generation,
            categories = artifact.classifier.categories().len(),
            dimension = artifact.vocabulary.dimension(),
            "loaded model artifact"
        );
        Ok(artifact)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.validate()?;
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), raw)?;
        Ok(())
    }
}
