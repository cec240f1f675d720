use std::sync::Arc;

use tracing::{debug, warn};

use nk_core::{ClassifiedArticle, Error, RawEntry, Result};
use nk_ingest::{canonicalize, filter_classifiable};

use crate::artifact::ModelArtifact;
use crate::labels::{assign, DEFAULT_THRESHOLD};
use crate::text::Normalizer;

/// Batch orchestrator: ingest → normalize/featurize → score → assign →
/// validate → emit. The model artifact is injected at construction and
/// reused for every batch; the pipeline holds no other state.
pub struct ClassificationPipeline {
    artifact: Arc<ModelArtifact>,
    normalizer: Normalizer,
    threshold: f32,
}

impl ClassificationPipeline {
    pub fn new(artifact: Arc<ModelArtifact>) -> Self {
        Self {
            artifact,
            normalizer: Normalizer::new(),
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Classify one batch. Output count and order match the canonical
    /// articles that survive the empty-text filter, minus records dropped by
    /// structural validation. Label sets are joined back to articles by link
    /// key; any count or key disagreement aborts the whole batch with
    /// `Error::Alignment` so misaligned title/label pairs can never be
    /// emitted.
    pub fn run(&self, entries: Vec<RawEntry>) -> Result<Vec<ClassifiedArticle>> {
        let canonical: Vec<_> = entries.into_iter().map(canonicalize).collect();
        let articles = filter_classifiable(canonical);
        debug!(batch = articles.len(), "classifying batch");

        let mut labeled: Vec<(String, Vec<String>)> = Vec::with_capacity(articles.len());
        for article in &articles {
            let vector = self
                .artifact
                .vocabulary
                .transform(&article.classification_text(), &self.normalizer);
            let scores = self.artifact.classifier.score(&vector)?;
            labeled.push((article.link.clone(), assign(&scores, self.threshold)));
        }

        if labeled.len() != articles.len() {
            return Err(Error::Alignment(format!(
                "{} articles but {} label sets",
                articles.len(),
                labeled.len()
            )));
        }

        let mut output = Vec::with_capacity(articles.len());
        for (article, (link, categories)) in articles.into_iter().zip(labeled) {
            if article.link != link {
                return Err(Error::Alignment(format!(
                    "label set for {:?} paired with article {:?}",
                    link, article.link
                )));
            }
            let classified = ClassifiedArticle::new(article, categories);
            match classified.validate() {
                Ok(()) => output.push(classified),
                Err(e) => {
                    warn!(link = %classified.link, error = %e, "dropping invalid record");
                }
            }
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Vocabulary;
    use crate::model::LinearClassifier;

    /// Artifact over a small fitted vocabulary. Zero weights make every
    /// probability sigmoid(bias), which keeps assignments predictable.
    fn artifact(bias: Vec<f32>) -> Arc<ModelArtifact> {
        let normalizer = Normalizer::new();
        let vocabulary = Vocabulary::fit(
            &["brand centrum räddningstjänst", "val regering riksdag"],
            &normalizer,
        );
        let dimension = vocabulary.dimension();
        let categories = vec!["Samhälle & Konflikter".to_string(), "Politik".to_string()];
        let weights = vec![vec![0.0; dimension]; categories.len()];
        let classifier = LinearClassifier::new(categories, weights, bias);
        Arc::new(ModelArtifact::new("test-gen", vocabulary, classifier).unwrap())
    }

    fn entry(title: &str, link: &str) -> RawEntry {
        RawEntry {
            title: Some(title.to_string()),
            summary: Some(String::new()),
            link: Some(link.to_string()),
            published: Some("Mon, 01 Jan 2024 12:00:00 GMT".to_string()),
        }
    }

    #[test]
    fn test_run_assigns_thresholded_categories() {
        // sigmoid(0) = 0.5 for the first category, sigmoid(-3) ≈ 0.047 for
        // the second; only the first clears the 0.3 threshold.
        let pipeline = ClassificationPipeline::new(artifact(vec![0.0, -3.0]));
        let output = pipeline
            .run(vec![entry("Brand i centrum", "https://x/1")])
            .unwrap();
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].categories, vec!["Samhälle & Konflikter"]);
    }

    #[test]
    fn test_run_falls_back_to_argmax_when_nothing_clears_threshold() {
        // sigmoid(-3) ≈ 0.047 and sigmoid(-2) ≈ 0.119: both below 0.3, so
        // the argmax category wins.
        let pipeline = ClassificationPipeline::new(artifact(vec![-3.0, -2.0]));
        let output = pipeline
            .run(vec![entry("Brand i centrum", "https://x/1")])
            .unwrap();
        assert_eq!(output[0].categories, vec!["Politik"]);
    }

    #[test]
    fn test_run_excludes_entries_without_text() {
        let pipeline = ClassificationPipeline::new(artifact(vec![0.0, 0.0]));
        let empty = RawEntry {
            link: Some("https://x/empty".to_string()),
            ..Default::default()
        };
        let output = pipeline
            .run(vec![empty, entry("Valet avgjort", "https://x/1")])
            .unwrap();
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].link, "https://x/1");
    }

    #[test]
    fn test_run_preserves_input_order() {
        let pipeline = ClassificationPipeline::new(artifact(vec![0.0, 0.0]));
        let output = pipeline
            .run(vec![
                entry("Brand i centrum", "https://x/1"),
                entry("Valet avgjort", "https://x/2"),
                entry("Nytt rekord", "https://x/3"),
            ])
            .unwrap();
        let links: Vec<&str> = output.iter().map(|a| a.link.as_str()).collect();
        assert_eq!(links, vec!["https://x/1", "https://x/2", "https://x/3"]);
    }

    #[test]
    fn test_run_drops_records_failing_validation() {
        let pipeline = ClassificationPipeline::new(artifact(vec![0.0, 0.0]));
        // Has text but no usable link: classified, then dropped by the
        // structural check. The batch itself continues.
        let output = pipeline
            .run(vec![
                entry("Brand i centrum", "inte en länk"),
                entry("Valet avgjort", "https://x/2"),
            ])
            .unwrap();
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].link, "https://x/2");
    }

    #[test]
    fn test_run_propagates_model_mismatch() {
        let normalizer = Normalizer::new();
        let vocabulary = Vocabulary::fit(&["brand centrum"], &normalizer);
        let classifier = LinearClassifier::new(
            vec!["Politik".to_string()],
            vec![vec![0.0; vocabulary.dimension()]],
            vec![0.0],
        );
        // Bypass the artifact constructor to simulate an artifact whose
        // vocabulary was swapped after validation.
        let mut artifact = ModelArtifact::new("test-gen", vocabulary, classifier).unwrap();
        // One unigram only, so the dimension cannot match the original's.
        artifact.vocabulary = Vocabulary::fit(&["ishockey"], &normalizer);

        let pipeline = ClassificationPipeline::new(Arc::new(artifact));
        let result = pipeline.run(vec![entry("Brand i centrum", "https://x/1")]);
        assert!(matches!(result, Err(Error::ModelMismatch(_))));
    }

    #[test]
    fn test_run_empty_batch() {
        let pipeline = ClassificationPipeline::new(artifact(vec![0.0, 0.0]));
        assert!(pipeline.run(Vec::new()).unwrap().is_empty());
    }
}
