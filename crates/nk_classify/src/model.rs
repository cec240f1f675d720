use serde::{Deserialize, Serialize};

use nk_core::{Error, Result};

use crate::features::FeatureVector;

/// Multi-label linear classifier: one weight row and bias per category, with
/// an independent sigmoid per category (one-vs-rest). Probabilities are in
/// [0, 1] and need not sum to 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearClassifier {
    categories: Vec<String>,
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
}

impl LinearClassifier {
    pub fn new(categories: Vec<String>, weights: Vec<Vec<f32>>, bias: Vec<f32>) -> Self {
        Self {
            categories,
            weights,
            bias,
        }
    }

    /// The training label space, in declaration order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Input dimensionality the model was trained against.
    pub fn dimension(&self) -> usize {
        self.weights.first().map(|row| row.len()).unwrap_or(0)
    }

    /// Shape check against the paired vocabulary, run at artifact load.
    pub fn validate(&self, expected_dimension: usize) -> Result<()> {
        if self.categories.is_empty() {
            return Err(Error::ModelMismatch("classifier has no categories".to_string()));
        }
        let mut unique = self.categories.clone();
        unique.sort();
        unique.dedup();
        if unique.len() != self.categories.len() {
            return Err(Error::ModelMismatch("duplicate category labels".to_string()));
        }
        if self.weights.len() != self.categories.len() || self.bias.len() != self.categories.len() {
            return Err(Error::ModelMismatch(format!(
                "{} categories but {} weight rows and {} biases",
                self.categories.len(),
                self.weights.len(),
                self.bias.len()
            )));
        }
        for (category, row) in self.categories.iter().zip(&self.weights) {
            if row.len() != expected_dimension {
                return Err(Error::ModelMismatch(format!(
                    "weight row for {:?} has dimension {}, vocabulary has {}",
                    category,
                    row.len(),
                    expected_dimension
                )));
            }
        }
        Ok(())
    }

    /// Score a feature vector: one (category, probability) pair per category,
    /// ordered by the training label space. A dimensionality mismatch means
    /// the vector was built against a different vocabulary generation and is
    /// fatal.
    pub fn score(&self, vector: &FeatureVector) -> Result<Vec<(String, f32)>> {
        if vector.len() != self.dimension() {
            return Err(Error::ModelMismatch(format!(
                "feature vector has dimension {}, model expects {}",
                vector.len(),
                self.dimension()
            )));
        }

        let values = vector.values();
        let mut scores = Vec::with_capacity(self.categories.len());
        for ((category, row), bias) in self.categories.iter().zip(&self.weights).zip(&self.bias) {
            let activation: f32 = row.iter().zip(values).map(|(w, v)| w * v).sum::<f32>() + bias;
            scores.push((category.clone(), sigmoid(activation)));
        }
        Ok(scores)
    }
}

fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> LinearClassifier {
        LinearClassifier::new(
            vec!["Sport".to_string(), "Politik".to_string()],
            vec![vec![2.0, 0.0], vec![0.0, 2.0]],
            vec![0.0, -1.0],
        )
    }

    #[test]
    fn test_score_orders_by_label_space() {
        let scores = classifier().score(&FeatureVector::new(vec![1.0, 0.0])).unwrap();
        assert_eq!(scores[0].0, "Sport");
        assert_eq!(scores[1].0, "Politik");
    }

    #[test]
    fn test_score_is_independent_per_category() {
        let scores = classifier().score(&FeatureVector::new(vec![1.0, 1.0])).unwrap();
        // sigmoid(2.0) and sigmoid(1.0); no normalization across labels.
        assert!((scores[0].1 - 0.880797).abs() < 1e-4);
        assert!((scores[1].1 - 0.731059).abs() < 1e-4);
        for (_, p) in &scores {
            assert!((0.0..=1.0).contains(p));
        }
    }

    #[test]
    fn test_score_rejects_dimension_mismatch() {
        let result = classifier().score(&FeatureVector::new(vec![1.0, 0.0, 0.0]));
        assert!(matches!(result, Err(Error::ModelMismatch(_))));
    }

    #[test]
    fn test_validate_rejects_bad_shapes() {
        assert!(classifier().validate(2).is_ok());
        assert!(classifier().validate(3).is_err());

        let no_bias = LinearClassifier::new(
            vec!["Sport".to_string()],
            vec![vec![0.0, 0.0]],
            vec![],
        );
        assert!(no_bias.validate(2).is_err());

        let duplicated = LinearClassifier::new(
            vec!["Sport".to_string(), "Sport".to_string()],
            vec![vec![0.0], vec![0.0]],
            vec![0.0, 0.0],
        );
        assert!(duplicated.validate(1).is_err());
    }
}
