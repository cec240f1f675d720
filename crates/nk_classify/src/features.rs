use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use nk_core::{Error, Result};

use crate::text::Normalizer;

const MIN_NGRAM: usize = 1;
const MAX_NGRAM: usize = 3;

/// A document projected into the vocabulary's weighted n-gram space.
/// L2-normalized, so the norm is 1.0 for any document with at least one
/// in-vocabulary term and 0.0 otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn l2_norm(&self) -> f32 {
        self.0.iter().map(|v| v * v).sum::<f32>().sqrt()
    }
}

/// Term-to-column mapping with inverse-document-frequency weights, fitted
/// once ahead of time. Part of the versioned model artifact: inference always
/// loads a previously fitted vocabulary, never fits its own, since a refit
/// would silently change dimensionality and column order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: HashMap<String, usize>,
    idf: Vec<f32>,
}

impl Vocabulary {
    /// Build a vocabulary over unigrams through trigrams of the corpus, with
    /// smoothed IDF weights. Columns are assigned in sorted-term order so the
    /// same corpus always fits to the same layout.
    pub fn fit<S: AsRef<str>>(corpus: &[S], normalizer: &Normalizer) -> Self {
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for doc in corpus {
            let tokens = normalizer.normalize(doc.as_ref());
            let seen: BTreeSet<String> = ngrams(&tokens).into_iter().collect();
            for term in seen {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let n = corpus.len() as f32;
        let mut terms = HashMap::with_capacity(document_frequency.len());
        let mut idf = Vec::with_capacity(document_frequency.len());
        for (index, (term, df)) in document_frequency.into_iter().enumerate() {
            terms.insert(term, index);
            idf.push(((1.0 + n) / (1.0 + df as f32)).ln() + 1.0);
        }

        Self { terms, idf }
    }

    pub fn dimension(&self) -> usize {
        self.idf.len()
    }

    /// Internal consistency check, run when an artifact is loaded.
    pub fn validate(&self) -> Result<()> {
        if self.terms.len() != self.idf.len() {
            return Err(Error::ModelMismatch(format!(
                "vocabulary has {} terms but {} idf weights",
                self.terms.len(),
                self.idf.len()
            )));
        }
        let mut seen = vec![false; self.idf.len()];
        for (term, &index) in &self.terms {
            if index >= self.idf.len() || seen[index] {
                return Err(Error::ModelMismatch(format!(
                    "vocabulary column index {} for term {:?} is out of range or duplicated",
                    index, term
                )));
            }
            seen[index] = true;
        }
        Ok(())
    }

    /// Project a document into the fitted space: n-gram term frequencies
    /// weighted by IDF, then L2-normalized. Out-of-vocabulary terms are
    /// ignored.
    pub fn transform(&self, text: &str, normalizer: &Normalizer) -> FeatureVector {
        let tokens = normalizer.normalize(text);
        let mut values = vec![0.0f32; self.dimension()];
        for term in ngrams(&tokens) {
            if let Some(&index) = self.terms.get(&term) {
                values[index] += 1.0;
            }
        }
        for (index, value) in values.iter_mut().enumerate() {
            *value *= self.idf[index];
        }

        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in values.iter_mut() {
                *value /= norm;
            }
        }
        FeatureVector(values)
    }
}

fn ngrams(tokens: &[String]) -> Vec<String> {
    let mut terms = Vec::new();
    for n in MIN_NGRAM..=MAX_NGRAM {
        for window in tokens.windows(n) {
            terms.push(window.join(" "));
        }
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<&'static str> {
        vec![
            "brand centrum räddningstjänst",
            "val regering riksdag",
            "match mål fotboll",
        ]
    }

    #[test]
    fn test_fit_is_stable_across_runs() {
        let normalizer = Normalizer::new();
        let a = Vocabulary::fit(&corpus(), &normalizer);
        let b = Vocabulary::fit(&corpus(), &normalizer);
        assert_eq!(a.dimension(), b.dimension());
        assert_eq!(a.terms, b.terms);
        assert_eq!(a.idf, b.idf);
    }

    #[test]
    fn test_fit_includes_ngrams_up_to_trigrams() {
        let normalizer = Normalizer::new();
        let vocabulary = Vocabulary::fit(&["brand centrum natt"], &normalizer);
        // 3 unigrams + 2 bigrams + 1 trigram
        assert_eq!(vocabulary.dimension(), 6);
    }

    #[test]
    fn test_transform_is_l2_normalized() {
        let normalizer = Normalizer::new();
        let vocabulary = Vocabulary::fit(&corpus(), &normalizer);

        let vector = vocabulary.transform("brand centrum", &normalizer);
        assert!((vector.l2_norm() - 1.0).abs() < 1e-5);

        // Repeating the text changes term frequencies but not the norm.
        let vector = vocabulary.transform("brand centrum brand centrum brand", &normalizer);
        assert!((vector.l2_norm() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_transform_empty_or_unknown_text_is_zero() {
        let normalizer = Normalizer::new();
        let vocabulary = Vocabulary::fit(&corpus(), &normalizer);

        for text in ["", "okänd terminologi utanför vokabulären"] {
            let vector = vocabulary.transform(text, &normalizer);
            assert_eq!(vector.len(), vocabulary.dimension());
            assert_eq!(vector.l2_norm(), 0.0, "text: {:?}", text);
        }
    }

    #[test]
    fn test_transform_dimensionality_is_fixed() {
        let normalizer = Normalizer::new();
        let vocabulary = Vocabulary::fit(&corpus(), &normalizer);
        for text in ["brand", "val regering riksdag brand centrum", ""] {
            assert_eq!(
                vocabulary.transform(text, &normalizer).len(),
                vocabulary.dimension()
            );
        }
    }

    #[test]
    fn test_validate_catches_corrupt_vocabulary() {
        let normalizer = Normalizer::new();
        let vocabulary = Vocabulary::fit(&corpus(), &normalizer);
        assert!(vocabulary.validate().is_ok());

        let mut corrupt = vocabulary.clone();
        corrupt.idf.pop();
        assert!(corrupt.validate().is_err());
    }
}
