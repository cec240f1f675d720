use std::collections::HashSet;

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};

/// Deterministic Swedish tokenizer used by the feature extractor.
///
/// Steps, in fixed order: lowercase, strip `<...>` markup, strip
/// non-word/non-space characters, strip digit runs, split on whitespace,
/// drop stopwords, stem. Total: any input string yields a (possibly empty)
/// token list.
pub struct Normalizer {
    markup: Regex,
    symbols: Regex,
    digits: Regex,
    stopwords: HashSet<String>,
    stemmer: Stemmer,
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            markup: Regex::new(r"<.*?>").expect("markup pattern"),
            symbols: Regex::new(r"[^\w\s]").expect("symbol pattern"),
            digits: Regex::new(r"\d+").expect("digit pattern"),
            stopwords: stop_words::get(stop_words::LANGUAGE::Swedish)
                .into_iter()
                .collect(),
            stemmer: Stemmer::create(Algorithm::Swedish),
        }
    }

    pub fn normalize(&self, text: &str) -> Vec<String> {
        let text = text.to_lowercase();
        let text = self.markup.replace_all(&text, " ");
        let text = self.symbols.replace_all(&text, "");
        let text = self.digits.replace_all(&text, "");

        text.split_whitespace()
            .filter(|token| !self.stopwords.contains(*token))
            .map(|token| self.stemmer.stem(token).into_owned())
            .collect()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}
