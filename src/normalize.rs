// Copyright 2026 Toxseek Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Tokenization and pluggable token normalization.
//!
//! The same tokens recur across thousands of documents, so per-token results
//! are memoized for the lifetime of the process. The cache is the only
//! mutable state touched at query time and uses locked insertion so queries
//! may run concurrently.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use rust_stemmers::Algorithm;
use rust_stemmers::Stemmer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizerMode {
    /// Lowercasing only.
    None,
    /// Snowball stemming, English.
    English,
    /// Snowball stemming, Russian.
    Russian,
}

impl NormalizerMode {
    pub fn parse(label: &str) -> Result<Self> {
        match label {
            "none" => Ok(NormalizerMode::None),
            "english" => Ok(NormalizerMode::English),
            "russian" => Ok(NormalizerMode::Russian),
            other => anyhow::bail!(
                "unknown normalizer {other:?}; expected none, english or russian"
            ),
        }
    }

    pub fn as_label(self) -> &'static str {
        match self {
            NormalizerMode::None => "none",
            NormalizerMode::English => "english",
            NormalizerMode::Russian => "russian",
        }
    }
}

pub struct Normalizer {
    mode: NormalizerMode,
    stemmer: Option<Stemmer>,
    cache: Mutex<HashMap<String, String>>,
}

impl Normalizer {
    pub fn new(mode: NormalizerMode) -> Self {
        let stemmer = match mode {
            NormalizerMode::None => None,
            NormalizerMode::English => Some(Stemmer::create(Algorithm::English)),
            NormalizerMode::Russian => Some(Stemmer::create(Algorithm::Russian)),
        };
        Self {
            mode,
            stemmer,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn mode(&self) -> NormalizerMode {
        self.mode
    }

    /// Split a raw span into word-like units and map each to its canonical
    /// form. Pure punctuation never produces a token, so an all-punctuation
    /// input normalizes to an empty sequence.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        tokenize(text)
            .into_iter()
            .map(|token| self.canonical(token))
            .collect()
    }

    /// Canonical form of a single token. Deterministic; memoized when a
    /// stemmer is active, since dictionary stemming is the expensive step.
    pub fn canonical(&self, token: &str) -> String {
        let lower = token.to_lowercase();
        let Some(stemmer) = &self.stemmer else {
            return lower;
        };
        let mut cache = self.cache.lock().unwrap_or_else(|err| err.into_inner());
        if let Some(hit) = cache.get(&lower) {
            return hit.clone();
        }
        let stemmed = stemmer.stem(&lower).into_owned();
        cache.insert(lower, stemmed.clone());
        stemmed
    }

    #[cfg(test)]
    pub fn cached_tokens(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .len()
    }
}

/// Word-like units: maximal runs of alphanumeric characters. Everything else
/// is a separator, which drops pure-punctuation tokens on the floor.
fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_discards_punctuation() {
        assert_eq!(tokenize("so, bad! words..."), vec!["so", "bad", "words"]);
        assert!(tokenize("?!...").is_empty());
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn identity_mode_lowercases() {
        let normalizer = Normalizer::new(NormalizerMode::None);
        assert_eq!(
            normalizer.normalize("Bad WORDS here"),
            vec!["bad", "words", "here"]
        );
    }

    #[test]
    fn english_mode_stems() {
        let normalizer = Normalizer::new(NormalizerMode::English);
        assert_eq!(normalizer.normalize("running runs"), vec!["run", "run"]);
    }

    #[test]
    fn normalization_is_deterministic() {
        let normalizer = Normalizer::new(NormalizerMode::English);
        let first = normalizer.normalize("Insulting comments are insulting");
        let second = normalizer.normalize("Insulting comments are insulting");
        assert_eq!(first, second);
    }

    #[test]
    fn stem_cache_fills_per_distinct_token() {
        let normalizer = Normalizer::new(NormalizerMode::English);
        normalizer.normalize("abuse abuse abusive");
        assert_eq!(normalizer.cached_tokens(), 2);
        normalizer.normalize("abuse");
        assert_eq!(normalizer.cached_tokens(), 2);
    }

    #[test]
    fn identity_mode_does_not_cache() {
        let normalizer = Normalizer::new(NormalizerMode::None);
        normalizer.normalize("plain words");
        assert_eq!(normalizer.cached_tokens(), 0);
    }

    #[test]
    fn mode_labels_round_trip() {
        for label in ["none", "english", "russian"] {
            let mode = NormalizerMode::parse(label).expect("parse");
            assert_eq!(mode.as_label(), label);
        }
        assert!(NormalizerMode::parse("porter2000").is_err());
    }
}
