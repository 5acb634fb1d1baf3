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

//! In-memory model of one corpus document.
//!
//! All derived fields are computed exactly once, at construction, from the
//! immutable source markup. Construction assumes the corpus already passed
//! schema validation; it still fails fast on values it cannot interpret
//! (missing attribute, non-integer rate) instead of defaulting, because a
//! silent default would corrupt the rating sum.

use std::collections::BTreeSet;
use std::collections::HashMap;

use anyhow::Result;

use crate::normalize::Normalizer;
use crate::xml::Element;

/// Ratings are summed per annotation and capped here.
pub const MAX_RATING: u8 = 10;

/// One `<tox>` annotation, validated into fixed fields at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToxAnnotation {
    pub rate: u32,
    pub tox_type: String,
    pub response: String,
}

/// One `<phrase>` annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseAnnotation {
    pub phrase_type: String,
}

#[derive(Debug, Clone)]
pub struct Document {
    raw: Element,
    token_counts: HashMap<String, u64>,
    annotation_tokens: HashMap<String, u64>,
    annotation_lemmas: HashMap<String, u64>,
    rating: u8,
    response_categories: BTreeSet<String>,
    toxicity_categories: BTreeSet<String>,
    phrase_categories: BTreeSet<String>,
}

impl Document {
    /// Derive every field from one top-level corpus node.
    pub fn build(raw: Element, normalizer: &Normalizer) -> Result<Self> {
        let mut token_counts = HashMap::new();
        for token in normalizer.normalize(raw.all_text().trim()) {
            *token_counts.entry(token).or_insert(0) += 1;
        }

        let mut annotation_tokens = HashMap::new();
        let mut annotation_lemmas = HashMap::new();
        for lex in raw.descendants("lex") {
            let text = lex.all_text().trim().to_lowercase();
            if text.is_empty() {
                continue;
            }
            let lemma = normalizer.canonical(&text);
            *annotation_tokens.entry(text).or_insert(0) += 1;
            *annotation_lemmas.entry(lemma).or_insert(0) += 1;
        }

        let tox_annotations = extract_tox(&raw)?;
        let phrase_annotations = extract_phrases(&raw)?;

        let sum: u32 = tox_annotations.iter().map(|tox| tox.rate).sum();
        let rating = sum.min(u32::from(MAX_RATING)) as u8;

        let mut response_categories = BTreeSet::new();
        let mut toxicity_categories = BTreeSet::new();
        for tox in &tox_annotations {
            response_categories.insert(tox.response.clone());
            toxicity_categories.insert(tox.tox_type.clone());
        }
        let phrase_categories = phrase_annotations
            .iter()
            .map(|phrase| phrase.phrase_type.clone())
            .collect();

        Ok(Self {
            raw,
            token_counts,
            annotation_tokens,
            annotation_lemmas,
            rating,
            response_categories,
            toxicity_categories,
            phrase_categories,
        })
    }

    pub fn to_xml(&self) -> String {
        self.raw.to_xml()
    }

    pub fn token_counts(&self) -> &HashMap<String, u64> {
        &self.token_counts
    }

    pub fn annotation_tokens(&self) -> &HashMap<String, u64> {
        &self.annotation_tokens
    }

    pub fn annotation_lemmas(&self) -> &HashMap<String, u64> {
        &self.annotation_lemmas
    }

    /// Always within `[0, MAX_RATING]`.
    pub fn rating(&self) -> u8 {
        self.rating
    }

    pub fn response_categories(&self) -> &BTreeSet<String> {
        &self.response_categories
    }

    pub fn toxicity_categories(&self) -> &BTreeSet<String> {
        &self.toxicity_categories
    }

    pub fn phrase_categories(&self) -> &BTreeSet<String> {
        &self.phrase_categories
    }
}

/// Category labels are compared with whitespace stripped and lowercased, so
/// `hate_speech: race` and `hate_speech:race` are the same key.
pub fn normalize_label(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

fn extract_tox(raw: &Element) -> Result<Vec<ToxAnnotation>> {
    let mut annotations = Vec::new();
    for element in raw.descendants("tox") {
        let rate_text = required_attr(element, "rate")?;
        let rate: u32 = rate_text.parse().map_err(|_| {
            anyhow::anyhow!(
                "non-integer rate {rate_text:?} in {}",
                shallow_markup(element)
            )
        })?;
        annotations.push(ToxAnnotation {
            rate,
            tox_type: normalize_label(required_attr(element, "type")?),
            response: normalize_label(required_attr(element, "response")?),
        });
    }
    Ok(annotations)
}

fn extract_phrases(raw: &Element) -> Result<Vec<PhraseAnnotation>> {
    let mut annotations = Vec::new();
    for element in raw.descendants("phrase") {
        annotations.push(PhraseAnnotation {
            phrase_type: normalize_label(required_attr(element, "type")?),
        });
    }
    Ok(annotations)
}

fn required_attr<'a>(element: &'a Element, name: &str) -> Result<&'a str> {
    element.attr(name).ok_or_else(|| {
        anyhow::anyhow!(
            "{} is missing required attribute {name:?}",
            shallow_markup(element)
        )
    })
}

/// Opening tag only, for error messages.
pub fn shallow_markup(element: &Element) -> String {
    let mut out = format!("<{}", element.name);
    for (key, value) in &element.attrs {
        out.push_str(&format!(" {key}=\"{value}\""));
    }
    out.push('>');
    out
}
