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

//! Query evaluation over the corpus indexes.
//!
//! Every active constraint resolves to one candidate set and the result is
//! their intersection. Labels within one dimension are unioned first, so
//! constraints are conjunctive across dimensions and disjunctive within one.
//! Unknown tokens and labels resolve to empty sets; that is no-match
//! semantics, not an error, so evaluation never fails.

use std::collections::BTreeSet;

use crate::document::MAX_RATING;
use crate::document::normalize_label;
use crate::index::CorpusIndex;
use crate::index::DocId;
use crate::normalize::Normalizer;

/// An immutable query descriptor, built per request and consumed once.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub query: String,
    pub rate_start: u8,
    pub rate_end: u8,
    pub responses: Vec<String>,
    pub tox_types: Vec<String>,
    pub phrase_types: Vec<String>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            query: String::new(),
            rate_start: 0,
            rate_end: MAX_RATING,
            responses: Vec::new(),
            tox_types: Vec::new(),
            phrase_types: Vec::new(),
        }
    }
}

pub fn evaluate(
    index: &CorpusIndex,
    normalizer: &Normalizer,
    params: &SearchParams,
) -> BTreeSet<DocId> {
    let mut sets: Vec<BTreeSet<DocId>> = Vec::new();

    // One candidate set per query token; an empty query contributes none.
    for token in normalizer.normalize(&params.query) {
        sets.push(index.lemma_docs(&token).cloned().unwrap_or_default());
    }

    sets.push(rating_candidates(index, params.rate_start, params.rate_end));

    if !params.responses.is_empty() {
        sets.push(label_candidates(&params.responses, |label| {
            index.response_docs(label)
        }));
    }
    if !params.tox_types.is_empty() {
        sets.push(label_candidates(&params.tox_types, |label| {
            index.tox_type_docs(label)
        }));
    }
    if !params.phrase_types.is_empty() {
        sets.push(label_candidates(&params.phrase_types, |label| {
            index.phrase_type_docs(label)
        }));
    }

    sets.into_iter()
        .reduce(|left, right| left.intersection(&right).copied().collect())
        .unwrap_or_default()
}

/// Union of the rating index over the inclusive range. An inverted range is
/// caller slip, not an error; the endpoints are swapped.
fn rating_candidates(index: &CorpusIndex, start: u8, end: u8) -> BTreeSet<DocId> {
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    let mut candidates = BTreeSet::new();
    for rating in start..=end.min(MAX_RATING) {
        if let Some(ids) = index.rating_docs(rating) {
            candidates.extend(ids.iter().copied());
        }
    }
    candidates
}

fn label_candidates<'a, F>(labels: &[String], lookup: F) -> BTreeSet<DocId>
where
    F: Fn(&str) -> Option<&'a BTreeSet<DocId>>,
{
    let mut candidates = BTreeSet::new();
    for label in labels {
        if let Some(ids) = lookup(&normalize_label(label)) {
            candidates.extend(ids.iter().copied());
        }
    }
    candidates
}
