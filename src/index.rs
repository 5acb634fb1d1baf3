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

//! Corpus store and inverted indexes.
//!
//! Documents get sequential identifiers starting at 0. The five inverted
//! indexes are built in one pass after every document is stored, and the
//! whole structure is read-only from then on; a changed corpus means a full
//! reload, never a patch.

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use anyhow::Result;

use crate::document::Document;
use crate::normalize::Normalizer;
use crate::query;
use crate::query::SearchParams;
use crate::xml::Node;
use crate::xml::parse_document;

pub type DocId = usize;

#[derive(Debug)]
pub struct CorpusIndex {
    documents: Vec<Document>,
    lemma_index: HashMap<String, BTreeSet<DocId>>,
    rating_index: HashMap<u8, BTreeSet<DocId>>,
    response_index: HashMap<String, BTreeSet<DocId>>,
    tox_type_index: HashMap<String, BTreeSet<DocId>>,
    phrase_type_index: HashMap<String, BTreeSet<DocId>>,
}

impl CorpusIndex {
    pub fn load_path(path: &Path, normalizer: &Normalizer) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read corpus {}", path.display()))?;
        Self::load_str(&text, normalizer)
            .with_context(|| format!("load corpus {}", path.display()))
    }

    /// Build the entire index from raw corpus markup. Any structural problem
    /// in any document fails the whole load; a partially built index would
    /// have undefined coverage.
    pub fn load_str(xml: &str, normalizer: &Normalizer) -> Result<Self> {
        let root = parse_document(xml)?;
        let mut documents = Vec::new();
        for node in root.nodes {
            if let Node::Element(element) = node {
                let document = Document::build(element, normalizer)
                    .with_context(|| format!("document {}", documents.len()))?;
                documents.push(document);
            }
        }
        Ok(Self::build(documents))
    }

    fn build(documents: Vec<Document>) -> Self {
        let mut index = Self {
            documents,
            lemma_index: HashMap::new(),
            rating_index: HashMap::new(),
            response_index: HashMap::new(),
            tox_type_index: HashMap::new(),
            phrase_type_index: HashMap::new(),
        };

        for id in 0..index.documents.len() {
            let document = &index.documents[id];

            for token in document.token_counts().keys() {
                index
                    .lemma_index
                    .entry(token.clone())
                    .or_default()
                    .insert(id);
            }
            // Curated lex keys are searchable alongside free text.
            for lemma in document.annotation_lemmas().keys() {
                index
                    .lemma_index
                    .entry(lemma.clone())
                    .or_default()
                    .insert(id);
            }

            index
                .rating_index
                .entry(document.rating())
                .or_default()
                .insert(id);

            for label in document.response_categories() {
                insert_categorical(&mut index.response_index, label, id);
            }
            for label in document.toxicity_categories() {
                insert_categorical(&mut index.tox_type_index, label, id);
            }
            for label in document.phrase_categories() {
                insert_categorical(&mut index.phrase_type_index, label, id);
            }
        }

        index
    }

    pub fn get(&self, id: DocId) -> Option<&Document> {
        self.documents.get(id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> impl Iterator<Item = (DocId, &Document)> {
        self.documents.iter().enumerate()
    }

    /// Matching identifiers for a structured query; purely a read.
    pub fn search(&self, normalizer: &Normalizer, params: &SearchParams) -> BTreeSet<DocId> {
        query::evaluate(self, normalizer, params)
    }

    pub fn lemma_docs(&self, token: &str) -> Option<&BTreeSet<DocId>> {
        self.lemma_index.get(token)
    }

    pub fn rating_docs(&self, rating: u8) -> Option<&BTreeSet<DocId>> {
        self.rating_index.get(&rating)
    }

    pub fn response_docs(&self, label: &str) -> Option<&BTreeSet<DocId>> {
        self.response_index.get(label)
    }

    pub fn tox_type_docs(&self, label: &str) -> Option<&BTreeSet<DocId>> {
        self.tox_type_index.get(label)
    }

    pub fn phrase_type_docs(&self, label: &str) -> Option<&BTreeSet<DocId>> {
        self.phrase_type_index.get(label)
    }

    pub fn lemma_count(&self) -> usize {
        self.lemma_index.len()
    }

    /// Distinct response labels present in the corpus, sorted for display.
    pub fn response_labels(&self) -> Vec<String> {
        sorted_keys(&self.response_index)
    }

    pub fn tox_type_labels(&self) -> Vec<String> {
        sorted_keys(&self.tox_type_index)
    }

    pub fn phrase_type_labels(&self) -> Vec<String> {
        sorted_keys(&self.phrase_type_index)
    }

    #[cfg(test)]
    fn all_index_ids(&self) -> impl Iterator<Item = DocId> + '_ {
        self.lemma_index
            .values()
            .chain(self.rating_index.values())
            .chain(self.response_index.values())
            .chain(self.tox_type_index.values())
            .chain(self.phrase_type_index.values())
            .flat_map(|ids| ids.iter().copied())
    }
}

/// Hierarchical labels (`group:subtype`) are also registered under their
/// parent group, so a group query matches all its subtypes.
fn insert_categorical(index: &mut HashMap<String, BTreeSet<DocId>>, label: &str, id: DocId) {
    index.entry(label.to_string()).or_default().insert(id);
    if let Some((group, _)) = label.split_once(':') {
        index.entry(group.to_string()).or_default().insert(id);
    }
}

fn sorted_keys(index: &HashMap<String, BTreeSet<DocId>>) -> Vec<String> {
    let mut keys: Vec<String> = index.keys().cloned().collect();
    keys.sort();
    keys
}
