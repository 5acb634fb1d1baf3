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

//! Standalone corpus schema validator.
//!
//! Checks raw corpus text independently of the index: well-formed markup
//! first, then the annotation vocabulary. The index loader assumes this has
//! already passed, so this is where a corpus author gets their diagnostics.
//! All violations are collected, not just the first.

use serde::Serialize;

use crate::document::normalize_label;
use crate::document::shallow_markup;
use crate::xml::Element;
use crate::xml::parse_document;
use crate::xml::parse_error_offset;

const TOX_TYPES: &[&str] = &[
    "threat",
    "general_insult",
    "harassment",
    "profanity",
    "hate_speech",
    "hate_speech:lgbtq*",
    "hate_speech:gender",
    "hate_speech:race",
    "hate_speech:religion",
    "hate_speech:nationality",
];

const RESPONSES: &[&str] = &["person", "author", "post:animate", "post:inanimate"];

const PHRASE_TYPES: &[&str] = &["direct", "indirect"];

/// Columns shown on each side of a syntax-error caret.
const EXCERPT_SPAN: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

impl ValidationError {
    fn markup(message: String) -> Self {
        Self {
            message,
            line: None,
            column: None,
            excerpt: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate raw corpus text. Markup checks only run when the syntax check
/// passes, since there is no tree to walk otherwise.
pub fn validate(xml: &str) -> ValidationReport {
    match parse_document(xml) {
        Ok(root) => ValidationReport {
            errors: validate_markup(&root),
        },
        Err(err) => ValidationReport {
            errors: vec![syntax_error(xml, &err)],
        },
    }
}

fn syntax_error(xml: &str, err: &anyhow::Error) -> ValidationError {
    let Some(offset) = parse_error_offset(xml) else {
        return ValidationError::markup(err.to_string());
    };
    let (line, column) = line_column(xml, offset);
    ValidationError {
        message: err.to_string(),
        line: Some(line),
        column: Some(column),
        excerpt: Some(excerpt(xml, line, column)),
    }
}

/// 1-based line and column for a byte offset.
fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(text.len());
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map(|pos| offset - pos - 1)
        .unwrap_or(offset)
        + 1;
    (line, column)
}

/// The offending line clipped around the error column, with a caret
/// underneath pointing at it.
fn excerpt(text: &str, line: usize, column: usize) -> String {
    let Some(raw) = text.lines().nth(line.saturating_sub(1)) else {
        return String::new();
    };
    let mut col = column.saturating_sub(1).min(raw.len());
    while !raw.is_char_boundary(col) {
        col -= 1;
    }
    let mut start = col.saturating_sub(EXCERPT_SPAN);
    while !raw.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (col + EXCERPT_SPAN).min(raw.len());
    while !raw.is_char_boundary(end) {
        end += 1;
    }
    let clipped = &raw[start..end];
    let marker = " ".repeat(clipped[..col - start].chars().count()) + "^";
    format!("{clipped}\n{marker}")
}

fn validate_markup(root: &Element) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for tox in root.descendants("tox") {
        let mut missing = false;
        for attr in ["rate", "type", "response"] {
            if tox.attr(attr).is_none() {
                errors.push(ValidationError::markup(format!(
                    "{} is missing {attr:?} attribute",
                    shallow_markup(tox)
                )));
                missing = true;
            }
        }
        if missing {
            continue;
        }

        let rate = tox.attr("rate").unwrap_or_default();
        match rate.parse::<i64>() {
            Ok(value) if (1..=10).contains(&value) => {}
            Ok(_) => errors.push(ValidationError::markup(format!(
                "{} \"rate\" value {rate:?} is not between 1 and 10",
                shallow_markup(tox)
            ))),
            Err(_) => errors.push(ValidationError::markup(format!(
                "{} \"rate\" value {rate:?} is not an integer",
                shallow_markup(tox)
            ))),
        }

        check_vocab(&mut errors, tox, "type", TOX_TYPES);
        check_vocab(&mut errors, tox, "response", RESPONSES);
    }

    for phrase in root.descendants("phrase") {
        // Checked on the phrase element itself, not on a sibling annotation.
        if phrase.attr("type").is_none() {
            errors.push(ValidationError::markup(format!(
                "{} is missing \"type\" attribute",
                shallow_markup(phrase)
            )));
            continue;
        }
        check_vocab(&mut errors, phrase, "type", PHRASE_TYPES);
    }

    errors
}

fn check_vocab(
    errors: &mut Vec<ValidationError>,
    element: &Element,
    attr: &str,
    vocabulary: &[&str],
) {
    let value = element.attr(attr).unwrap_or_default();
    if !vocabulary.contains(&normalize_label(value).as_str()) {
        errors.push(ValidationError::markup(format!(
            "{} {attr:?} value {value:?} is invalid",
            shallow_markup(element)
        )));
    }
}
