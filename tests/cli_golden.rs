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

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use jsonschema::JSONSchema;
use serde_json::Value;
use tempfile::TempDir;

fn toxseek_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("toxseek"))
}

fn load_schema() -> JSONSchema {
    let schema_text = include_str!("../schemas/response.schema.json");
    let schema_json: Value = serde_json::from_str(schema_text).expect("schema json");
    JSONSchema::options()
        .compile(&schema_json)
        .expect("compile schema")
}

fn assert_schema(schema: &JSONSchema, value: &Value) {
    if let Err(errors) = schema.validate(value) {
        let msgs: Vec<String> = errors.map(|e| e.to_string()).collect();
        panic!("schema validation failed:\n{}", msgs.join("\n"));
    }
}

/// The three-document corpus from the engine's documentation: one mid-rated
/// harassment doc, one high-rated hierarchical hate-speech doc, one clean doc.
fn write_corpus(root: &Path) {
    let xml = r#"<corpus>
  <text>mild words <tox rate="4" type="harassment" response="person">abuse</tox></text>
  <text><tox rate="9" type="hate_speech: race" response="author">slur words</tox><phrase type="direct">openly</phrase><lex>slur</lex></text>
  <text>completely calm comment</text>
</corpus>"#;
    fs::write(root.join("corpus.xml"), xml).expect("write corpus");
}

fn run_json(cmd: &mut Command, cwd: &Path) -> Value {
    let output = cmd.current_dir(cwd).output().expect("run command");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("parse json")
}

fn result_ids(value: &Value) -> Vec<i64> {
    value["results"]
        .as_array()
        .expect("results array")
        .iter()
        .map(|r| r["id"].as_i64().expect("id"))
        .collect()
}

#[test]
fn search_rating_filter_returns_high_rated_doc() {
    let temp = TempDir::new().expect("tempdir");
    write_corpus(temp.path());
    let schema = load_schema();

    let mut cmd = toxseek_cmd();
    cmd.args(["search", "--from", "5", "--to", "10", "--json"]);
    let value = run_json(&mut cmd, temp.path());
    assert_schema(&schema, &value);
    assert_eq!(value["ok"], Value::Bool(true));
    assert_eq!(result_ids(&value), vec![1]);
    assert_eq!(value["stats"]["total_hits"], 1);
}

#[test]
fn search_group_filter_matches_subtype() {
    let temp = TempDir::new().expect("tempdir");
    write_corpus(temp.path());
    let schema = load_schema();

    let mut cmd = toxseek_cmd();
    cmd.args(["search", "--tox-type", "hate_speech", "--json"]);
    let value = run_json(&mut cmd, temp.path());
    assert_schema(&schema, &value);
    assert_eq!(result_ids(&value), vec![1]);
    assert_eq!(value["results"][0]["rate"], 9);
}

#[test]
fn empty_search_browses_the_whole_corpus() {
    let temp = TempDir::new().expect("tempdir");
    write_corpus(temp.path());
    let schema = load_schema();

    let mut cmd = toxseek_cmd();
    cmd.args(["search", "--json"]);
    let value = run_json(&mut cmd, temp.path());
    assert_schema(&schema, &value);
    assert_eq!(result_ids(&value), vec![0, 1, 2]);
}

#[test]
fn unknown_word_yields_empty_results() {
    let temp = TempDir::new().expect("tempdir");
    write_corpus(temp.path());

    let mut cmd = toxseek_cmd();
    cmd.args(["search", "zzzznonexistentword", "--json"]);
    let value = run_json(&mut cmd, temp.path());
    assert_eq!(result_ids(&value), Vec::<i64>::new());
    assert_eq!(value["stats"]["total_hits"], 0);
}

#[test]
fn pattern_narrows_search_output() {
    let temp = TempDir::new().expect("tempdir");
    write_corpus(temp.path());

    let mut cmd = toxseek_cmd();
    cmd.args(["search", "words", "--pattern", "phrase", "--json"]);
    let value = run_json(&mut cmd, temp.path());
    assert_eq!(result_ids(&value), vec![1]);
}

#[test]
fn search_text_mode_prints_id_and_rating() {
    let temp = TempDir::new().expect("tempdir");
    write_corpus(temp.path());

    let mut cmd = toxseek_cmd();
    cmd.args(["search", "--from", "5"]);
    cmd.current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicates::str::contains("1\t9\thate_speech"));
}

#[test]
fn show_prints_verbatim_markup() {
    let temp = TempDir::new().expect("tempdir");
    write_corpus(temp.path());

    let mut cmd = toxseek_cmd();
    cmd.args(["show", "0", "--json"]);
    let value = run_json(&mut cmd, temp.path());
    let xml = value["results"][0]["xml"].as_str().expect("xml");
    assert!(xml.contains(r#"<tox rate="4" type="harassment" response="person">abuse</tox>"#));

    let mut cmd = toxseek_cmd();
    cmd.args(["show", "99"]);
    cmd.current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicates::str::contains("no document with id 99"));
}

#[test]
fn categories_lists_vocabularies_with_groups() {
    let temp = TempDir::new().expect("tempdir");
    write_corpus(temp.path());
    let schema = load_schema();

    let mut cmd = toxseek_cmd();
    cmd.args(["categories", "--json"]);
    let value = run_json(&mut cmd, temp.path());
    assert_schema(&schema, &value);
    let tox_types = value["diagnostics"]["tox_types"]
        .as_array()
        .expect("tox_types");
    assert!(tox_types.contains(&Value::String("hate_speech".into())));
    assert!(tox_types.contains(&Value::String("hate_speech:race".into())));
    assert!(tox_types.contains(&Value::String("harassment".into())));
}

#[test]
fn stats_reports_counts_and_rating_histogram() {
    let temp = TempDir::new().expect("tempdir");
    write_corpus(temp.path());
    let schema = load_schema();

    let mut cmd = toxseek_cmd();
    cmd.args(["stats", "--json"]);
    let value = run_json(&mut cmd, temp.path());
    assert_schema(&schema, &value);
    assert_eq!(value["stats"]["corpus"]["docs"], 3);
    let ratings = value["stats"]["corpus"]["ratings"]
        .as_array()
        .expect("ratings");
    assert_eq!(ratings.len(), 11);
    assert_eq!(ratings[0], 1);
    assert_eq!(ratings[4], 1);
    assert_eq!(ratings[9], 1);
}

#[test]
fn validate_accepts_the_fixture_corpus() {
    let temp = TempDir::new().expect("tempdir");
    write_corpus(temp.path());
    let schema = load_schema();

    let mut cmd = toxseek_cmd();
    cmd.args(["validate", "corpus.xml", "--json"]);
    let value = run_json(&mut cmd, temp.path());
    assert_schema(&schema, &value);
    assert_eq!(value["ok"], Value::Bool(true));
    assert_eq!(value["diagnostics"]["valid"], Value::Bool(true));
}

#[test]
fn validate_rejects_bad_markup_with_exit_code() {
    let temp = TempDir::new().expect("tempdir");
    fs::write(
        temp.path().join("broken.xml"),
        r#"<corpus><text><tox rate="99" type="grumpiness" response="person">a</tox></text></corpus>"#,
    )
    .expect("write corpus");

    let mut cmd = toxseek_cmd();
    cmd.args(["validate", "broken.xml", "--json"]);
    let output = cmd.current_dir(temp.path()).output().expect("run");
    assert_eq!(output.status.code(), Some(1));
    let value: Value =
        serde_json::from_slice(&output.stdout).expect("parse json despite failure");
    assert_eq!(value["ok"], Value::Bool(false));
    let errors = value["diagnostics"]["errors"].as_array().expect("errors");
    assert_eq!(errors.len(), 2);
}

#[test]
fn missing_corpus_is_a_json_error_envelope() {
    let temp = TempDir::new().expect("tempdir");
    let schema = load_schema();

    let mut cmd = toxseek_cmd();
    cmd.args(["search", "--json"]);
    let value = run_json(&mut cmd, temp.path());
    assert_schema(&schema, &value);
    assert_eq!(value["ok"], Value::Bool(false));
    assert!(
        value["error"]["message"]
            .as_str()
            .expect("message")
            .contains("corpus.xml")
    );
}

#[test]
fn corpus_flag_overrides_discovery() {
    let temp = TempDir::new().expect("tempdir");
    let data = temp.path().join("data");
    fs::create_dir_all(&data).expect("mkdir");
    write_corpus(&data);

    let mut cmd = toxseek_cmd();
    cmd.args(["search", "--corpus", "data/corpus.xml", "--json"]);
    let value = run_json(&mut cmd, temp.path());
    assert_eq!(result_ids(&value), vec![0, 1, 2]);
}
