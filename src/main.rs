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

mod cli;
mod config;
mod document;
mod index;
mod normalize;
mod output;
mod query;
mod validate;
mod xml;

use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context as _;
use anyhow::Result;
use clap::Parser;
use serde_json::Value;
use serde_json::json;

use crate::cli::Cli;
use crate::cli::Commands;
use crate::config::ConfigCtx;
use crate::document::Document;
use crate::index::CorpusIndex;
use crate::index::DocId;
use crate::normalize::Normalizer;
use crate::output::CorpusStats;
use crate::output::JsonResponse;
use crate::output::QueryOut;
use crate::output::StatsOut;
use crate::output::print_json;
use crate::query::SearchParams;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let corpus = cli.corpus;
    match cli.command {
        Commands::Search(args) => {
            let json = args.json;
            handle_result(cmd_search(corpus, args), json)
        }
        Commands::Show(args) => handle_result(cmd_show(corpus, args.id, args.json), args.json),
        Commands::Stats { json } => handle_result(cmd_stats(corpus, json), json),
        Commands::Categories { json } => handle_result(cmd_categories(corpus, json), json),
        Commands::Validate(args) => handle_result(cmd_validate(args.path, args.json), args.json),
    }
}

fn handle_result(result: Result<()>, json: bool) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(err) => {
            if json {
                let resp = JsonResponse::error("error", &format!("{err:#}"));
                print_json(&resp)?;
                Ok(())
            } else {
                Err(err)
            }
        }
    }
}

/// The index is rebuilt from the source corpus on every invocation; there is
/// no persisted form.
fn load_index(corpus_override: Option<PathBuf>) -> Result<(CorpusIndex, Normalizer)> {
    let ctx = ConfigCtx::load_from_cwd()?;
    let normalizer = Normalizer::new(ctx.config.normalizer_mode()?);
    let path = corpus_override.unwrap_or_else(|| ctx.corpus_path());
    let index = CorpusIndex::load_path(&path, &normalizer)?;
    Ok((index, normalizer))
}

fn cmd_search(corpus: Option<PathBuf>, args: cli::SearchArgs) -> Result<()> {
    let started = Instant::now();
    let (index, normalizer) = load_index(corpus)?;

    let params = SearchParams {
        query: args.query.clone(),
        rate_start: args.from,
        rate_end: args.to,
        responses: args.response.clone(),
        tox_types: args.tox_type.clone(),
        phrase_types: args.phrase_type.clone(),
    };
    let matches = index.search(&normalizer, &params);

    // Sorting and the secondary regex are presentation concerns; the core
    // returns an unordered set.
    let mut hits: Vec<DocId> = matches.into_iter().collect();
    if let Some(pattern) = &args.pattern {
        let re = regex::Regex::new(pattern).context("invalid --pattern")?;
        hits.retain(|id| {
            index
                .get(*id)
                .is_some_and(|doc| re.is_match(&doc.to_xml()))
        });
    }

    if args.json {
        let results: Vec<Value> = hits
            .iter()
            .filter_map(|id| index.get(*id).map(|doc| doc_json(*id, doc)))
            .collect();
        let mut resp = JsonResponse::ok()
            .with_query(query_out(&args))
            .with_results(results)
            .with_stats(StatsOut {
                took_ms: started.elapsed().as_millis() as i64,
                total_hits: hits.len() as i64,
                doc_count: Some(index.len() as i64),
                corpus: None,
            });
        if index.is_empty() {
            resp = resp.with_warnings(vec!["corpus contains no documents".to_string()]);
        }
        print_json(&resp)?;
    } else {
        for id in &hits {
            if let Some(doc) = index.get(*id) {
                let types: Vec<&str> = doc
                    .toxicity_categories()
                    .iter()
                    .map(String::as_str)
                    .collect();
                println!("{}\t{}\t{}\t{}", id, doc.rating(), types.join(","), doc.to_xml());
            }
        }
        eprintln!("{} match(es)", hits.len());
    }

    Ok(())
}

fn query_out(args: &cli::SearchArgs) -> QueryOut {
    let filters = if args.response.is_empty()
        && args.tox_type.is_empty()
        && args.phrase_type.is_empty()
    {
        None
    } else {
        Some(json!({
            "responses": args.response,
            "tox_types": args.tox_type,
            "phrase_types": args.phrase_type,
        }))
    };
    QueryOut {
        text: args.query.clone(),
        rate_start: i64::from(args.from),
        rate_end: i64::from(args.to),
        filters,
        pattern: args.pattern.clone(),
    }
}

fn doc_json(id: DocId, doc: &Document) -> Value {
    json!({
        "id": id,
        "rate": doc.rating(),
        "tox_types": doc.toxicity_categories(),
        "responses": doc.response_categories(),
        "phrase_types": doc.phrase_categories(),
        "xml": doc.to_xml(),
    })
}

fn cmd_show(corpus: Option<PathBuf>, id: DocId, json: bool) -> Result<()> {
    let (index, _normalizer) = load_index(corpus)?;
    let doc = index
        .get(id)
        .ok_or_else(|| anyhow::anyhow!("no document with id {id}"))?;

    if json {
        let resp = JsonResponse::ok().with_results(vec![doc_json(id, doc)]);
        print_json(&resp)?;
    } else {
        println!("{}", doc.to_xml());
        println!("rate: {}", doc.rating());
        print_labels("tox_types", doc.toxicity_categories().iter());
        print_labels("responses", doc.response_categories().iter());
        print_labels("phrase_types", doc.phrase_categories().iter());
        let mut lex: Vec<&str> = doc.annotation_tokens().keys().map(String::as_str).collect();
        lex.sort_unstable();
        println!("lex: {}", lex.join(", "));
    }
    Ok(())
}

fn print_labels<'a>(name: &str, labels: impl Iterator<Item = &'a String>) {
    let joined: Vec<&str> = labels.map(String::as_str).collect();
    println!("{name}: {}", joined.join(", "));
}

fn cmd_stats(corpus: Option<PathBuf>, json: bool) -> Result<()> {
    let (index, normalizer) = load_index(corpus)?;

    let mut ratings = vec![0i64; usize::from(document::MAX_RATING) + 1];
    for (_, doc) in index.documents() {
        ratings[usize::from(doc.rating())] += 1;
    }
    let stats = CorpusStats {
        docs: index.len() as i64,
        lemmas: index.lemma_count() as i64,
        responses: index.response_labels().len() as i64,
        tox_types: index.tox_type_labels().len() as i64,
        phrase_types: index.phrase_type_labels().len() as i64,
        ratings,
    };

    if json {
        let resp = JsonResponse::ok()
            .with_diagnostics(json!({ "normalizer": normalizer.mode().as_label() }))
            .with_stats(StatsOut {
                took_ms: 0,
                total_hits: 0,
                doc_count: Some(stats.docs),
                corpus: Some(stats),
            });
        print_json(&resp)?;
    } else {
        println!("Normalizer: {}", normalizer.mode().as_label());
        println!("Docs: {}", stats.docs);
        println!("Lemmas: {}", stats.lemmas);
        println!("Response labels: {}", stats.responses);
        println!("Toxicity labels: {}", stats.tox_types);
        println!("Phrase labels: {}", stats.phrase_types);
        for (rating, count) in stats.ratings.iter().enumerate() {
            if *count > 0 {
                println!("rate {rating}: {count}");
            }
        }
    }
    Ok(())
}

fn cmd_categories(corpus: Option<PathBuf>, json: bool) -> Result<()> {
    let (index, _normalizer) = load_index(corpus)?;

    if json {
        let resp = JsonResponse::ok().with_diagnostics(json!({
            "responses": index.response_labels(),
            "tox_types": index.tox_type_labels(),
            "phrase_types": index.phrase_type_labels(),
        }));
        print_json(&resp)?;
    } else {
        print_vocab("responses", &index.response_labels());
        print_vocab("tox_types", &index.tox_type_labels());
        print_vocab("phrase_types", &index.phrase_type_labels());
    }
    Ok(())
}

fn print_vocab(name: &str, labels: &[String]) {
    println!("{name}:");
    for label in labels {
        println!("  {label}");
    }
}

fn cmd_validate(path: PathBuf, json: bool) -> Result<()> {
    let text = read_corpus(&path)?;
    let report = validate::validate(&text);

    if json {
        let mut resp = JsonResponse::ok().with_diagnostics(json!({
            "valid": report.is_valid(),
            "errors": report.errors,
        }));
        if !report.is_valid() {
            resp = resp.failed();
        }
        print_json(&resp)?;
    } else if report.is_valid() {
        println!("{} is valid", path.display());
    } else {
        println!("{} is invalid:", path.display());
        for error in &report.errors {
            match (error.line, error.column) {
                (Some(line), Some(column)) => {
                    println!("  line {line}, column {column}: {}", error.message);
                }
                _ => println!("  {}", error.message),
            }
            if let Some(excerpt) = &error.excerpt {
                for excerpt_line in excerpt.lines() {
                    println!("    {excerpt_line}");
                }
            }
        }
    }

    if !report.is_valid() {
        std::process::exit(1);
    }
    Ok(())
}

fn read_corpus(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}
