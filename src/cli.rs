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

use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;

#[derive(Parser, Debug)]
#[command(name = "toxseek", version, about = "Search engine for annotated toxicity corpora")]
pub struct Cli {
    /// Corpus file (overrides toxseek.toml discovery)
    #[arg(long, global = true)]
    pub corpus: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the corpus
    Search(SearchArgs),

    /// Print one document verbatim with its derived fields
    Show(ShowArgs),

    /// Corpus statistics
    Stats {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Category vocabularies present in the corpus
    Categories {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a corpus file against the annotation schema
    Validate(ValidateArgs),
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Query text; empty means no text constraint
    #[arg(default_value = "")]
    pub query: String,

    /// Lowest rating to match
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub from: u8,

    /// Highest rating to match
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub to: u8,

    /// Response category filter (repeatable)
    #[arg(long)]
    pub response: Vec<String>,

    /// Toxicity category filter (repeatable)
    #[arg(long = "tox-type")]
    pub tox_type: Vec<String>,

    /// Phrase category filter (repeatable)
    #[arg(long = "phrase-type")]
    pub phrase_type: Vec<String>,

    /// Secondary regex over the raw markup of matched documents
    #[arg(long)]
    pub pattern: Option<String>,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Document identifier
    pub id: usize,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Corpus file to validate
    pub path: PathBuf,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}
