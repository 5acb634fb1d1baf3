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

use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

use crate::normalize::NormalizerMode;

pub const CONFIG_FILE: &str = "toxseek.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub corpus_path: PathBuf,
    pub normalizer: String,
}

impl Config {
    pub fn normalizer_mode(&self) -> Result<NormalizerMode> {
        NormalizerMode::parse(&self.normalizer)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corpus_path: PathBuf::from("corpus.xml"),
            normalizer: "none".to_string(),
        }
    }
}

/// A resolved configuration: the directory the config file was found in
/// (relative corpus paths resolve against it) plus the parsed settings.
/// When no config file exists anywhere up the tree, defaults apply and the
/// starting directory is the root.
#[derive(Debug, Clone)]
pub struct ConfigCtx {
    pub root: PathBuf,
    pub config: Config,
}

impl ConfigCtx {
    pub fn load_from_cwd() -> Result<Self> {
        let cwd = std::env::current_dir().context("get current dir")?;
        Self::load_from(&cwd)
    }

    pub fn load_from(start: &Path) -> Result<Self> {
        match find_config_root(start) {
            Some(root) => {
                let config = read_config(&root.join(CONFIG_FILE))?;
                Ok(Self { root, config })
            }
            None => Ok(Self {
                root: start.to_path_buf(),
                config: Config::default(),
            }),
        }
    }

    pub fn corpus_path(&self) -> PathBuf {
        if self.config.corpus_path.is_absolute() {
            self.config.corpus_path.clone()
        } else {
            self.root.join(&self.config.corpus_path)
        }
    }
}

pub fn find_config_root(start: &Path) -> Option<PathBuf> {
    let mut cur = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    loop {
        if cur.join(CONFIG_FILE).exists() {
            return Some(cur);
        }
        match cur.parent() {
            Some(parent) => cur = parent.to_path_buf(),
            None => return None,
        }
    }
}

pub fn read_config(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let config: Config = toml::from_str(&text).context("parse toxseek.toml")?;
    // Unknown normalizer names are a startup error, not a per-query one.
    config
        .normalizer_mode()
        .with_context(|| format!("in {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn find_config_root_walks_up() {
        let dir = tempdir().expect("tempdir");
        let root = dir.path().join("repo");
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).expect("mkdir");
        std::fs::write(root.join(CONFIG_FILE), "corpus_path = \"corpus.xml\"").expect("write");

        let found = find_config_root(&nested);
        let expected = root.canonicalize().unwrap_or(root);
        assert_eq!(found, Some(expected));
    }

    #[test]
    fn defaults_apply_without_a_config_file() {
        let dir = tempdir().expect("tempdir");
        let ctx = ConfigCtx::load_from(dir.path()).expect("load");
        assert_eq!(ctx.config.corpus_path, PathBuf::from("corpus.xml"));
        assert_eq!(ctx.config.normalizer, "none");
        assert_eq!(ctx.corpus_path(), dir.path().join("corpus.xml"));
    }

    #[test]
    fn relative_corpus_path_resolves_against_config_root() {
        let dir = tempdir().expect("tempdir");
        let nested = dir.path().join("sub");
        std::fs::create_dir_all(&nested).expect("mkdir");
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "corpus_path = \"data/all.xml\"\nnormalizer = \"english\"",
        )
        .expect("write");

        let ctx = ConfigCtx::load_from(&nested).expect("load");
        assert!(ctx.corpus_path().ends_with("data/all.xml"));
        assert_eq!(
            ctx.config.normalizer_mode().expect("mode"),
            NormalizerMode::English
        );
    }

    #[test]
    fn unknown_normalizer_is_rejected_at_load() {
        let dir = tempdir().expect("tempdir");
        std::fs::write(dir.path().join(CONFIG_FILE), "normalizer = \"porter2000\"")
            .expect("write");
        let err = ConfigCtx::load_from(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("unknown normalizer"));
    }
}
