//! Key-based translation catalogues with a current language.
//!
//! Lookups never fail: an unknown key, or no language at all, yields the key
//! itself so untranslated UI still shows something readable.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::markup::{self, TextSegment};

#[derive(Debug, thiserror::Error)]
pub enum LocaleError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse RON {path}: {source}")]
    Ron {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("unknown language `{0}`")]
    UnknownLanguage(String),
}

/// One language's catalogue. Entries keep insertion order so saved files
/// are stable.
#[derive(Debug, Clone)]
pub struct Language {
    pub code: String,
    pub name: String,
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl Language {
    fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Insert or overwrite a translation.
    fn set(&mut self, key: &str, value: &str) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].1 = value.to_string(),
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), value.to_string()));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&i| self.entries[i].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(key, value)` pairs in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

pub struct Localizer {
    languages: Vec<Language>,
    current: Option<usize>,
    styled_parsing: bool,
}

impl Default for Localizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Localizer {
    pub fn new() -> Self {
        Self {
            languages: Vec::new(),
            current: None,
            styled_parsing: true,
        }
    }

    fn position(&self, code: &str) -> Option<usize> {
        self.languages.iter().position(|l| l.code == code)
    }

    pub fn language(&self, code: &str) -> Option<&Language> {
        self.languages.iter().find(|l| l.code == code)
    }

    /// Register a language. The first one added becomes current.
    /// Returns false if the code is already registered.
    pub fn add_language(&mut self, code: &str, name: &str) -> bool {
        if self.position(code).is_some() {
            return false;
        }
        self.languages.push(Language::new(code, name));
        if self.current.is_none() {
            self.current = Some(self.languages.len() - 1);
        }
        true
    }

    pub fn set_current_language(&mut self, code: &str) -> bool {
        match self.position(code) {
            Some(i) => {
                self.current = Some(i);
                log::debug!("switched language to {code}");
                true
            }
            None => {
                log::warn!("cannot switch to unknown language {code}");
                false
            }
        }
    }

    pub fn current_language(&self) -> Option<&Language> {
        self.current.and_then(|i| self.languages.get(i))
    }

    pub fn current_language_code(&self) -> Option<&str> {
        self.current_language().map(|l| l.code.as_str())
    }

    pub fn current_language_name(&self) -> Option<&str> {
        self.current_language().map(|l| l.name.as_str())
    }

    /// `(code, name)` of every registered language, in registration order.
    pub fn languages(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.languages
            .iter()
            .map(|l| (l.code.as_str(), l.name.as_str()))
    }

    /// Add or update a translation. Returns false for an unknown language.
    pub fn add_translation(&mut self, code: &str, key: &str, value: &str) -> bool {
        match self.position(code) {
            Some(i) => {
                self.languages[i].set(key, value);
                true
            }
            None => false,
        }
    }

    /// Translation of `key` in the current language, or `key` itself.
    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.current_language()
            .and_then(|l| l.get(key))
            .unwrap_or(key)
    }

    /// Translation of `key` parsed as markup. Missing keys and disabled
    /// parsing yield a single plain segment.
    pub fn get_styled(&self, key: &str) -> Vec<TextSegment> {
        match self.current_language().and_then(|l| l.get(key)) {
            Some(text) if self.styled_parsing => markup::parse(text),
            Some(text) => vec![TextSegment::plain(text)],
            None => vec![TextSegment::plain(key)],
        }
    }

    pub fn set_styled_parsing(&mut self, enabled: bool) {
        self.styled_parsing = enabled;
    }

    pub fn styled_parsing(&self) -> bool {
        self.styled_parsing
    }

    /// Load `key=value` lines into an existing language. Returns the number
    /// of translations read.
    pub fn load_from_file(&mut self, code: &str, path: impl AsRef<Path>) -> Result<usize, LocaleError> {
        let path = path.as_ref();
        let i = self
            .position(code)
            .ok_or_else(|| LocaleError::UnknownLanguage(code.to_string()))?;
        let content = std::fs::read_to_string(path).map_err(|source| LocaleError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let pairs = parse_catalogue(&content);
        for (key, value) in &pairs {
            self.languages[i].set(key, value);
        }
        log::debug!("loaded {} translations for {code} from {}", pairs.len(), path.display());
        Ok(pairs.len())
    }

    /// Load a RON map `{ "key": "value", ... }` into an existing language.
    pub fn load_ron(&mut self, code: &str, path: impl AsRef<Path>) -> Result<usize, LocaleError> {
        let path = path.as_ref();
        let i = self
            .position(code)
            .ok_or_else(|| LocaleError::UnknownLanguage(code.to_string()))?;
        let content = std::fs::read_to_string(path).map_err(|source| LocaleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let map: BTreeMap<String, String> =
            ron::from_str(&content).map_err(|source| LocaleError::Ron {
                path: path.to_path_buf(),
                source,
            })?;

        for (key, value) in &map {
            self.languages[i].set(key, value);
        }
        Ok(map.len())
    }

    /// Write a language's catalogue in the `key=value` format.
    pub fn save_to_file(&self, code: &str, path: impl AsRef<Path>) -> Result<(), LocaleError> {
        let path = path.as_ref();
        let lang = self
            .language(code)
            .ok_or_else(|| LocaleError::UnknownLanguage(code.to_string()))?;
        std::fs::write(path, render_catalogue(lang)).map_err(|source| LocaleError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Parse `key=value` lines. Lines starting with `#`, blank lines and lines
/// without `=` are skipped. Keys lose trailing whitespace, values lose
/// leading whitespace.
fn parse_catalogue(content: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            log::warn!("skipping translation line {}: no '='", lineno + 1);
            continue;
        };
        let key = key.trim_end();
        if key.is_empty() {
            log::warn!("skipping translation line {}: empty key", lineno + 1);
            continue;
        }
        pairs.push((key.to_string(), value.trim_start().to_string()));
    }
    pairs
}

fn render_catalogue(lang: &Language) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Translations for {} ({})", lang.name, lang.code);
    let _ = writeln!(out, "# Format: key=value");
    out.push('\n');
    for (key, value) in lang.entries() {
        let _ = writeln!(out, "{key}={value}");
    }
    out
}
