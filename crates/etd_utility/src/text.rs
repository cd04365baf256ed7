//! Translation lookup seam.
//!
//! # Responsibility
//! - Define the `Translator` contract consumed by builders and renderers.
//! - Provide an in-memory catalog implementation loaded from JSON.
//!
//! # Invariants
//! - Catalog keys are matched case-insensitively (stored uppercased).
//! - Unknown keys translate to themselves.
//! - Parameter substitution replaces the longest matching token first.

use log::debug;
use regex::Regex;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Output shaping flags applied after catalog lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Escape quotes and backslashes so the value can sit inside a JS literal.
    pub js_safe: bool,
    /// Turn literal `\\`, `\n` and `\t` sequences into their characters.
    ///
    /// Ignored when `js_safe` is set.
    pub interpret_backslashes: bool,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            js_safe: false,
            interpret_backslashes: true,
        }
    }
}

impl TranslateOptions {
    /// Options used for strings shipped to client-side scripts.
    pub fn for_client() -> Self {
        Self {
            js_safe: true,
            interpret_backslashes: true,
        }
    }
}

/// Key based translation lookup.
pub trait Translator {
    /// Returns whether `key` exists in the active catalog.
    fn has_key(&self, key: &str) -> bool;

    /// Translates `key`, substituting `params` as literal token replacements.
    fn translate(&self, key: &str, params: &[(&str, &str)], options: TranslateOptions) -> String;

    /// Shorthand for a parameterless translation with default options.
    fn text(&self, key: &str) -> String {
        self.translate(key, &[], TranslateOptions::default())
    }
}

/// Catalog load errors.
#[derive(Debug)]
pub enum TextError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl Display for TextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read translation catalog: {err}"),
            Self::Parse(err) => write!(f, "invalid translation catalog: {err}"),
        }
    }
}

impl Error for TextError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for TextError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for TextError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// In-memory translation catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogTranslator {
    locale: String,
    strings: HashMap<String, String>,
}

impl CatalogTranslator {
    /// Creates an empty catalog for `locale`.
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            strings: HashMap::new(),
        }
    }

    /// Parses a flat JSON object of `key -> translated string`.
    pub fn from_json_str(locale: impl Into<String>, json: &str) -> Result<Self, TextError> {
        let raw: HashMap<String, String> = serde_json::from_str(json)?;
        let mut catalog = Self::new(locale);
        for (key, value) in raw {
            catalog.insert(key, value);
        }
        Ok(catalog)
    }

    /// Reads a catalog file (see [`CatalogTranslator::from_json_str`]).
    pub fn load(locale: impl Into<String>, path: &Path) -> Result<Self, TextError> {
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(locale, &json)?;
        debug!(
            "event=catalog_load module=text status=ok entries={} path={}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Adds or replaces one entry.
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.strings
            .insert(key.as_ref().to_uppercase(), value.into());
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Translator for CatalogTranslator {
    fn has_key(&self, key: &str) -> bool {
        self.strings.contains_key(&key.to_uppercase())
    }

    fn translate(&self, key: &str, params: &[(&str, &str)], options: TranslateOptions) -> String {
        let raw = self
            .strings
            .get(&key.to_uppercase())
            .map(String::as_str)
            .unwrap_or(key);

        let shaped = if options.js_safe {
            add_slashes(raw)
        } else if options.interpret_backslashes && raw.contains('\\') {
            interpret_backslashes(raw)
        } else {
            raw.to_string()
        };

        substitute_params(&shaped, params)
    }
}

/// Escapes backslashes, quotes and NUL bytes.
pub fn add_slashes(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '\'' | '"' => {
                out.push('\\');
                out.push(c);
            }
            '\0' => out.push_str("\\0"),
            _ => out.push(c),
        }
    }
    out
}

fn interpret_backslashes(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('\\') => {
                out.push('\\');
                chars.next();
            }
            Some('n') => {
                out.push('\n');
                chars.next();
            }
            Some('t') => {
                out.push('\t');
                chars.next();
            }
            _ => out.push('\\'),
        }
    }
    out
}

/// Replaces every parameter token in one pass, longest token first.
fn substitute_params(value: &str, params: &[(&str, &str)]) -> String {
    let mut tokens: Vec<&(&str, &str)> = params.iter().filter(|(from, _)| !from.is_empty()).collect();
    if tokens.is_empty() {
        return value.to_string();
    }
    tokens.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let pattern = tokens
        .iter()
        .map(|(from, _)| regex::escape(from))
        .collect::<Vec<_>>()
        .join("|");
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(_) => return value.to_string(),
    };

    re.replace_all(value, |caps: &regex::Captures<'_>| {
        let matched = &caps[0];
        tokens
            .iter()
            .find(|(from, _)| *from == matched)
            .map(|(_, to)| (*to).to_string())
            .unwrap_or_else(|| matched.to_string())
    })
    .into_owned()
}
