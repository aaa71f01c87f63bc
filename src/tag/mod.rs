//! Seal tag plaintext grammar.
//!
//! ```text
//! SeAl:AI-GENERATED[:v1(;key=value)*]
//! ```
//!
//! Keys and values escape `\`, `;` and `=` with a leading `\`. Pairs keep
//! insertion order.

use crate::config::SEAL_MARKER;

const METADATA_VERSION: &str = "v1";
const PAIR_SEP: char = ';';
const KV_SEP: char = '=';
const ESCAPE: char = '\\';

/// Ordered key/value metadata carried after the seal marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair; builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn encode(&self) -> String {
        let mut out = String::from(METADATA_VERSION);
        for (key, value) in &self.entries {
            out.push(PAIR_SEP);
            escape_into(&mut out, key);
            out.push(KV_SEP);
            escape_into(&mut out, value);
        }
        out
    }

    /// Inverse of [`Metadata::encode`]. `None` on an unknown version or a
    /// malformed pair.
    pub fn decode(text: &str) -> Option<Self> {
        let mut fields = split_unescaped(text, PAIR_SEP).into_iter();
        if fields.next()? != METADATA_VERSION {
            return None;
        }

        let mut metadata = Self::new();
        for field in fields {
            let mut parts = split_unescaped(&field, KV_SEP).into_iter();
            let (key, value) = (parts.next()?, parts.next()?);
            if parts.next().is_some() {
                return None;
            }
            metadata.insert(unescape(&key)?, unescape(&value)?);
        }
        Some(metadata)
    }
}

fn escape_into(out: &mut String, raw: &str) {
    for c in raw.chars() {
        if matches!(c, ESCAPE | PAIR_SEP | KV_SEP) {
            out.push(ESCAPE);
        }
        out.push(c);
    }
}

/// Split on `sep` where it is not escaped. Escapes are left in place.
fn split_unescaped(text: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == ESCAPE {
            current.push(c);
            if let Some(next) = chars.next() {
                current.push(next);
            }
        } else if c == sep {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
}

fn unescape(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == ESCAPE {
            out.push(chars.next()?);
        } else if c == PAIR_SEP || c == KV_SEP {
            return None;
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Build the plaintext for a fresh seal tag. Empty metadata counts as none.
pub fn build(metadata: Option<&Metadata>) -> String {
    match metadata {
        Some(m) if !m.is_empty() => format!("{SEAL_MARKER}:{}", m.encode()),
        _ => SEAL_MARKER.to_string(),
    }
}

/// A plaintext is a genuine seal tag iff it starts with the marker.
pub fn is_valid(plaintext: &str) -> bool {
    plaintext.starts_with(SEAL_MARKER)
}

/// Metadata carried by a seal tag plaintext, if any.
pub fn parse_metadata(plaintext: &str) -> Option<Metadata> {
    let rest = plaintext.strip_prefix(SEAL_MARKER)?.strip_prefix(':')?;
    Metadata::decode(rest)
}
