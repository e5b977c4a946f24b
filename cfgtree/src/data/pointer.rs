//! JSON Pointer (RFC 6901) codec.
//!
//! A [`Pointer`] is an ordered list of unescaped reference tokens. The empty
//! pointer addresses the document root. Text form escapes `~` as `~0` and
//! `/` as `~1` inside each token.

use std::{fmt, str::FromStr};

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::ConfigError;

/// Location of a node inside a JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pointer {
    tokens: Vec<String>,
}

/// Escape a single reference token (`~` -> `~0`, `/` -> `~1`).
pub fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Unescape a single reference token (`~1` -> `/`, `~0` -> `~`).
pub fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

impl Pointer {
    /// The root pointer.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse pointer text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPointer`] when non-empty text does not
    /// start with `/`.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        let Some(rest) = s.strip_prefix('/') else {
            return Err(ConfigError::InvalidPointer {
                pointer: s.to_string(),
            });
        };
        Ok(Self {
            tokens: rest.split('/').map(unescape).collect(),
        })
    }

    /// Whether this is the root pointer.
    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Unescaped reference tokens, outermost first.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the pointer has no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Last token, if any.
    pub fn last(&self) -> Option<&str> {
        self.tokens.last().map(String::as_str)
    }

    /// Append a token in place.
    pub fn push(&mut self, token: impl Into<String>) {
        self.tokens.push(token.into());
    }

    /// Pointer to a named child.
    pub fn child(&self, token: impl Into<String>) -> Self {
        let mut p = self.clone();
        p.push(token);
        p
    }

    /// Pointer to an array element.
    pub fn index(&self, idx: usize) -> Self {
        self.child(idx.to_string())
    }

    /// Pointer to the parent node; `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.tokens.is_empty() {
            return None;
        }
        Some(Self {
            tokens: self.tokens[..self.tokens.len() - 1].to_vec(),
        })
    }

    /// Look up the node this pointer addresses.
    pub fn get<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        self.tokens.iter().try_fold(doc, |cur, token| match cur {
            Value::Object(map) => map.get(token),
            Value::Array(arr) => parse_index(token).and_then(|i| arr.get(i)),
            _ => None,
        })
    }

    /// Mutable lookup of the node this pointer addresses.
    pub fn get_mut<'a>(&self, doc: &'a mut Value) -> Option<&'a mut Value> {
        self.tokens.iter().try_fold(doc, |cur, token| match cur {
            Value::Object(map) => map.get_mut(token),
            Value::Array(arr) => parse_index(token).and_then(move |i| arr.get_mut(i)),
            _ => None,
        })
    }
}

/// Array index token per RFC 6901: `0` or digits without a leading zero.
pub fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || (token.len() > 1 && token.starts_with('0')) {
        return None;
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "/{}", escape(token))?;
        }
        Ok(())
    }
}

impl FromStr for Pointer {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<S: Into<String>> FromIterator<S> for Pointer {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl Serialize for Pointer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
