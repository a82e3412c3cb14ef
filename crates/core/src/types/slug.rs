//! URL-safe slugs derived from human-readable names.

use core::fmt;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Errors that can occur when building a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// Nothing URL-safe was left after normalization.
    #[error("slug is empty after normalization: {0:?}")]
    Empty(String),
}

/// A normalized, URL-safe identifier.
///
/// ## Normalization
///
/// - Lowercased, with diacritics stripped (`Café` → `cafe`)
/// - Anything other than ASCII letters, digits, whitespace and `-` is dropped
/// - Whitespace runs become a single `-`, hyphen runs are collapsed
/// - Leading and trailing hyphens are trimmed
///
/// ```
/// use olivo_market_core::Slug;
///
/// assert_eq!(Slug::from_name("Queso Llanero").unwrap().as_str(), "queso-llanero");
/// assert_eq!(Slug::from_name("Víveres & Más").unwrap().as_str(), "viveres-mas");
/// assert!(Slug::from_name("¡¿!").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Normalize any text (a name or a caller-supplied slug) into a slug.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError::Empty`] if nothing URL-safe remains.
    pub fn from_name(text: &str) -> Result<Self, SlugError> {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return Err(SlugError::Empty(text.to_owned()));
        }
        Ok(Self(normalized))
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the slug and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

fn normalize(text: &str) -> String {
    let stripped: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();

    let mut out = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        let c = if c.is_whitespace() { '-' } else { c };
        if c == '-' && (out.is_empty() || out.ends_with('-')) {
            continue;
        }
        out.push(c);
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
