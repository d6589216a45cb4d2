//! County-name canonicalization.

use std::{borrow::Borrow, fmt, sync::LazyLock};

use regex::Regex;

static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-_]").unwrap());
static NON_ALPHA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z\s]+").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static UNIT_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?: county)+$").unwrap());

/// Normalized county name, the only join key between shapes and tables.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CountyKey(String);

impl CountyKey {
    pub fn as_str(&self) -> &str { &self.0 }

    /// An empty key never matches anything and must not be looked up.
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl fmt::Display for CountyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl Borrow<str> for CountyKey {
    fn borrow(&self) -> &str { &self.0 }
}

impl AsRef<str> for CountyKey {
    fn as_ref(&self) -> &str { &self.0 }
}

/// Canonicalize a free-text county name.
///
/// Lower-cases, turns `-`/`_` into spaces, drops everything outside `[a-z ]`,
/// collapses whitespace and strips trailing standalone "county" words, so
/// `"Los Angeles County"`, `" los-angeles "` and `"LOS ANGELES"` agree.
/// Idempotent; empty or symbol-only input yields the empty key.
pub fn normalize(raw: &str) -> CountyKey {
    let lower = raw.to_lowercase();
    let spaced = SEPARATORS.replace_all(&lower, " ");
    let letters = NON_ALPHA.replace_all(&spaced, "");
    let collapsed = WHITESPACE.replace_all(letters.trim(), " ");
    let stripped = UNIT_SUFFIX.replace(&collapsed, "");
    CountyKey(stripped.trim().to_string())
}
