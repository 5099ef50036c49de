//! Output column aliases for wide pivots.
//!
//! Distinct values of the column dimension become result column names. The
//! values are arbitrary data, so each one is reduced to `[A-Za-z0-9_]`, capped
//! in length, and suffixed with a short digest of the original text. Remaining
//! collisions get a numeric suffix.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

static UNSAFE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]+").unwrap());

/// Maximum characters kept from the sanitized value.
pub const MAX_BASE_LEN: usize = 40;

/// Hex characters of the content digest appended to every alias.
pub const HASH_LEN: usize = 6;

const FALLBACK_BASE: &str = "col";

/// Generate a unique alias for `value` and register it in `used`.
pub fn make_alias(value: &str, used: &mut HashSet<String>) -> String {
    let sanitized = UNSAFE_RUN.replace_all(value, "_");
    let trimmed = sanitized.trim_matches('_');
    let base: String = if trimmed.is_empty() {
        FALLBACK_BASE.to_string()
    } else {
        // Sanitized text is ASCII, so char and byte counts agree.
        trimmed.chars().take(MAX_BASE_LEN).collect()
    };

    let digest = Sha256::digest(value.as_bytes());
    let hex = format!("{digest:x}");
    let stem = format!("{base}_{}", &hex[..HASH_LEN]);

    let mut alias = stem.clone();
    let mut n = 2;
    while used.contains(&alias) {
        alias = format!("{stem}_{n}");
        n += 1;
    }

    used.insert(alias.clone());
    alias
}

/// Alias allocator scoped to a single wide-pivot query.
#[derive(Debug, Default)]
pub struct AliasGenerator {
    used: HashSet<String>,
}

impl AliasGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with names that are already taken, such as the row dimensions.
    pub fn with_reserved<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            used: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Allocate the next alias for `value`.
    pub fn make_alias(&mut self, value: &str) -> String {
        make_alias(value, &mut self.used)
    }

    /// Names handed out or reserved so far.
    pub fn used(&self) -> &HashSet<String> {
        &self.used
    }
}
