//! Minimal `Cache-Control` directive parser.
//!
//! Stored entries carry the header rendered from the strategy that was active
//! when they were written. Staleness is decided by reading `max-age` back out
//! of that header, so a later reader with a different strategy never changes
//! how an existing entry ages.

use std::time::Duration;

use smol_str::SmolStr;

/// Parsed `Cache-Control` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheControl {
    directives: Vec<(SmolStr, Option<SmolStr>)>,
}

impl CacheControl {
    /// Parses a header value. Unknown or malformed directives are kept as-is
    /// and never cause an error.
    pub fn parse(header: &str) -> Self {
        let directives = header
            .split(',')
            .map(str::trim)
            .filter(|directive| !directive.is_empty())
            .map(|directive| match directive.split_once('=') {
                Some((name, value)) => (
                    SmolStr::new(name.trim().to_ascii_lowercase()),
                    Some(SmolStr::new(value.trim().trim_matches('"'))),
                ),
                None => (SmolStr::new(directive.to_ascii_lowercase()), None),
            })
            .collect();
        Self { directives }
    }

    /// Returns the value of the first directive named `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.directives
            .iter()
            .find(|(directive, _)| directive == name)
            .and_then(|(_, value)| value.as_deref())
    }

    /// Whether a directive named `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.directives.iter().any(|(directive, _)| directive == name)
    }

    fn seconds(&self, name: &str) -> Option<Duration> {
        self.get(name)
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_secs)
    }

    /// `max-age`, if present and well formed.
    pub fn max_age(&self) -> Option<Duration> {
        self.seconds("max-age")
    }

    /// `stale-while-revalidate`, if present and well formed.
    pub fn stale_while_revalidate(&self) -> Option<Duration> {
        self.seconds("stale-while-revalidate")
    }

    /// Fresh window used for staleness decisions. Missing `max-age` means the
    /// entry is never fresh.
    pub fn fresh_for(&self) -> Duration {
        self.max_age().unwrap_or(Duration::ZERO)
    }
}
