//! Caching strategies and their `Cache-Control` rendering.
//!
//! A [`CachingStrategy`] is an immutable description of how long a computed
//! value stays fresh and how long it may be served stale while it is being
//! recomputed. Strategies are usually built from one of the presets:
//!
//! | preset | mode | max-age | stale-while-revalidate |
//! |--------|------|---------|------------------------|
//! | [`CachingStrategy::no_store`] | `no-store` | - | - |
//! | [`CachingStrategy::short`] | `public` | 1s | 9s |
//! | [`CachingStrategy::long`] | `public` | 3600s | 82800s |
//! | [`CachingStrategy::custom`] | as given | as given | as given |
//!
//! ```
//! use std::time::Duration;
//! use subcache_core::{CacheMode, CachingStrategy, StrategyOptions};
//!
//! let strategy = CachingStrategy::short(
//!     StrategyOptions::new().mode(CacheMode::Private).max_age(Duration::from_secs(30)),
//! )
//! .unwrap();
//! assert_eq!(strategy.header(), "private, max-age=30, stale-while-revalidate=9");
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const SHORT_MAX_AGE: Duration = Duration::from_secs(1);
const SHORT_STALE_WHILE_REVALIDATE: Duration = Duration::from_secs(9);
const LONG_MAX_AGE: Duration = Duration::from_secs(3600);
const LONG_STALE_WHILE_REVALIDATE: Duration = Duration::from_secs(82800);

/// Errors raised while building a strategy. Always raised before any I/O.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StrategyError {
    /// The mode is not one of the values allowed in this position.
    #[error("'mode' must be either 'public' or 'private', got '{0}'")]
    InvalidMode(String),
}

/// Cache visibility mode, rendered as the leading `Cache-Control` token.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CacheMode {
    /// Shared caches may store the value.
    Public,
    /// Only private caches may store the value.
    Private,
    /// Nothing is stored at all.
    NoStore,
}

impl CacheMode {
    /// Returns the wire token of the mode.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CacheMode::Public => "public",
            CacheMode::Private => "private",
            CacheMode::NoStore => "no-store",
        }
    }

    /// Whether entries written under this mode can expire and be revalidated.
    #[inline]
    pub const fn is_expirable(&self) -> bool {
        matches!(self, CacheMode::Public | CacheMode::Private)
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheMode {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(CacheMode::Public),
            "private" => Ok(CacheMode::Private),
            "no-store" => Ok(CacheMode::NoStore),
            other => Err(StrategyError::InvalidMode(other.to_owned())),
        }
    }
}

impl TryFrom<String> for CacheMode {
    type Error = StrategyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CacheMode> for String {
    fn from(mode: CacheMode) -> Self {
        mode.as_str().to_owned()
    }
}

/// Field-by-field options for [`CachingStrategy::short`], [`CachingStrategy::long`]
/// and [`CachingStrategy::custom`].
///
/// Every field is optional; a set field replaces the preset default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyOptions {
    /// Cache mode.
    #[serde(default)]
    pub mode: Option<CacheMode>,
    /// Fresh window.
    #[serde(default, with = "humantime_serde")]
    pub max_age: Option<Duration>,
    /// Window after `max_age` during which stale data is served.
    #[serde(default, with = "humantime_serde")]
    pub stale_while_revalidate: Option<Duration>,
    /// Shared-cache override of `max_age`. Header only.
    #[serde(default, with = "humantime_serde")]
    pub s_max_age: Option<Duration>,
    /// Header-only hint for serving stale data on upstream errors.
    #[serde(default, with = "humantime_serde")]
    pub stale_if_error: Option<Duration>,
}

impl StrategyOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the mode.
    pub fn mode(self, mode: CacheMode) -> Self {
        Self {
            mode: Some(mode),
            ..self
        }
    }

    /// Sets the fresh window.
    pub fn max_age(self, max_age: Duration) -> Self {
        Self {
            max_age: Some(max_age),
            ..self
        }
    }

    /// Sets the stale-while-revalidate window.
    pub fn stale_while_revalidate(self, window: Duration) -> Self {
        Self {
            stale_while_revalidate: Some(window),
            ..self
        }
    }

    /// Sets `s-maxage`.
    pub fn s_max_age(self, s_max_age: Duration) -> Self {
        Self {
            s_max_age: Some(s_max_age),
            ..self
        }
    }

    /// Sets `stale-if-error`.
    pub fn stale_if_error(self, window: Duration) -> Self {
        Self {
            stale_if_error: Some(window),
            ..self
        }
    }
}

/// Immutable caching policy for one cached computation.
///
/// Durations have whole-second resolution: sub-second values are rounded up
/// on construction, so the rendered header and the physical TTL agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StrategyOptions")]
pub struct CachingStrategy {
    #[serde(default)]
    mode: Option<CacheMode>,
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    max_age: Option<Duration>,
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    stale_while_revalidate: Option<Duration>,
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    s_max_age: Option<Duration>,
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    stale_if_error: Option<Duration>,
}

impl CachingStrategy {
    /// Disables caching entirely.
    pub fn no_store() -> Self {
        Self {
            mode: Some(CacheMode::NoStore),
            max_age: None,
            stale_while_revalidate: None,
            s_max_age: None,
            stale_if_error: None,
        }
    }

    /// One second fresh, nine seconds stale.
    pub fn short(overrides: StrategyOptions) -> Result<Self, StrategyError> {
        Self::expirable(SHORT_MAX_AGE, SHORT_STALE_WHILE_REVALIDATE, overrides)
    }

    /// One hour fresh, twenty-three hours stale.
    pub fn long(overrides: StrategyOptions) -> Result<Self, StrategyError> {
        Self::expirable(LONG_MAX_AGE, LONG_STALE_WHILE_REVALIDATE, overrides)
    }

    /// Exactly the fields given, nothing else.
    pub fn custom(options: StrategyOptions) -> Self {
        Self {
            mode: options.mode,
            max_age: options.max_age.map(whole_seconds),
            stale_while_revalidate: options.stale_while_revalidate.map(whole_seconds),
            s_max_age: options.s_max_age.map(whole_seconds),
            stale_if_error: options.stale_if_error.map(whole_seconds),
        }
    }

    fn expirable(
        max_age: Duration,
        stale_while_revalidate: Duration,
        overrides: StrategyOptions,
    ) -> Result<Self, StrategyError> {
        if let Some(mode) = overrides.mode
            && !mode.is_expirable()
        {
            return Err(StrategyError::InvalidMode(mode.to_string()));
        }
        Ok(Self {
            mode: Some(overrides.mode.unwrap_or(CacheMode::Public)),
            max_age: Some(whole_seconds(overrides.max_age.unwrap_or(max_age))),
            stale_while_revalidate: Some(whole_seconds(
                overrides
                    .stale_while_revalidate
                    .unwrap_or(stale_while_revalidate),
            )),
            s_max_age: overrides.s_max_age.map(whole_seconds),
            stale_if_error: overrides.stale_if_error.map(whole_seconds),
        })
    }

    /// Returns the mode, if one was set.
    #[inline]
    pub fn mode(&self) -> Option<CacheMode> {
        self.mode
    }

    /// Returns the fresh window.
    #[inline]
    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
    }

    /// Returns the stale-while-revalidate window.
    #[inline]
    pub fn stale_while_revalidate(&self) -> Option<Duration> {
        self.stale_while_revalidate
    }

    /// Returns `s-maxage`.
    #[inline]
    pub fn s_max_age(&self) -> Option<Duration> {
        self.s_max_age
    }

    /// Returns `stale-if-error`.
    #[inline]
    pub fn stale_if_error(&self) -> Option<Duration> {
        self.stale_if_error
    }

    /// `true` when nothing may be read from or written to the store.
    #[inline]
    pub fn is_no_store(&self) -> bool {
        self.mode == Some(CacheMode::NoStore)
    }

    /// Renders the strategy as a `Cache-Control` header value.
    ///
    /// Only fields that are set are rendered, always in the order
    /// mode, `max-age`, `stale-while-revalidate`, `s-maxage`, `stale-if-error`.
    pub fn header(&self) -> String {
        let mut directives: Vec<String> = Vec::with_capacity(5);
        if let Some(mode) = self.mode {
            directives.push(mode.as_str().to_owned());
        }
        let fields = [
            ("max-age", self.max_age),
            ("stale-while-revalidate", self.stale_while_revalidate),
            ("s-maxage", self.s_max_age),
            ("stale-if-error", self.stale_if_error),
        ];
        for (token, value) in fields {
            if let Some(value) = value {
                directives.push(format!("{}={}", token, value.as_secs()));
            }
        }
        directives.join(", ")
    }
}

impl From<StrategyOptions> for CachingStrategy {
    fn from(options: StrategyOptions) -> Self {
        Self::custom(options)
    }
}

/// Rounds up to the next whole second.
fn whole_seconds(duration: Duration) -> Duration {
    if duration.subsec_nanos() == 0 {
        duration
    } else {
        Duration::from_secs(duration.as_secs().saturating_add(1))
    }
}

impl Default for CachingStrategy {
    fn default() -> Self {
        Self {
            mode: Some(CacheMode::Public),
            max_age: Some(SHORT_MAX_AGE),
            stale_while_revalidate: Some(SHORT_STALE_WHILE_REVALIDATE),
            s_max_age: None,
            stale_if_error: None,
        }
    }
}

impl fmt::Display for CachingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn presets_render_expected_headers() {
        assert_eq!(CachingStrategy::no_store().header(), "no-store");
        assert_eq!(
            CachingStrategy::short(StrategyOptions::new()).unwrap().header(),
            "public, max-age=1, stale-while-revalidate=9"
        );
        assert_eq!(
            CachingStrategy::long(StrategyOptions::new()).unwrap().header(),
            "public, max-age=3600, stale-while-revalidate=82800"
        );
    }

    #[test]
    fn overrides_replace_defaults_field_by_field() {
        let strategy = CachingStrategy::long(
            StrategyOptions::new()
                .stale_while_revalidate(secs(60))
                .stale_if_error(secs(120)),
        )
        .unwrap();
        assert_eq!(strategy.max_age(), Some(secs(3600)));
        assert_eq!(strategy.stale_while_revalidate(), Some(secs(60)));
        assert_eq!(
            strategy.header(),
            "public, max-age=3600, stale-while-revalidate=60, stale-if-error=120"
        );
    }

    #[test]
    fn custom_renders_only_present_fields_in_fixed_order() {
        let strategy = CachingStrategy::custom(
            StrategyOptions::new()
                .stale_if_error(secs(5))
                .s_max_age(secs(4))
                .max_age(secs(3)),
        );
        assert_eq!(strategy.mode(), None);
        assert_eq!(strategy.header(), "max-age=3, s-maxage=4, stale-if-error=5");
    }

    #[test]
    fn sub_second_durations_round_up() {
        let strategy = CachingStrategy::custom(
            StrategyOptions::new()
                .max_age(Duration::from_millis(1500))
                .stale_while_revalidate(Duration::from_millis(500)),
        );
        assert_eq!(strategy.max_age(), Some(secs(2)));
        assert_eq!(strategy.stale_while_revalidate(), Some(secs(1)));
        assert_eq!(strategy.header(), "max-age=2, stale-while-revalidate=1");

        let short =
            CachingStrategy::short(StrategyOptions::new().max_age(Duration::from_millis(1))).unwrap();
        assert_eq!(short.max_age(), Some(secs(1)));

        let at_limit = CachingStrategy::custom(
            StrategyOptions::new().max_age(Duration::new(u64::MAX, 1)),
        );
        assert_eq!(at_limit.max_age(), Some(secs(u64::MAX)));
    }

    #[test]
    fn deserialized_strategy_rounds_like_custom() {
        let strategy: CachingStrategy =
            serde_saphyr::from_str("mode: public\nmax_age: 1500ms\n").unwrap();
        assert_eq!(strategy.header(), "public, max-age=2");
    }

    #[test]
    fn expirable_presets_reject_no_store_mode() {
        let err = CachingStrategy::short(StrategyOptions::new().mode(CacheMode::NoStore))
            .unwrap_err();
        assert_eq!(err, StrategyError::InvalidMode("no-store".to_owned()));
        assert!(CachingStrategy::long(StrategyOptions::new().mode(CacheMode::NoStore)).is_err());
    }

    #[test]
    fn mode_parsing_rejects_unknown_values() {
        assert_eq!("private".parse::<CacheMode>(), Ok(CacheMode::Private));
        assert_eq!("no-store".parse::<CacheMode>(), Ok(CacheMode::NoStore));
        assert_eq!(
            "shared".parse::<CacheMode>(),
            Err(StrategyError::InvalidMode("shared".to_owned()))
        );
    }

    #[test]
    fn default_is_short() {
        assert_eq!(
            CachingStrategy::default(),
            CachingStrategy::short(StrategyOptions::new()).unwrap()
        );
        assert!(!CachingStrategy::default().is_no_store());
        assert!(CachingStrategy::no_store().is_no_store());
    }

    #[test]
    fn deserializes_from_yaml_with_humantime_durations() {
        let yaml = r#"
mode: private
max_age: 1m
stale_while_revalidate: 1h
"#;
        let strategy: CachingStrategy = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(strategy.header(), "private, max-age=60, stale-while-revalidate=3600");
    }

    #[test]
    fn invalid_mode_in_configuration_is_rejected() {
        let yaml = "mode: shared\nmax_age: 1s\n";
        let result: Result<CachingStrategy, _> = serde_saphyr::from_str(yaml);
        assert!(result.is_err());
    }
}
