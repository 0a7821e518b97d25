//! Store names.

use smol_str::SmolStr;
use std::fmt;

/// Name of a store, as reported in [`ResponseSource`](crate::ResponseSource),
/// log fields and the `store` metric label.
///
/// ```
/// use subcache_core::StoreLabel;
///
/// assert_eq!(StoreLabel::new_static("moka").as_str(), "moka");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StoreLabel(SmolStr);

impl StoreLabel {
    /// Label from any string.
    #[inline]
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self(name.into())
    }

    /// Label from a string literal, without allocating.
    #[inline]
    pub const fn new_static(name: &'static str) -> Self {
        Self(SmolStr::new_static(name))
    }

    /// The name.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StoreLabel {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for StoreLabel {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}
