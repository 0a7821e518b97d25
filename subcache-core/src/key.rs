//! Cache key types and canonicalization.
//!
//! A [`CacheKey`] is an ordered list of heterogeneous [`KeyPart`]s. The key is
//! canonicalized once, on construction, into the single string used to
//! address the store:
//!
//! 1. strings are used as-is, numbers and booleans use their decimal/text form;
//! 2. structured parts are serialized as JSON with object fields sorted
//!    recursively, so field order never changes the key;
//! 3. all part strings are concatenated in order and the result is
//!    percent-encoded as one unit.
//!
//! ```
//! use subcache_core::{CacheKey, KeyPart};
//! use serde_json::json;
//!
//! let key = CacheKey::new(vec![
//!     KeyPart::from("products/"),
//!     KeyPart::from(42),
//!     KeyPart::from(json!({"locale": "en", "currency": "EUR"})),
//! ]);
//! assert_eq!(
//!     key.canonical(),
//!     "products%2F42%7B%22currency%22%3A%22EUR%22%2C%22locale%22%3A%22en%22%7D"
//! );
//! ```
//!
//! ## Collisions
//!
//! Parts are concatenated without separators, so `["ab", "c"]` and
//! `["a", "bc"]` address the same entry. This is accepted: keys are built by
//! code, not by end users, and the usual shape (a URL plus request options)
//! does not produce such ambiguities in practice.
//!
//! ## Performance
//!
//! [`CacheKey`] uses `Arc` internally for cheap cloning. Background
//! revalidation and write tasks each hold a clone of the key.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use smol_str::SmolStr;

/// A single component of a cache key.
#[derive(Clone, Debug, PartialEq)]
pub enum KeyPart {
    /// Plain string, used verbatim.
    Str(SmolStr),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating point number.
    Float(f64),
    /// Boolean flag.
    Bool(bool),
    /// Structured value, serialized with sorted object fields.
    Structured(Value),
}

impl KeyPart {
    /// Serializes any value into a structured key part.
    pub fn structured<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(KeyPart::from)
    }

    /// Appends the string form of this part to `out`.
    fn write_to(&self, out: &mut String) {
        use std::fmt::Write;

        match self {
            KeyPart::Str(s) => out.push_str(s),
            // Writing into a String never fails.
            KeyPart::Int(n) => {
                let _ = write!(out, "{}", n);
            }
            KeyPart::UInt(n) => {
                let _ = write!(out, "{}", n);
            }
            KeyPart::Float(n) => {
                let _ = write!(out, "{}", n);
            }
            KeyPart::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            KeyPart::Structured(value) => write_stable_json(value, out),
        }
    }
}

/// Serializes `value` as JSON with object fields sorted at every depth.
fn write_stable_json(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_stable_json(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut fields: Vec<(&String, &Value)> = map.iter().collect();
            fields.sort_by(|(a, _), (b, _)| a.cmp(b));
            out.push('{');
            for (i, (name, field)) in fields.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(name.clone()).to_string());
                out.push(':');
                write_stable_json(field, out);
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        KeyPart::Str(SmolStr::new(value))
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        KeyPart::Str(SmolStr::from(value))
    }
}

impl From<SmolStr> for KeyPart {
    fn from(value: SmolStr) -> Self {
        KeyPart::Str(value)
    }
}

impl From<i64> for KeyPart {
    fn from(value: i64) -> Self {
        KeyPart::Int(value)
    }
}

impl From<i32> for KeyPart {
    fn from(value: i32) -> Self {
        KeyPart::Int(value.into())
    }
}

impl From<u64> for KeyPart {
    fn from(value: u64) -> Self {
        KeyPart::UInt(value)
    }
}

impl From<u32> for KeyPart {
    fn from(value: u32) -> Self {
        KeyPart::UInt(value.into())
    }
}

impl From<f64> for KeyPart {
    fn from(value: f64) -> Self {
        KeyPart::Float(value)
    }
}

impl From<bool> for KeyPart {
    fn from(value: bool) -> Self {
        KeyPart::Bool(value)
    }
}

impl From<Value> for KeyPart {
    /// Scalars map onto their scalar parts, so `json!("a")` and `"a"` are the
    /// same part. `null` contributes nothing to the key.
    fn from(value: Value) -> Self {
        match value {
            Value::Null => KeyPart::Str(SmolStr::default()),
            Value::Bool(b) => KeyPart::Bool(b),
            Value::String(s) => KeyPart::Str(SmolStr::from(s)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    KeyPart::Int(i)
                } else if let Some(u) = n.as_u64() {
                    KeyPart::UInt(u)
                } else {
                    KeyPart::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            structured => KeyPart::Structured(structured),
        }
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_to(&mut out);
        f.write_str(&out)
    }
}

/// Concatenates the string forms of `parts` and percent-encodes the result.
pub fn canonicalize(parts: &[KeyPart]) -> String {
    let mut raw = String::new();
    for part in parts {
        part.write_to(&mut raw);
    }
    urlencoding::encode(&raw).into_owned()
}

#[derive(Debug)]
struct CacheKeyInner {
    parts: Vec<KeyPart>,
    canonical: SmolStr,
    display_name: Option<SmolStr>,
}

/// A cache key identifying a cached entry.
///
/// Equality and hashing use the canonical string only: two keys with
/// different parts but the same canonical form are the same key. The
/// optional display name is diagnostic and never part of the identity.
#[derive(Clone, Debug)]
pub struct CacheKey {
    inner: Arc<CacheKeyInner>,
}

impl CacheKey {
    /// Creates a key from its parts and canonicalizes it.
    pub fn new(parts: Vec<KeyPart>) -> Self {
        let canonical = SmolStr::from(canonicalize(&parts));
        CacheKey {
            inner: Arc::new(CacheKeyInner {
                parts,
                canonical,
                display_name: None,
            }),
        }
    }

    /// Attaches a human-readable name, recorded in stored diagnostics.
    pub fn with_display_name(self, name: impl Into<SmolStr>) -> Self {
        CacheKey {
            inner: Arc::new(CacheKeyInner {
                parts: self.inner.parts.clone(),
                canonical: self.inner.canonical.clone(),
                display_name: Some(name.into()),
            }),
        }
    }

    /// Name given with [`with_display_name`](Self::with_display_name).
    pub fn display_name(&self) -> Option<&str> {
        self.inner.display_name.as_deref()
    }

    /// Returns the canonical, percent-encoded key string.
    #[inline]
    pub fn canonical(&self) -> &str {
        &self.inner.canonical
    }

    /// Returns an iterator over the key parts.
    pub fn parts(&self) -> impl Iterator<Item = &KeyPart> {
        self.inner.parts.iter()
    }

    /// Whether the canonical key is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.canonical.is_empty()
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.canonical == other.inner.canonical
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.canonical.hash(state);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.canonical)
    }
}

impl FromIterator<KeyPart> for CacheKey {
    fn from_iter<I: IntoIterator<Item = KeyPart>>(iter: I) -> Self {
        CacheKey::new(iter.into_iter().collect())
    }
}

impl From<Vec<KeyPart>> for CacheKey {
    fn from(parts: Vec<KeyPart>) -> Self {
        CacheKey::new(parts)
    }
}

impl From<KeyPart> for CacheKey {
    fn from(part: KeyPart) -> Self {
        CacheKey::new(vec![part])
    }
}

impl From<&str> for CacheKey {
    fn from(value: &str) -> Self {
        CacheKey::new(vec![KeyPart::from(value)])
    }
}

impl From<String> for CacheKey {
    fn from(value: String) -> Self {
        CacheKey::new(vec![KeyPart::from(value)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_does_not_change_identity() {
        let plain = CacheKey::from("catalog");
        let named = plain.clone().with_display_name("Catalog page");

        assert_eq!(named, plain);
        assert_eq!(named.canonical(), "catalog");
        assert_eq!(named.display_name(), Some("Catalog page"));
        assert_eq!(plain.display_name(), None);
    }
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn equal_part_lists_canonicalize_identically() {
        let a = CacheKey::new(vec!["user".into(), 7.into(), json!({"a": 1}).into()]);
        let b = CacheKey::new(vec!["user".into(), 7.into(), json!({"a": 1}).into()]);
        assert_eq!(a.canonical(), b.canonical());
        assert_eq!(a, b);
    }

    #[test]
    fn object_field_order_is_irrelevant() {
        let a = CacheKey::from(KeyPart::from(json!({"b": [1, {"y": 2, "x": 1}], "a": null})));
        let b = CacheKey::from(KeyPart::from(json!({"a": null, "b": [1, {"x": 1, "y": 2}]})));
        assert_eq!(a, b);
        assert_eq!(
            urlencoding::decode(a.canonical()).unwrap(),
            r#"{"a":null,"b":[1,{"x":1,"y":2}]}"#
        );
    }

    #[test]
    fn structurally_different_lists_differ() {
        let a = CacheKey::new(vec!["user".into(), 7.into()]);
        let b = CacheKey::new(vec!["user".into(), 8.into()]);
        let c = CacheKey::new(vec!["user".into(), json!({"id": 7}).into()]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn concatenation_collisions_share_a_key() {
        let a = CacheKey::new(vec!["ab".into(), "c".into()]);
        let b = CacheKey::new(vec!["a".into(), "bc".into()]);
        assert_eq!(a, b);
    }

    #[test]
    fn scalar_json_values_match_scalar_parts() {
        assert_eq!(KeyPart::from(json!("x")), KeyPart::from("x"));
        assert_eq!(KeyPart::from(json!(3)), KeyPart::from(3));
        assert_eq!(KeyPart::from(json!(true)), KeyPart::from(true));
        assert_eq!(KeyPart::from(json!(null)).to_string(), "");
    }

    #[test]
    fn numbers_render_in_decimal_form() {
        assert_eq!(KeyPart::from(1.5).to_string(), "1.5");
        assert_eq!(KeyPart::from(2.0).to_string(), "2");
        assert_eq!(KeyPart::from(-3).to_string(), "-3");
        assert_eq!(KeyPart::from(u64::MAX).to_string(), "18446744073709551615");
    }

    #[test]
    fn result_is_percent_encoded_as_one_unit() {
        let key = CacheKey::new(vec!["https://api.example.com/q?a=1&b=2".into(), " x".into()]);
        assert_eq!(
            key.canonical(),
            "https%3A%2F%2Fapi.example.com%2Fq%3Fa%3D1%26b%3D2%20x"
        );
    }

    #[test]
    fn structured_accepts_any_serializable_value() {
        #[derive(Serialize)]
        struct Options {
            method: &'static str,
            page: u32,
        }
        let part = KeyPart::structured(&Options {
            method: "GET",
            page: 2,
        })
        .unwrap();
        assert_eq!(part.to_string(), r#"{"method":"GET","page":2}"#);
    }
}
