//! Composite key rendering: ordered components joined with `#`.
//!
//! The rendered string is the only identity the store sees. It is never split
//! back into components; callers keep the [`CompositeKey`] if they need the
//! tuple.

use std::fmt;

use tracing::warn;

/// Separator between rendered key components.
pub const KEY_DELIMITER: char = '#';

/// One component of a composite key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPart {
    Int(i64),
    Str(String),
    Key(CompositeKey),
}

impl From<i64> for KeyPart {
    fn from(n: i64) -> Self {
        KeyPart::Int(n)
    }
}

impl From<&str> for KeyPart {
    fn from(s: &str) -> Self {
        KeyPart::Str(s.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(s: String) -> Self {
        KeyPart::Str(s)
    }
}

impl From<CompositeKey> for KeyPart {
    fn from(key: CompositeKey) -> Self {
        KeyPart::Key(key)
    }
}

/// Render `parts` in order, joined with [`KEY_DELIMITER`].
///
/// Components are not escaped: a string component containing `#` makes the
/// result ambiguous. Such components are logged, not rejected, so existing
/// keys keep their exact rendering.
pub fn build_key(parts: &[KeyPart]) -> String {
    let mut out = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push(KEY_DELIMITER);
        }
        match part {
            KeyPart::Int(n) => out.push_str(&n.to_string()),
            KeyPart::Str(s) => {
                if s.contains(KEY_DELIMITER) {
                    warn!(component = %s, "key component contains the key delimiter");
                }
                out.push_str(s);
            }
            KeyPart::Key(key) => out.push_str(key.as_str()),
        }
    }
    out
}

/// A key tuple together with its rendered form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeKey {
    parts: Vec<KeyPart>,
    rendered: String,
}

impl CompositeKey {
    pub fn new(parts: Vec<KeyPart>) -> Self {
        let rendered = build_key(&parts);
        Self { parts, rendered }
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.parts
    }

    pub fn as_str(&self) -> &str {
        &self.rendered
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_key_integers() {
        let key = build_key(&[5.into(), 10.into(), 20.into()]);
        assert_eq!(key, "5#10#20");
    }

    #[test]
    fn test_build_key_single_and_empty() {
        assert_eq!(build_key(&[42.into()]), "42");
        assert_eq!(build_key(&[]), "");
    }

    #[test]
    fn test_build_key_mixed() {
        let key = build_key(&[3.into(), "alice".into(), (-1).into()]);
        assert_eq!(key, "3#alice#-1");
    }

    #[test]
    fn test_nested_composite() {
        let inner = CompositeKey::new(vec![10.into(), 20.into()]);
        let outer = CompositeKey::new(vec![5.into(), inner.clone().into()]);
        assert_eq!(outer.as_str(), "5#10#20");
        assert_eq!(outer.parts()[1], KeyPart::Key(inner));
        assert_eq!(outer.to_string(), "5#10#20");
    }

    #[test]
    fn test_order_matters() {
        let a = build_key(&[1.into(), 2.into()]);
        let b = build_key(&[2.into(), 1.into()]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_integer_components_are_injective() {
        // No decimal rendering contains '#', so distinct tuples never collide.
        let mut seen = std::collections::HashSet::new();
        for a in [0i64, 1, 10, 11] {
            for b in [0i64, 1, 10, 11] {
                assert!(seen.insert(build_key(&[a.into(), b.into()])));
            }
        }
    }

    #[test]
    fn test_delimiter_in_string_is_not_escaped() {
        let key = build_key(&["a#b".into(), "c".into()]);
        assert_eq!(key, "a#b#c");
        assert_eq!(key, build_key(&["a".into(), "b#c".into()]));
    }
}
