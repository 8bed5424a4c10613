//! Property keys as seen by object implementations.
//!
//! A property name crosses the bridge as a `String` or `Int` value. Host
//! objects receive it decoded into a [`PropertyKey`] so they never need to
//! touch the ledger to compare names.
//!
//! As in the scripting host, `obj[0]` and `obj["0"]` are the same property:
//! a name that is the canonical spelling of an `i32` decodes to
//! [`PropertyKey::Index`].

use std::fmt;

/// A decoded property name.
///
/// # Examples
///
/// ```
/// use core_types::PropertyKey;
///
/// let named = PropertyKey::from("x");
/// let index = PropertyKey::Index(0);
/// assert_eq!(named.to_string(), "x");
/// assert_eq!(index.to_string(), "0");
/// assert_eq!(PropertyKey::from("0"), index);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// Named property
    Name(String),
    /// Integer index (array element)
    Index(i32),
}

impl PropertyKey {
    /// Returns the name if this is a named key.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            PropertyKey::Name(s) => Some(s),
            PropertyKey::Index(_) => None,
        }
    }
}

/// The index a name spells, if it is exactly how that integer prints.
fn canonical_index(s: &str) -> Option<i32> {
    let n = s.parse::<i32>().ok()?;
    (n.to_string() == s).then_some(n)
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        match canonical_index(s) {
            Some(n) => PropertyKey::Index(n),
            None => PropertyKey::Name(s.to_string()),
        }
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        match canonical_index(&s) {
            Some(n) => PropertyKey::Index(n),
            None => PropertyKey::Name(s),
        }
    }
}

impl From<i32> for PropertyKey {
    fn from(n: i32) -> Self {
        PropertyKey::Index(n)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::Name(s) => f.write_str(s),
            PropertyKey::Index(n) => write!(f, "{}", n),
        }
    }
}
