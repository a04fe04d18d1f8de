use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameParseError {
    #[error("Invalid percent-escape in name component '{0}'")]
    InvalidEscape(String),
}

/// A single name component: an opaque byte value
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameComponent {
    value: Bytes,
}

impl NameComponent {
    pub fn new(value: impl Into<Bytes>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &Bytes {
        &self.value
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl From<Bytes> for NameComponent {
    fn from(value: Bytes) -> Self {
        Self { value }
    }
}

impl From<Vec<u8>> for NameComponent {
    fn from(value: Vec<u8>) -> Self {
        Self {
            value: Bytes::from(value),
        }
    }
}

impl From<&[u8]> for NameComponent {
    fn from(value: &[u8]) -> Self {
        Self {
            value: Bytes::copy_from_slice(value),
        }
    }
}

impl From<&str> for NameComponent {
    fn from(value: &str) -> Self {
        Self {
            value: Bytes::copy_from_slice(value.as_bytes()),
        }
    }
}

impl Ord for NameComponent {
    // Canonical order: shorter components sort first, ties break bytewise.
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .len()
            .cmp(&other.value.len())
            .then_with(|| self.value.as_ref().cmp(other.value.as_ref()))
    }
}

impl PartialOrd for NameComponent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Formats the component in NDN URI escaping: alphanumerics and `+ - . _`
/// stay literal, everything else becomes `%XX`, and a value consisting
/// entirely of periods (including the empty value) gains three leading
/// periods so it survives the round trip through URI path syntax.
impl fmt::Display for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.iter().all(|&b| b == b'.') {
            write!(f, "...")?;
            for _ in 0..self.value.len() {
                write!(f, ".")?;
            }
            return Ok(());
        }
        for &b in self.value.iter() {
            if b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.' | b'_') {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "%{:02X}", b)?;
            }
        }
        Ok(())
    }
}

/// A hierarchical NDN name: a sequence of components
#[derive(
    Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Name {
    components: Vec<NameComponent>,
}

impl Name {
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Parse a name from its URI form, e.g. `/hello/world` or `/a/%07%20`
    ///
    /// Empty segments and the dot segments `.` and `..` contribute no
    /// component, so `/a//b` and `/a/./b` both parse as `/a/b`.
    pub fn from_uri(uri: &str) -> Result<Self, NameParseError> {
        let mut name = Name::new();
        for part in uri.trim().split('/') {
            if let Some(component) = unescape_component(part)? {
                name.append(component);
            }
        }
        Ok(name)
    }

    pub fn append(&mut self, component: impl Into<NameComponent>) -> &mut Self {
        self.components.push(component.into());
        self
    }

    pub fn get(&self, index: usize) -> Option<&NameComponent> {
        self.components.get(index)
    }

    pub fn components(&self) -> &[NameComponent] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn clear(&mut self) {
        self.components.clear();
    }

    pub fn get_prefix(&self, count: usize) -> Name {
        let end = count.min(self.components.len());
        Self {
            components: self.components[..end].to_vec(),
        }
    }

    pub fn is_prefix_of(&self, other: &Name) -> bool {
        self.len() <= other.len()
            && self
                .components
                .iter()
                .zip(&other.components)
                .all(|(ours, theirs)| ours == theirs)
    }

    pub fn to_uri(&self) -> String {
        if self.components.is_empty() {
            return "/".to_string();
        }

        let mut uri = String::new();
        for component in &self.components {
            uri.push('/');
            uri.push_str(&component.to_string());
        }
        uri
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uri())
    }
}

impl FromStr for Name {
    type Err = NameParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Name::from_uri(s)
    }
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

// Returns None for segments that contribute no component ("" , "." and "..").
fn unescape_component(part: &str) -> Result<Option<NameComponent>, NameParseError> {
    let bytes = part.as_bytes();
    let mut value = Vec::with_capacity(bytes.len());

    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let high = bytes.get(i + 1).copied().and_then(hex_value);
            let low = bytes.get(i + 2).copied().and_then(hex_value);
            match (high, low) {
                (Some(high), Some(low)) => {
                    value.push((high << 4) | low);
                    i += 3;
                }
                _ => return Err(NameParseError::InvalidEscape(part.to_string())),
            }
        } else {
            value.push(bytes[i]);
            i += 1;
        }
    }

    if value.iter().all(|&b| b == b'.') {
        // An all-periods value carries three extra periods in URI form.
        if value.len() < 3 {
            return Ok(None);
        }
        value.drain(..3);
    }
    Ok(Some(NameComponent::new(value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_parse_and_uri() {
        let name = Name::from_uri("/hello/world/test").unwrap();
        assert_eq!(name.len(), 3);
        assert_eq!(name.get(0).unwrap().value().as_ref(), b"hello");
        assert_eq!(name.get(1).unwrap().value().as_ref(), b"world");
        assert_eq!(name.get(2).unwrap().value().as_ref(), b"test");
        assert_eq!(name.to_uri(), "/hello/world/test");
    }

    #[test]
    fn test_empty_name() {
        assert!(Name::from_uri("").unwrap().is_empty());
        assert!(Name::from_uri("/").unwrap().is_empty());
        assert_eq!(Name::new().to_uri(), "/");
    }

    #[test]
    fn test_percent_escaping() {
        let mut name = Name::new();
        name.append(&[0x07, b' ', 0xAB][..]);
        assert_eq!(name.to_uri(), "/%07%20%AB");

        let parsed = Name::from_uri("/%07%20%ab").unwrap();
        assert_eq!(parsed, name);
    }

    #[test]
    fn test_unreserved_characters_stay_literal() {
        let name = Name::from_uri("/a+b-c.d_e").unwrap();
        assert_eq!(name.get(0).unwrap().value().as_ref(), b"a+b-c.d_e");
        assert_eq!(name.to_uri(), "/a+b-c.d_e");
    }

    #[test]
    fn test_all_periods_component() {
        let mut name = Name::new();
        name.append("").append("..");
        assert_eq!(name.to_uri(), "/.../.....");

        let parsed = Name::from_uri("/.../.....").unwrap();
        assert_eq!(parsed, name);
        assert!(parsed.get(0).unwrap().is_empty());
        assert_eq!(parsed.get(1).unwrap().value().as_ref(), b"..");
    }

    #[test]
    fn test_dot_segments_contribute_nothing() {
        let name = Name::from_uri("/a/./b//c/..").unwrap();
        assert_eq!(name.to_uri(), "/a/b/c");
    }

    #[test]
    fn test_invalid_escape() {
        assert_eq!(
            Name::from_uri("/a/%zz"),
            Err(NameParseError::InvalidEscape("%zz".to_string()))
        );
        assert!(Name::from_uri("/a/%4").is_err());
    }

    #[test]
    fn test_component_ordering() {
        // Shorter sorts first, ties break bytewise.
        let a = NameComponent::from("a");
        let b = NameComponent::from("b");
        let aa = NameComponent::from("aa");
        let empty = NameComponent::default();

        assert!(empty < a);
        assert!(a < b);
        assert!(b < aa);
        assert!(NameComponent::from("ab") < NameComponent::from("ac"));
    }

    #[test]
    fn test_prefix_relations() {
        let name = Name::from_uri("/a/b/c").unwrap();
        let prefix = name.get_prefix(2);

        assert_eq!(prefix.to_uri(), "/a/b");
        assert!(prefix.is_prefix_of(&name));
        assert!(name.is_prefix_of(&name));
        assert!(!name.is_prefix_of(&prefix));
        assert!(Name::new().is_prefix_of(&name));
        assert!(!Name::from_uri("/a/x").unwrap().is_prefix_of(&name));

        // Asking for more components than exist is not an error.
        assert_eq!(name.get_prefix(10), name);
    }
}
