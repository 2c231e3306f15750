//! Hierarchical document model
//!
//! A [`Document`] is the parsed form of one simulation run's recorded output
//! (or of its reference). It is a closed union of mappings, sequences and
//! scalars, and it is never mutated once built.
//!
//! `Document` implements `Deserialize` directly, so any self-describing serde
//! format (YAML streams in practice, JSON in tests) can produce one without an
//! intermediate value type. Mapping keys are stored in their textual form and
//! keep their original order.

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// Ordered key/value pairs of a mapping node.
pub type Mapping = IndexMap<String, Document>;

/// A parsed hierarchical value.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Mapping(Mapping),
    Sequence(Vec<Document>),
    Scalar(Scalar),
}

/// Leaf value of a document.
///
/// Integers and floats are both "numbers" for comparison purposes; they are
/// kept apart so that integers written by the simulation round-trip without
/// acquiring a fractional part.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

/// One step of a key path used by [`Document::get_path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Mapping key, matched against the textual form of the key
    Key(String),
    /// Sequence index; negative values count from the end
    Index(isize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<isize> for PathSegment {
    fn from(index: isize) -> Self {
        PathSegment::Index(index)
    }
}

impl Scalar {
    /// Numeric view used for tolerance comparisons.
    ///
    /// Booleans count as `0`/`1`; strings and null have no numeric view.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Integer(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Scalar::Null | Scalar::String(_) => None,
        }
    }

    pub fn is_textual(&self) -> bool {
        matches!(self, Scalar::String(_))
    }

    /// Short name of the scalar kind, for diagnostics and logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "boolean",
            Scalar::Integer(_) | Scalar::Float(_) => "number",
            Scalar::String(_) => "string",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

impl Document {
    /// Build a mapping document from key/value pairs, keeping their order.
    pub fn mapping<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Document)>,
    {
        Document::Mapping(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn sequence(items: impl IntoIterator<Item = Document>) -> Self {
        Document::Sequence(items.into_iter().collect())
    }

    pub fn null() -> Self {
        Document::Scalar(Scalar::Null)
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Document::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Document]> {
        match self {
            Document::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Document::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_scalar().and_then(Scalar::as_f64)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Document::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Look up a direct child of a mapping by key.
    pub fn get(&self, key: &str) -> Option<&Document> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Follow a key path from this node.
    ///
    /// Returns `None` as soon as a segment does not apply (missing key, index
    /// out of range, or a key segment applied to a sequence and vice versa).
    pub fn get_path(&self, path: &[PathSegment]) -> Option<&Document> {
        let mut node = self;
        for segment in path {
            node = match (segment, node) {
                (PathSegment::Key(key), Document::Mapping(m)) => m.get(key.as_str())?,
                (PathSegment::Index(index), Document::Sequence(items)) => {
                    let len = items.len() as isize;
                    let resolved = if *index < 0 { len + index } else { *index };
                    if resolved < 0 || resolved >= len {
                        return None;
                    }
                    &items[resolved as usize]
                }
                _ => return None,
            };
        }
        Some(node)
    }

    /// Short name of the node kind, for diagnostics and logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Document::Mapping(_) => "mapping",
            Document::Sequence(_) => "sequence",
            Document::Scalar(s) => s.kind_name(),
        }
    }

    fn into_key_text(self) -> Result<String, String> {
        match self {
            Document::Scalar(s) => Ok(s.to_string()),
            other => Err(format!(
                "mapping keys must be scalars, found a {}",
                other.kind_name()
            )),
        }
    }
}

impl From<f64> for Document {
    fn from(value: f64) -> Self {
        Document::Scalar(Scalar::Float(value))
    }
}

impl From<i64> for Document {
    fn from(value: i64) -> Self {
        Document::Scalar(Scalar::Integer(value))
    }
}

impl From<bool> for Document {
    fn from(value: bool) -> Self {
        Document::Scalar(Scalar::Bool(value))
    }
}

impl From<&str> for Document {
    fn from(value: &str) -> Self {
        Document::Scalar(Scalar::String(value.to_string()))
    }
}

impl From<String> for Document {
    fn from(value: String) -> Self {
        Document::Scalar(Scalar::String(value))
    }
}

impl From<Scalar> for Document {
    fn from(value: Scalar) -> Self {
        Document::Scalar(value)
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Null => serializer.serialize_unit(),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Integer(i) => serializer.serialize_i64(*i),
            Scalar::Float(f) => serializer.serialize_f64(*f),
            Scalar::String(s) => serializer.serialize_str(s),
        }
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Document::Mapping(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Document::Sequence(items) => serializer.collect_seq(items),
            Document::Scalar(s) => s.serialize(serializer),
        }
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Document;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mapping, a sequence or a scalar")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Document, E> {
        Ok(Document::Scalar(Scalar::Bool(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Document, E> {
        Ok(Document::Scalar(Scalar::Integer(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Document, E> {
        Ok(Document::Scalar(match i64::try_from(v) {
            Ok(i) => Scalar::Integer(i),
            Err(_) => Scalar::Float(v as f64),
        }))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Document, E> {
        Ok(Document::Scalar(Scalar::Float(v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Document, E> {
        Ok(Document::Scalar(Scalar::String(v.to_string())))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Document, E> {
        Ok(Document::Scalar(Scalar::String(v)))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Document, E> {
        Ok(Document::null())
    }

    fn visit_none<E: de::Error>(self) -> Result<Document, E> {
        Ok(Document::null())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Document, D::Error> {
        Document::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Document, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Document>()? {
            items.push(item);
        }
        Ok(Document::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Document, A::Error> {
        let mut mapping = Mapping::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(key) = map.next_key::<Document>()? {
            let key = key.into_key_text().map_err(de::Error::custom)?;
            let value = map.next_value::<Document>()?;
            mapping.insert(key, value);
        }
        Ok(Document::Mapping(mapping))
    }

    // YAML tags (`!Tag value`) arrive as single-variant enums; the tag is dropped.
    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<Document, A::Error> {
        let (_tag, variant) = data.variant::<String>()?;
        variant.newtype_variant::<Document>()
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DocumentVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Document {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_mapping_preserves_key_order() {
        let doc = yaml("zeta: 1\nalpha: 2\nmid: 3\n");
        let keys: Vec<&str> = doc.as_mapping().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_scalar_kinds() {
        let doc = yaml("i: 3\nf: 2.5\nb: true\nn: ~\ns: PBE\n");
        assert_eq!(doc.get("i"), Some(&Document::from(3i64)));
        assert_eq!(doc.get("f"), Some(&Document::from(2.5)));
        assert_eq!(doc.get("b"), Some(&Document::from(true)));
        assert_eq!(doc.get("n"), Some(&Document::null()));
        assert_eq!(doc.get("s").and_then(Document::as_str), Some("PBE"));
    }

    #[test]
    fn test_non_string_keys_use_textual_form() {
        let doc = yaml("1: one\ntrue: yes-value\n2.5: half\n");
        let m = doc.as_mapping().unwrap();
        assert!(m.contains_key("1"));
        assert!(m.contains_key("true"));
        assert!(m.contains_key("2.5"));
    }

    #[test]
    fn test_tagged_values_are_unwrapped() {
        let doc = yaml("energy: !Hartree -1.5\n");
        assert_eq!(doc.get("energy").and_then(Document::as_f64), Some(-1.5));
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(Scalar::Integer(2).as_f64(), Some(2.0));
        assert_eq!(Scalar::Bool(true).as_f64(), Some(1.0));
        assert_eq!(Scalar::Null.as_f64(), None);
        assert_eq!(Scalar::String("1.0".into()).as_f64(), None);
    }

    #[test]
    fn test_get_path_keys_and_indexes() {
        let doc = yaml(
            "Ground State Optimization:\n  - Fermi Energy: -0.1\n  - Fermi Energy: -0.2\n",
        );
        let last = doc.get_path(&[
            "Ground State Optimization".into(),
            PathSegment::Index(-1),
            "Fermi Energy".into(),
        ]);
        assert_eq!(last.and_then(Document::as_f64), Some(-0.2));

        let first = doc.get_path(&[
            "Ground State Optimization".into(),
            PathSegment::Index(0),
            "Fermi Energy".into(),
        ]);
        assert_eq!(first.and_then(Document::as_f64), Some(-0.1));
    }

    #[test]
    fn test_get_path_misses() {
        let doc = yaml("a:\n  - 1\n");
        assert!(doc.get_path(&["b".into()]).is_none());
        assert!(doc.get_path(&["a".into(), PathSegment::Index(3)]).is_none());
        assert!(doc.get_path(&["a".into(), PathSegment::Index(-2)]).is_none());
        assert!(doc.get_path(&["a".into(), "x".into()]).is_none());
        assert_eq!(doc.get_path(&[]), Some(&doc));
    }

    #[test]
    fn test_serialize_keeps_order_and_integers() {
        let doc = Document::mapping([
            ("b", Document::from(1i64)),
            ("a", Document::sequence([Document::from(0.5), Document::null()])),
        ]);
        let json = serde_json::to_string(&doc).unwrap();
        assert_eq!(json, r#"{"b":1,"a":[0.5,null]}"#);
    }

    #[test]
    fn test_composite_keys_are_rejected() {
        let result: Result<Document, _> = serde_yaml::from_str("? [1, 2]\n: value\n");
        assert!(result.is_err());
    }
}
