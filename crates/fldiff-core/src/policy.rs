//! Tolerance specification, label overrides and ignore rules
//!
//! A tolerance specification is itself a document with three reserved
//! sections and any number of named override blocks:
//!
//! ```yaml
//! Default tolerances:
//!   Epsilon: 1.1e-11
//!   Energies: 1.0e-10
//!   Orbitals: {e: 1.0e-8}
//! Keys to ignore: [Version Number, Timestamp of this run, "Time*"]
//! Patterns to ignore: [Wavefunction, Memory]
//! Cluster:
//!   Keys to ignore: [Maximal OpenMP threads per MPI task]
//!   Energies: 1.0e-9
//! ```
//!
//! [`ToleranceSpec::resolve`] merges the selected override block into the
//! defaults and returns an immutable [`ResolvedTolerances`] that the
//! comparator uses for every document of a batch.

use crate::diff::model::Tree;
use crate::errors::FldiffError;
use fldiff_core_types::{Document, Mapping};
use indexmap::IndexMap;
use serde::Serialize;

pub const DEFAULT_TOLERANCES: &str = "Default tolerances";
pub const KEYS_TO_IGNORE: &str = "Keys to ignore";
pub const PATTERNS_TO_IGNORE: &str = "Patterns to ignore";
/// Entry of the default table holding the global fallback tolerance
pub const EPSILON: &str = "Epsilon";

/// Allowed deviation: a tolerance, a per-key table, or a one-entry sequence.
pub type Policy = Tree<f64>;

/// Flat, name-keyed default tolerance table.
pub type ToleranceTable = IndexMap<String, Policy>;

/// One named override block of the specification.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverrideBlock {
    pub keys_to_ignore: Vec<String>,
    pub patterns_to_ignore: Vec<String>,
    pub tolerances: ToleranceTable,
}

/// Parsed tolerance specification, before any label is applied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToleranceSpec {
    pub defaults: ToleranceTable,
    pub keys_to_ignore: Vec<String>,
    pub patterns_to_ignore: Vec<String>,
    pub overrides: IndexMap<String, OverrideBlock>,
}

/// Exact key names and substring patterns excluded from comparison.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct IgnoreRules {
    #[serde(rename = "Keys to ignore")]
    keys: Vec<String>,
    #[serde(rename = "Patterns to ignore")]
    patterns: Vec<String>,
}

impl IgnoreRules {
    /// Build ignore rules; keys containing `*` become patterns made of the
    /// text before the first `*`.
    pub fn new(
        keys: impl IntoIterator<Item = String>,
        patterns: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut rules = IgnoreRules {
            keys: Vec::new(),
            patterns: patterns.into_iter().collect(),
        };
        for key in keys {
            match key.split_once('*') {
                Some((prefix, _)) => rules.patterns.push(prefix.to_string()),
                None => rules.keys.push(key),
            }
        }
        rules
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_ignored(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key) || self.patterns.iter().any(|p| key.contains(p.as_str()))
    }
}

/// Tolerance configuration ready for comparison.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResolvedTolerances {
    /// Override block that was merged in, if any
    #[serde(rename = "Label", skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Fallback tolerance for numbers without a resolved tolerance
    #[serde(rename = "Epsilon")]
    pub epsilon: f64,
    #[serde(rename = "Default tolerances")]
    pub defaults: ToleranceTable,
    #[serde(flatten)]
    pub ignore: IgnoreRules,
}

impl ResolvedTolerances {
    /// Configuration with no tolerances and nothing ignored: exact matching.
    pub fn exact() -> Self {
        Self::default()
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_default(mut self, key: impl Into<String>, policy: Policy) -> Self {
        self.defaults.insert(key.into(), policy);
        self
    }

    pub fn with_ignore(mut self, ignore: IgnoreRules) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn is_ignored(&self, key: &str) -> bool {
        self.ignore.is_ignored(key)
    }

    /// Effective policy for `key` inside a mapping reached with `ambient`.
    ///
    /// First match wins: an explicit entry of the ambient table, the default
    /// table entry for the key name, then the ambient tolerance itself when it
    /// is a single number broadcast over the mapping.
    pub fn resolve_child<'a>(&'a self, ambient: Option<&'a Policy>, key: &str) -> Option<&'a Policy> {
        if let Some(Tree::Map(table)) = ambient {
            if let Some(explicit) = table.get(key) {
                return Some(explicit);
            }
        }
        if let Some(default) = self.defaults.get(key) {
            return Some(default);
        }
        match ambient {
            Some(Tree::Leaf(_)) => ambient,
            _ => None,
        }
    }
}

/// Policy applied to every element of a sequence reached with `ambient`.
///
/// A sequence carries one policy for all of its elements: a number or a
/// table is broadcast as is, a sequence of policies contributes its first
/// entry.
pub fn element_policy(ambient: Option<&Policy>) -> Option<&Policy> {
    match ambient {
        Some(Tree::Seq(items)) => items.first(),
        other => other,
    }
}

impl ToleranceSpec {
    /// Parse a specification document.
    ///
    /// A null document (empty file) yields an empty specification.
    ///
    /// # Errors
    ///
    /// - `InvalidToleranceSection` when the root or a reserved section has the
    ///   wrong shape
    /// - `InvalidToleranceValue` when a tolerance is neither numeric nor a table
    pub fn from_document(doc: &Document) -> Result<Self, FldiffError> {
        let root = match doc {
            Document::Mapping(m) => m,
            Document::Scalar(fldiff_core_types::Scalar::Null) => return Ok(Self::default()),
            other => {
                return Err(FldiffError::InvalidToleranceSection {
                    section: "<root>".to_string(),
                    reason: format!("expected a mapping, found a {}", other.kind_name()),
                })
            }
        };

        let mut spec = ToleranceSpec::default();
        for (name, section) in root {
            match name.as_str() {
                DEFAULT_TOLERANCES => spec.defaults = parse_table(name, section)?,
                KEYS_TO_IGNORE => spec.keys_to_ignore = parse_string_list(name, section)?,
                PATTERNS_TO_IGNORE => spec.patterns_to_ignore = parse_string_list(name, section)?,
                label => {
                    let block = parse_override_block(label, section)?;
                    spec.overrides.insert(label.to_string(), block);
                }
            }
        }
        Ok(spec)
    }

    /// Merge the override block named `label` into the defaults.
    ///
    /// The block's ignore lists extend the base lists and its remaining
    /// entries replace same-named default tolerances. An unknown label is
    /// reported as a warning and leaves the defaults untouched.
    pub fn resolve(&self, label: Option<&str>) -> ResolvedTolerances {
        let mut defaults = self.defaults.clone();
        let mut keys = self.keys_to_ignore.clone();
        let mut patterns = self.patterns_to_ignore.clone();
        let mut applied = None;

        if let Some(label) = label.filter(|l| !l.is_empty()) {
            match self.overrides.get(label) {
                Some(block) => {
                    keys.extend(block.keys_to_ignore.iter().cloned());
                    patterns.extend(block.patterns_to_ignore.iter().cloned());
                    for (key, policy) in &block.tolerances {
                        defaults.insert(key.clone(), policy.clone());
                    }
                    tracing::debug!(
                        label,
                        new_keys = block.keys_to_ignore.len(),
                        new_patterns = block.patterns_to_ignore.len(),
                        new_tolerances = block.tolerances.len(),
                        "applied tolerance override"
                    );
                    applied = Some(label.to_string());
                }
                None => {
                    tracing::warn!(label, "label not found in tolerance specification");
                }
            }
        }

        let epsilon = defaults
            .get(EPSILON)
            .and_then(Tree::as_leaf)
            .copied()
            .unwrap_or(0.0);

        ResolvedTolerances {
            label: applied,
            epsilon,
            defaults,
            ignore: IgnoreRules::new(keys, patterns),
        }
    }
}

fn parse_policy(key: &str, doc: &Document) -> Result<Policy, FldiffError> {
    match doc {
        Document::Mapping(m) => Ok(Tree::Map(parse_entries(m)?)),
        Document::Sequence(items) => items
            .iter()
            .map(|item| parse_policy(key, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Tree::Seq),
        Document::Scalar(s) => s.as_f64().map(Tree::Leaf).ok_or_else(|| {
            FldiffError::InvalidToleranceValue {
                key: key.to_string(),
                found: s.kind_name().to_string(),
            }
        }),
    }
}

fn parse_entries(mapping: &Mapping) -> Result<ToleranceTable, FldiffError> {
    mapping
        .iter()
        .map(|(key, value)| Ok::<_, FldiffError>((key.clone(), parse_policy(key, value)?)))
        .collect()
}

fn parse_table(section: &str, doc: &Document) -> Result<ToleranceTable, FldiffError> {
    match doc {
        Document::Mapping(m) => parse_entries(m),
        Document::Scalar(fldiff_core_types::Scalar::Null) => Ok(ToleranceTable::new()),
        other => Err(FldiffError::InvalidToleranceSection {
            section: section.to_string(),
            reason: format!("expected a mapping, found a {}", other.kind_name()),
        }),
    }
}

fn parse_string_list(section: &str, doc: &Document) -> Result<Vec<String>, FldiffError> {
    let invalid = |reason: String| FldiffError::InvalidToleranceSection {
        section: section.to_string(),
        reason,
    };
    match doc {
        Document::Sequence(items) => items
            .iter()
            .map(|item| match item {
                Document::Scalar(s) => Ok(s.to_string()),
                other => Err(invalid(format!(
                    "entries must be scalars, found a {}",
                    other.kind_name()
                ))),
            })
            .collect(),
        Document::Scalar(fldiff_core_types::Scalar::Null) => Ok(Vec::new()),
        other => Err(invalid(format!(
            "expected a sequence, found a {}",
            other.kind_name()
        ))),
    }
}

fn parse_override_block(label: &str, doc: &Document) -> Result<OverrideBlock, FldiffError> {
    let entries = match doc {
        Document::Mapping(m) => m,
        other => {
            return Err(FldiffError::InvalidToleranceSection {
                section: label.to_string(),
                reason: format!("override block must be a mapping, found a {}", other.kind_name()),
            })
        }
    };

    let mut block = OverrideBlock::default();
    for (key, value) in entries {
        match key.as_str() {
            KEYS_TO_IGNORE => block.keys_to_ignore = parse_string_list(key, value)?,
            PATTERNS_TO_IGNORE => block.patterns_to_ignore = parse_string_list(key, value)?,
            _ => {
                block.tolerances.insert(key.clone(), parse_policy(key, value)?);
            }
        }
    }
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(text: &str) -> ToleranceSpec {
        let doc: Document = serde_yaml::from_str(text).unwrap();
        ToleranceSpec::from_document(&doc).unwrap()
    }

    const SAMPLE: &str = r#"
Default tolerances:
  Epsilon: 1.0e-10
  Energies: 1.0e-8
  Orbitals:
    e: 1.0e-6
Keys to ignore: [Version Number, "Timings*"]
Patterns to ignore: [Memory]
Cluster:
  Keys to ignore: [Hostname]
  Patterns to ignore: [GPU]
  Energies: 1.0e-5
  Epsilon: 1.0e-9
"#;

    #[test]
    fn test_parse_sections() {
        let spec = spec(SAMPLE);
        assert_eq!(spec.defaults.len(), 3);
        assert_eq!(spec.defaults.get("Energies"), Some(&Tree::Leaf(1.0e-8)));
        assert!(matches!(spec.defaults.get("Orbitals"), Some(Tree::Map(_))));
        assert_eq!(spec.keys_to_ignore, vec!["Version Number", "Timings*"]);
        assert_eq!(spec.patterns_to_ignore, vec!["Memory"]);
        assert!(spec.overrides.contains_key("Cluster"));
    }

    #[test]
    fn test_resolve_without_label() {
        let resolved = spec(SAMPLE).resolve(None);
        assert_eq!(resolved.label, None);
        assert_eq!(resolved.epsilon, 1.0e-10);
        assert!(resolved.is_ignored("Version Number"));
        assert!(resolved.is_ignored("Timings for root process"));
        assert!(resolved.is_ignored("Memory Consumption Report"));
        assert!(!resolved.is_ignored("Hostname"));
    }

    #[test]
    fn test_resolve_with_label_merges_block() {
        let resolved = spec(SAMPLE).resolve(Some("Cluster"));
        assert_eq!(resolved.label.as_deref(), Some("Cluster"));
        assert_eq!(resolved.defaults.get("Energies"), Some(&Tree::Leaf(1.0e-5)));
        assert_eq!(resolved.epsilon, 1.0e-9);
        assert!(resolved.is_ignored("Hostname"));
        assert!(resolved.is_ignored("GPU acceleration"));
        assert!(!resolved.defaults.contains_key("Cluster"));
    }

    #[test]
    fn test_unknown_label_keeps_defaults() {
        let base = spec(SAMPLE);
        let resolved = base.resolve(Some("Laptop"));
        assert_eq!(resolved.label, None);
        assert_eq!(resolved, base.resolve(None));
    }

    #[test]
    fn test_empty_label_is_no_label() {
        let base = spec(SAMPLE);
        assert_eq!(base.resolve(Some("")), base.resolve(None));
    }

    #[test]
    fn test_null_specification_is_empty() {
        let resolved = ToleranceSpec::from_document(&Document::null())
            .unwrap()
            .resolve(None);
        assert_eq!(resolved, ResolvedTolerances::exact());
        assert_eq!(resolved.epsilon, 0.0);
    }

    #[test]
    fn test_invalid_tolerance_value() {
        let doc: Document =
            serde_yaml::from_str("Default tolerances:\n  Energies: tight\n").unwrap();
        let err = ToleranceSpec::from_document(&doc).unwrap_err();
        assert_eq!(
            err,
            FldiffError::InvalidToleranceValue {
                key: "Energies".to_string(),
                found: "string".to_string(),
            }
        );
    }

    #[test]
    fn test_invalid_ignore_section() {
        let doc: Document = serde_yaml::from_str("Keys to ignore: {a: 1}\n").unwrap();
        assert!(matches!(
            ToleranceSpec::from_document(&doc),
            Err(FldiffError::InvalidToleranceSection { .. })
        ));
    }

    #[test]
    fn test_ignore_rules_star_keys_become_patterns() {
        let rules = IgnoreRules::new(
            vec!["Timestamp".to_string(), "Wall*clock".to_string()],
            vec!["GPU".to_string()],
        );
        assert_eq!(rules.keys(), ["Timestamp"]);
        assert_eq!(rules.patterns(), ["GPU", "Wall"]);
        assert!(rules.is_ignored("Timestamp"));
        assert!(!rules.is_ignored("Timestamp of run"));
        assert!(rules.is_ignored("Wallclock"));
        assert!(rules.is_ignored("Use GPU"));
    }

    #[test]
    fn test_resolution_order() {
        let tolerances = ResolvedTolerances::exact()
            .with_default("Energy", Tree::Leaf(0.5))
            .with_default("Forces", Tree::Leaf(0.25));

        let explicit: Policy = Tree::Map(
            [("Energy".to_string(), Tree::Leaf(0.1))].into_iter().collect(),
        );
        // explicit entry beats the default table
        assert_eq!(
            tolerances.resolve_child(Some(&explicit), "Energy"),
            Some(&Tree::Leaf(0.1))
        );
        // default table applies at any depth
        assert_eq!(
            tolerances.resolve_child(Some(&explicit), "Forces"),
            Some(&Tree::Leaf(0.25))
        );
        assert_eq!(tolerances.resolve_child(None, "Forces"), Some(&Tree::Leaf(0.25)));

        // broadcast scalar loses against the default table but covers the rest
        let broadcast: Policy = Tree::Leaf(1.0e-3);
        assert_eq!(
            tolerances.resolve_child(Some(&broadcast), "Forces"),
            Some(&Tree::Leaf(0.25))
        );
        assert_eq!(
            tolerances.resolve_child(Some(&broadcast), "Stress"),
            Some(&Tree::Leaf(1.0e-3))
        );

        assert_eq!(tolerances.resolve_child(None, "Stress"), None);
        assert_eq!(tolerances.resolve_child(Some(&explicit), "Stress"), None);
    }

    #[test]
    fn test_element_policy_broadcast() {
        let leaf: Policy = Tree::Leaf(0.1);
        assert_eq!(element_policy(Some(&leaf)), Some(&leaf));
        let seq: Policy = Tree::Seq(vec![Tree::Leaf(0.2), Tree::Leaf(0.3)]);
        assert_eq!(element_policy(Some(&seq)), Some(&Tree::Leaf(0.2)));
        assert_eq!(element_policy(None), None);
    }

    #[test]
    fn test_resolved_serialization_shape() {
        let resolved = spec(SAMPLE).resolve(Some("Cluster"));
        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["Label"], "Cluster");
        assert_eq!(json["Default tolerances"]["Energies"], 1.0e-5);
        assert_eq!(json["Keys to ignore"][0], "Version Number");
        assert_eq!(json["Patterns to ignore"][1], "GPU");
        assert_eq!(json["Patterns to ignore"][2], "Timings");
    }
}
