//! Comparison output types.
//!
//! Tolerance policies and diagnostics share one recursive shape, [`Tree`].
//! A policy holds the allowed deviation at each position, a diagnostic holds
//! what was actually observed where the comparison failed.

use fldiff_core_types::Document;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// Recursive mapping / sequence / leaf tree mirroring a document's shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Tree<L> {
    Leaf(L),
    Map(IndexMap<String, Tree<L>>),
    Seq(Vec<Tree<L>>),
}

impl<L> Tree<L> {
    pub fn as_leaf(&self) -> Option<&L> {
        match self {
            Tree::Leaf(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Tree<L>>> {
        match self {
            Tree::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Child of a map node by key.
    pub fn get(&self, key: &str) -> Option<&Tree<L>> {
        self.as_map().and_then(|m| m.get(key))
    }
}

/// What was observed at a failing position.
#[derive(Debug, Clone, PartialEq)]
pub enum Discrepancy {
    /// Absolute numeric difference that exceeded the tolerance
    Difference(f64),
    /// Sequence lengths differ
    NotSameLength,
    /// The data value cannot be compared with the reference value
    NotSameKind,
    /// A textual reference did not match; holds the data value
    Mismatch(Document),
    /// Value under a missing key, failed without being evaluated
    Forced,
}

impl Discrepancy {
    pub const NOT_SAME_LENGTH: &'static str = "NOT SAME LENGTH";
    pub const NOT_SAME_KIND: &'static str = "NOT SAME KIND";

    pub fn difference(&self) -> Option<f64> {
        match self {
            Discrepancy::Difference(d) => Some(*d),
            _ => None,
        }
    }

    /// Whether `self` should replace `recorded` when both land in one slot.
    ///
    /// Larger differences win over smaller ones; sentinels and mismatched
    /// values win over plain differences, and the newer of two sentinels wins.
    fn outranks(&self, recorded: &Discrepancy) -> bool {
        match (self.difference(), recorded.difference()) {
            (Some(new), Some(old)) => new > old || new.is_nan(),
            (None, _) => true,
            (Some(_), None) => false,
        }
    }
}

impl Serialize for Discrepancy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Discrepancy::Difference(d) => serializer.serialize_f64(*d),
            Discrepancy::NotSameLength => serializer.serialize_str(Self::NOT_SAME_LENGTH),
            Discrepancy::NotSameKind => serializer.serialize_str(Self::NOT_SAME_KIND),
            Discrepancy::Mismatch(value) => value.serialize(serializer),
            Discrepancy::Forced => serializer.serialize_unit(),
        }
    }
}

/// Observed discrepancies, shaped like the tolerance policy.
pub type Diagnostic = Tree<Discrepancy>;

impl Tree<Discrepancy> {
    /// Fold another failure into this slot.
    ///
    /// Maps merge key by key, a sequence replaces the slot wholesale, and
    /// leaves keep the larger discrepancy.
    pub fn absorb(&mut self, other: Diagnostic) {
        match (&mut *self, other) {
            (Tree::Map(mine), Tree::Map(theirs)) => {
                for (key, value) in theirs {
                    match mine.get_mut(&key) {
                        Some(existing) => existing.absorb(value),
                        None => {
                            mine.insert(key, value);
                        }
                    }
                }
            }
            (Tree::Leaf(mine), Tree::Leaf(theirs)) => {
                if theirs.outranks(mine) {
                    *mine = theirs;
                }
            }
            (slot, other) => *slot = other,
        }
    }

    /// Number of failing leaves in this diagnostic.
    pub fn leaf_count(&self) -> usize {
        match self {
            Tree::Leaf(_) => 1,
            Tree::Map(m) => m.values().map(Tree::leaf_count).sum(),
            Tree::Seq(s) => s.iter().map(Tree::leaf_count).sum(),
        }
    }
}

/// Running statistics gathered during one comparison.
///
/// Every recursive step returns its own tally and the parent folds it in, so
/// no state is shared between calls.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tally {
    /// Number of failed leaf checks (scalars, length and kind mismatches)
    pub failed_checks: usize,
    /// Largest numeric difference seen on any evaluated scalar
    pub max_discrepancy: f64,
    /// Largest tolerance that was applied to an evaluated scalar
    pub max_tolerance: f64,
    /// Reference keys absent from the data, in traversal order
    pub missing_items: Vec<String>,
}

impl Tally {
    pub fn absorb(&mut self, other: Tally) {
        self.failed_checks += other.failed_checks;
        self.max_discrepancy = self.max_discrepancy.max(other.max_discrepancy);
        self.max_tolerance = self.max_tolerance.max(other.max_tolerance);
        self.missing_items.extend(other.missing_items);
    }

    pub(crate) fn observe_discrepancy(&mut self, difference: f64) {
        self.max_discrepancy = self.max_discrepancy.max(difference);
    }

    pub(crate) fn observe_tolerance(&mut self, tolerance: f64) {
        self.max_tolerance = self.max_tolerance.max(tolerance.abs());
    }
}
