//! Recursive tolerance-aware comparison.
//!
//! The entry points are [`compare`] for one document pair and
//! [`Comparator::compare`] for a subtree with an explicit ambient policy.
//! Dispatch is driven by the reference's shape; the data side is inspected
//! only to classify mismatches.

use crate::diff::model::{Diagnostic, Discrepancy, Tally, Tree};
use crate::policy::{element_policy, Policy, ResolvedTolerances};
use fldiff_core_types::{Document, Mapping, Scalar};
use indexmap::IndexMap;
use std::fmt;

/// Switches that alter comparison semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompareOptions {
    /// Let failing sequence elements loosen the tolerance used for the
    /// following elements of the same sequence.
    ///
    /// Off by default: every element is compared against the same broadcast
    /// policy. Turn on to reproduce reports generated by the historical tool.
    pub ratchet_sequences: bool,
}

/// Result of comparing one subtree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Comparison {
    pub failed: bool,
    /// Observed discrepancies; `None` when nothing failed
    pub diagnostic: Option<Diagnostic>,
    pub tally: Tally,
}

impl Comparison {
    fn pass(tally: Tally) -> Self {
        Self {
            failed: false,
            diagnostic: None,
            tally,
        }
    }

    /// One failed check with the given observation.
    fn check_failed(discrepancy: Discrepancy, mut tally: Tally) -> Self {
        tally.failed_checks += 1;
        Self {
            failed: true,
            diagnostic: Some(Tree::Leaf(discrepancy)),
            tally,
        }
    }

    pub fn passed(&self) -> bool {
        !self.failed
    }
}

/// Position inside the reference, for log messages.
#[derive(Clone, Copy)]
enum Trail<'p> {
    Root,
    Key(&'p Trail<'p>, &'p str),
    Index(&'p Trail<'p>, usize),
}

impl fmt::Display for Trail<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trail::Root => f.write_str("/"),
            Trail::Key(Trail::Root, key) => write!(f, "/{}", key),
            Trail::Key(parent, key) => write!(f, "{}/{}", parent, key),
            Trail::Index(Trail::Root, index) => write!(f, "/[{}]", index),
            Trail::Index(parent, index) => write!(f, "{}/[{}]", parent, index),
        }
    }
}

/// Compare one data document against its reference.
///
/// Shorthand for [`Comparator::compare_documents`] with default options.
pub fn compare(data: &Document, reference: &Document, tolerances: &ResolvedTolerances) -> Comparison {
    Comparator::new(tolerances, CompareOptions::default()).compare_documents(data, reference)
}

/// Comparison context shared by every pair of a batch.
#[derive(Debug, Clone, Copy)]
pub struct Comparator<'t> {
    tolerances: &'t ResolvedTolerances,
    options: CompareOptions,
}

impl<'t> Comparator<'t> {
    pub fn new(tolerances: &'t ResolvedTolerances, options: CompareOptions) -> Self {
        Self {
            tolerances,
            options,
        }
    }

    /// Compare a whole document with no ambient policy.
    pub fn compare_documents(&self, data: &Document, reference: &Document) -> Comparison {
        self.compare(data, reference, None, false)
    }

    /// Compare a subtree.
    ///
    /// `tolerance` is the policy that reached this position; `forced_fail`
    /// marks subtrees under a key missing from the data, which fail whatever
    /// their values.
    pub fn compare(
        &self,
        data: &Document,
        reference: &Document,
        tolerance: Option<&Policy>,
        forced_fail: bool,
    ) -> Comparison {
        self.compare_at(data, reference, tolerance, forced_fail, &Trail::Root)
    }

    fn compare_at(
        &self,
        data: &Document,
        reference: &Document,
        tolerance: Option<&Policy>,
        forced_fail: bool,
        trail: &Trail<'_>,
    ) -> Comparison {
        match reference {
            Document::Mapping(entries) => {
                self.compare_mapping(data, entries, tolerance, forced_fail, trail)
            }
            Document::Sequence(items) => {
                self.compare_sequence(data, items, tolerance, forced_fail, trail)
            }
            Document::Scalar(scalar) => {
                self.compare_scalar(data, scalar, tolerance, forced_fail, trail)
            }
        }
    }

    fn compare_mapping(
        &self,
        data: &Document,
        reference: &Mapping,
        tolerance: Option<&Policy>,
        forced_fail: bool,
        trail: &Trail<'_>,
    ) -> Comparison {
        let Some(data_entries) = data.as_mapping() else {
            tracing::debug!(path = %trail, found = data.kind_name(), "expected a mapping");
            return Comparison::check_failed(Discrepancy::NotSameKind, Tally::default());
        };

        let mut tally = Tally::default();
        let mut failures: IndexMap<String, Diagnostic> = IndexMap::new();

        for (key, ref_value) in reference {
            if self.tolerances.is_ignored(key) {
                continue;
            }
            let child_trail = Trail::Key(trail, key);
            let child_tolerance = self.tolerances.resolve_child(tolerance, key);

            let (value, child_forced, missing) = match data_entries.get(key) {
                Some(value) => (value, forced_fail, false),
                None => {
                    tracing::warn!(path = %child_trail, key = key.as_str(), "reference item not found in data");
                    tally.missing_items.push(key.clone());
                    (ref_value, true, true)
                }
            };

            let child = self.compare_at(value, ref_value, child_tolerance, child_forced, &child_trail);
            tally.absorb(child.tally);

            let observed = match (child.failed, child.diagnostic) {
                (true, Some(diagnostic)) => Some(diagnostic),
                // an empty container under a missing key still has to show up
                _ if missing => Some(Tree::Leaf(Discrepancy::Forced)),
                _ => None,
            };
            if let Some(observed) = observed {
                match failures.get_mut(key) {
                    Some(slot) => slot.absorb(observed),
                    None => {
                        failures.insert(key.clone(), observed);
                    }
                }
            }
        }

        if failures.is_empty() {
            Comparison::pass(tally)
        } else {
            Comparison {
                failed: true,
                diagnostic: Some(Tree::Map(failures)),
                tally,
            }
        }
    }

    fn compare_sequence(
        &self,
        data: &Document,
        reference: &[Document],
        tolerance: Option<&Policy>,
        forced_fail: bool,
        trail: &Trail<'_>,
    ) -> Comparison {
        let Some(items) = data.as_sequence() else {
            tracing::debug!(path = %trail, found = data.kind_name(), "expected a sequence");
            return Comparison::check_failed(Discrepancy::NotSameKind, Tally::default());
        };
        if items.len() != reference.len() {
            tracing::debug!(
                path = %trail,
                reference_len = reference.len(),
                data_len = items.len(),
                "sequence lengths differ"
            );
            return Comparison::check_failed(Discrepancy::NotSameLength, Tally::default());
        }

        let broadcast = element_policy(tolerance);
        let mut ratchet: Option<Policy> = broadcast.cloned();
        let mut tally = Tally::default();
        let mut worst: Option<Diagnostic> = None;

        for (index, (item, ref_item)) in items.iter().zip(reference).enumerate() {
            let element_tolerance = if self.options.ratchet_sequences {
                ratchet.as_ref()
            } else {
                broadcast
            };
            let child = self.compare_at(
                item,
                ref_item,
                element_tolerance,
                forced_fail,
                &Trail::Index(trail, index),
            );
            tally.absorb(child.tally);

            if let (true, Some(diagnostic)) = (child.failed, child.diagnostic) {
                if self.options.ratchet_sequences {
                    ratchet = loosen(ratchet, &diagnostic);
                }
                match worst.as_mut() {
                    Some(slot) => slot.absorb(diagnostic),
                    None => worst = Some(diagnostic),
                }
            }
        }

        match worst {
            Some(diagnostic) => Comparison {
                failed: true,
                diagnostic: Some(Tree::Seq(vec![diagnostic])),
                tally,
            },
            None => Comparison::pass(tally),
        }
    }

    fn compare_scalar(
        &self,
        data: &Document,
        reference: &Scalar,
        tolerance: Option<&Policy>,
        forced_fail: bool,
        trail: &Trail<'_>,
    ) -> Comparison {
        let tally = Tally::default();

        if forced_fail {
            return Comparison::check_failed(Discrepancy::Forced, tally);
        }

        if reference.is_textual() {
            return if data.as_scalar() == Some(reference) {
                Comparison::pass(tally)
            } else {
                tracing::debug!(path = %trail, expected = %reference, "text differs");
                Comparison::check_failed(Discrepancy::Mismatch(data.clone()), tally)
            };
        }

        let limit = match tolerance {
            Some(Tree::Leaf(t)) => Some(*t),
            _ => None,
        };
        self.compare_number(data, reference, limit, trail, tally)
    }

    fn compare_number(
        &self,
        data: &Document,
        reference: &Scalar,
        tolerance: Option<f64>,
        trail: &Trail<'_>,
        mut tally: Tally,
    ) -> Comparison {
        if let Some(t) = tolerance {
            tally.observe_tolerance(t);
        }

        let observed = data.as_scalar();
        if observed.map_or(false, |s| scalars_equal(s, reference)) {
            return Comparison::pass(tally);
        }

        let (Some(value), Some(expected)) = (observed.and_then(Scalar::as_f64), reference.as_f64()) else {
            tracing::debug!(
                path = %trail,
                expected = reference.kind_name(),
                found = data.kind_name(),
                "values are not comparable"
            );
            return Comparison::check_failed(Discrepancy::NotSameKind, tally);
        };

        let difference = (value - expected).abs();
        tally.observe_discrepancy(difference);

        let limit = tolerance.unwrap_or(self.tolerances.epsilon);
        if difference <= limit {
            Comparison::pass(tally)
        } else {
            tracing::debug!(path = %trail, difference, limit, "difference exceeds tolerance");
            Comparison::check_failed(Discrepancy::Difference(difference), tally)
        }
    }
}

/// Exact equality of two non-textual scalars.
///
/// Numbers compare by value across integer/float/boolean, so `1 == 1.0`;
/// two NaNs are equal so that every document matches itself.
fn scalars_equal(data: &Scalar, reference: &Scalar) -> bool {
    match (data, reference) {
        (Scalar::Null, Scalar::Null) => true,
        (Scalar::String(_), _) | (_, Scalar::String(_)) => false,
        _ => match (data.as_f64(), reference.as_f64()) {
            (Some(a), Some(b)) => a == b || (a.is_nan() && b.is_nan()),
            _ => false,
        },
    }
}

/// Fold a failing element's observation into the shared sequence policy.
///
/// Observed differences become tolerances; sentinels carry no tolerance and
/// leave the policy as it was.
fn loosen(policy: Option<Policy>, diagnostic: &Diagnostic) -> Option<Policy> {
    let Some(update) = observed_tolerance(diagnostic) else {
        return policy;
    };
    match (policy, update) {
        (Some(Tree::Map(mut table)), Tree::Map(entries)) => {
            table.extend(entries);
            Some(Tree::Map(table))
        }
        (Some(Tree::Leaf(current)), Tree::Leaf(observed)) => Some(Tree::Leaf(current.max(observed))),
        // a broadcast leaf still covers the keys that passed
        (Some(Tree::Leaf(current)), Tree::Map(_)) => Some(Tree::Leaf(current)),
        (_, update) => Some(update),
    }
}

fn observed_tolerance(diagnostic: &Diagnostic) -> Option<Policy> {
    match diagnostic {
        Tree::Leaf(discrepancy) => discrepancy.difference().map(Tree::Leaf),
        Tree::Map(entries) => {
            let table: IndexMap<String, Policy> = entries
                .iter()
                .filter_map(|(k, v)| observed_tolerance(v).map(|p| (k.clone(), p)))
                .collect();
            (!table.is_empty()).then_some(Tree::Map(table))
        }
        Tree::Seq(items) => {
            let items: Vec<Policy> = items.iter().filter_map(observed_tolerance).collect();
            (!items.is_empty()).then_some(Tree::Seq(items))
        }
    }
}
