//! Core types shared across fldiff facilities
//!
//! This crate provides the foundational types used by the comparator, the
//! loader and the logging facility:
//!
//! - **Document model**: `Document`, `Scalar`, `Mapping`, `PathSegment`
//! - **Schema constants**: Canonical field keys and event names

pub mod document;
pub mod schema;

pub use document::{Document, Mapping, PathSegment, Scalar};
