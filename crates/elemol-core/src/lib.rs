//! # Elemol Core Library
//!
//! Foundational reference data and data-interchange models for computational
//! molecular science: periodic-table lookups, a canonical molecule record
//! with validation and canonicalization, and rigid-body alignment between
//! structures.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a
//! clear separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Compiled-in periodic-table and nuclide
//!   reference data, physical constants, the immutable canonical molecule
//!   record and the [`core::models::Molecule`] entity built on it, pure
//!   geometry/assignment utilities, and deterministic text-dialect writers.
//!
//! - **[`parse`]: The Canonicalizer.** Turns any recognized input shape —
//!   delimited text in several dialects, explicit arrays, a prior schema
//!   document, or a PubChem identifier — into exactly one validated canonical
//!   record, or fails with a typed, field-naming diagnostic. No partial
//!   record ever escapes a failure.
//!
//! - **[`align`]: The Matching Engine.** Finds the rigid rotation,
//!   translation, atom permutation, and optional mirror reflection that best
//!   superimposes one molecule onto another, and applies the discovered
//!   transformation to every per-atom field of the entity, not just the
//!   coordinates.

pub mod align;
pub mod core;
pub mod parse;
