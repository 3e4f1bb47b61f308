//! Rigid alignment between molecules: the transform "mill" that applies a
//! discovered (shift, rotation, permutation, mirror) recipe, and the engine
//! that searches for the recipe minimizing RMSD under per-element
//! correspondence constraints.

mod engine;
mod mill;

pub use engine::{
    AlignOptions, AlignmentError, AlignmentReport, MolsAlign, align_geometries,
};
pub use mill::{AlignmentMill, ScrambleOptions, compute_scramble};
