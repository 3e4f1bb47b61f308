//! The canonical molecule record: the single normalized representation all
//! inputs reduce to, and the flat interchange mapping they serialize to.

use super::provenance::Provenance;
use crate::parse::ValidationError;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Schema identifier carried by every record this library emits.
pub const SCHEMA_NAME: &str = "elemol_molecule";
/// Current schema version.
pub const SCHEMA_VERSION: u32 = 2;

fn is_false(v: &bool) -> bool {
    !*v
}

/// Rounds to `decimals` places and flips negative zero, so equal-within-
/// tolerance values serialize identically for hashing and storage.
pub fn float_prep(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// A validated, immutable molecule description.
///
/// Geometry is Cartesian, flat `3N`, always in Bohr, already noise-rounded.
/// Per-atom arrays share one index order; fragments partition `[0, N)` as
/// contiguous, disjoint index groups. Records are built only by the
/// canonicalizer (or deserialized from a prior record and re-validated);
/// "mutation" means canonicalizing a copy with overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MolRecord {
    pub schema_name: String,
    pub schema_version: u32,
    /// Marks a record that has already passed canonicalization, enabling
    /// the trusted fast path on reconstruction.
    #[serde(default, skip_serializing_if = "is_false")]
    pub validated: bool,

    pub symbols: Vec<String>,
    pub geometry: Vec<f64>,
    pub masses: Vec<f64>,
    pub atomic_numbers: Vec<u16>,
    /// Per-atom mass numbers; 0 marks an atom with no isotope specified.
    pub mass_numbers: Vec<u16>,
    /// Per-atom user tags split off the nucleus labels; empty when absent.
    pub atom_labels: Vec<String>,
    pub real: Vec<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    pub molecular_charge: f64,
    pub molecular_multiplicity: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connectivity: Option<Vec<(usize, usize, f64)>>,

    pub fragments: Vec<Vec<usize>>,
    pub fragment_charges: Vec<f64>,
    pub fragment_multiplicities: Vec<u32>,

    pub fix_com: bool,
    pub fix_orientation: bool,

    pub provenance: Provenance,

    /// Opaque pass-through metadata.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extras: Map<String, Value>,
}

impl MolRecord {
    /// Number of atoms.
    pub fn natom(&self) -> usize {
        self.symbols.len()
    }

    /// Geometry rows as points, Bohr.
    pub fn points(&self) -> Vec<Point3<f64>> {
        self.geometry
            .chunks_exact(3)
            .map(|xyz| Point3::new(xyz[0], xyz[1], xyz[2]))
            .collect()
    }

    /// Re-checks every structural invariant of the canonical form.
    ///
    /// The canonicalizer establishes these at construction; this is the
    /// belt-and-braces check applied to records arriving from outside.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let natom = self.natom();

        let per_atom: [(&'static str, usize); 5] = [
            ("geometry", self.geometry.len() / 3),
            ("masses", self.masses.len()),
            ("atomic_numbers", self.atomic_numbers.len()),
            ("mass_numbers", self.mass_numbers.len()),
            ("real", self.real.len()),
        ];
        if !self.geometry.len().is_multiple_of(3) {
            return Err(ValidationError::ShapeMismatch {
                field: "geometry",
                expected: 3 * natom,
                found: self.geometry.len(),
            });
        }
        for (field, found) in per_atom {
            if found != natom {
                return Err(ValidationError::ShapeMismatch {
                    field,
                    expected: natom,
                    found,
                });
            }
        }
        if self.atom_labels.len() != natom {
            return Err(ValidationError::ShapeMismatch {
                field: "atom_labels",
                expected: natom,
                found: self.atom_labels.len(),
            });
        }

        // Fragments partition [0, natom) exactly.
        let mut seen = vec![false; natom];
        for fragment in &self.fragments {
            for &at in fragment {
                if at >= natom || seen[at] {
                    return Err(ValidationError::MalformedFragments(format!(
                        "fragment pattern repeats or exceeds atoms: {:?}",
                        self.fragments
                    )));
                }
                seen[at] = true;
            }
        }
        if seen.iter().any(|&s| !s) {
            return Err(ValidationError::MalformedFragments(format!(
                "fragment pattern skips atoms: {:?}",
                self.fragments
            )));
        }

        let nfr = self.fragments.len();
        if self.fragment_charges.len() != nfr {
            return Err(ValidationError::ShapeMismatch {
                field: "fragment_charges",
                expected: nfr,
                found: self.fragment_charges.len(),
            });
        }
        if self.fragment_multiplicities.len() != nfr {
            return Err(ValidationError::ShapeMismatch {
                field: "fragment_multiplicities",
                expected: nfr,
                found: self.fragment_multiplicities.len(),
            });
        }

        let frag_sum: f64 = self.fragment_charges.iter().sum();
        if (frag_sum - self.molecular_charge).abs() > 1.0e-6 {
            return Err(ValidationError::ChargeMultiplicity {
                quantity: "molecular charge",
                message: format!(
                    "molecular charge {} differs from fragment sum {frag_sum}",
                    self.molecular_charge
                ),
            });
        }

        if let Some(connectivity) = &self.connectivity {
            for &(at1, at2, order) in connectivity {
                if at1 == at2 {
                    return Err(ValidationError::BadConnectivity(format!(
                        "self-bond on atom {at1}"
                    )));
                }
                if at1 >= natom || at2 >= natom {
                    return Err(ValidationError::BadConnectivity(format!(
                        "bond ({at1}, {at2}) exceeds {natom} atoms"
                    )));
                }
                if !(0.0..=5.0).contains(&order) {
                    return Err(ValidationError::BadConnectivity(format!(
                        "bond order {order} outside [0, 5]"
                    )));
                }
            }
        }

        Ok(())
    }
}
