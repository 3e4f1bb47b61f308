//! The molecule canonicalizer.
//!
//! Every input shape — delimited text, explicit arrays, a schema document,
//! or a PubChem identifier — funnels through [`from_input`] into one
//! validated canonical record. Failures are typed and name the offending
//! field and value; no partial record is ever returned.

mod arrays;
mod chgmult;
pub mod nucleus;
pub mod pubchem;
mod schema;
mod text;

pub use arrays::from_input;
pub use chgmult::{ChargeMultiplicity, reconcile_charge_multiplicity};
pub use schema::from_schema;
pub use text::{TextDialect, filter_comments, from_string};

use crate::core::constants::LengthUnit;
use crate::core::element::NotAnElementError;
use crate::core::models::provenance::Provenance;
use pubchem::PubChemError;
use thiserror::Error;

/// Processing knobs threaded explicitly through canonicalization.
///
/// There is deliberately no process-wide default state; a caller wanting a
/// different geometry precision passes it per call.
#[derive(Debug, Clone)]
pub struct CanonicalizeOptions {
    /// Decimal places geometry is rounded to after orientation, directly
    /// controlling hash stability.
    pub geometry_noise: u32,
    /// Interatom distance (native input units) nearer than which atoms are
    /// rejected.
    pub tooclose: f64,
    /// How different an explicit mass may be from a known nuclide mass and
    /// still merit that mass-number assignment.
    pub mass_tol: f64,
    /// Turns off the sanity checks that prevent periodic-table violations
    /// (e.g. light uranium).
    pub nonphysical: bool,
    /// Force all-ghost fragments to charge 0, multiplicity 1, overriding
    /// explicit values.
    pub zero_ghost_fragments: bool,
}

impl Default for CanonicalizeOptions {
    fn default() -> Self {
        Self {
            geometry_noise: 8,
            tooclose: 0.1,
            mass_tol: 1.0e-3,
            nonphysical: false,
            zero_ghost_fragments: false,
        }
    }
}

/// Unvalidated array-form input to the canonicalizer.
///
/// Per-atom arrays may be omitted wholesale; `mass` and `mass_numbers`
/// additionally admit per-atom holes. Atom count is fixed by `geometry`
/// (flat, length 3N, in `units`).
#[derive(Debug, Clone, Default)]
pub struct MoleculeInput {
    pub geometry: Vec<f64>,
    pub symbols: Option<Vec<String>>,
    pub atomic_numbers: Option<Vec<u16>>,
    /// Per-atom mass-number claims: `Some(0)` asserts "no isotope
    /// specified", `None` leaves it to be inferred.
    pub mass_numbers: Option<Vec<Option<u16>>>,
    pub masses: Option<Vec<Option<f64>>>,
    pub real: Option<Vec<bool>>,
    pub labels: Option<Vec<String>>,
    /// Whether `labels` carry full nucleus specs (ghosting, isotope, mass,
    /// user tag) or only bare user tags.
    pub speclabel: bool,
    pub name: Option<String>,
    pub comment: Option<String>,
    pub units: LengthUnit,
    /// Override for the unit conversion factor into Bohr; must stay within
    /// 5% of the physical value.
    pub input_units_to_au: Option<f64>,
    pub fix_com: Option<bool>,
    pub fix_orientation: Option<bool>,
    pub fragment_separators: Option<Vec<usize>>,
    pub fragment_charges: Option<Vec<Option<f64>>>,
    pub fragment_multiplicities: Option<Vec<Option<u32>>>,
    pub molecular_charge: Option<f64>,
    pub molecular_multiplicity: Option<u32>,
    pub connectivity: Option<Vec<(usize, usize, f64)>>,
    pub provenance: Option<Provenance>,
    pub extras: Option<serde_json::Map<String, serde_json::Value>>,
}

/// A structural invariant was violated; raised before any record is built.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("invalid molecule geometry units: {0}")]
    BadUnits(String),

    #[error("no big perturbations to physical constants: {given} !~= {physical}")]
    BadUnitFactor { given: f64, physical: f64 },

    #[error("dimension mismatch for '{field}': expected {expected}, found {found}")]
    ShapeMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("atoms {i} and {j} are too close: {dist}")]
    TooClose { i: usize, j: usize, dist: f64 },

    #[error("malformed fragments: {0}")]
    MalformedFragments(String),

    #[error("charge/multiplicity mismatch for {quantity}: {message}")]
    ChargeMultiplicity {
        quantity: &'static str,
        message: String,
    },

    #[error("bad connectivity entry: {0}")]
    BadConnectivity(String),

    #[error("bad provenance entry: {0}")]
    BadProvenance(String),

    #[error("inconsistent or unspecified {feature}: {context}")]
    Nucleus {
        feature: &'static str,
        context: String,
    },

    #[error("nucleus label is not parseable: {0}")]
    BadNucleusLabel(String),

    #[error("schema not recognized: {0}")]
    BadSchema(String),

    #[error(transparent)]
    NotAnElement(#[from] NotAnElementError),
}

/// Text could not be tokenized under a dialect; carries the remnant.
#[derive(Debug, Error, PartialEq)]
#[error("unprocessable molecule remnants under {dialect}:\n{remnant}")]
pub struct MoleculeFormatError {
    pub dialect: String,
    pub remnant: String,
}

/// Any failure on the canonicalization path.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Format(#[from] MoleculeFormatError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotAnElement(#[from] NotAnElementError),

    /// Kept distinct so offline callers can catch exactly the network
    /// pathway.
    #[error(transparent)]
    PubChem(#[from] PubChemError),
}
