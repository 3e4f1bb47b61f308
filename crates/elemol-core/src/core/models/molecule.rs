//! The molecule entity: an immutable, validated wrapper around one
//! canonical record, exposing hashing, derived quantities, fragment
//! extraction, serialization, and alignment.

use super::record::{MolRecord, float_prep};
use crate::align::{
    AlignOptions, AlignmentError, AlignmentMill, AlignmentReport, ScrambleOptions,
    align_geometries, compute_scramble,
};
use crate::core::constants::BOHR_TO_ANGSTROM;
use crate::core::io::{WriteDialect, WriteError, WriteOptions, to_string_fmt};
use crate::core::utils::geometry::{MeasureError, measure_coordinates};
use crate::parse::{
    CanonicalizeOptions, MoleculeInput, ParseError, TextDialect, ValidationError, from_input,
    from_schema, from_string,
};
use nalgebra::Point3;
use rand::Rng;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

// Rounding quantities for hashing and comparison.
const GEOMETRY_NOISE: u32 = 8;
const MASS_NOISE: u32 = 6;
const CHARGE_NOISE: u32 = 4;

/// Any failure raised by molecule construction or its derived operations.
#[derive(Debug, Error)]
pub enum MoleculeError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Measure(#[from] MeasureError),

    #[error(transparent)]
    Alignment(#[from] AlignmentError),

    #[error("bad fragment selection: {0}")]
    Fragment(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("cannot infer molecule format from filename: {0}")]
    UnknownExtension(String),
}

impl From<ValidationError> for MoleculeError {
    fn from(err: ValidationError) -> Self {
        MoleculeError::Parse(err.into())
    }
}

/// An immutable molecule built atop a canonical record.
///
/// The entity owns its record exclusively; every derived entity (from
/// alignment, fragment extraction, scrambling, or copy-with-overrides) is a
/// new entity with freshly computed provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    record: MolRecord,
}

impl Molecule {
    // <<< constructors

    /// Builds from molecule text, detecting the dialect.
    pub fn from_string(text: &str) -> Result<Self, MoleculeError> {
        Self::from_string_with(text, None, &CanonicalizeOptions::default())
    }

    /// Builds from molecule text under an explicit dialect and options.
    pub fn from_string_with(
        text: &str,
        dialect: Option<TextDialect>,
        options: &CanonicalizeOptions,
    ) -> Result<Self, MoleculeError> {
        let (input, _) = from_string(text, dialect)?;
        Self::from_input(&input, options)
    }

    /// Builds from explicit arrays.
    pub fn from_input(
        input: &MoleculeInput,
        options: &CanonicalizeOptions,
    ) -> Result<Self, MoleculeError> {
        let record = from_input(input, options)?;
        Ok(Self { record })
    }

    /// Builds from a schema document (any supported version).
    pub fn from_schema(
        document: &Value,
        options: &CanonicalizeOptions,
    ) -> Result<Self, MoleculeError> {
        let input = from_schema(document)?;
        Self::from_input(&input, options)
    }

    /// Wraps an existing canonical record.
    ///
    /// With `trusted` set and the record marked `validated`, the record is
    /// adopted as-is — the fast path for records known to have passed
    /// canonicalization already. Otherwise the record is re-canonicalized
    /// from scratch.
    pub fn from_record(record: MolRecord, trusted: bool) -> Result<Self, MoleculeError> {
        if trusted && record.validated {
            return Ok(Self { record });
        }
        let input = record_to_input(&record);
        Self::from_input(&input, &CanonicalizeOptions::default())
    }

    /// Reads a molecule from a file, dispatching on the extension
    /// (`.xyz`, `.qcin`, `.json`; anything else is sniffed as text).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MoleculeError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        match extension(path) {
            Some("json") => {
                let document: Value = serde_json::from_str(&contents)?;
                Self::from_schema(&document, &CanonicalizeOptions::default())
            }
            Some("xyz") => Self::from_string_with(
                &contents,
                Some(TextDialect::Xyz),
                &CanonicalizeOptions::default(),
            )
            .or_else(|_| {
                Self::from_string_with(
                    &contents,
                    Some(TextDialect::XyzPlus),
                    &CanonicalizeOptions::default(),
                )
            }),
            Some("qcin") | Some("psi4") => Self::from_string_with(
                &contents,
                Some(TextDialect::Qcin),
                &CanonicalizeOptions::default(),
            ),
            _ => Self::from_string(&contents),
        }
    }

    /// Writes the molecule to a file, dispatching on the extension.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), MoleculeError> {
        let path = path.as_ref();
        let rendered = match extension(path) {
            Some("json") => serde_json::to_string_pretty(&self.record)?,
            Some("xyz") => self.to_string_fmt(WriteDialect::Xyz, &WriteOptions::default())?,
            Some("qcin") | Some("psi4") => {
                self.to_string_fmt(WriteDialect::Qcin, &WriteOptions::default())?
            }
            _ => {
                return Err(MoleculeError::UnknownExtension(
                    path.display().to_string(),
                ));
            }
        };
        std::fs::write(path, rendered)?;
        Ok(())
    }

    // <<< record access

    /// The canonical record this entity wraps.
    pub fn record(&self) -> &MolRecord {
        &self.record
    }

    /// Consumes the entity, yielding its record.
    pub fn into_record(self) -> MolRecord {
        self.record
    }

    /// The record as a flat schema document.
    pub fn to_schema(&self) -> Result<Value, MoleculeError> {
        Ok(serde_json::to_value(&self.record)?)
    }

    pub fn natom(&self) -> usize {
        self.record.natom()
    }

    /// Geometry rows, Bohr.
    pub fn points(&self) -> Vec<Point3<f64>> {
        self.record.points()
    }

    // <<< derived quantities

    /// Deterministic content hash over the identity-bearing fields, stable
    /// across processes.
    ///
    /// Geometry, masses, and charges enter at fixed tolerances (1e-8,
    /// 1e-6, 1e-4), so equal chemistry up to those tolerances — and up to
    /// rigid-body placement, since orientation is canonicalized — hashes
    /// identically.
    pub fn get_hash(&self) -> String {
        let record = &self.record;
        let hashed: [(&str, Value); 10] = [
            ("symbols", serde_json::json!(record.symbols)),
            (
                "masses",
                Value::from(
                    record
                        .masses
                        .iter()
                        .map(|&m| float_prep(m, MASS_NOISE))
                        .collect::<Vec<_>>(),
                ),
            ),
            (
                "molecular_charge",
                Value::from(float_prep(record.molecular_charge, CHARGE_NOISE)),
            ),
            (
                "molecular_multiplicity",
                Value::from(record.molecular_multiplicity),
            ),
            ("real", serde_json::json!(record.real)),
            (
                "geometry",
                Value::from(
                    record
                        .geometry
                        .iter()
                        .map(|&g| float_prep(g, GEOMETRY_NOISE))
                        .collect::<Vec<_>>(),
                ),
            ),
            ("fragments", serde_json::json!(record.fragments)),
            (
                "fragment_charges",
                Value::from(
                    record
                        .fragment_charges
                        .iter()
                        .map(|&c| float_prep(c, CHARGE_NOISE))
                        .collect::<Vec<_>>(),
                ),
            ),
            (
                "fragment_multiplicities",
                serde_json::json!(record.fragment_multiplicities),
            ),
            ("connectivity", serde_json::json!(record.connectivity)),
        ];

        let mut hasher = Sha256::new();
        for (_, value) in &hashed {
            hasher.update(value.to_string().as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    /// Element counts, alphabetically sorted, count suppressed at 1:
    /// carbon dioxide is `"CO2"`.
    pub fn get_molecular_formula(&self) -> String {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for symbol in &self.record.symbols {
            *counts.entry(symbol.as_str()).or_default() += 1;
        }
        let mut formula = String::new();
        for (symbol, count) in counts {
            formula.push_str(symbol);
            if count > 1 {
                formula.push_str(&count.to_string());
            }
        }
        formula
    }

    /// Effective per-atom nuclear charges; ghosts contribute zero.
    fn zeff(&self) -> Vec<f64> {
        self.record
            .atomic_numbers
            .iter()
            .zip(&self.record.real)
            .map(|(&z, &real)| if real { z as f64 } else { 0.0 })
            .collect()
    }

    fn fragment_atoms(&self, ifr: Option<usize>) -> Result<Vec<usize>, MoleculeError> {
        match ifr {
            None => Ok((0..self.natom()).collect()),
            Some(ifr) => self
                .record
                .fragments
                .get(ifr)
                .cloned()
                .ok_or_else(|| {
                    MoleculeError::Fragment(format!(
                        "fragment {ifr} out of range for {} fragments",
                        self.record.fragments.len()
                    ))
                }),
        }
    }

    /// Nuclear repulsion energy [Eh] of the molecule, or of one fragment.
    /// Ghost atoms are excluded.
    pub fn nuclear_repulsion_energy(&self, ifr: Option<usize>) -> Result<f64, MoleculeError> {
        let zeff = self.zeff();
        let points = self.points();
        let atoms = self.fragment_atoms(ifr)?;

        let mut nre = 0.0;
        for (slot, &at1) in atoms.iter().enumerate() {
            for &at2 in &atoms[..slot] {
                let dist = (points[at1] - points[at2]).norm();
                nre += zeff[at1] * zeff[at2] / dist;
            }
        }
        Ok(nre)
    }

    /// Electron count of the molecule, or of one fragment. Ghost atoms are
    /// excluded.
    pub fn nelectrons(&self, ifr: Option<usize>) -> Result<i64, MoleculeError> {
        let zeff = self.zeff();
        let atoms = self.fragment_atoms(ifr)?;
        let z_total: f64 = atoms.iter().map(|&at| zeff[at]).sum();
        let charge = match ifr {
            None => self.record.molecular_charge,
            Some(ifr) => self.record.fragment_charges[ifr],
        };
        Ok((z_total - charge).round() as i64)
    }

    /// Distance (2 indices, Bohr), angle (3), or dihedral (4, signed) over
    /// atom indices; angles in degrees when `degrees`.
    pub fn measure(&self, indices: &[usize], degrees: bool) -> Result<f64, MoleculeError> {
        Ok(measure_coordinates(&self.points(), indices, degrees)?)
    }

    // <<< rendering

    /// Renders into a program dialect.
    pub fn to_string_fmt(
        &self,
        dialect: WriteDialect,
        options: &WriteOptions,
    ) -> Result<String, MoleculeError> {
        Ok(to_string_fmt(&self.record, dialect, options)?)
    }

    /// Geometry listing in Angstrom for human eyes.
    pub fn pretty_print(&self) -> String {
        let mut text = format!(
            "    Geometry (in Angstrom), charge = {:.1}, multiplicity = {}:\n\n",
            self.record.molecular_charge, self.record.molecular_multiplicity
        );
        text.push_str(
            "       Center              X                  Y                   Z       \n",
        );
        text.push_str(
            "    ------------   -----------------  -----------------  -----------------\n",
        );
        for (at, point) in self.points().iter().enumerate() {
            let ghost = if self.record.real[at] { "" } else { "(Gh)" };
            text.push_str(&format!(
                "    {:<8}{:<4} ",
                self.record.symbols[at], ghost
            ));
            for axis in 0..3 {
                text.push_str(&format!("  {:17.12}", point.coords[axis] * BOHR_TO_ANGSTROM));
            }
            text.push('\n');
        }
        text
    }

    // <<< derivation

    /// New entity keeping `real_frs` fragments as real atoms and
    /// `ghost_frs` fragments as ghosts, dropping the rest. Real blocks come
    /// first, ghosts after; atom order within each retained fragment is
    /// preserved. Totals are recomputed from the retained real fragments.
    pub fn get_fragment(
        &self,
        real_frs: &[usize],
        ghost_frs: &[usize],
    ) -> Result<Self, MoleculeError> {
        let nfr = self.record.fragments.len();
        for &ifr in real_frs.iter().chain(ghost_frs) {
            if ifr >= nfr {
                return Err(MoleculeError::Fragment(format!(
                    "fragment {ifr} out of range for {nfr} fragments"
                )));
            }
        }
        if real_frs.iter().any(|ifr| ghost_frs.contains(ifr)) {
            return Err(MoleculeError::Fragment(format!(
                "real and ghost sets overlap: {real_frs:?}, {ghost_frs:?}"
            )));
        }

        let record = &self.record;
        let mut geometry = Vec::new();
        let mut labels = Vec::new();
        let mut masses = Vec::new();
        let mut mass_numbers = Vec::new();
        let mut symbols = Vec::new();
        let mut real = Vec::new();
        let mut separators = Vec::new();
        let mut charges = Vec::new();
        let mut multiplicities = Vec::new();

        let mut push_block = |ifr: usize, as_real: bool| {
            if !symbols.is_empty() {
                separators.push(symbols.len());
            }
            for &at in &record.fragments[ifr] {
                geometry.extend_from_slice(&record.geometry[3 * at..3 * at + 3]);
                symbols.push(record.symbols[at].clone());
                labels.push(record.atom_labels[at].clone());
                masses.push(Some(record.masses[at]));
                mass_numbers.push(Some(record.mass_numbers[at]));
                real.push(as_real);
            }
            if as_real {
                charges.push(Some(record.fragment_charges[ifr]));
                multiplicities.push(Some(record.fragment_multiplicities[ifr]));
            } else {
                charges.push(Some(0.0));
                multiplicities.push(Some(1));
            }
        };

        for &ifr in real_frs {
            push_block(ifr, true);
        }
        for &ifr in ghost_frs {
            push_block(ifr, false);
        }

        let molecular_charge: f64 = real_frs
            .iter()
            .map(|&ifr| record.fragment_charges[ifr])
            .sum();
        let molecular_multiplicity: u32 = real_frs
            .iter()
            .map(|&ifr| record.fragment_multiplicities[ifr] - 1)
            .sum::<u32>()
            + 1;

        let name = format!(
            "{} ({real_frs:?},{ghost_frs:?})",
            record.name.as_deref().unwrap_or_default()
        );

        let input = MoleculeInput {
            geometry,
            symbols: Some(symbols),
            masses: Some(masses),
            mass_numbers: Some(mass_numbers),
            real: Some(real),
            labels: Some(labels),
            speclabel: false,
            name: Some(name),
            units: crate::core::constants::LengthUnit::Bohr,
            // Subsets keep the parent frame.
            fix_com: Some(true),
            fix_orientation: Some(true),
            fragment_separators: Some(separators),
            fragment_charges: Some(charges),
            fragment_multiplicities: Some(multiplicities),
            molecular_charge: Some(molecular_charge),
            molecular_multiplicity: Some(molecular_multiplicity),
            ..Default::default()
        };
        Self::from_input(&input, &CanonicalizeOptions::default())
    }

    /// New entity with the given overrides applied and every invariant
    /// re-validated. There are no in-place setters.
    pub fn updated(
        &self,
        update: MoleculeUpdate,
        options: &CanonicalizeOptions,
    ) -> Result<Self, MoleculeError> {
        let mut input = record_to_input(&self.record);
        if let Some(name) = update.name {
            input.name = Some(name);
        }
        if let Some(comment) = update.comment {
            input.comment = Some(comment);
        }
        if let Some(geometry) = update.geometry {
            input.geometry = geometry;
        }
        if let Some(charge) = update.molecular_charge {
            input.molecular_charge = Some(charge);
            // Stale fragment allocations must be re-derived, not re-checked.
            if self.record.fragments.len() == 1 {
                input.fragment_charges = None;
                input.fragment_multiplicities = None;
                input.fragment_separators = None;
            }
        }
        if let Some(multiplicity) = update.molecular_multiplicity {
            input.molecular_multiplicity = Some(multiplicity);
            if self.record.fragments.len() == 1 {
                input.fragment_charges = None;
                input.fragment_multiplicities = None;
                input.fragment_separators = None;
            }
        }
        if let Some(fragment_charges) = update.fragment_charges {
            input.fragment_charges = Some(fragment_charges.into_iter().map(Some).collect());
        }
        if let Some(fragment_multiplicities) = update.fragment_multiplicities {
            input.fragment_multiplicities =
                Some(fragment_multiplicities.into_iter().map(Some).collect());
        }
        if let Some(connectivity) = update.connectivity {
            input.connectivity = Some(connectivity);
        }
        if let Some(fix_com) = update.fix_com {
            input.fix_com = Some(fix_com);
        }
        if let Some(fix_orientation) = update.fix_orientation {
            input.fix_orientation = Some(fix_orientation);
        }
        if let Some(extras) = update.extras {
            input.extras = Some(extras);
        }
        Self::from_input(&input, options)
    }

    // <<< comparison

    /// Scientific (tolerance-aware) identity, the same field set the hash
    /// covers.
    pub fn compare(&self, other: &Molecule) -> bool {
        let a = &self.record;
        let b = &other.record;
        let close = |x: f64, y: f64, noise: u32| (x - y).abs() < 10f64.powi(-(noise as i32));

        a.symbols == b.symbols
            && a.masses.len() == b.masses.len()
            && a.masses
                .iter()
                .zip(&b.masses)
                .all(|(&x, &y)| close(x, y, MASS_NOISE))
            && a.real == b.real
            && a.fragments == b.fragments
            && a.fragment_charges.len() == b.fragment_charges.len()
            && a.fragment_charges
                .iter()
                .zip(&b.fragment_charges)
                .all(|(&x, &y)| close(x, y, CHARGE_NOISE))
            && a.fragment_multiplicities == b.fragment_multiplicities
            && close(a.molecular_charge, b.molecular_charge, CHARGE_NOISE)
            && a.molecular_multiplicity == b.molecular_multiplicity
            && a.geometry.len() == b.geometry.len()
            && a.geometry
                .iter()
                .zip(&b.geometry)
                .all(|(&x, &y)| close(x, y, GEOMETRY_NOISE))
    }

    // <<< alignment

    /// Per-atom correspondence classes for the alignment engine.
    fn atom_classes(&self, generic_ghosts: bool) -> Vec<String> {
        self.record
            .symbols
            .iter()
            .zip(&self.record.masses)
            .zip(&self.record.real)
            .map(|((symbol, &mass), &real)| {
                if generic_ghosts && !real {
                    "*".to_string()
                } else {
                    format!("{symbol}@{}", float_prep(mass, MASS_NOISE))
                }
            })
            .collect()
    }

    /// Finds the shift, rotation, and atom reordering of `self` that best
    /// aligns it onto `reference`, and returns the aligned entity together
    /// with the transform report.
    ///
    /// Every per-atom field follows the discovered permutation. Fragment
    /// identity is not constrained during matching and the aligned entity
    /// is rebuilt as a single fragment; this mirrors the behavior of the
    /// correspondence search this engine derives from.
    pub fn align(
        &self,
        reference: &Molecule,
        options: &AlignOptions,
    ) -> Result<(Molecule, AlignmentReport), MoleculeError> {
        let report = align_geometries(
            &self.points(),
            &reference.points(),
            &self.atom_classes(options.generic_ghosts),
            &reference.atom_classes(options.generic_ghosts),
            options,
        )?;

        let moved = report.mill.align_coordinates(&self.points(), false);
        let aligned = self.rebuilt_under(&report.mill, moved)?;
        Ok((aligned, report))
    }

    /// New entity under a random or directed translation, rotation, and
    /// atom shuffling; the returned report carries the perturbation recipe
    /// so tests can verify the aligner recovers it.
    pub fn scramble<R: Rng + ?Sized>(
        &self,
        options: &ScrambleOptions,
        rng: &mut R,
    ) -> Result<(Molecule, AlignmentReport), MoleculeError> {
        let perturbation = compute_scramble(self.natom(), options, rng);
        let points = self.points();
        let moved = perturbation.align_coordinates(&points, true);

        let rmsd = points
            .iter()
            .zip(&moved)
            .map(|(a, b)| (a - b).norm_squared())
            .sum::<f64>()
            .sqrt()
            * BOHR_TO_ANGSTROM
            / (self.natom().max(1) as f64).sqrt();
        let max_displacement = points
            .iter()
            .zip(&moved)
            .map(|(a, b)| (a - b).norm() * BOHR_TO_ANGSTROM)
            .fold(0.0f64, f64::max);

        let scrambled = self.rebuilt_under(&perturbation, moved)?;
        Ok((
            scrambled,
            AlignmentReport {
                rmsd,
                max_displacement,
                mill: perturbation,
            },
        ))
    }

    /// Rebuilds this entity from transformed coordinates with `mill`'s atom
    /// map applied to every per-atom field. The rebuilt record keeps the
    /// frame it was given; re-orienting would undo the transform.
    fn rebuilt_under(
        &self,
        mill: &AlignmentMill,
        moved: Vec<Point3<f64>>,
    ) -> Result<Self, MoleculeError> {
        let record = &self.record;
        let geometry: Vec<f64> = moved.iter().flat_map(|p| [p.x, p.y, p.z]).collect();

        let input = MoleculeInput {
            geometry,
            symbols: Some(mill.align_atoms(&record.symbols)),
            masses: Some(
                mill.align_atoms(&record.masses)
                    .into_iter()
                    .map(Some)
                    .collect(),
            ),
            mass_numbers: Some(
                mill.align_atoms(&record.mass_numbers)
                    .into_iter()
                    .map(Some)
                    .collect(),
            ),
            real: Some(mill.align_atoms(&record.real)),
            labels: Some(mill.align_atoms(&record.atom_labels)),
            speclabel: false,
            name: record.name.clone(),
            units: crate::core::constants::LengthUnit::Bohr,
            fix_com: Some(true),
            fix_orientation: Some(true),
            molecular_charge: Some(record.molecular_charge),
            molecular_multiplicity: Some(record.molecular_multiplicity),
            ..Default::default()
        };
        Self::from_input(&input, &CanonicalizeOptions::default())
    }
}

impl fmt::Display for Molecule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty_print())
    }
}

/// Overrides for [`Molecule::updated`]; unset fields keep their values.
#[derive(Debug, Clone, Default)]
pub struct MoleculeUpdate {
    pub name: Option<String>,
    pub comment: Option<String>,
    /// Replacement geometry, flat `3N`, Bohr.
    pub geometry: Option<Vec<f64>>,
    pub molecular_charge: Option<f64>,
    pub molecular_multiplicity: Option<u32>,
    pub fragment_charges: Option<Vec<f64>>,
    pub fragment_multiplicities: Option<Vec<u32>>,
    pub connectivity: Option<Vec<(usize, usize, f64)>>,
    pub fix_com: Option<bool>,
    pub fix_orientation: Option<bool>,
    pub extras: Option<serde_json::Map<String, Value>>,
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

/// Decomposes a canonical record back into canonicalizer input.
fn record_to_input(record: &MolRecord) -> MoleculeInput {
    let separators: Vec<usize> = record
        .fragments
        .iter()
        .scan(0usize, |acc, fragment| {
            *acc += fragment.len();
            Some(*acc)
        })
        .take(record.fragments.len().saturating_sub(1))
        .collect();

    MoleculeInput {
        geometry: record.geometry.clone(),
        symbols: Some(record.symbols.clone()),
        atomic_numbers: Some(record.atomic_numbers.clone()),
        mass_numbers: Some(record.mass_numbers.iter().copied().map(Some).collect()),
        masses: Some(record.masses.iter().copied().map(Some).collect()),
        real: Some(record.real.clone()),
        labels: Some(record.atom_labels.clone()),
        speclabel: false,
        name: record.name.clone(),
        comment: record.comment.clone(),
        units: crate::core::constants::LengthUnit::Bohr,
        input_units_to_au: None,
        fix_com: Some(record.fix_com),
        fix_orientation: Some(record.fix_orientation),
        fragment_separators: Some(separators),
        fragment_charges: Some(record.fragment_charges.iter().copied().map(Some).collect()),
        fragment_multiplicities: Some(
            record
                .fragment_multiplicities
                .iter()
                .copied()
                .map(Some)
                .collect(),
        ),
        molecular_charge: Some(record.molecular_charge),
        molecular_multiplicity: Some(record.molecular_multiplicity),
        connectivity: record.connectivity.clone(),
        provenance: Some(record.provenance.clone()),
        extras: if record.extras.is_empty() {
            None
        } else {
            Some(record.extras.clone())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WATER: &str = "\
0 1
O 0.000000 0.000000 -0.068516
H 0.000000 -0.790689 0.543701
H 0.000000 0.790689 0.543701
";

    fn water() -> Molecule {
        Molecule::from_string(WATER).unwrap()
    }

    #[test]
    fn formula_is_alphabetical_and_count_suppressed() {
        assert_eq!(water().get_molecular_formula(), "H2O");

        let co2 = Molecule::from_string(
            "C 0.0 0.0 0.0\nO 0.0 0.0 1.16\nO 0.0 0.0 -1.16\n",
        )
        .unwrap();
        assert_eq!(co2.get_molecular_formula(), "CO2");
    }

    #[test]
    fn nelectrons_and_nre_exclude_ghosts() {
        let molecule = water();
        assert_eq!(molecule.nelectrons(None).unwrap(), 10);
        let nre = molecule.nuclear_repulsion_energy(None).unwrap();
        assert!(nre > 8.0 && nre < 10.5, "nre {nre}");

        let ghosted = Molecule::from_string(
            "@O 0.000000 0.000000 -0.068516\nH 0.000000 -0.790689 0.543701\nH 0.000000 0.790689 0.543701\n",
        )
        .unwrap();
        assert_eq!(ghosted.nelectrons(None).unwrap(), 2);
        assert!(ghosted.nuclear_repulsion_energy(None).unwrap() < nre);
    }

    #[test]
    fn measure_dispatches_on_arity() {
        let molecule = water();
        let oh = molecule.measure(&[0, 1], false).unwrap();
        assert!((oh - 1.0 * 1.889_725).abs() < 0.1, "distance {oh}");
        let hoh = molecule.measure(&[1, 0, 2], true).unwrap();
        assert!((hoh - 104.5).abs() < 2.0, "angle {hoh}");
    }

    #[test]
    fn hash_is_invariant_under_rigid_motion_of_the_input() {
        let upright = water();
        // The same structure fed in shifted and crudely rotated (90 degrees
        // about z): canonical orientation scrubs the difference.
        let moved = Molecule::from_string(
            "\
0 1
O 1.000000 2.000000 2.931484
H 1.790689 2.000000 3.543701
H 0.209311 2.000000 3.543701
",
        )
        .unwrap();
        assert_eq!(upright.get_hash(), moved.get_hash());
        assert!(upright.compare(&moved));
    }

    #[test]
    fn hash_is_sensitive_to_charge_and_geometry() {
        let base = water();
        let charged = base
            .updated(
                MoleculeUpdate {
                    molecular_charge: Some(1.0),
                    molecular_multiplicity: Some(2),
                    ..Default::default()
                },
                &CanonicalizeOptions::default(),
            )
            .unwrap();
        assert_ne!(base.get_hash(), charged.get_hash());

        let mut geometry = base.record().geometry.clone();
        geometry[0] += 1.0e-4;
        let nudged = base
            .updated(
                MoleculeUpdate {
                    geometry: Some(geometry),
                    fix_com: Some(true),
                    fix_orientation: Some(true),
                    ..Default::default()
                },
                &CanonicalizeOptions::default(),
            )
            .unwrap();
        assert_ne!(base.get_hash(), nudged.get_hash());
    }

    #[test]
    fn record_round_trip_reproduces_hash() {
        let molecule = water();
        let schema = molecule.to_schema().unwrap();
        let back = Molecule::from_schema(&schema, &CanonicalizeOptions::default()).unwrap();
        assert_eq!(molecule.get_hash(), back.get_hash());
        assert!(molecule.compare(&back));

        let trusted = Molecule::from_record(molecule.record().clone(), true).unwrap();
        assert_eq!(trusted.record(), molecule.record());
    }

    #[test]
    fn get_fragment_preserves_order_and_ghosts_the_rest() {
        let dimer = Molecule::from_string(
            "\
-1 1
O 0.0 0.0 0.0
H 0.0 0.0 0.97
--
1 1
Na 3.0 0.0 0.0
",
        )
        .unwrap();
        assert_eq!(dimer.record().fragments.len(), 2);
        assert_eq!(dimer.record().molecular_charge, 0.0);

        let hydroxide = dimer.get_fragment(&[0], &[1]).unwrap();
        assert_eq!(
            hydroxide.record().symbols,
            vec!["O".to_string(), "H".to_string(), "Na".to_string()]
        );
        assert_eq!(hydroxide.record().real, vec![true, true, false]);
        assert_eq!(hydroxide.record().molecular_charge, -1.0);
        assert_eq!(hydroxide.nelectrons(None).unwrap(), 10);

        let sodium = dimer.get_fragment(&[1], &[]).unwrap();
        assert_eq!(sodium.record().symbols, vec!["Na".to_string()]);
        assert_eq!(sodium.record().molecular_charge, 1.0);
    }

    #[test]
    fn get_fragment_rejects_bad_selections() {
        let molecule = water();
        assert!(matches!(
            molecule.get_fragment(&[2], &[]),
            Err(MoleculeError::Fragment(_))
        ));
        assert!(matches!(
            molecule.get_fragment(&[0], &[0]),
            Err(MoleculeError::Fragment(_))
        ));
    }

    #[test]
    fn updated_rejects_inconsistent_overrides() {
        let dimer = Molecule::from_string(
            "\
-1 1
O 0.0 0.0 0.0
H 0.0 0.0 0.97
--
1 1
Na 3.0 0.0 0.0
",
        )
        .unwrap();
        let err = dimer
            .updated(
                MoleculeUpdate {
                    molecular_charge: Some(1.0),
                    ..Default::default()
                },
                &CanonicalizeOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            MoleculeError::Parse(ParseError::Validation(
                ValidationError::ChargeMultiplicity { .. }
            ))
        ));
    }

    #[test]
    fn alignment_of_scrambled_copy_recovers_the_structure() {
        use rand::SeedableRng;
        use rand::rngs::StdRng;

        let base = water();
        let mut rng = StdRng::seed_from_u64(29);
        let (scrambled, _) = base
            .scramble(&ScrambleOptions::default(), &mut rng)
            .unwrap();

        let (aligned, report) = scrambled
            .align(
                &base,
                &AlignOptions {
                    mols_align: crate::align::MolsAlign::Yes,
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(report.rmsd < 1e-5, "rmsd {}", report.rmsd);
        assert_eq!(aligned.get_molecular_formula(), "H2O");
        assert!(
            (aligned.nuclear_repulsion_energy(None).unwrap()
                - base.nuclear_repulsion_energy(None).unwrap())
            .abs()
                < 1e-4
        );
    }

    #[test]
    fn self_alignment_is_idempotent() {
        let base = water();
        let (aligned, report) = base.align(&base, &AlignOptions::default()).unwrap();
        assert!(report.rmsd < 1e-8);
        for (a, b) in aligned
            .record()
            .geometry
            .iter()
            .zip(&base.record().geometry)
        {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn file_round_trip_through_json_and_xyz() {
        let dir = tempfile::tempdir().unwrap();
        let molecule = water();

        let json_path = dir.path().join("water.json");
        molecule.to_file(&json_path).unwrap();
        let from_json = Molecule::from_file(&json_path).unwrap();
        assert_eq!(molecule.get_hash(), from_json.get_hash());

        let xyz_path = dir.path().join("water.xyz");
        molecule.to_file(&xyz_path).unwrap();
        let from_xyz = Molecule::from_file(&xyz_path).unwrap();
        assert_eq!(from_xyz.get_molecular_formula(), "H2O");

        assert!(matches!(
            molecule.to_file(dir.path().join("water.cube")),
            Err(MoleculeError::UnknownExtension(_))
        ));
    }
}
