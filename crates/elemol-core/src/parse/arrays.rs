//! Array-form canonicalization: unvalidated arrays in, one canonical
//! record out.
//!
//! The pipeline is strictly ordered: units, geometry screen, nucleus
//! resolution, fragment partition, charge/multiplicity reconciliation,
//! connectivity, frame orientation, and finally the single noise-rounding
//! pass that fixes hash stability. A failure at any stage returns before
//! any record exists.

use super::chgmult::reconcile_charge_multiplicity;
use super::nucleus::{NucleusHints, reconcile_nucleus};
use super::{CanonicalizeOptions, MoleculeInput, ValidationError};
use crate::core::models::provenance::provenance_stamp;
use crate::core::models::record::{MolRecord, SCHEMA_NAME, SCHEMA_VERSION, float_prep};
use crate::core::utils::geometry::{center_of_mass, principal_axes};
use nalgebra::Point3;
use tracing::debug;

/// Composes a canonical record from unvalidated arrays and scalars.
///
/// # Errors
///
/// [`ValidationError`] naming the offending field and value; see the kind
/// catalogue on the type. Element and isotope resolution failures surface
/// as [`ValidationError::NotAnElement`].
pub fn from_input(
    input: &MoleculeInput,
    options: &CanonicalizeOptions,
) -> Result<MolRecord, ValidationError> {
    // <<< units
    let physical = input.units.to_bohr();
    let to_bohr = match input.input_units_to_au {
        Some(given) => {
            if (given - physical).abs() >= 0.05 {
                return Err(ValidationError::BadUnitFactor { given, physical });
            }
            given
        }
        None => physical,
    };

    // <<< geometry shape and overlap screen (native input units)
    if !input.geometry.len().is_multiple_of(3) {
        return Err(ValidationError::ShapeMismatch {
            field: "geometry",
            expected: 3 * (input.geometry.len() / 3 + 1),
            found: input.geometry.len(),
        });
    }
    let natom = input.geometry.len() / 3;
    let native: Vec<Point3<f64>> = input
        .geometry
        .chunks_exact(3)
        .map(|xyz| Point3::new(xyz[0], xyz[1], xyz[2]))
        .collect();
    for i in 0..natom {
        for j in 0..i {
            let dist = (native[i] - native[j]).norm();
            if dist < options.tooclose {
                return Err(ValidationError::TooClose { i, j, dist });
            }
        }
    }
    let mut points: Vec<Point3<f64>> = native.iter().map(|p| p * to_bohr).collect();

    // <<< nuclei
    let per_atom_len = |field: &'static str, found: usize| {
        if found == natom {
            Ok(())
        } else {
            Err(ValidationError::ShapeMismatch {
                field,
                expected: natom,
                found,
            })
        }
    };
    if let Some(v) = &input.symbols {
        per_atom_len("symbols", v.len())?;
    }
    if let Some(v) = &input.atomic_numbers {
        per_atom_len("atomic_numbers", v.len())?;
    }
    if let Some(v) = &input.mass_numbers {
        per_atom_len("mass_numbers", v.len())?;
    }
    if let Some(v) = &input.masses {
        per_atom_len("masses", v.len())?;
    }
    if let Some(v) = &input.real {
        per_atom_len("real", v.len())?;
    }
    if let Some(v) = &input.labels {
        per_atom_len("labels", v.len())?;
    }

    let mut symbols = Vec::with_capacity(natom);
    let mut atomic_numbers = Vec::with_capacity(natom);
    let mut mass_numbers = Vec::with_capacity(natom);
    let mut masses = Vec::with_capacity(natom);
    let mut real = Vec::with_capacity(natom);
    let mut atom_labels = Vec::with_capacity(natom);
    for at in 0..natom {
        let hints = NucleusHints {
            a: input.mass_numbers.as_ref().and_then(|v| v[at]),
            z: input.atomic_numbers.as_ref().map(|v| v[at]),
            symbol: input.symbols.as_ref().map(|v| v[at].clone()),
            mass: input.masses.as_ref().and_then(|v| v[at]),
            real: input.real.as_ref().map(|v| v[at]),
            label: input.labels.as_ref().map(|v| v[at].clone()),
            speclabel: input.speclabel,
        };
        let nucleus = reconcile_nucleus(&hints, options.nonphysical, options.mass_tol)?;
        symbols.push(nucleus.symbol.to_string());
        atomic_numbers.push(nucleus.z);
        mass_numbers.push(nucleus.a);
        masses.push(nucleus.mass);
        real.push(nucleus.real);
        atom_labels.push(nucleus.user);
    }

    // <<< fragment partition
    let (fragments, frag_chg_in, frag_mult_in) = build_fragments(input, natom)?;
    let nfr = fragments.len();

    let fragment_zeff: Vec<f64> = fragments
        .iter()
        .map(|fragment| {
            fragment
                .iter()
                .map(|&at| if real[at] { atomic_numbers[at] as f64 } else { 0.0 })
                .sum()
        })
        .collect();
    let ghost_only: Vec<bool> = fragments
        .iter()
        .map(|fragment| fragment.iter().all(|&at| !real[at]))
        .collect();

    let chgmult = reconcile_charge_multiplicity(
        &fragment_zeff,
        &ghost_only,
        input.molecular_charge,
        &frag_chg_in,
        input.molecular_multiplicity,
        &frag_mult_in,
        options.zero_ghost_fragments,
    )?;

    // <<< connectivity
    let connectivity = match &input.connectivity {
        Some(bonds) => {
            let mut normalized = Vec::with_capacity(bonds.len());
            for &(at1, at2, order) in bonds {
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
                normalized.push((at1.min(at2), at1.max(at2), order));
            }
            normalized.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
            Some(normalized)
        }
        None => None,
    };

    // <<< provenance sanity, then a fresh stamp
    if let Some(given) = &input.provenance {
        if given.creator.is_empty() || given.routine.is_empty() {
            return Err(ValidationError::BadProvenance(format!("{given:?}")));
        }
    }

    // <<< frame
    let fix_com = input.fix_com.unwrap_or(false);
    let fix_orientation = input.fix_orientation.unwrap_or(false);
    if !fix_com {
        let com = center_of_mass(&points, &masses);
        for p in &mut points {
            p.coords -= com;
        }
    }
    if !fix_orientation && natom > 0 {
        orient_to_principal_frame(&mut points, &masses, options.geometry_noise);
    }

    // <<< the one and only rounding pass
    let geometry: Vec<f64> = points
        .iter()
        .flat_map(|p| [p.x, p.y, p.z])
        .map(|v| float_prep(v, options.geometry_noise))
        .collect();

    debug!(natom, nfr, "canonicalized molecule input");

    Ok(MolRecord {
        schema_name: SCHEMA_NAME.to_string(),
        schema_version: SCHEMA_VERSION,
        validated: true,
        symbols,
        geometry,
        masses,
        atomic_numbers,
        mass_numbers,
        atom_labels,
        real,
        name: input.name.clone(),
        comment: input.comment.clone(),
        molecular_charge: chgmult.molecular_charge,
        molecular_multiplicity: chgmult.molecular_multiplicity,
        connectivity,
        fragments,
        fragment_charges: chgmult.fragment_charges,
        fragment_multiplicities: chgmult.fragment_multiplicities,
        fix_com,
        fix_orientation,
        provenance: provenance_stamp("elemol.parse.from_input"),
        extras: input.extras.clone().unwrap_or_default(),
    })
}

type FragmentLayout = (Vec<Vec<usize>>, Vec<Option<f64>>, Vec<Option<u32>>);

fn build_fragments(input: &MoleculeInput, natom: usize) -> Result<FragmentLayout, ValidationError> {
    let Some(separators) = &input.fragment_separators else {
        if input.fragment_charges.is_some() || input.fragment_multiplicities.is_some() {
            return Err(ValidationError::MalformedFragments(format!(
                "fragment quantities given without separation info: chg {:?}, mult {:?}",
                input.fragment_charges, input.fragment_multiplicities
            )));
        }
        return Ok(((vec![(0..natom).collect()]), vec![None], vec![None]));
    };

    let mut bounds = Vec::with_capacity(separators.len() + 2);
    bounds.push(0usize);
    bounds.extend_from_slice(separators);
    bounds.push(natom);
    for window in bounds.windows(2) {
        if window[1] <= window[0] && natom != 0 {
            return Err(ValidationError::MalformedFragments(format!(
                "separators {separators:?} yield a zero-length or unsorted fragment"
            )));
        }
        if window[1] > natom {
            return Err(ValidationError::MalformedFragments(format!(
                "separator {} exceeds {natom} atoms",
                window[1]
            )));
        }
    }

    let fragments: Vec<Vec<usize>> = bounds
        .windows(2)
        .map(|window| (window[0]..window[1]).collect())
        .collect();
    let nfr = fragments.len();

    let charges = match &input.fragment_charges {
        Some(charges) if charges.len() != nfr => {
            return Err(ValidationError::MalformedFragments(format!(
                "dimension mismatch among fragment quantities: {} separators + 1 vs {} charges",
                separators.len(),
                charges.len()
            )));
        }
        Some(charges) => charges.clone(),
        None => vec![None; nfr],
    };
    let multiplicities = match &input.fragment_multiplicities {
        Some(mults) if mults.len() != nfr => {
            return Err(ValidationError::MalformedFragments(format!(
                "dimension mismatch among fragment quantities: {} separators + 1 vs {} multiplicities",
                separators.len(),
                mults.len()
            )));
        }
        Some(mults) => mults.clone(),
        None => vec![None; nfr],
    };

    Ok((fragments, charges, multiplicities))
}

/// Rotates into the inertial frame and fixes phases so that geometrically
/// identical structures normalize to identical coordinates.
fn orient_to_principal_frame(points: &mut [Point3<f64>], masses: &[f64], noise: u32) {
    let (_, axes) = principal_axes(points, masses);
    for p in points.iter_mut() {
        p.coords = axes.transpose() * p.coords;
    }

    // Phases: make the first off-plane atom positive in each column.
    let threshold = 10f64.powi(-(noise as i32));
    let mut phase_fixed = [false; 3];
    for at in 0..points.len() {
        for axis in 0..3 {
            if phase_fixed[axis] {
                continue;
            }
            let val = points[at].coords[axis];
            if val.abs() < threshold {
                continue;
            }
            phase_fixed[axis] = true;
            if val < 0.0 {
                for p in points.iter_mut() {
                    p.coords[axis] = -p.coords[axis];
                }
            }
        }
        if phase_fixed.iter().all(|&done| done) {
            break;
        }
    }
}
