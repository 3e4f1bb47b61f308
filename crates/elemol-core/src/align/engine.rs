//! The alignment search: best (permutation, rotation, translation, mirror)
//! bringing one geometry into coincidence with another.
//!
//! Correspondence is restricted per atom class (element + mass, or the
//! wildcard ghost class): within each class the Hungarian assignment
//! proposes a matching under the current trial rotation, Kabsch refines the
//! rotation under that matching, and the two are iterated to convergence.
//! Candidate trials span the identity and principal-axes pre-alignments,
//! doubled for the mirror image when requested and meaningful.

use super::mill::AlignmentMill;
use crate::core::utils::assignment::{assignment_alternatives, linear_sum_assignment};
use crate::core::utils::geometry::{kabsch_align, principal_axes};
use nalgebra::{DMatrix, Matrix3, Point3, Vector3};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq)]
pub enum AlignmentError {
    #[error("geometries differ in atom count: {r} != {c}")]
    AtomCountMismatch { r: usize, c: usize },

    #[error("atom classes cannot map to each other:\n  R: {r:?}\n  C: {c:?}")]
    CompositionMismatch { r: Vec<String>, c: Vec<String> },
}

/// Whether the two structures are expected to coincide, and how tightly —
/// a `true`-like value lets the search stop as soon as the expectation is
/// met.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MolsAlign {
    /// No expectation; search every candidate.
    #[default]
    No,
    /// Identical structures expected; stop below the loose default.
    Yes,
    /// Stop once RMSD [A] drops below this threshold.
    Within(f64),
}

impl MolsAlign {
    fn convergence(self) -> f64 {
        match self {
            MolsAlign::No => 0.0,
            MolsAlign::Yes => 1.0e-3,
            MolsAlign::Within(tol) => tol,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlignOptions {
    /// Atom `i` of the reference already corresponds to atom `i` of the
    /// concern geometry; skip the permutation search.
    pub atoms_map: bool,
    pub mols_align: MolsAlign,
    /// Also try the mirror image, when the structure is actually chiral.
    pub run_mirror: bool,
    /// Treat every ghost atom as one wildcard class instead of its element.
    pub generic_ghosts: bool,
    /// Bound on assignment/realignment refinement rounds per candidate.
    pub max_iterations: usize,
    /// RMSD improvement below which refinement counts as converged.
    pub convergence: f64,
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self {
            atoms_map: false,
            mols_align: MolsAlign::No,
            run_mirror: false,
            generic_ghosts: false,
            max_iterations: 30,
            convergence: 1.0e-10,
        }
    }
}

/// The outcome of an alignment search.
#[derive(Debug, Clone)]
pub struct AlignmentReport {
    /// Root-mean-square displacement [A] after the best transform.
    pub rmsd: f64,
    /// Largest single-atom displacement [A] after the best transform.
    pub max_displacement: f64,
    pub mill: AlignmentMill,
}

/// Finds the transform of `cgeom` (and reordering, constrained by the
/// `cuniq`/`runiq` atom classes) that best matches `rgeom`. Geometries are
/// Bohr; reported displacements are Angstrom.
///
/// # Errors
///
/// [`AlignmentError`] when the geometries differ in atom count or their
/// atom-class multisets do not match exactly.
pub fn align_geometries(
    cgeom: &[Point3<f64>],
    rgeom: &[Point3<f64>],
    cuniq: &[String],
    runiq: &[String],
    options: &AlignOptions,
) -> Result<AlignmentReport, AlignmentError> {
    if rgeom.len() != cgeom.len() {
        return Err(AlignmentError::AtomCountMismatch {
            r: rgeom.len(),
            c: cgeom.len(),
        });
    }
    let nat = rgeom.len();

    let mut r_sorted = runiq.to_vec();
    let mut c_sorted = cuniq.to_vec();
    r_sorted.sort();
    c_sorted.sort();
    if r_sorted != c_sorted {
        return Err(AlignmentError::CompositionMismatch {
            r: runiq.to_vec(),
            c: cuniq.to_vec(),
        });
    }

    if nat == 0 {
        return Ok(AlignmentReport {
            rmsd: 0.0,
            max_displacement: 0.0,
            mill: AlignmentMill::identity(0),
        });
    }

    // Atom classes; BTreeMap keeps candidate enumeration deterministic.
    let mut groups: BTreeMap<&str, (Vec<usize>, Vec<usize>)> = BTreeMap::new();
    for (at, class) in runiq.iter().enumerate() {
        groups.entry(class).or_default().0.push(at);
    }
    for (at, class) in cuniq.iter().enumerate() {
        groups.entry(class).or_default().1.push(at);
    }

    let mirrors: &[bool] = if options.run_mirror && !superimposable_on_mirror(cgeom, cuniq) {
        &[false, true]
    } else {
        &[false]
    };
    let stop_below = options.mols_align.convergence();

    let mut best: Option<(f64, AlignmentMill)> = None;
    'candidates: for &mirror in mirrors {
        let cg = apply_mirror(cgeom, mirror);

        let candidates: Vec<(f64, AlignmentMill)> = if options.atoms_map {
            // Correspondence is given; a single Kabsch settles the frame.
            let (rmsd, rotation, shift) = kabsch_align(rgeom, &cg);
            vec![(
                rmsd,
                AlignmentMill {
                    shift,
                    rotation,
                    atommap: (0..nat).collect(),
                    mirror: false,
                },
            )]
        } else {
            trial_rotations(rgeom, &cg)
                .into_iter()
                .map(|start| refine_candidate(&cg, rgeom, &groups, start, options))
                .collect()
        };

        for (rmsd, mut mill) in candidates {
            mill.mirror = mirror;

            if best.as_ref().is_none_or(|(held, _)| rmsd < *held) {
                best = Some((rmsd, mill));
                if stop_below > 0.0 && rmsd < stop_below {
                    break 'candidates;
                }
            }
        }

        // Symmetric structures admit many equal-cost matchings; when the
        // plain refinement stalls, enumerate near-optimal assignments
        // under the best rotation found so far.
        let stalled = match &best {
            Some((held, mill)) if *held > 1.0e-6 && !options.atoms_map => {
                Some((*held, mill.rotation))
            }
            _ => None,
        };
        if let Some((held, rotation)) = stalled
            && let Some((rmsd, alt)) = degenerate_rescue(&cg, rgeom, &groups, &rotation, mirror)
            && rmsd < held
        {
            best = Some((rmsd, alt));
        }
    }

    let (rmsd, mill) = best.expect("at least one candidate evaluated");
    debug!(rmsd, mirror = mill.mirror, "alignment search settled");
    let aligned = mill.align_coordinates(cgeom, false);
    let max_displacement = aligned
        .iter()
        .zip(rgeom)
        .map(|(a, r)| (a - r).norm() * crate::core::constants::BOHR_TO_ANGSTROM)
        .fold(0.0f64, f64::max);

    Ok(AlignmentReport {
        rmsd,
        max_displacement,
        mill,
    })
}

fn apply_mirror(geom: &[Point3<f64>], mirror: bool) -> Vec<Point3<f64>> {
    if !mirror {
        return geom.to_vec();
    }
    geom.iter()
        .map(|p| Point3::new(p.x, -p.y, p.z))
        .collect()
}

/// Is the structure superimposable on its own mirror image? Chirality
/// gates whether mirror candidates are worth doubling the search.
fn superimposable_on_mirror(geom: &[Point3<f64>], uniq: &[String]) -> bool {
    let mirrored = apply_mirror(geom, true);
    let probe = AlignOptions {
        run_mirror: false,
        mols_align: MolsAlign::Within(1.0e-6),
        ..Default::default()
    };
    match align_geometries(&mirrored, geom, uniq, uniq, &probe) {
        Ok(report) => report.rmsd < 1.0e-6,
        Err(_) => false,
    }
}

/// Identity plus the four proper sign combinations of principal-axes
/// pre-alignment; one of them lands near any pure rigid rotation.
fn trial_rotations(rgeom: &[Point3<f64>], cgeom: &[Point3<f64>]) -> Vec<Matrix3<f64>> {
    let unit = vec![1.0; rgeom.len()];
    let (_, mut er) = principal_axes(rgeom, &unit);
    let (_, mut ec) = principal_axes(cgeom, &unit);
    if er.determinant() < 0.0 {
        let flipped = -er.column(2);
        er.set_column(2, &flipped);
    }
    if ec.determinant() < 0.0 {
        let flipped = -ec.column(2);
        ec.set_column(2, &flipped);
    }

    let mut rotations = vec![Matrix3::identity()];
    for signs in [
        [1.0, 1.0, 1.0],
        [1.0, -1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
    ] {
        let flip = Matrix3::from_diagonal(&Vector3::new(signs[0], signs[1], signs[2]));
        rotations.push(er * flip * ec.transpose());
    }
    rotations
}

type Groups<'a> = BTreeMap<&'a str, (Vec<usize>, Vec<usize>)>;

/// Iterates assignment under the current rotation against Kabsch
/// re-refinement until the RMSD stops improving.
fn refine_candidate(
    cgeom: &[Point3<f64>],
    rgeom: &[Point3<f64>],
    groups: &Groups<'_>,
    start: Matrix3<f64>,
    options: &AlignOptions,
) -> (f64, AlignmentMill) {
    let nat = rgeom.len();
    let mut rotation = start;
    let mut held: Option<(f64, AlignmentMill)> = None;

    for _ in 0..options.max_iterations.max(1) {
        let atommap = assign_under_rotation(cgeom, rgeom, groups, &rotation);
        let permuted: Vec<Point3<f64>> = atommap.iter().map(|&at| cgeom[at]).collect();
        let (rmsd, refined, shift) = kabsch_align(rgeom, &permuted);

        // The Kabsch transform maps post-permutation coordinates; recover
        // the pre-permutation shift so the mill composes mirror -> shift ->
        // rotate -> map.
        let mill = AlignmentMill {
            shift,
            rotation: refined,
            atommap,
            mirror: false,
        };

        let improved = held
            .as_ref()
            .map(|(prev, _)| *prev - rmsd > options.convergence)
            .unwrap_or(true);
        let best_so_far = held.as_ref().is_none_or(|(prev, _)| rmsd < *prev);
        if best_so_far {
            held = Some((rmsd, mill));
        }
        if !improved {
            break;
        }
        rotation = refined;
    }

    let (rmsd, mill) = held.expect("refinement ran at least once");
    debug_assert_eq!(mill.atommap.len(), nat);
    (rmsd, mill)
}

/// Per-class Hungarian matching on post-rotation Cartesian distances.
fn assign_under_rotation(
    cgeom: &[Point3<f64>],
    rgeom: &[Point3<f64>],
    groups: &Groups<'_>,
    rotation: &Matrix3<f64>,
) -> Vec<usize> {
    let r_centroid = centroid(rgeom);
    let c_centroid = centroid(cgeom);

    let mut atommap = vec![0usize; rgeom.len()];
    for (r_idx, c_idx) in groups.values() {
        if r_idx.len() == 1 {
            atommap[r_idx[0]] = c_idx[0];
            continue;
        }
        let cost = DMatrix::from_fn(r_idx.len(), c_idx.len(), |slot, col| {
            let rc = rgeom[r_idx[slot]].coords - r_centroid;
            let cc = rotation * (cgeom[c_idx[col]].coords - c_centroid);
            (rc - cc).norm_squared()
        });
        let perm = linear_sum_assignment(&cost);
        for (slot, &col) in perm.iter().enumerate() {
            atommap[r_idx[slot]] = c_idx[col];
        }
    }
    atommap
}

fn centroid(geom: &[Point3<f64>]) -> Vector3<f64> {
    geom.iter().map(|p| p.coords).sum::<Vector3<f64>>() / geom.len() as f64
}

/// Bounded sweep over near-optimal per-class matchings for symmetric
/// structures where the iterative refinement cannot escape a tie.
fn degenerate_rescue(
    cgeom: &[Point3<f64>],
    rgeom: &[Point3<f64>],
    groups: &Groups<'_>,
    rotation: &Matrix3<f64>,
    mirror: bool,
) -> Option<(f64, AlignmentMill)> {
    const PER_GROUP: usize = 8;
    const TOTAL: usize = 64;

    let r_centroid = centroid(rgeom);
    let c_centroid = centroid(cgeom);

    // Alternative matchings per class under the frozen rotation.
    let mut class_options: Vec<(&Vec<usize>, &Vec<usize>, Vec<Vec<usize>>)> = Vec::new();
    let mut combinations = 1usize;
    for (r_idx, c_idx) in groups.values() {
        let cost = DMatrix::from_fn(r_idx.len(), c_idx.len(), |slot, col| {
            let rc = rgeom[r_idx[slot]].coords - r_centroid;
            let cc = rotation * (cgeom[c_idx[col]].coords - c_centroid);
            (rc - cc).norm_squared()
        });
        let alternatives = assignment_alternatives(&cost, 1.0e-6, PER_GROUP);
        combinations = combinations.saturating_mul(alternatives.len());
        class_options.push((r_idx, c_idx, alternatives));
    }
    if combinations > TOTAL || combinations <= 1 {
        return None;
    }

    let mut best: Option<(f64, AlignmentMill)> = None;
    let mut odometer = vec![0usize; class_options.len()];
    loop {
        let mut atommap = vec![0usize; rgeom.len()];
        for (digit, (r_idx, c_idx, alternatives)) in odometer.iter().zip(&class_options) {
            for (slot, &col) in alternatives[*digit].iter().enumerate() {
                atommap[r_idx[slot]] = c_idx[col];
            }
        }
        let permuted: Vec<Point3<f64>> = atommap.iter().map(|&at| cgeom[at]).collect();
        let (rmsd, refined, shift) = kabsch_align(rgeom, &permuted);
        if best.as_ref().is_none_or(|(held, _)| rmsd < *held) {
            best = Some((
                rmsd,
                AlignmentMill {
                    shift,
                    rotation: refined,
                    atommap,
                    mirror,
                },
            ));
        }

        // Advance the odometer.
        let mut pos = 0;
        loop {
            if pos == odometer.len() {
                return best;
            }
            odometer[pos] += 1;
            if odometer[pos] < class_options[pos].2.len() {
                break;
            }
            odometer[pos] = 0;
            pos += 1;
        }
    }
}
