//! Pure numeric routines on Cartesian coordinates: measurement, rotation
//! generation, inertia, and rigid superposition.
//!
//! Coordinates are unit-agnostic except where noted; RMSD values from
//! [`kabsch_align`] are reported in Angstrom assuming Bohr inputs, matching
//! the canonical record's internal unit.

use crate::core::constants::BOHR_TO_ANGSTROM;
use nalgebra::{DMatrix, Matrix3, Matrix4, Point3, SymmetricEigen, Vector3};
use rand::Rng;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MeasureError {
    #[error("measurement index {index} is out of bounds for {natom} atoms")]
    OutOfBounds { index: usize, natom: usize },
    #[error("measurement takes 2, 3, or 4 indices, got {0}")]
    Arity(usize),
}

/// Distance between two points.
pub fn compute_distance(p1: &Point3<f64>, p2: &Point3<f64>) -> f64 {
    (p1 - p2).norm()
}

/// Angle (radians) at vertex `p2` of the `p1-p2-p3` triple.
///
/// The cosine is clamped to `[-1, 1]` before inversion; floating-point
/// overshoot on collinear points must not produce NaN.
pub fn compute_angle(p1: &Point3<f64>, p2: &Point3<f64>, p3: &Point3<f64>) -> f64 {
    let v21 = p1 - p2;
    let v23 = p3 - p2;
    let cosine = (v21.dot(&v23) / (v21.norm() * v23.norm())).clamp(-1.0, 1.0);
    cosine.acos()
}

/// Signed dihedral (radians) of the `p1-p2-p3-p4` chain, in `(-pi, pi]`.
///
/// Praxeolitic formulation: the torsion comes out of `atan2` of cross/dot
/// projections, so the sign survives in all four quadrants, where a naive
/// `acos` of the plane-normal cosine would not.
pub fn compute_dihedral(
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    p3: &Point3<f64>,
    p4: &Point3<f64>,
) -> f64 {
    let b0 = p1 - p2;
    let b1 = (p3 - p2).normalize();
    let b2 = p4 - p3;

    // Projections of the outer bonds onto the plane perpendicular to b1.
    let v = b0 - b1 * b0.dot(&b1);
    let w = b2 - b1 * b2.dot(&b1);

    let x = v.dot(&w);
    let y = b1.cross(&v).dot(&w);
    y.atan2(x)
}

/// Distance (2 indices), angle (3), or dihedral (4) over `coords`.
pub fn measure_coordinates(
    coords: &[Point3<f64>],
    indices: &[usize],
    degrees: bool,
) -> Result<f64, MeasureError> {
    for &index in indices {
        if index >= coords.len() {
            return Err(MeasureError::OutOfBounds {
                index,
                natom: coords.len(),
            });
        }
    }

    let value = match indices {
        [i, j] => return Ok(compute_distance(&coords[*i], &coords[*j])),
        [i, j, k] => compute_angle(&coords[*i], &coords[*j], &coords[*k]),
        [i, j, k, l] => compute_dihedral(&coords[*i], &coords[*j], &coords[*k], &coords[*l]),
        other => return Err(MeasureError::Arity(other.len())),
    };

    Ok(if degrees { value.to_degrees() } else { value })
}

/// Euclidean distance matrix between rows of `a` and rows of `b`.
pub fn distance_matrix(a: &[Point3<f64>], b: &[Point3<f64>]) -> DMatrix<f64> {
    DMatrix::from_fn(a.len(), b.len(), |i, j| (a[i] - b[j]).norm())
}

/// Mass-weighted centroid.
pub fn center_of_mass(coords: &[Point3<f64>], masses: &[f64]) -> Vector3<f64> {
    let total: f64 = masses.iter().sum();
    let mut com = Vector3::zeros();
    for (p, &m) in coords.iter().zip(masses) {
        com += p.coords * m;
    }
    if total > 0.0 { com / total } else { com }
}

/// Moment-of-inertia tensor about the origin.
pub fn inertia_tensor(coords: &[Point3<f64>], masses: &[f64]) -> Matrix3<f64> {
    let mut tensor = Matrix3::zeros();
    for (p, &m) in coords.iter().zip(masses) {
        let (x, y, z) = (p.x, p.y, p.z);
        tensor[(0, 0)] += m * (y * y + z * z);
        tensor[(1, 1)] += m * (x * x + z * z);
        tensor[(2, 2)] += m * (x * x + y * y);
        tensor[(0, 1)] -= m * x * y;
        tensor[(0, 2)] -= m * x * z;
        tensor[(1, 2)] -= m * y * z;
    }
    tensor[(1, 0)] = tensor[(0, 1)];
    tensor[(2, 0)] = tensor[(0, 2)];
    tensor[(2, 1)] = tensor[(1, 2)];
    tensor
}

/// Eigen-decomposition of a symmetric matrix with eigenvalues ascending.
///
/// nalgebra's `SymmetricEigen` leaves eigenpairs unordered; callers here
/// always want the principal-axis convention.
fn sorted_symmetric_eigen3(m: &Matrix3<f64>) -> (Vector3<f64>, Matrix3<f64>) {
    let eigen = SymmetricEigen::new(*m);
    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| {
        eigen.eigenvalues[a]
            .partial_cmp(&eigen.eigenvalues[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let values = Vector3::new(
        eigen.eigenvalues[order[0]],
        eigen.eigenvalues[order[1]],
        eigen.eigenvalues[order[2]],
    );
    let vectors = Matrix3::from_columns(&[
        eigen.eigenvectors.column(order[0]).into_owned(),
        eigen.eigenvectors.column(order[1]).into_owned(),
        eigen.eigenvectors.column(order[2]).into_owned(),
    ]);
    (values, vectors)
}

/// Principal axes of the inertia tensor, eigenvalues ascending.
pub fn principal_axes(coords: &[Point3<f64>], masses: &[f64]) -> (Vector3<f64>, Matrix3<f64>) {
    sorted_symmetric_eigen3(&inertia_tensor(coords, masses))
}

/// Uniformly-distributed proper rotation (det +1) by Arvo's method.
///
/// `deflection` scales how far from the identity the rotation may stray:
/// 0.0 is no change, 1.0 is a fully random orientation.
pub fn random_rotation_matrix<R: Rng + ?Sized>(deflection: f64, rng: &mut R) -> Matrix3<f64> {
    let theta: f64 = rng.r#gen::<f64>() * 2.0 * deflection * std::f64::consts::PI;
    let phi: f64 = rng.r#gen::<f64>() * 2.0 * std::f64::consts::PI;
    let z: f64 = rng.r#gen::<f64>() * 2.0 * deflection;

    let r = z.sqrt();
    let v = Vector3::new(phi.sin() * r, phi.cos() * r, (2.0 - z).sqrt());

    let (st, ct) = theta.sin_cos();
    let rot_z = Matrix3::new(ct, st, 0.0, -st, ct, 0.0, 0.0, 0.0, 1.0);

    (v * v.transpose() - Matrix3::identity()) * rot_z
}

/// Optimal rigid superposition of `cgeom` onto `rgeom` (equal cardinality,
/// 1-to-1 correspondence) via the quaternion formulation of the Kabsch
/// algorithm.
///
/// Returns `(rmsd, rotation, shift)` where the aligned geometry is
/// `rotation * (c - shift)` per point and `rmsd` is in Angstrom for Bohr
/// inputs.
pub fn kabsch_align(
    rgeom: &[Point3<f64>],
    cgeom: &[Point3<f64>],
) -> (f64, Matrix3<f64>, Vector3<f64>) {
    debug_assert_eq!(rgeom.len(), cgeom.len());
    let n = rgeom.len();

    // Coincident inputs can otherwise pick up a compensating
    // translation/rotation pair.
    if rgeom
        .iter()
        .zip(cgeom)
        .all(|(r, c)| (r - c).norm() < 1.0e-12)
    {
        return (0.0, Matrix3::identity(), Vector3::zeros());
    }

    let r_centroid: Vector3<f64> = rgeom.iter().map(|p| p.coords).sum::<Vector3<f64>>() / n as f64;
    let c_centroid: Vector3<f64> = cgeom.iter().map(|p| p.coords).sum::<Vector3<f64>>() / n as f64;

    let rc: Vec<Vector3<f64>> = rgeom.iter().map(|p| p.coords - r_centroid).collect();
    let cc: Vec<Vector3<f64>> = cgeom.iter().map(|p| p.coords - c_centroid).collect();

    let rotation = kabsch_quaternion(&cc, &rc);
    let shift = c_centroid - rotation.transpose() * r_centroid;

    let mut residual = 0.0;
    for (r, c) in rc.iter().zip(&cc) {
        residual += (r - rotation * c).norm_squared();
    }
    let rmsd = residual.sqrt() * BOHR_TO_ANGSTROM / (n as f64).sqrt();

    (rmsd, rotation, shift)
}

/// Optimal rotation `U` minimizing `sum || q_i - U p_i ||^2` over centered
/// column-vector sets, by the largest eigenvector of Horn's quaternion
/// matrix.
fn kabsch_quaternion(p: &[Vector3<f64>], q: &[Vector3<f64>]) -> Matrix3<f64> {
    let mut s = Matrix3::zeros();
    for (pi, qi) in p.iter().zip(q) {
        s += pi * qi.transpose();
    }

    let f = Matrix4::new(
        s[(0, 0)] + s[(1, 1)] + s[(2, 2)],
        s[(1, 2)] - s[(2, 1)],
        s[(2, 0)] - s[(0, 2)],
        s[(0, 1)] - s[(1, 0)],
        s[(1, 2)] - s[(2, 1)],
        s[(0, 0)] - s[(1, 1)] - s[(2, 2)],
        s[(0, 1)] + s[(1, 0)],
        s[(2, 0)] + s[(0, 2)],
        s[(2, 0)] - s[(0, 2)],
        s[(0, 1)] + s[(1, 0)],
        -s[(0, 0)] + s[(1, 1)] - s[(2, 2)],
        s[(1, 2)] + s[(2, 1)],
        s[(0, 1)] - s[(1, 0)],
        s[(2, 0)] + s[(0, 2)],
        s[(1, 2)] + s[(2, 1)],
        -s[(0, 0)] - s[(1, 1)] + s[(2, 2)],
    );

    let eigen = SymmetricEigen::new(f);
    let mut leading = 0;
    for i in 1..4 {
        if eigen.eigenvalues[i] > eigen.eigenvalues[leading] {
            leading = i;
        }
    }
    let qv = eigen.eigenvectors.column(leading);
    let (q0, qx, qy, qz) = (qv[0], qv[1], qv[2], qv[3]);

    Matrix3::new(
        q0 * q0 + qx * qx - qy * qy - qz * qz,
        2.0 * (qx * qy - q0 * qz),
        2.0 * (qx * qz + q0 * qy),
        2.0 * (qx * qy + q0 * qz),
        q0 * q0 - qx * qx + qy * qy - qz * qz,
        2.0 * (qy * qz - q0 * qx),
        2.0 * (qx * qz - q0 * qy),
        2.0 * (qy * qz + q0 * qx),
        q0 * q0 - qx * qx - qy * qy + qz * qz,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn distance_between_unit_points() {
        let d = compute_distance(&Point3::new(0.0, 0.0, 0.0), &Point3::new(3.0, 4.0, 0.0));
        assert!(f64_approx_equal(d, 5.0));
    }

    #[test]
    fn right_angle_measures_ninety_degrees() {
        let coords = [
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let angle = measure_coordinates(&coords, &[0, 1, 2], true).unwrap();
        assert!(f64_approx_equal(angle, 90.0));
    }

    #[test]
    fn collinear_angle_does_not_produce_nan() {
        let coords = [
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ];
        let angle = measure_coordinates(&coords, &[0, 1, 2], true).unwrap();
        assert!(f64_approx_equal(angle, 180.0));
    }

    #[test]
    fn dihedral_sign_survives_beyond_ninety_degrees() {
        // Chain built to have a geometric torsion of 200 degrees, i.e. a
        // signed value of -160; an unsigned formulation would report +160.
        let tau = 200.0f64.to_radians();
        let coords = [
            Point3::new(tau.cos(), tau.sin(), 1.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ];
        let dihedral = measure_coordinates(&coords, &[0, 1, 2, 3], true).unwrap();
        assert!((dihedral - (-160.0)).abs() < 1e-8);
    }

    #[test]
    fn dihedral_positive_quadrant() {
        let tau = 60.0f64.to_radians();
        let coords = [
            Point3::new(tau.cos(), tau.sin(), 1.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ];
        let dihedral = measure_coordinates(&coords, &[0, 1, 2, 3], true).unwrap();
        assert!((dihedral - 60.0).abs() < 1e-8);
    }

    #[test]
    fn measure_rejects_bad_indices_and_arity() {
        let coords = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        assert_eq!(
            measure_coordinates(&coords, &[0, 5], false),
            Err(MeasureError::OutOfBounds { index: 5, natom: 2 })
        );
        assert_eq!(
            measure_coordinates(&coords, &[0], false),
            Err(MeasureError::Arity(1))
        );
    }

    #[test]
    fn random_rotation_is_proper() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let rot = random_rotation_matrix(1.0, &mut rng);
            assert!((rot.determinant() - 1.0).abs() < 1e-10);
            let should_be_identity = rot * rot.transpose();
            assert!((should_be_identity - Matrix3::identity()).norm() < 1e-10);
        }
    }

    #[test]
    fn kabsch_recovers_a_pure_rotation() {
        let mut rng = StdRng::seed_from_u64(11);
        let rot = random_rotation_matrix(1.0, &mut rng);
        let shift = Vector3::new(1.5, -2.0, 0.25);

        let rgeom = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.3, 0.0),
            Point3::new(0.2, 0.4, 1.7),
        ];
        let cgeom: Vec<Point3<f64>> = rgeom
            .iter()
            .map(|p| Point3::from(rot * p.coords + shift))
            .collect();

        let (rmsd, u, t) = kabsch_align(&rgeom, &cgeom);
        assert!(rmsd < 1e-8);
        for (r, c) in rgeom.iter().zip(&cgeom) {
            let aligned = u * (c.coords - t);
            assert!((aligned - r.coords).norm() < 1e-8);
        }
    }

    #[test]
    fn kabsch_on_identical_geometries_is_identity() {
        let geom = vec![
            Point3::new(0.1, 0.2, 0.3),
            Point3::new(1.0, -1.0, 0.5),
            Point3::new(-0.7, 0.9, 2.0),
        ];
        let (rmsd, u, t) = kabsch_align(&geom, &geom);
        assert!(f64_approx_equal(rmsd, 0.0));
        assert!((u - Matrix3::identity()).norm() < 1e-12);
        assert!(t.norm() < 1e-12);
    }

    #[test]
    fn inertia_tensor_of_linear_molecule_is_degenerate() {
        let coords = [Point3::new(0.0, 0.0, -1.0), Point3::new(0.0, 0.0, 1.0)];
        let masses = [1.0, 1.0];
        let (values, _) = principal_axes(&coords, &masses);
        assert!(f64_approx_equal(values[0], 0.0));
        assert!(f64_approx_equal(values[1], 2.0));
        assert!(f64_approx_equal(values[2], 2.0));
    }

    #[test]
    fn center_of_mass_weights_by_mass() {
        let coords = [Point3::new(0.0, 0.0, 0.0), Point3::new(3.0, 0.0, 0.0)];
        let com = center_of_mass(&coords, &[2.0, 1.0]);
        assert!(f64_approx_equal(com[0], 1.0));
    }
}
