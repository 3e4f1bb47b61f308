//! The alignment mill: application of a fixed (shift, rotation, atom map,
//! mirror) recipe to coordinate sets and per-atom arrays.

use crate::core::utils::geometry::random_rotation_matrix;
use nalgebra::{Matrix3, Point3, Vector3};
use rand::Rng;
use rand::seq::SliceRandom;

/// A simple transformation recipe for molecular coordinates.
///
/// Forward application takes the "concern" frame into the reference frame:
/// optional mirror (y negated), shift subtraction, rotation, then the atom
/// map reorders rows into reference order. When `mirror` is set the
/// molecular identity itself changes, so it is opt-in everywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentMill {
    pub shift: Vector3<f64>,
    pub rotation: Matrix3<f64>,
    pub atommap: Vec<usize>,
    pub mirror: bool,
}

impl AlignmentMill {
    /// The do-nothing recipe for `nat` atoms.
    pub fn identity(nat: usize) -> Self {
        Self {
            shift: Vector3::zeros(),
            rotation: Matrix3::identity(),
            atommap: (0..nat).collect(),
            mirror: false,
        }
    }

    /// Transforms a geometry; `reverse` applies the inverse rotation and
    /// shift (the atom map is applied the same way in both directions,
    /// matching how scrambling recipes are generated and undone).
    pub fn align_coordinates(&self, geom: &[Point3<f64>], reverse: bool) -> Vec<Point3<f64>> {
        let transformed: Vec<Point3<f64>> = if reverse {
            geom.iter()
                .map(|p| {
                    let mut coords = self.rotation.transpose() * p.coords + self.shift;
                    if self.mirror {
                        coords[1] = -coords[1];
                    }
                    Point3::from(coords)
                })
                .collect()
        } else {
            geom.iter()
                .map(|p| {
                    let mut coords = p.coords;
                    if self.mirror {
                        coords[1] = -coords[1];
                    }
                    Point3::from(self.rotation * (coords - self.shift))
                })
                .collect()
        };

        self.atommap.iter().map(|&at| transformed[at]).collect()
    }

    /// Reorders any per-atom array (masses, symbols, flags) under the map.
    pub fn align_atoms<T: Clone>(&self, atoms: &[T]) -> Vec<T> {
        self.atommap.iter().map(|&at| atoms[at].clone()).collect()
    }

    /// Rotates a free vector attached to the molecule.
    pub fn align_vector(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * vector
    }

    /// Transforms a per-atom vector block (e.g. a nuclear gradient):
    /// each 3-vector is rotated, and the blocks are reindexed under the
    /// atom map alongside the atoms they belong to.
    pub fn align_vector_blocks(&self, blocks: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
        let rotated: Vec<Vector3<f64>> = blocks.iter().map(|v| self.rotation * v).collect();
        self.atommap.iter().map(|&at| rotated[at]).collect()
    }
}

/// What to randomize when scrambling a structure.
#[derive(Debug, Clone)]
pub struct ScrambleOptions {
    /// Shuffle atom order, or keep it.
    pub resort: bool,
    /// Random translation on `[-3, 3)` per axis, or stay put.
    pub shift: bool,
    /// Random rotation, or keep the orientation.
    pub rotate: bool,
    /// How far from identity the random rotation may stray; 1.0 is fully
    /// random.
    pub deflection: f64,
    /// Mirror the structure (changes molecular identity).
    pub mirror: bool,
}

impl Default for ScrambleOptions {
    fn default() -> Self {
        Self {
            resort: true,
            shift: true,
            rotate: true,
            deflection: 1.0,
            mirror: false,
        }
    }
}

/// Generates a random translation, rotation, and atom shuffling recipe for
/// `nat` atoms, for scrambling structures in tests and round-trip checks.
pub fn compute_scramble<R: Rng + ?Sized>(
    nat: usize,
    options: &ScrambleOptions,
    rng: &mut R,
) -> AlignmentMill {
    let mut atommap: Vec<usize> = (0..nat).collect();
    if options.resort {
        atommap.shuffle(rng);
    }

    let shift = if options.shift {
        Vector3::new(
            rng.gen_range(-3.0..3.0),
            rng.gen_range(-3.0..3.0),
            rng.gen_range(-3.0..3.0),
        )
    } else {
        Vector3::zeros()
    };

    let rotation = if options.rotate {
        random_rotation_matrix(options.deflection, rng)
    } else {
        Matrix3::identity()
    };

    AlignmentMill {
        shift,
        rotation,
        atommap,
        mirror: options.mirror,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn triangle() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.5),
        ]
    }

    #[test]
    fn identity_mill_is_a_no_op() {
        let mill = AlignmentMill::identity(3);
        let out = mill.align_coordinates(&triangle(), false);
        assert_eq!(out, triangle());
    }

    #[test]
    fn atom_map_reorders_rows_and_arrays() {
        let mill = AlignmentMill {
            atommap: vec![2, 0, 1],
            ..AlignmentMill::identity(3)
        };
        let out = mill.align_coordinates(&triangle(), false);
        assert_eq!(out[0], triangle()[2]);
        assert_eq!(mill.align_atoms(&["a", "b", "c"]), vec!["c", "a", "b"]);
    }

    #[test]
    fn forward_then_reverse_restores_unshuffled_geometry() {
        let mut rng = StdRng::seed_from_u64(3);
        let mill = compute_scramble(
            3,
            &ScrambleOptions {
                resort: false,
                ..Default::default()
            },
            &mut rng,
        );
        let forward = mill.align_coordinates(&triangle(), false);
        let back = mill.align_coordinates(&forward, true);
        for (orig, restored) in triangle().iter().zip(&back) {
            assert!((orig - restored).norm() < 1e-12);
        }
    }

    #[test]
    fn vector_blocks_rotate_and_reindex_together() {
        let mill = AlignmentMill {
            atommap: vec![1, 0],
            rotation: Matrix3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0),
            ..AlignmentMill::identity(2)
        };
        let grads = [Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 2.0)];
        let out = mill.align_vector_blocks(&grads);
        // Atom 1's block leads after the swap; atom 0's x-vector rotates
        // onto y.
        assert!((out[0] - Vector3::new(0.0, 0.0, 2.0)).norm() < 1e-12);
        assert!((out[1] - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn mirror_negates_y_before_the_rigid_motion() {
        let mill = AlignmentMill {
            mirror: true,
            ..AlignmentMill::identity(3)
        };
        let out = mill.align_coordinates(&triangle(), false);
        assert_eq!(out[2].y, -2.0);
    }

    #[test]
    fn scramble_respects_the_toggles() {
        let mut rng = StdRng::seed_from_u64(5);
        let fixed = compute_scramble(
            4,
            &ScrambleOptions {
                resort: false,
                shift: false,
                rotate: false,
                deflection: 1.0,
                mirror: false,
            },
            &mut rng,
        );
        assert_eq!(fixed, AlignmentMill::identity(4));

        let shuffled = compute_scramble(64, &ScrambleOptions::default(), &mut rng);
        assert_ne!(shuffled.atommap, (0..64).collect::<Vec<_>>());
        assert!(shuffled.shift.norm() > 0.0);
    }
}
