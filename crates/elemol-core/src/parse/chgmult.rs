//! Charge and multiplicity reconciliation across fragments.
//!
//! Missing values are filled from electron-counting parity (closed-shell
//! singlet default); explicit values override but must survive feasibility
//! and parity cross-checks, and the molecular totals must agree with the
//! fragment decomposition after filling.

use super::ValidationError;
use tracing::debug;

/// Fully reconciled charge/multiplicity allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeMultiplicity {
    pub molecular_charge: f64,
    pub fragment_charges: Vec<f64>,
    pub molecular_multiplicity: u32,
    pub fragment_multiplicities: Vec<u32>,
}

const CHARGE_TOL: f64 = 1.0e-6;

fn electron_count(
    zeff: f64,
    charge: f64,
    fragment: usize,
) -> Result<u64, ValidationError> {
    let nel = zeff - charge;
    if nel < -CHARGE_TOL {
        return Err(ValidationError::ChargeMultiplicity {
            quantity: "fragment charge",
            message: format!(
                "fragment {fragment} with nuclear charge {zeff} cannot carry charge {charge}"
            ),
        });
    }
    let rounded = nel.round();
    if (nel - rounded).abs() > CHARGE_TOL {
        return Err(ValidationError::ChargeMultiplicity {
            quantity: "fragment charge",
            message: format!(
                "fragment {fragment} charge {charge} leaves a non-integer electron count {nel}"
            ),
        });
    }
    Ok(rounded.max(0.0) as u64)
}

fn check_multiplicity(
    mult: u32,
    nel: u64,
    what: &'static str,
    which: String,
) -> Result<(), ValidationError> {
    if mult < 1 {
        return Err(ValidationError::ChargeMultiplicity {
            quantity: what,
            message: format!("{which}: multiplicity {mult} below 1"),
        });
    }
    let unpaired = (mult - 1) as u64;
    if unpaired > nel {
        return Err(ValidationError::ChargeMultiplicity {
            quantity: what,
            message: format!(
                "{which}: multiplicity {mult} requires more unpaired electrons than the {nel} present"
            ),
        });
    }
    if (nel - unpaired) % 2 != 0 {
        return Err(ValidationError::ChargeMultiplicity {
            quantity: what,
            message: format!("{which}: multiplicity {mult} has wrong parity for {nel} electrons"),
        });
    }
    Ok(())
}

/// Reconciles explicit and defaulted charges/multiplicities for a fragment
/// partition.
///
/// `fragment_zeff` carries the summed effective nuclear charge of each
/// fragment (ghost atoms contribute zero). `ghost_only` marks fragments
/// whose atoms are all ghosts; with `zero_ghost_fragments` those are forced
/// to charge 0, multiplicity 1 regardless of explicit values.
///
/// # Errors
///
/// [`ValidationError::ChargeMultiplicity`] naming the mismatched quantity:
/// a molecular charge that disagrees with the fragment sum, a non-integer
/// or negative electron count, or a multiplicity failing the parity rule.
pub fn reconcile_charge_multiplicity(
    fragment_zeff: &[f64],
    ghost_only: &[bool],
    molecular_charge: Option<f64>,
    fragment_charges: &[Option<f64>],
    molecular_multiplicity: Option<u32>,
    fragment_multiplicities: &[Option<u32>],
    zero_ghost_fragments: bool,
) -> Result<ChargeMultiplicity, ValidationError> {
    let nfr = fragment_zeff.len();
    debug_assert_eq!(nfr, fragment_charges.len());
    debug_assert_eq!(nfr, fragment_multiplicities.len());
    debug_assert_eq!(nfr, ghost_only.len());

    let mut frag_chg: Vec<Option<f64>> = fragment_charges.to_vec();
    let mut frag_mult: Vec<Option<u32>> = fragment_multiplicities.to_vec();
    if zero_ghost_fragments {
        for ifr in 0..nfr {
            if ghost_only[ifr] {
                frag_chg[ifr] = Some(0.0);
                frag_mult[ifr] = Some(1);
            }
        }
    }

    // A single unfragmented system inherits explicit molecular values
    // directly rather than defaulting against them.
    if nfr == 1 {
        if frag_chg[0].is_none() {
            frag_chg[0] = molecular_charge;
        }
        if frag_mult[0].is_none() {
            frag_mult[0] = molecular_multiplicity;
        }
    }

    // <<< charges
    let explicit_sum: f64 = frag_chg.iter().flatten().sum();
    let unspecified: Vec<usize> = (0..nfr).filter(|&i| frag_chg[i].is_none()).collect();

    let charges: Vec<f64> = match molecular_charge {
        Some(total) => {
            let leftover = total - explicit_sum;
            if unspecified.is_empty() {
                if leftover.abs() > CHARGE_TOL {
                    return Err(ValidationError::ChargeMultiplicity {
                        quantity: "molecular charge",
                        message: format!(
                            "molecular charge {total} differs from fragment sum {explicit_sum}"
                        ),
                    });
                }
                frag_chg.iter().map(|c| c.unwrap()).collect()
            } else {
                // Unallocated charge lands on the first open fragment.
                let first_open = unspecified[0];
                (0..nfr)
                    .map(|i| frag_chg[i].unwrap_or(if i == first_open { leftover } else { 0.0 }))
                    .collect()
            }
        }
        None => frag_chg.iter().map(|c| c.unwrap_or(0.0)).collect(),
    };
    let total_charge = molecular_charge.unwrap_or_else(|| charges.iter().sum());

    // <<< per-fragment electron counts gate everything downstream
    let mut electrons = Vec::with_capacity(nfr);
    for ifr in 0..nfr {
        electrons.push(electron_count(fragment_zeff[ifr], charges[ifr], ifr)?);
    }
    let total_electrons: u64 = electrons.iter().sum();

    // <<< fragment multiplicities
    let mut mults: Vec<u32> = Vec::with_capacity(nfr);
    let mut open: Vec<usize> = Vec::new();
    for ifr in 0..nfr {
        match frag_mult[ifr] {
            Some(m) => {
                check_multiplicity(m, electrons[ifr], "fragment multiplicity", format!("fragment {ifr}"))?;
                mults.push(m);
            }
            None => {
                open.push(ifr);
                mults.push(if electrons[ifr] % 2 == 0 { 1 } else { 2 });
            }
        }
    }

    // <<< molecular multiplicity
    let spin_sum = |mults: &[u32]| mults.iter().map(|&m| (m - 1) as u64).sum::<u64>();
    let multiplicity = match molecular_multiplicity {
        Some(total) => {
            check_multiplicity(total, total_electrons, "molecular multiplicity", "molecule".into())?;
            // Promote defaulted fragments (two unpaired electrons at a time,
            // parity-preserving) until the requested total spin is reachable.
            let target = (total - 1) as u64;
            let mut guard = 0;
            while spin_sum(&mults) < target && guard < 4 * nfr as u64 + 8 {
                let mut promoted = false;
                for &ifr in &open {
                    let unpaired = (mults[ifr] - 1) as u64;
                    if unpaired + 2 <= electrons[ifr] {
                        mults[ifr] += 2;
                        promoted = true;
                        break;
                    }
                }
                if !promoted {
                    break;
                }
                guard += 1;
            }
            let reachable = spin_sum(&mults);
            if target > reachable || (reachable - target) % 2 != 0 {
                return Err(ValidationError::ChargeMultiplicity {
                    quantity: "molecular multiplicity",
                    message: format!(
                        "multiplicity {total} is not reachable from fragment multiplicities {mults:?}"
                    ),
                });
            }
            // Spin pairing below the fragment high-spin sum is legitimate
            // (antiferromagnetic coupling); nothing further to allocate.
            total
        }
        None => (spin_sum(&mults) + 1) as u32,
    };

    debug!(
        total_charge,
        multiplicity,
        nfr,
        "reconciled charge/multiplicity"
    );

    Ok(ChargeMultiplicity {
        molecular_charge: total_charge,
        fragment_charges: charges,
        molecular_multiplicity: multiplicity,
        fragment_multiplicities: mults,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn none_vec<T: Clone>(n: usize) -> Vec<Option<T>> {
        vec![None; n]
    }

    #[test]
    fn neutral_closed_shell_defaults() {
        // Water: one fragment, 10 electrons.
        let out = reconcile_charge_multiplicity(
            &[10.0],
            &[false],
            None,
            &none_vec(1),
            None,
            &none_vec(1),
            false,
        )
        .unwrap();
        assert_eq!(out.molecular_charge, 0.0);
        assert_eq!(out.molecular_multiplicity, 1);
        assert_eq!(out.fragment_charges, vec![0.0]);
        assert_eq!(out.fragment_multiplicities, vec![1]);
    }

    #[test]
    fn odd_electron_count_defaults_to_doublet() {
        let out = reconcile_charge_multiplicity(
            &[7.0],
            &[false],
            None,
            &none_vec(1),
            None,
            &none_vec(1),
            false,
        )
        .unwrap();
        assert_eq!(out.molecular_multiplicity, 2);
    }

    #[test]
    fn opposite_fragment_charges_sum_to_neutral() {
        let out = reconcile_charge_multiplicity(
            &[10.0, 10.0],
            &[false, false],
            None,
            &[Some(-1.0), Some(1.0)],
            None,
            &none_vec(2),
            false,
        )
        .unwrap();
        assert_eq!(out.molecular_charge, 0.0);
        assert_eq!(out.fragment_charges, vec![-1.0, 1.0]);
        assert_eq!(out.fragment_multiplicities, vec![2, 2]);
        assert_eq!(out.molecular_multiplicity, 3);
    }

    #[test]
    fn contradicting_molecular_charge_fails_naming_the_quantity() {
        let err = reconcile_charge_multiplicity(
            &[10.0, 10.0],
            &[false, false],
            Some(1.0),
            &[Some(-1.0), Some(1.0)],
            None,
            &none_vec(2),
            false,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::ChargeMultiplicity {
                quantity: "molecular charge",
                ..
            }
        ));
    }

    #[test]
    fn leftover_charge_lands_on_first_open_fragment() {
        let out = reconcile_charge_multiplicity(
            &[10.0, 10.0],
            &[false, false],
            Some(-1.0),
            &[None, Some(0.0)],
            None,
            &none_vec(2),
            false,
        )
        .unwrap();
        assert_eq!(out.fragment_charges, vec![-1.0, 0.0]);
        assert_eq!(out.molecular_charge, -1.0);
    }

    #[test]
    fn single_fragment_inherits_explicit_molecular_values() {
        let out = reconcile_charge_multiplicity(
            &[8.0],
            &[false],
            Some(1.0),
            &none_vec(1),
            Some(2),
            &none_vec(1),
            false,
        )
        .unwrap();
        assert_eq!(out.fragment_charges, vec![1.0]);
        assert_eq!(out.fragment_multiplicities, vec![2]);
    }

    #[test]
    fn explicit_multiplicity_with_wrong_parity_fails() {
        let err = reconcile_charge_multiplicity(
            &[10.0],
            &[false],
            None,
            &none_vec(1),
            Some(2),
            &none_vec(1),
            false,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::ChargeMultiplicity {
                quantity: "molecular multiplicity",
                ..
            }
        ));
    }

    #[test]
    fn triplet_total_promotes_a_defaulted_fragment() {
        let out = reconcile_charge_multiplicity(
            &[8.0, 10.0],
            &[false, false],
            None,
            &none_vec(2),
            Some(3),
            &none_vec(2),
            false,
        )
        .unwrap();
        assert_eq!(out.molecular_multiplicity, 3);
        assert_eq!(spin(&out.fragment_multiplicities), 2);
    }

    fn spin(mults: &[u32]) -> u64 {
        mults.iter().map(|&m| (m - 1) as u64).sum()
    }

    #[test]
    fn two_doublets_may_couple_to_a_singlet() {
        let out = reconcile_charge_multiplicity(
            &[7.0, 7.0],
            &[false, false],
            None,
            &none_vec(2),
            Some(1),
            &[Some(2), Some(2)],
            false,
        )
        .unwrap();
        assert_eq!(out.molecular_multiplicity, 1);
        assert_eq!(out.fragment_multiplicities, vec![2, 2]);
    }

    #[test]
    fn charge_exceeding_electrons_fails() {
        let err = reconcile_charge_multiplicity(
            &[1.0],
            &[false],
            None,
            &[Some(2.0)],
            None,
            &none_vec(1),
            false,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::ChargeMultiplicity {
                quantity: "fragment charge",
                ..
            }
        ));
    }

    #[test]
    fn ghost_fragments_can_be_zeroed() {
        let out = reconcile_charge_multiplicity(
            &[10.0, 0.0],
            &[false, true],
            None,
            &[Some(1.0), Some(-1.0)],
            None,
            &none_vec(2),
            true,
        )
        .unwrap();
        assert_eq!(out.fragment_charges, vec![1.0, 0.0]);
        assert_eq!(out.fragment_multiplicities, vec![1, 1]);
        assert_eq!(out.molecular_charge, 1.0);
    }
}
