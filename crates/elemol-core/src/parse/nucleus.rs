//! Nucleus label parsing and reconciliation.
//!
//! A nucleus spec conveys at least element identity and possibly ghosting,
//! isotope, mass, and user-tag information: `@13C_mine`, `Gh(O18)`,
//! `He4@4.01`, `27`. [`reconcile_nucleus`] folds every piece of evidence —
//! explicit arguments plus whatever the label says — into one consistent
//! descriptor, or refuses. An isotope suffix must name a known nuclide of
//! the stated element; silently falling back to the standard mass is
//! exactly the failure mode this module exists to prevent.

use super::ValidationError;
use crate::core::element;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

/// Fields split out of a nucleus label, before table reconciliation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NucleusLabel {
    /// Mass number, from either the `13C` prefix or the `O18` suffix form.
    pub a: Option<u16>,
    pub z: Option<u16>,
    pub symbol: Option<String>,
    pub mass: Option<f64>,
    pub real: bool,
    pub user: Option<String>,
}

/// A fully reconciled nucleus descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Nucleus {
    /// Mass number; 0 when no isotope was specified.
    pub a: u16,
    pub z: u16,
    pub symbol: &'static str,
    pub mass: f64,
    pub real: bool,
    /// User portion of the label, lowercased, empty when absent.
    pub user: String,
}

fn label_core_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?ix)
            \A
            (?:
                (?P<A>\d+)?                  # optional mass number prefix
                (?P<E>[A-Z]{1,3})            # atomic symbol
                (?P<A2>\d+)?                 # optional mass number suffix
                (?P<user1>_\w+)?             # optional user tag
              |
                (?P<Z>\d{1,3})               # atomic number
                (?P<user2>_\w+)?             # optional user tag
            )
            (?:@(?P<mass>\d+\.\d+))?         # optional mass value [u]
            \z",
        )
        .expect("nucleus regex")
    })
}

/// Separates a nucleus label into fields.
///
/// # Errors
///
/// [`ValidationError::BadNucleusLabel`] when the label does not match the
/// nucleus grammar, including a doubly-specified mass number (`13C14`).
pub fn parse_nucleus_label(label: &str) -> Result<NucleusLabel, ValidationError> {
    let trimmed = label.trim();

    // Ghosting wraps the core label: `@stuff` or `Gh(stuff)`.
    let (core, real) = if let Some(rest) = trimmed.strip_prefix('@') {
        (rest, false)
    } else if let Some(rest) = trimmed
        .strip_prefix("Gh(")
        .or_else(|| trimmed.strip_prefix("GH("))
        .or_else(|| trimmed.strip_prefix("gh("))
    {
        let inner = rest
            .strip_suffix(')')
            .ok_or_else(|| ValidationError::BadNucleusLabel(label.to_string()))?;
        (inner, false)
    } else {
        (trimmed, true)
    };

    let caps = label_core_regex()
        .captures(core)
        .ok_or_else(|| ValidationError::BadNucleusLabel(label.to_string()))?;

    let read_u16 = |name: &str| -> Result<Option<u16>, ValidationError> {
        caps.name(name)
            .map(|m| {
                m.as_str()
                    .parse::<u16>()
                    .map_err(|_| ValidationError::BadNucleusLabel(label.to_string()))
            })
            .transpose()
    };

    let a_prefix = read_u16("A")?;
    let a_suffix = read_u16("A2")?;
    let a = match (a_prefix, a_suffix) {
        (Some(_), Some(_)) => {
            return Err(ValidationError::BadNucleusLabel(label.to_string()));
        }
        (prefix, suffix) => prefix.or(suffix),
    };

    Ok(NucleusLabel {
        a,
        z: read_u16("Z")?,
        symbol: caps.name("E").map(|m| m.as_str().to_string()),
        mass: caps.name("mass").and_then(|m| m.as_str().parse().ok()),
        real,
        user: caps
            .name("user1")
            .or_else(|| caps.name("user2"))
            .map(|m| m.as_str().to_string()),
    })
}

/// Evidence supplied to [`reconcile_nucleus`] beyond the label itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NucleusHints {
    /// Mass-number claim. `Some(0)` asserts "no isotope specified" (as a
    /// canonical record does), which suppresses inferring a nuclide from an
    /// explicit mass; `None` leaves the question open.
    pub a: Option<u16>,
    pub z: Option<u16>,
    pub symbol: Option<String>,
    pub mass: Option<f64>,
    pub real: Option<bool>,
    pub label: Option<String>,
    /// Interpret `label` as a full nucleus spec (`true`) or as a bare user
    /// tag (`false`).
    pub speclabel: bool,
}

#[derive(Hash, PartialEq, Eq)]
struct CacheKey {
    a: Option<u16>,
    z: Option<u16>,
    symbol: Option<String>,
    mass_bits: Option<u64>,
    real: Option<bool>,
    label: Option<String>,
    speclabel: bool,
    nonphysical: bool,
    mtol_bits: u64,
}

fn cache() -> &'static RwLock<HashMap<CacheKey, Result<Nucleus, ValidationError>>> {
    static CACHE: OnceLock<RwLock<HashMap<CacheKey, Result<Nucleus, ValidationError>>>> =
        OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Forms a consistent nucleus descriptor from all available evidence,
/// supplemented by the periodic table. At the least, element identity must
/// be derivable somehow. Repeated queries are memoized; molecule inputs
/// resolve the same handful of labels thousands of times.
///
/// # Errors
///
/// - [`ValidationError::NotAnElement`] when a symbol, atomic number, or
///   isotope suffix resolves to nothing in the table.
/// - [`ValidationError::Nucleus`] when the pieces of evidence contradict
///   each other (e.g. `Z=1` with label `"he"`, or a ghost marker against an
///   explicit `real=true`).
pub fn reconcile_nucleus(
    hints: &NucleusHints,
    nonphysical: bool,
    mtol: f64,
) -> Result<Nucleus, ValidationError> {
    let key = CacheKey {
        a: hints.a,
        z: hints.z,
        symbol: hints.symbol.clone(),
        mass_bits: hints.mass.map(f64::to_bits),
        real: hints.real,
        label: hints.label.clone(),
        speclabel: hints.speclabel,
        nonphysical,
        mtol_bits: mtol.to_bits(),
    };
    if let Some(hit) = cache().read().expect("nucleus cache poisoned").get(&key) {
        return hit.clone();
    }
    let result = reconcile_uncached(hints, nonphysical, mtol);
    cache()
        .write()
        .expect("nucleus cache poisoned")
        .insert(key, result.clone());
    result
}

fn reconcile_uncached(
    hints: &NucleusHints,
    nonphysical: bool,
    mtol: f64,
) -> Result<Nucleus, ValidationError> {
    let context = || {
        format!(
            "A: {:?}, Z: {:?}, E: {:?}, mass: {:?}, real: {:?}, label: {:?}",
            hints.a, hints.z, hints.symbol, hints.mass, hints.real, hints.label
        )
    };

    let parsed = match (&hints.label, hints.speclabel) {
        (Some(label), true) => Some(parse_nucleus_label(label)?),
        _ => None,
    };

    // <<< element identity: every clue must agree on Z. Nuclide-alias
    // symbols ("D", "T") also carry a mass-number claim.
    let mut z_candidates: Vec<u16> = Vec::new();
    let mut a_claims: Vec<u16> = Vec::new();
    if let Some(z) = hints.z {
        element::element_from_z(z)?;
        z_candidates.push(z);
    }
    if let Some(symbol) = &hints.symbol {
        let info = element::lookup(symbol)?;
        z_candidates.push(info.z);
        if let Some(a) = info.a {
            a_claims.push(a);
        }
    }
    if let Some(parts) = &parsed {
        if let Some(z) = parts.z {
            element::element_from_z(z)?;
            z_candidates.push(z);
        }
        if let Some(symbol) = &parts.symbol {
            let info = element::lookup(symbol)?;
            z_candidates.push(info.z);
            if let Some(a) = info.a {
                a_claims.push(a);
            }
        }
    }
    let z = *z_candidates.first().ok_or_else(|| ValidationError::Nucleus {
        feature: "atomic number",
        context: context(),
    })?;
    if z_candidates.iter().any(|&cand| cand != z) {
        return Err(ValidationError::Nucleus {
            feature: "atomic number",
            context: context(),
        });
    }
    let info = element::element_from_z(z)?;

    // <<< real/ghost: explicit argument and label marker must agree
    let label_real = parsed.as_ref().map(|p| p.real);
    let real = match (hints.real, label_real) {
        (Some(arg), Some(lbl)) if arg != lbl => {
            return Err(ValidationError::Nucleus {
                feature: "real/ghost",
                context: context(),
            });
        }
        (Some(arg), _) => arg,
        (None, Some(lbl)) => lbl,
        (None, None) => true,
    };

    // <<< isotope: every mass-number claim must agree
    let mut no_isotope = false;
    match hints.a {
        Some(0) => no_isotope = true,
        Some(a) => a_claims.push(a),
        None => {}
    }
    if let Some(a) = parsed.as_ref().and_then(|p| p.a) {
        a_claims.push(a);
    }
    if no_isotope && !a_claims.is_empty() {
        return Err(ValidationError::Nucleus {
            feature: "mass number",
            context: context(),
        });
    }
    let a_claim = a_claims.first().copied();
    if let Some(first) = a_claim {
        if a_claims.iter().any(|&cand| cand != first) {
            return Err(ValidationError::Nucleus {
                feature: "mass number",
                context: context(),
            });
        }
    }

    // <<< mass value: argument and label must agree
    let mass_claim = match (hints.mass, parsed.as_ref().and_then(|p| p.mass)) {
        (Some(arg), Some(lbl)) if (arg - lbl).abs() >= mtol => {
            return Err(ValidationError::Nucleus {
                feature: "mass",
                context: context(),
            });
        }
        (arg, lbl) => arg.or(lbl),
    };

    let (a, mass) = match (a_claim, mass_claim) {
        (Some(a), None) => {
            // The isotope must be a known nuclide of this element.
            let iso_mass = element::isotope_mass(z, a)?;
            (a, iso_mass)
        }
        (Some(a), Some(m)) => {
            let iso_mass = element::isotope_mass(z, a)?;
            if (iso_mass - m).abs() >= mtol {
                return Err(ValidationError::Nucleus {
                    feature: "mass",
                    context: context(),
                });
            }
            (a, m)
        }
        (None, Some(m)) => {
            if nonphysical {
                if m <= 0.5 {
                    return Err(ValidationError::Nucleus {
                        feature: "mass",
                        context: context(),
                    });
                }
            } else {
                let (lo, hi) = element::mass_range(z)?;
                // Half a u of slack beyond the known nuclide masses.
                if m < lo - 0.5 || m > hi + 0.5 {
                    return Err(ValidationError::Nucleus {
                        feature: "mass",
                        context: context(),
                    });
                }
            }
            // Assign the nearest nuclide's A only if the mass truly matches
            // and the caller left the isotope question open.
            let a = if no_isotope {
                0
            } else {
                let nearest = m.round() as u16;
                match element::isotope_mass(z, nearest) {
                    Ok(iso_mass) if (iso_mass - m).abs() < mtol => nearest,
                    _ => 0,
                }
            };
            (a, m)
        }
        (None, None) => (0, info.mass),
    };

    let user = match (&hints.label, hints.speclabel) {
        (Some(label), false) => label.to_lowercase(),
        _ => parsed
            .as_ref()
            .and_then(|p| p.user.as_ref())
            .map(|u| u.to_lowercase())
            .unwrap_or_default(),
    };

    Ok(Nucleus {
        a,
        z,
        symbol: info.symbol,
        mass,
        real,
        user,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_label(label: &str) -> Result<Nucleus, ValidationError> {
        reconcile_nucleus(
            &NucleusHints {
                label: Some(label.to_string()),
                speclabel: true,
                ..Default::default()
            },
            false,
            1.0e-3,
        )
    }

    #[test]
    fn label_splits_into_fields() {
        let parts = parse_nucleus_label("@40Ca_mine@1.07").unwrap();
        assert_eq!(parts.a, Some(40));
        assert_eq!(parts.symbol.as_deref(), Some("Ca"));
        assert_eq!(parts.user.as_deref(), Some("_mine"));
        assert_eq!(parts.mass, Some(1.07));
        assert!(!parts.real);
    }

    #[test]
    fn suffix_and_prefix_isotope_forms_agree() {
        let prefix = parse_nucleus_label("18O").unwrap();
        let suffix = parse_nucleus_label("O18").unwrap();
        assert_eq!(prefix.a, Some(18));
        assert_eq!(suffix.a, Some(18));
        assert_eq!(prefix.symbol, suffix.symbol);
    }

    #[test]
    fn doubly_specified_mass_number_is_rejected() {
        assert!(matches!(
            parse_nucleus_label("13C14"),
            Err(ValidationError::BadNucleusLabel(_))
        ));
    }

    #[test]
    fn ghost_wrapper_forms_are_equivalent() {
        let at = parse_nucleus_label("@Ca").unwrap();
        let gh = parse_nucleus_label("Gh(Ca)").unwrap();
        assert!(!at.real && !gh.real);
        assert_eq!(at.symbol, gh.symbol);
    }

    #[test]
    fn atomic_number_labels_parse() {
        let parts = parse_nucleus_label("53_mI4").unwrap();
        assert_eq!(parts.z, Some(53));
        assert_eq!(parts.user.as_deref(), Some("_mI4"));
    }

    #[test]
    fn unbalanced_ghost_parenthesis_is_rejected() {
        assert!(parse_nucleus_label("Gh(Ca").is_err());
    }

    #[test]
    fn bare_symbol_gets_default_nuclide_mass_and_no_mass_number() {
        let co = from_label("co").unwrap();
        assert_eq!((co.a, co.z, co.symbol), (0, 27, "Co"));
        assert!((co.mass - 58.933195048).abs() < 1e-9);
        assert!(co.real);
        assert_eq!(co.user, "");
    }

    #[test]
    fn isotope_label_resolves_to_nuclide_mass() {
        let o18 = from_label("O18").unwrap();
        assert_eq!(o18.a, 18);
        assert!((o18.mass - 17.9991610).abs() < 1e-9);

        let co60 = from_label("60Co").unwrap();
        assert_eq!(co60.a, 60);
        assert!((co60.mass - 59.933817059).abs() < 1e-9);
    }

    #[test]
    fn deuterium_shorthand_is_an_isotope_claim() {
        let d = from_label("D").unwrap();
        assert_eq!((d.z, d.a), (1, 2));
        assert!((d.mass - 2.0141017778).abs() < 1e-9);
    }

    #[test]
    fn unknown_isotope_is_a_resolution_error_not_a_fallback() {
        let err = from_label("O99").unwrap_err();
        assert!(matches!(err, ValidationError::NotAnElement(_)));
        // A fractional suffix does not even tokenize as a mass number.
        assert!(from_label("O17.5").is_err());
    }

    #[test]
    fn explicit_mass_with_user_tag() {
        let n = from_label("co_mIne@58.933195048").unwrap();
        assert_eq!(n.a, 59);
        assert_eq!(n.user, "_mine");
        assert!((n.mass - 58.933195048).abs() < 1e-12);
    }

    #[test]
    fn off_nuclide_mass_keeps_value_but_drops_mass_number() {
        let n = from_label("Co@60.6").unwrap();
        assert_eq!(n.a, 0);
        assert!((n.mass - 60.6).abs() < 1e-12);
    }

    #[test]
    fn ghost_label_with_isotope() {
        let n = from_label("@60Co").unwrap();
        assert!(!n.real);
        assert_eq!(n.a, 60);
    }

    #[test]
    fn conflicting_element_evidence_is_rejected() {
        let err = reconcile_nucleus(
            &NucleusHints {
                z: Some(1),
                label: Some("he".to_string()),
                speclabel: true,
                ..Default::default()
            },
            false,
            1.0e-3,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Nucleus {
                feature: "atomic number",
                ..
            }
        ));
    }

    #[test]
    fn conflicting_reality_evidence_is_rejected() {
        let err = reconcile_nucleus(
            &NucleusHints {
                real: Some(true),
                label: Some("@U".to_string()),
                speclabel: true,
                ..Default::default()
            },
            false,
            1.0e-3,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Nucleus {
                feature: "real/ghost",
                ..
            }
        ));
    }

    #[test]
    fn conflicting_mass_numbers_are_rejected() {
        let err = reconcile_nucleus(
            &NucleusHints {
                a: Some(4),
                label: Some("3he".to_string()),
                speclabel: true,
                ..Default::default()
            },
            false,
            1.0e-3,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Nucleus {
                feature: "mass number",
                ..
            }
        ));
    }

    #[test]
    fn explicit_no_isotope_claim_suppresses_mass_inference() {
        // A canonical record re-entering validation carries its default
        // mass explicitly; mass number 0 keeps it from being promoted to
        // the default nuclide.
        let n = reconcile_nucleus(
            &NucleusHints {
                symbol: Some("O".to_string()),
                mass: Some(15.99491461956),
                a: Some(0),
                ..Default::default()
            },
            false,
            1.0e-3,
        )
        .unwrap();
        assert_eq!(n.a, 0);

        // Without the claim, the matching nuclide is identified.
        let inferred = reconcile_nucleus(
            &NucleusHints {
                symbol: Some("O".to_string()),
                mass: Some(15.99491461956),
                ..Default::default()
            },
            false,
            1.0e-3,
        )
        .unwrap();
        assert_eq!(inferred.a, 16);
    }

    #[test]
    fn no_isotope_claim_conflicts_with_an_isotope_label() {
        let err = reconcile_nucleus(
            &NucleusHints {
                a: Some(0),
                label: Some("O18".to_string()),
                speclabel: true,
                ..Default::default()
            },
            false,
            1.0e-3,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Nucleus {
                feature: "mass number",
                ..
            }
        ));
    }

    #[test]
    fn nonphysical_mass_requires_the_escape_hatch() {
        let strict = reconcile_nucleus(
            &NucleusHints {
                z: Some(27),
                mass: Some(200.0),
                ..Default::default()
            },
            false,
            1.0e-3,
        );
        assert!(strict.is_err());

        let loose = reconcile_nucleus(
            &NucleusHints {
                z: Some(27),
                mass: Some(200.0),
                ..Default::default()
            },
            true,
            1.0e-3,
        )
        .unwrap();
        assert!((loose.mass - 200.0).abs() < 1e-12);
        assert_eq!(loose.a, 0);
    }

    #[test]
    fn plain_user_tag_mode_keeps_whole_label() {
        let n = reconcile_nucleus(
            &NucleusHints {
                symbol: Some("C".to_string()),
                label: Some("_MINE".to_string()),
                speclabel: false,
                ..Default::default()
            },
            false,
            1.0e-3,
        )
        .unwrap();
        assert_eq!(n.user, "_mine");
        assert_eq!(n.symbol, "C");
    }
}
