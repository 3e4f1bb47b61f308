//! Alias resolution over the static element and nuclide tables.
//!
//! Any of {symbol, element name, atomic number, nuclide label} resolves to
//! the same [`ElementInfo`]. Lookups are total functions over a fixed finite
//! domain; anything outside it fails with [`NotAnElementError`]. Resolved
//! aliases are memoized in an unbounded in-process cache keyed by the exact
//! query string — the alias domain is small and finite, and racing
//! population is idempotent, so the cache is safe to share across threads.

use super::table::{ELEMENTS, ISOTOPES, NAMES, SYMBOLS};
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};
use thiserror::Error;

/// Raised when an alias cannot be identified as an element or known nuclide.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unidentifiable element or nuclide: '{0}'")]
pub struct NotAnElementError(pub String);

/// The result of resolving an alias against the periodic table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementInfo {
    /// Atomic number.
    pub z: u16,
    /// Element symbol, "Fe" capitalization.
    pub symbol: &'static str,
    /// Element name, "Iron" capitalization.
    pub name: &'static str,
    /// Mass [u]: the nuclide mass if the alias named a nuclide, else the
    /// element's default-nuclide mass.
    pub mass: f64,
    /// Mass number of the resolved nuclide, `None` for plain-element aliases.
    pub a: Option<u16>,
    /// Periodic-table period.
    pub period: u8,
    /// Periodic-table group.
    pub group: u8,
}

fn cache() -> &'static RwLock<HashMap<String, Result<ElementInfo, NotAnElementError>>> {
    static CACHE: OnceLock<RwLock<HashMap<String, Result<ElementInfo, NotAnElementError>>>> =
        OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Per-element nuclide index `(a, mass)` built once from the flat table.
fn nuclides_by_z() -> &'static HashMap<u16, Vec<(u16, f64)>> {
    static INDEX: OnceLock<HashMap<u16, Vec<(u16, f64)>>> = OnceLock::new();
    INDEX.get_or_init(|| {
        let mut index: HashMap<u16, Vec<(u16, f64)>> = HashMap::new();
        for (key, mass) in ISOTOPES.entries() {
            let split = key.find(|c: char| c.is_ascii_digit()).expect("nuclide key");
            let symbol = &key[..split];
            let a: u16 = key[split..].parse().expect("nuclide mass number");
            let data = ELEMENTS.get(symbol).expect("nuclide element");
            index.entry(data.z).or_default().push((a, *mass));
        }
        for nuclides in index.values_mut() {
            nuclides.sort_by_key(|(a, _)| *a);
        }
        index
    })
}

fn capitalized(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

fn resolve_uncached(alias: &str) -> Result<ElementInfo, NotAnElementError> {
    let trimmed = alias.trim();

    // Hydrogen nuclide shorthands.
    let keyed = match capitalized(trimmed).as_str() {
        "D" => "H2".to_string(),
        "T" => "H3".to_string(),
        other => other.to_string(),
    };

    // Nuclide label, "Sym<A>" form.
    if let Some(split) = keyed.find(|c: char| c.is_ascii_digit()) {
        if split > 0 && keyed[split..].chars().all(|c| c.is_ascii_digit()) {
            let symbol = &keyed[..split];
            let a: u16 = keyed[split..]
                .parse()
                .map_err(|_| NotAnElementError(alias.to_string()))?;
            let data = ELEMENTS
                .get(symbol)
                .ok_or_else(|| NotAnElementError(alias.to_string()))?;
            let mass = *ISOTOPES
                .get(keyed.as_str())
                .ok_or_else(|| NotAnElementError(alias.to_string()))?;
            return Ok(ElementInfo {
                z: data.z,
                symbol: data.symbol,
                name: data.name,
                mass,
                a: Some(a),
                period: data.period,
                group: data.group,
            });
        }
    }

    // Plain symbol.
    if let Some(data) = ELEMENTS.get(keyed.as_str()) {
        return Ok(info_for(data));
    }

    // Atomic number, numeric or stringly.
    if let Ok(z) = trimmed.parse::<u16>() {
        return element_from_z(z).map_err(|_| NotAnElementError(alias.to_string()));
    }

    // Element name.
    if let Some(symbol) = NAMES.get(trimmed.to_ascii_lowercase().as_str()) {
        return Ok(info_for(ELEMENTS.get(symbol).expect("name alias target")));
    }

    Err(NotAnElementError(alias.to_string()))
}

fn info_for(data: &super::table::ElementData) -> ElementInfo {
    ElementInfo {
        z: data.z,
        symbol: data.symbol,
        name: data.name,
        mass: data.mass,
        a: None,
        period: data.period,
        group: data.group,
    }
}

/// Resolves `alias` (symbol, name, atomic number, or nuclide label) against
/// the periodic table.
///
/// # Errors
///
/// Returns [`NotAnElementError`] carrying the alias verbatim when it matches
/// nothing in the table.
pub fn lookup(alias: &str) -> Result<ElementInfo, NotAnElementError> {
    if let Some(hit) = cache().read().expect("element cache poisoned").get(alias) {
        return hit.clone();
    }
    let resolved = resolve_uncached(alias);
    cache()
        .write()
        .expect("element cache poisoned")
        .insert(alias.to_string(), resolved.clone());
    resolved
}

/// Element record for an atomic number.
pub fn element_from_z(z: u16) -> Result<ElementInfo, NotAnElementError> {
    SYMBOLS
        .get(z as usize)
        .filter(|s| !s.is_empty())
        .and_then(|s| ELEMENTS.get(s))
        .map(info_for)
        .ok_or_else(|| NotAnElementError(z.to_string()))
}

/// Atomic number for any recognized alias.
pub fn to_z(alias: &str) -> Result<u16, NotAnElementError> {
    lookup(alias).map(|info| info.z)
}

/// Capitalized element symbol for any recognized alias.
pub fn to_symbol(alias: &str) -> Result<&'static str, NotAnElementError> {
    lookup(alias).map(|info| info.symbol)
}

/// Element name for any recognized alias.
pub fn to_name(alias: &str) -> Result<&'static str, NotAnElementError> {
    lookup(alias).map(|info| info.name)
}

/// Mass [u] for any recognized alias; nuclide aliases ("O18", "D") give the
/// nuclide mass, plain aliases the element's default-nuclide mass.
pub fn to_mass(alias: &str) -> Result<f64, NotAnElementError> {
    lookup(alias).map(|info| info.mass)
}

/// Mass [u] of the nuclide with mass number `a` of element `z`.
pub fn isotope_mass(z: u16, a: u16) -> Result<f64, NotAnElementError> {
    let symbol = element_from_z(z)?.symbol;
    nuclides_by_z()
        .get(&z)
        .and_then(|nuclides| nuclides.iter().find(|(na, _)| *na == a))
        .map(|(_, mass)| *mass)
        .ok_or_else(|| NotAnElementError(format!("{symbol}{a}")))
}

/// Mass number of the element's default (most common) nuclide.
pub fn most_common_a(z: u16) -> Result<u16, NotAnElementError> {
    element_from_z(z).map(|_| {
        ELEMENTS
            .get(SYMBOLS[z as usize])
            .expect("element table entry")
            .a
    })
}

/// Smallest and largest known mass number for element `z`.
pub fn mass_number_range(z: u16) -> Result<(u16, u16), NotAnElementError> {
    element_from_z(z)?;
    let nuclides = nuclides_by_z().get(&z).expect("default nuclide present");
    Ok((nuclides.first().expect("nonempty").0, nuclides.last().expect("nonempty").0))
}

/// Smallest and largest known nuclide mass [u] for element `z`.
pub fn mass_range(z: u16) -> Result<(f64, f64), NotAnElementError> {
    element_from_z(z)?;
    let nuclides = nuclides_by_z().get(&z).expect("default nuclide present");
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for (_, mass) in nuclides {
        lo = lo.min(*mass);
        hi = hi.max(*mass);
    }
    Ok((lo, hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_aliases_resolve_case_insensitively() {
        assert_eq!(to_z("co").unwrap(), 27);
        assert_eq!(to_z("cO").unwrap(), 27);
        assert_eq!(to_symbol("CO").unwrap(), "Co");
        assert_eq!(to_name("fe").unwrap(), "Iron");
    }

    #[test]
    fn atomic_number_aliases_resolve() {
        assert_eq!(to_symbol("27").unwrap(), "Co");
        assert_eq!(element_from_z(8).unwrap().symbol, "O");
        assert!(element_from_z(0).is_err());
        assert!(element_from_z(119).is_err());
    }

    #[test]
    fn element_name_aliases_resolve() {
        assert_eq!(to_z("oxygen").unwrap(), 8);
        assert_eq!(to_z("Aluminium").unwrap(), 13);
    }

    #[test]
    fn nuclide_aliases_give_nuclide_masses() {
        let o18 = lookup("O18").unwrap();
        assert_eq!(o18.z, 8);
        assert_eq!(o18.a, Some(18));
        assert!((o18.mass - 17.9991610).abs() < 1e-9);

        // Plain element gives the default nuclide mass, not an average.
        assert!((to_mass("O").unwrap() - 15.99491461956).abs() < 1e-9);
    }

    #[test]
    fn hydrogen_shorthands_resolve() {
        assert!((to_mass("D").unwrap() - 2.0141017778).abs() < 1e-9);
        assert!((to_mass("t").unwrap() - 3.0160492777).abs() < 1e-9);
        assert_eq!(to_z("D").unwrap(), 1);
    }

    #[test]
    fn unknown_aliases_are_rejected_verbatim() {
        let err = lookup("Xx").unwrap_err();
        assert_eq!(err, NotAnElementError("Xx".to_string()));
        assert!(lookup("O99").is_err());
        assert!(lookup("").is_err());
    }

    #[test]
    fn isotope_mass_checks_known_nuclides() {
        assert!((isotope_mass(8, 18).unwrap() - 17.9991610).abs() < 1e-9);
        assert!(isotope_mass(8, 99).is_err());
        assert!(isotope_mass(200, 1).is_err());
    }

    #[test]
    fn ranges_cover_known_nuclides() {
        let (amin, amax) = mass_number_range(8).unwrap();
        assert_eq!((amin, amax), (16, 18));
        let (mlo, mhi) = mass_range(1).unwrap();
        assert!(mlo < 1.01 && mhi > 3.0);
    }

    #[test]
    fn repeated_lookups_hit_the_cache() {
        let first = lookup("co60").unwrap();
        let second = lookup("co60").unwrap();
        assert_eq!(first, second);
        assert!((first.mass - 59.933817059).abs() < 1e-9);
    }
}
