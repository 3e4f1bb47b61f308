//! PubChem identifier resolution over the PUG REST interface.
//!
//! Invoked only when input text explicitly asks for it (`pubchem:<query>`).
//! The lookup is synchronous with no retries; every failure — network
//! included — surfaces as a [`PubChemError`], a kind distinct from all
//! validation errors, so offline callers can catch exactly this pathway
//! and degrade gracefully.

use crate::core::element;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

const PUG_REST: &str = "https://pubchem.ncbi.nlm.nih.gov/rest/pug";

#[derive(Debug, Error)]
pub enum PubChemError {
    /// The database could not be reached; offline environments catch this.
    #[error("unable to reach PubChem: {0}")]
    Connection(String),

    #[error("no PubChem matches for '{query}'")]
    NotFound { query: String },

    /// A wildcard search matched several compounds; pick one and re-run.
    #[error("multiple PubChem results for '{query}': {}", format_matches(matches))]
    Ambiguous {
        query: String,
        /// `(cid, iupac_name)` candidates.
        matches: Vec<(u64, String)>,
    },

    #[error("malformed PubChem response: {0}")]
    Malformed(String),
}

fn format_matches(matches: &[(u64, String)]) -> String {
    matches
        .iter()
        .map(|(cid, name)| format!("{cid} ({name})"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One resolved compound: identity plus Angstrom geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct PubChemMolecule {
    pub cid: u64,
    pub iupac_name: String,
    pub charge: f64,
    /// `(symbol, x, y, z)` rows in Angstrom.
    pub atoms: Vec<(String, f64, f64, f64)>,
}

/// Resolves `query` (CID, name, or formula; trailing `*` lists candidate
/// matches instead of failing on several).
pub fn resolve(query: &str) -> Result<PubChemMolecule, PubChemError> {
    info!(query, "resolving molecule via PubChem");
    let (bare, wildcard) = match query.strip_suffix('*') {
        Some(stripped) => (stripped.trim(), true),
        None => (query.trim(), false),
    };

    let cids = search_cids(bare, wildcard)?;
    match cids.len() {
        0 => Err(PubChemError::NotFound {
            query: query.to_string(),
        }),
        1 => fetch_compound(cids[0]),
        _ => {
            let mut matches = Vec::with_capacity(cids.len());
            for &cid in cids.iter().take(20) {
                let name = fetch_property(cid, "IUPACName").unwrap_or_default();
                matches.push((cid, name));
            }
            Err(PubChemError::Ambiguous {
                query: query.to_string(),
                matches,
            })
        }
    }
}

fn get_json(url: &str) -> Result<Value, PubChemError> {
    debug!(url, "PubChem request");
    let response = reqwest::blocking::get(url).map_err(|e| {
        PubChemError::Connection(e.to_string())
    })?;
    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Err(PubChemError::NotFound {
            query: url.to_string(),
        });
    }
    if !response.status().is_success() {
        return Err(PubChemError::Connection(format!(
            "PubChem returned status {}",
            response.status()
        )));
    }
    response
        .json()
        .map_err(|e| PubChemError::Malformed(e.to_string()))
}

fn search_cids(query: &str, wildcard: bool) -> Result<Vec<u64>, PubChemError> {
    let url = if query.chars().all(|c| c.is_ascii_digit()) && !query.is_empty() {
        format!("{PUG_REST}/compound/cid/{query}/cids/JSON")
    } else {
        let name_type = if wildcard { "?name_type=word" } else { "" };
        format!("{PUG_REST}/compound/name/{query}/cids/JSON{name_type}")
    };

    let value = match get_json(&url) {
        // Unknown names come back as HTTP 404 from PUG.
        Err(PubChemError::NotFound { .. }) => {
            return Err(PubChemError::NotFound {
                query: query.to_string(),
            });
        }
        other => other?,
    };

    let cids = value["IdentifierList"]["CID"]
        .as_array()
        .map(|arr| arr.iter().filter_map(Value::as_u64).collect::<Vec<_>>())
        .unwrap_or_default();

    if !wildcard && cids.len() > 1 {
        // A plain (non-wildcard) name search takes the best match.
        return Ok(vec![cids[0]]);
    }
    Ok(cids)
}

fn fetch_property(cid: u64, property: &str) -> Result<String, PubChemError> {
    let url = format!("{PUG_REST}/compound/cid/{cid}/property/{property}/JSON");
    let value = get_json(&url)?;
    value["PropertyTable"]["Properties"][0][property]
        .as_str()
        .map(String::from)
        .ok_or_else(|| PubChemError::Malformed(format!("missing {property} for CID {cid}")))
}

fn fetch_compound(cid: u64) -> Result<PubChemMolecule, PubChemError> {
    let iupac_name = fetch_property(cid, "IUPACName").unwrap_or_else(|_| format!("CID {cid}"));

    // Prefer the 3-D conformer; plenty of compounds only carry 2-D.
    let record = match get_json(&format!(
        "{PUG_REST}/compound/cid/{cid}/record/JSON?record_type=3d"
    )) {
        Ok(value) => value,
        Err(PubChemError::NotFound { .. }) => {
            get_json(&format!("{PUG_REST}/compound/cid/{cid}/record/JSON"))?
        }
        Err(other) => return Err(other),
    };

    let compound = &record["PC_Compounds"][0];
    let charge = compound["charge"].as_f64().unwrap_or(0.0);

    let elements = compound["atoms"]["element"]
        .as_array()
        .ok_or_else(|| PubChemError::Malformed(format!("no atoms for CID {cid}")))?;
    let conformer = &compound["coords"][0]["conformers"][0];
    let xs = conformer["x"].as_array();
    let ys = conformer["y"].as_array();
    let zs = conformer["z"].as_array();
    let (xs, ys) = match (xs, ys) {
        (Some(xs), Some(ys)) => (xs, ys),
        _ => {
            return Err(PubChemError::Malformed(format!(
                "no conformer coordinates for CID {cid}"
            )));
        }
    };

    let mut atoms = Vec::with_capacity(elements.len());
    for (at, z_value) in elements.iter().enumerate() {
        let z = z_value
            .as_u64()
            .ok_or_else(|| PubChemError::Malformed(format!("bad element entry for CID {cid}")))?;
        let symbol = element::element_from_z(z as u16)
            .map_err(|e| PubChemError::Malformed(e.to_string()))?
            .symbol
            .to_string();
        let x = xs
            .get(at)
            .and_then(Value::as_f64)
            .ok_or_else(|| PubChemError::Malformed(format!("short x array for CID {cid}")))?;
        let y = ys
            .get(at)
            .and_then(Value::as_f64)
            .ok_or_else(|| PubChemError::Malformed(format!("short y array for CID {cid}")))?;
        // 2-D records carry no z array; the plane is still a valid start.
        let z_coord = zs
            .and_then(|arr| arr.get(at))
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        atoms.push((symbol, x, y, z_coord));
    }

    Ok(PubChemMolecule {
        cid,
        iupac_name,
        charge,
        atoms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Network-bound; run explicitly with `--ignored` when online.
    #[test]
    #[ignore]
    fn water_resolves_by_name() {
        let result = resolve("water").unwrap();
        assert_eq!(result.atoms.len(), 3);
        assert_eq!(result.charge, 0.0);
    }

    #[test]
    #[ignore]
    fn wildcard_queries_list_candidates() {
        let err = resolve("glucose*").unwrap_err();
        assert!(matches!(err, PubChemError::Ambiguous { .. }));
    }

    #[test]
    fn match_formatting_is_human_readable() {
        let err = PubChemError::Ambiguous {
            query: "x*".to_string(),
            matches: vec![(962, "oxidane".to_string())],
        };
        assert!(err.to_string().contains("962 (oxidane)"));
    }
}
