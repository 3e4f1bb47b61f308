//! Schema-form input: a previously canonicalized record (possibly from an
//! older schema layout) re-validated into a fresh canonical record's input.
//!
//! Version-1 envelopes nest the molecule under a `molecule` key; legacy
//! field spellings are normalized; non-contiguous fragment patterns are an
//! error rather than a silent reorder.

use super::{MoleculeInput, ValidationError};
use crate::core::constants::LengthUnit;
use serde_json::{Map, Value};

/// Normalizes a schema document into canonicalizer input.
///
/// Accepts version-2 flat records (`schema_name` of `elemol_molecule` or
/// `qcschema_molecule`) and version-1 envelopes (`schema_name` of
/// `qcschema*` with the molecule nested under `"molecule"`). Atom labels
/// from schema input are plain user tags, never full nucleus specs.
///
/// # Errors
///
/// [`ValidationError::BadSchema`] for unrecognized `schema_name`/`schema_version`
/// or mistyped fields; [`ValidationError::MalformedFragments`] when the
/// fragment pattern skips atoms or would require reordering them.
pub fn from_schema(document: &Value) -> Result<MoleculeInput, ValidationError> {
    let top = document
        .as_object()
        .ok_or_else(|| ValidationError::BadSchema("document is not an object".to_string()))?;

    let schema_name = top
        .get("schema_name")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let schema_version = top.get("schema_version").and_then(Value::as_u64);

    let body: &Map<String, Value> = if (schema_name.starts_with("qcschema")
        || schema_name.starts_with("qc_schema"))
        && schema_version == Some(1)
    {
        top.get("molecule")
            .and_then(Value::as_object)
            .ok_or_else(|| {
                ValidationError::BadSchema(
                    "version-1 envelope is missing the 'molecule' object".to_string(),
                )
            })?
    } else if schema_name.starts_with("elemol_molecule")
        || schema_name.starts_with("qcschema_molecule")
    {
        top
    } else {
        return Err(ValidationError::BadSchema(format!(
            "schema_name/schema_version: {}/{}",
            if schema_name.is_empty() {
                "(none)"
            } else {
                schema_name
            },
            schema_version.map_or("(none)".to_string(), |v| v.to_string()),
        )));
    };

    // Legacy spellings from the array-era layout.
    let field = |modern: &str, legacy: &str| body.get(modern).or_else(|| body.get(legacy));

    let geometry = to_f64_vec(
        field("geometry", "geom")
            .ok_or_else(|| ValidationError::BadSchema("missing 'geometry'".to_string()))?,
        "geometry",
    )?;
    let natom = geometry.len() / 3;

    let symbols = field("symbols", "elem")
        .map(|v| to_string_vec(v, "symbols"))
        .transpose()?;
    let atomic_numbers = field("atomic_numbers", "elez")
        .map(|v| to_u16_vec(v, "atomic_numbers"))
        .transpose()?;
    let mass_numbers = field("mass_numbers", "elea")
        .map(|v| to_opt_u16_vec(v, "mass_numbers"))
        .transpose()?;
    let masses = field("masses", "mass")
        .map(|v| to_opt_f64_vec(v, "masses"))
        .transpose()?;
    let real = body
        .get("real")
        .map(|v| to_bool_vec(v, "real"))
        .transpose()?;
    let labels = field("atom_labels", "elbl")
        .map(|v| to_string_vec(v, "atom_labels"))
        .transpose()?;

    // Fragment index groups reduce to separator form; the canonical layout
    // keeps fragments contiguous, so a pattern that would reorder atoms is
    // refused.
    let fragment_separators = match body.get("fragments") {
        Some(value) => Some(contiguize_fragment_pattern(value, natom)?),
        None => None,
    };

    let connectivity = body
        .get("connectivity")
        .map(|v| to_connectivity(v))
        .transpose()?;

    Ok(MoleculeInput {
        geometry,
        symbols,
        atomic_numbers,
        mass_numbers,
        masses,
        real,
        labels,
        speclabel: false,
        name: body.get("name").and_then(Value::as_str).map(String::from),
        comment: body
            .get("comment")
            .and_then(Value::as_str)
            .map(String::from),
        units: LengthUnit::Bohr,
        input_units_to_au: None,
        fix_com: body.get("fix_com").and_then(Value::as_bool),
        fix_orientation: body.get("fix_orientation").and_then(Value::as_bool),
        fragment_separators,
        fragment_charges: body
            .get("fragment_charges")
            .map(|v| to_opt_f64_vec(v, "fragment_charges"))
            .transpose()?,
        fragment_multiplicities: body
            .get("fragment_multiplicities")
            .map(|v| to_opt_u32_vec(v, "fragment_multiplicities"))
            .transpose()?,
        molecular_charge: body.get("molecular_charge").and_then(Value::as_f64),
        molecular_multiplicity: body
            .get("molecular_multiplicity")
            .and_then(Value::as_u64)
            .map(|v| v as u32),
        connectivity,
        provenance: body
            .get("provenance")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| ValidationError::BadProvenance(e.to_string()))?,
        extras: body
            .get("extras")
            .and_then(Value::as_object)
            .cloned(),
    })
}

/// Collapses a fragment index-group pattern into separator indices,
/// verifying the pattern partitions `[0, natom)` in order.
fn contiguize_fragment_pattern(
    value: &Value,
    natom: usize,
) -> Result<Vec<usize>, ValidationError> {
    let groups = value
        .as_array()
        .ok_or_else(|| ValidationError::BadSchema("'fragments' is not an array".to_string()))?;

    let mut flat: Vec<usize> = Vec::new();
    let mut separators = Vec::new();
    for group in groups {
        let indices = group.as_array().ok_or_else(|| {
            ValidationError::BadSchema("'fragments' entries must be index arrays".to_string())
        })?;
        if !flat.is_empty() {
            separators.push(flat.len());
        }
        for index in indices {
            let at = index.as_u64().ok_or_else(|| {
                ValidationError::BadSchema("fragment indices must be integers".to_string())
            })? as usize;
            flat.push(at);
        }
    }

    let mut sorted = flat.clone();
    sorted.sort_unstable();
    if sorted != (0..natom).collect::<Vec<_>>() {
        return Err(ValidationError::MalformedFragments(format!(
            "fragment pattern skips or repeats atoms: {value}"
        )));
    }
    if flat != (0..natom).collect::<Vec<_>>() {
        return Err(ValidationError::MalformedFragments(format!(
            "non-contiguous fragment pattern would reorder atoms: {value}"
        )));
    }

    Ok(separators)
}

fn to_f64_vec(value: &Value, field: &str) -> Result<Vec<f64>, ValidationError> {
    value
        .as_array()
        .and_then(|arr| arr.iter().map(Value::as_f64).collect())
        .ok_or_else(|| ValidationError::BadSchema(format!("'{field}' is not a numeric array")))
}

fn to_opt_f64_vec(value: &Value, field: &str) -> Result<Vec<Option<f64>>, ValidationError> {
    value
        .as_array()
        .map(|arr| arr.iter().map(|v| v.as_f64()).collect())
        .ok_or_else(|| ValidationError::BadSchema(format!("'{field}' is not an array")))
}

fn to_u16_vec(value: &Value, field: &str) -> Result<Vec<u16>, ValidationError> {
    value
        .as_array()
        .and_then(|arr| {
            arr.iter()
                .map(|v| v.as_u64().map(|n| n as u16))
                .collect()
        })
        .ok_or_else(|| ValidationError::BadSchema(format!("'{field}' is not an integer array")))
}

fn to_opt_u16_vec(value: &Value, field: &str) -> Result<Vec<Option<u16>>, ValidationError> {
    value
        .as_array()
        .map(|arr| {
            arr.iter()
                // 0 is the canonical "no isotope specified" claim; the
                // legacy -1 placeholder leaves the question open.
                .map(|v| match v.as_i64() {
                    Some(n) if n >= 0 => Some(n as u16),
                    _ => None,
                })
                .collect()
        })
        .ok_or_else(|| ValidationError::BadSchema(format!("'{field}' is not an array")))
}

fn to_opt_u32_vec(value: &Value, field: &str) -> Result<Vec<Option<u32>>, ValidationError> {
    value
        .as_array()
        .map(|arr| arr.iter().map(|v| v.as_u64().map(|n| n as u32)).collect())
        .ok_or_else(|| ValidationError::BadSchema(format!("'{field}' is not an array")))
}

fn to_bool_vec(value: &Value, field: &str) -> Result<Vec<bool>, ValidationError> {
    value
        .as_array()
        .and_then(|arr| arr.iter().map(Value::as_bool).collect())
        .ok_or_else(|| ValidationError::BadSchema(format!("'{field}' is not a boolean array")))
}

fn to_string_vec(value: &Value, field: &str) -> Result<Vec<String>, ValidationError> {
    value
        .as_array()
        .and_then(|arr| {
            arr.iter()
                .map(|v| v.as_str().map(String::from))
                .collect()
        })
        .ok_or_else(|| ValidationError::BadSchema(format!("'{field}' is not a string array")))
}

fn to_connectivity(value: &Value) -> Result<Vec<(usize, usize, f64)>, ValidationError> {
    let rows = value
        .as_array()
        .ok_or_else(|| ValidationError::BadConnectivity(format!("{value}")))?;
    let mut bonds = Vec::with_capacity(rows.len());
    for row in rows {
        let triple = row.as_array().filter(|t| t.len() == 3).ok_or_else(|| {
            ValidationError::BadConnectivity(format!("entry is not (at1, at2, order): {row}"))
        })?;
        let at1 = triple[0]
            .as_u64()
            .ok_or_else(|| ValidationError::BadConnectivity(format!("{row}")))?;
        let at2 = triple[1]
            .as_u64()
            .ok_or_else(|| ValidationError::BadConnectivity(format!("{row}")))?;
        let order = triple[2]
            .as_f64()
            .ok_or_else(|| ValidationError::BadConnectivity(format!("{row}")))?;
        bonds.push((at1 as usize, at2 as usize, order));
    }
    Ok(bonds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn water_schema() -> Value {
        json!({
            "schema_name": "elemol_molecule",
            "schema_version": 2,
            "symbols": ["O", "H", "H"],
            "geometry": [0.0, 0.0, -0.129, 0.0, -1.494, 1.027, 0.0, 1.494, 1.027],
            "molecular_charge": 0.0,
            "molecular_multiplicity": 1,
        })
    }

    #[test]
    fn flat_v2_document_converts() {
        let input = from_schema(&water_schema()).unwrap();
        assert_eq!(input.symbols.as_ref().unwrap().len(), 3);
        assert_eq!(input.units, LengthUnit::Bohr);
        assert!(!input.speclabel);
        assert_eq!(input.molecular_charge, Some(0.0));
    }

    #[test]
    fn v1_envelope_unwraps_the_molecule() {
        let document = json!({
            "schema_name": "qcschema_input",
            "schema_version": 1,
            "molecule": water_schema(),
        });
        let input = from_schema(&document).unwrap();
        assert_eq!(input.symbols.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn legacy_field_spellings_normalize() {
        let document = json!({
            "schema_name": "elemol_molecule",
            "schema_version": 2,
            "elem": ["H", "H"],
            "geom": [0.0, 0.0, 0.0, 1.4, 0.0, 0.0],
            "elea": [-1, 2],
        });
        let input = from_schema(&document).unwrap();
        assert_eq!(input.symbols.as_deref().unwrap(), ["H", "H"]);
        assert_eq!(input.mass_numbers.as_deref().unwrap(), [None, Some(2)]);
    }

    #[test]
    fn unknown_schema_is_rejected() {
        let document = json!({"schema_name": "pdb", "geometry": []});
        assert!(matches!(
            from_schema(&document),
            Err(ValidationError::BadSchema(_))
        ));
    }

    #[test]
    fn contiguous_fragments_reduce_to_separators() {
        let mut document = water_schema();
        document["fragments"] = json!([[0], [1, 2]]);
        let input = from_schema(&document).unwrap();
        assert_eq!(input.fragment_separators.as_deref().unwrap(), [1]);
    }

    #[test]
    fn noncontiguous_fragments_are_refused() {
        let mut document = water_schema();
        document["fragments"] = json!([[0, 2], [1]]);
        assert!(matches!(
            from_schema(&document),
            Err(ValidationError::MalformedFragments(_))
        ));
    }

    #[test]
    fn skipping_fragments_are_refused() {
        let mut document = water_schema();
        document["fragments"] = json!([[0, 1]]);
        assert!(matches!(
            from_schema(&document),
            Err(ValidationError::MalformedFragments(_))
        ));
    }
}
