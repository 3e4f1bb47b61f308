pub mod align;
pub mod convert;
pub mod info;

use crate::config::RunConfig;
use crate::error::Result;
use elemol::core::models::Molecule;
use elemol::parse::TextDialect;
use std::path::Path;

/// Reads a molecule with the configured canonicalization options,
/// dispatching on the file extension like the library does.
pub fn read_molecule(path: &Path, config: &RunConfig) -> Result<Molecule> {
    let options = config.canonicalize.to_options();
    let contents = std::fs::read_to_string(path)?;
    let molecule = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => {
            let document: serde_json::Value = serde_json::from_str(&contents)
                .map_err(elemol::core::models::MoleculeError::from)?;
            Molecule::from_schema(&document, &options)?
        }
        Some("xyz") => Molecule::from_string_with(&contents, Some(TextDialect::Xyz), &options)
            .or_else(|_| {
                Molecule::from_string_with(&contents, Some(TextDialect::XyzPlus), &options)
            })?,
        Some("qcin") | Some("psi4") => {
            Molecule::from_string_with(&contents, Some(TextDialect::Qcin), &options)?
        }
        _ => Molecule::from_string_with(&contents, None, &options)?,
    };
    Ok(molecule)
}
