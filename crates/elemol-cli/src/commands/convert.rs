use super::read_molecule;
use crate::cli::ConvertArgs;
use crate::config::RunConfig;
use crate::error::{CliError, Result};
use elemol::core::constants::LengthUnit;
use elemol::core::io::{WriteDialect, WriteOptions};
use tracing::info;

pub fn run(args: ConvertArgs, config: &RunConfig) -> Result<()> {
    let molecule = read_molecule(&args.input, config)?;
    info!(
        "Canonicalized {} ({} atoms) from {}",
        molecule.get_molecular_formula(),
        molecule.natom(),
        args.input.display()
    );

    let dialect_name = match (&args.to, &args.output) {
        (Some(name), _) => name.clone(),
        (None, Some(path)) => path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                CliError::InvalidArgument(format!(
                    "cannot infer output dialect from {}",
                    path.display()
                ))
            })?,
        (None, None) => {
            return Err(CliError::InvalidArgument(
                "supply --to or an --output path with a recognizable extension".to_string(),
            ));
        }
    };

    let rendered = if dialect_name.eq_ignore_ascii_case("json") {
        let mut buffer = serde_json::to_string_pretty(&molecule.to_schema().map_err(CliError::Molecule)?)
            .map_err(elemol::core::models::MoleculeError::from)?;
        buffer.push('\n');
        buffer
    } else {
        let dialect: WriteDialect = dialect_name
            .parse()
            .map_err(elemol::core::models::MoleculeError::from)?;
        let units = match args.units.as_deref() {
            Some(token) => Some(LengthUnit::from_token(token).ok_or_else(|| {
                CliError::InvalidArgument(format!("unrecognized units: {token}"))
            })?),
            None => None,
        };
        molecule.to_string_fmt(
            dialect,
            &WriteOptions {
                units,
                ..Default::default()
            },
        )?
    };

    match args.output {
        Some(path) => {
            std::fs::write(&path, rendered)?;
            info!("Wrote {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
