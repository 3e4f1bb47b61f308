//! Per-dialect molecule writers.

use crate::core::constants::LengthUnit;
use crate::core::models::record::MolRecord;
use std::fmt::Write as _;
use std::str::FromStr;
use thiserror::Error;

/// The recognized output text dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteDialect {
    /// Generic XYZ; cannot express ghost atoms without an explicit style.
    Xyz,
    /// The fragmented input dialect this library also parses.
    Qcin,
    /// NWChem `geometry` block; ghosts carry the `bq` prefix.
    Nwchem,
    /// ORCA `* xyz` block; ghosts carry the `:` suffix.
    Orca,
}

impl WriteDialect {
    fn label(self) -> &'static str {
        match self {
            WriteDialect::Xyz => "xyz",
            WriteDialect::Qcin => "qcin",
            WriteDialect::Nwchem => "nwchem",
            WriteDialect::Orca => "orca",
        }
    }

    fn default_units(self) -> LengthUnit {
        // Every dialect here speaks Angstrom by convention.
        LengthUnit::Angstrom
    }

    fn default_ghost(self) -> Option<GhostStyle> {
        match self {
            WriteDialect::Xyz => None,
            WriteDialect::Qcin => Some(GhostStyle::Wrapped),
            WriteDialect::Nwchem => Some(GhostStyle::BqPrefix),
            WriteDialect::Orca => Some(GhostStyle::ColonSuffix),
        }
    }
}

impl FromStr for WriteDialect {
    type Err = WriteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xyz" => Ok(WriteDialect::Xyz),
            "qcin" | "psi4" => Ok(WriteDialect::Qcin),
            "nwchem" => Ok(WriteDialect::Nwchem),
            "orca" => Ok(WriteDialect::Orca),
            other => Err(WriteError::UnknownDialect(other.to_string())),
        }
    }
}

/// How ghost atoms are spelled in an atom line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GhostStyle {
    /// `Gh(O)` wrapping.
    Wrapped,
    /// `@O` prefix.
    AtPrefix,
    /// `bqO` prefix.
    BqPrefix,
    /// `O :` suffix.
    ColonSuffix,
}

#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    /// Output units; `None` takes the dialect default (Angstrom).
    pub units: Option<LengthUnit>,
    /// Ghost spelling override; `None` takes the dialect default, which for
    /// strict XYZ is "refuse".
    pub ghost: Option<GhostStyle>,
    /// Column width for each coordinate.
    pub width: usize,
    /// Decimal places for each coordinate.
    pub prec: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            units: None,
            ghost: None,
            width: 17,
            prec: 12,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum WriteError {
    #[error("molecule dialect '{0}' not recognized; choose among xyz, qcin, nwchem, orca")]
    UnknownDialect(String),

    #[error(
        "dialect '{dialect}' cannot express ghost atoms faithfully; pass a ghost style or extract the real fragments"
    )]
    GhostsUnrepresentable { dialect: &'static str },
}

/// Renders `record` into the requested dialect.
///
/// # Errors
///
/// [`WriteError::GhostsUnrepresentable`] when the record carries ghost
/// atoms, the dialect has no spelling for them, and no override was given.
pub fn to_string_fmt(
    record: &MolRecord,
    dialect: WriteDialect,
    options: &WriteOptions,
) -> Result<String, WriteError> {
    let units = options.units.unwrap_or_else(|| dialect.default_units());
    let factor = units.from_bohr();

    let ghost = options.ghost.or_else(|| dialect.default_ghost());
    if ghost.is_none() && record.real.iter().any(|&r| !r) {
        return Err(WriteError::GhostsUnrepresentable {
            dialect: dialect.label(),
        });
    }

    let mut out = String::new();
    match dialect {
        WriteDialect::Xyz => write_xyz(record, &mut out, units, factor, ghost, options),
        WriteDialect::Qcin => write_qcin(record, &mut out, units, factor, ghost, options),
        WriteDialect::Nwchem => write_nwchem(record, &mut out, factor, ghost, options),
        WriteDialect::Orca => write_orca(record, &mut out, factor, ghost, options),
    }
    Ok(out)
}

/// Atom token under a ghost spelling; real atoms pass through.
fn atom_token(symbol: &str, a: u16, label: &str, real: bool, ghost: Option<GhostStyle>) -> String {
    let mut core = String::new();
    if a > 0 {
        let _ = write!(core, "{a}");
    }
    core.push_str(symbol);
    core.push_str(label);

    if real {
        return core;
    }
    match ghost.expect("ghost style checked before rendering") {
        GhostStyle::Wrapped => format!("Gh({core})"),
        GhostStyle::AtPrefix => format!("@{core}"),
        GhostStyle::BqPrefix => format!("bq{core}"),
        GhostStyle::ColonSuffix => format!("{core} :"),
    }
}

fn write_atom_line(
    out: &mut String,
    token: &str,
    xyz: (f64, f64, f64),
    options: &WriteOptions,
) {
    let (w, p) = (options.width, options.prec);
    let _ = writeln!(
        out,
        "{token:<8}{x:>w$.p$}{y:>w$.p$}{z:>w$.p$}",
        x = xyz.0,
        y = xyz.1,
        z = xyz.2
    );
}

fn atom_coords(record: &MolRecord, at: usize, factor: f64) -> (f64, f64, f64) {
    (
        record.geometry[3 * at] * factor,
        record.geometry[3 * at + 1] * factor,
        record.geometry[3 * at + 2] * factor,
    )
}

fn write_xyz(
    record: &MolRecord,
    out: &mut String,
    units: LengthUnit,
    factor: f64,
    ghost: Option<GhostStyle>,
    options: &WriteOptions,
) {
    let _ = match units {
        LengthUnit::Angstrom => writeln!(out, "{}", record.natom()),
        LengthUnit::Bohr => writeln!(out, "{} au", record.natom()),
    };
    let comment = record
        .name
        .as_deref()
        .or(record.comment.as_deref())
        .unwrap_or_default();
    let _ = writeln!(out, "{comment}");
    for at in 0..record.natom() {
        let token = atom_token(
            &record.symbols[at],
            0,
            "",
            record.real[at],
            ghost,
        );
        write_atom_line(out, &token, atom_coords(record, at, factor), options);
    }
}

fn write_qcin(
    record: &MolRecord,
    out: &mut String,
    units: LengthUnit,
    factor: f64,
    ghost: Option<GhostStyle>,
    options: &WriteOptions,
) {
    let _ = writeln!(
        out,
        "units {}",
        match units {
            LengthUnit::Angstrom => "ang",
            LengthUnit::Bohr => "au",
        }
    );
    if record.fix_com {
        let _ = writeln!(out, "no_com");
    }
    if record.fix_orientation {
        let _ = writeln!(out, "no_reorient");
    }
    for (ifr, fragment) in record.fragments.iter().enumerate() {
        if ifr > 0 {
            let _ = writeln!(out, "--");
        }
        let _ = writeln!(
            out,
            "{} {}",
            record.fragment_charges[ifr], record.fragment_multiplicities[ifr]
        );
        for &at in fragment {
            let token = atom_token(
                &record.symbols[at],
                record.mass_numbers[at],
                &record.atom_labels[at],
                record.real[at],
                ghost,
            );
            write_atom_line(out, &token, atom_coords(record, at, factor), options);
        }
    }
}

fn write_nwchem(
    record: &MolRecord,
    out: &mut String,
    factor: f64,
    ghost: Option<GhostStyle>,
    options: &WriteOptions,
) {
    let _ = writeln!(out, "geometry units angstroms");
    for at in 0..record.natom() {
        let token = atom_token(
            &record.symbols[at],
            0,
            "",
            record.real[at],
            ghost,
        );
        let mut line = String::new();
        write_atom_line(&mut line, &token, atom_coords(record, at, factor), options);
        let _ = write!(out, "  {line}");
    }
    let _ = writeln!(out, "end");
}

fn write_orca(
    record: &MolRecord,
    out: &mut String,
    factor: f64,
    ghost: Option<GhostStyle>,
    options: &WriteOptions,
) {
    let _ = writeln!(
        out,
        "* xyz {} {}",
        record.molecular_charge, record.molecular_multiplicity
    );
    for at in 0..record.natom() {
        let token = atom_token(
            &record.symbols[at],
            0,
            "",
            record.real[at],
            ghost,
        );
        write_atom_line(out, &token, atom_coords(record, at, factor), options);
    }
    let _ = writeln!(out, "*");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::provenance::provenance_stamp;
    use serde_json::Map;

    fn record(real: Vec<bool>) -> MolRecord {
        let natom = real.len();
        MolRecord {
            schema_name: "elemol_molecule".to_string(),
            schema_version: 2,
            validated: true,
            symbols: vec!["H".to_string(); natom],
            geometry: (0..3 * natom).map(|i| i as f64 * 0.5).collect(),
            masses: vec![1.00782503207; natom],
            atomic_numbers: vec![1; natom],
            mass_numbers: vec![0; natom],
            atom_labels: vec![String::new(); natom],
            real,
            name: Some("chain".to_string()),
            comment: None,
            molecular_charge: 0.0,
            molecular_multiplicity: 1,
            connectivity: None,
            fragments: vec![(0..natom).collect()],
            fragment_charges: vec![0.0],
            fragment_multiplicities: vec![1],
            fix_com: false,
            fix_orientation: false,
            provenance: provenance_stamp("test"),
            extras: Map::new(),
        }
    }

    #[test]
    fn xyz_writes_count_comment_and_angstrom_rows() {
        let text =
            to_string_fmt(&record(vec![true, true]), WriteDialect::Xyz, &WriteOptions::default())
                .unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("2"));
        assert_eq!(lines.next(), Some("chain"));
        let first = lines.next().unwrap();
        assert!(first.starts_with("H"));
        // 1.0 bohr third coordinate, converted.
        assert!(first.contains("0.529177210670"));
    }

    #[test]
    fn strict_xyz_refuses_ghosts_without_an_override() {
        let err = to_string_fmt(
            &record(vec![true, false]),
            WriteDialect::Xyz,
            &WriteOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            WriteError::GhostsUnrepresentable { dialect: "xyz" }
        );

        let text = to_string_fmt(
            &record(vec![true, false]),
            WriteDialect::Xyz,
            &WriteOptions {
                ghost: Some(GhostStyle::AtPrefix),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(text.contains("@H"));
    }

    #[test]
    fn qcin_round_trip_shape() {
        let text = to_string_fmt(
            &record(vec![true, true]),
            WriteDialect::Qcin,
            &WriteOptions::default(),
        )
        .unwrap();
        assert!(text.starts_with("units ang\n"));
        assert!(text.contains("0 1"));

        let (input, dialect) =
            crate::parse::from_string(&text, None).expect("writer output must re-parse");
        assert_eq!(dialect, crate::parse::TextDialect::Qcin);
        assert_eq!(input.labels.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn qcin_spells_ghosts_and_isotopes() {
        let mut rec = record(vec![true, false]);
        rec.mass_numbers[0] = 2;
        let text =
            to_string_fmt(&rec, WriteDialect::Qcin, &WriteOptions::default()).unwrap();
        assert!(text.contains("2H"));
        assert!(text.contains("Gh(H)"));
    }

    #[test]
    fn nwchem_block_uses_bq_prefix() {
        let text = to_string_fmt(
            &record(vec![true, false]),
            WriteDialect::Nwchem,
            &WriteOptions::default(),
        )
        .unwrap();
        assert!(text.starts_with("geometry units angstroms\n"));
        assert!(text.contains("bqH"));
        assert!(text.trim_end().ends_with("end"));
    }

    #[test]
    fn orca_block_uses_colon_suffix() {
        let text = to_string_fmt(
            &record(vec![true, false]),
            WriteDialect::Orca,
            &WriteOptions::default(),
        )
        .unwrap();
        assert!(text.starts_with("* xyz 0 1\n"));
        assert!(text.contains("H :"));
        assert!(text.trim_end().ends_with("*"));
    }

    #[test]
    fn width_and_precision_are_honored() {
        let text = to_string_fmt(
            &record(vec![true]),
            WriteDialect::Xyz,
            &WriteOptions {
                width: 12,
                prec: 4,
                ..Default::default()
            },
        )
        .unwrap();
        let atom_line = text.lines().nth(2).unwrap();
        assert_eq!(atom_line.len(), 8 + 3 * 12);
    }
}
