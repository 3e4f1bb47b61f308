//! Text-form molecule parsing: several dialects, one tokenizer contract.
//!
//! Each dialect is a pure parse function over the comment-stripped text;
//! whatever a dialect cannot consume is a [`MoleculeFormatError`] carrying
//! the remnant. With no dialect given, a ranked-fallback loop tries every
//! dialect and reports the most specific (shortest-remnant) failure.

use super::nucleus::parse_nucleus_label;
use super::pubchem;
use super::{MoleculeFormatError, MoleculeInput, ParseError};
use crate::core::constants::LengthUnit;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// The recognized input text dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextDialect {
    /// Strict XYZ: count line, comment line, `<symbol-or-Z> <x> <y> <z>`.
    Xyz,
    /// Enhanced XYZ: units on the count line, optional charge/multiplicity
    /// line, full nucleus labels.
    XyzPlus,
    /// Fragmented quantum-chemistry input: `--` separators, per-fragment
    /// charge/multiplicity headers, `units`/`no_com`/`no_reorient`
    /// directives, `pubchem:` lines.
    Qcin,
}

impl TextDialect {
    pub const ALL: [TextDialect; 3] = [TextDialect::Qcin, TextDialect::Xyz, TextDialect::XyzPlus];

    pub fn label(self) -> &'static str {
        match self {
            TextDialect::Xyz => "xyz",
            TextDialect::XyzPlus => "xyz+",
            TextDialect::Qcin => "qcin",
        }
    }
}

impl fmt::Display for TextDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TextDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xyz" => Ok(TextDialect::Xyz),
            "xyz+" => Ok(TextDialect::XyzPlus),
            "qcin" | "psi4" => Ok(TextDialect::Qcin),
            other => Err(format!(
                "molecule dialect '{other}' not recognized; choose among xyz, xyz+, qcin"
            )),
        }
    }
}

const NUMBER: &str = r"[-+]?(?:\d+\.\d*|\.\d+|\d+)(?:[Ee][-+]?\d+)?";

fn regex(cell: &'static OnceLock<Regex>, pattern: impl FnOnce() -> String) -> &'static Regex {
    cell.get_or_init(|| Regex::new(&pattern()).expect("dialect regex"))
}

fn atom_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, || {
        format!(
            r"(?i)^(?P<nucleus>[^\s,]+)[\t ,]+(?P<x>{NUMBER})[\t ,]+(?P<y>{NUMBER})[\t ,]+(?P<z>{NUMBER})$"
        )
    })
}

fn chgmult_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, || {
        format!(r"^(?P<chg>{NUMBER})[\t ,]+(?P<mult>\d+)$")
    })
}

/// Charge/multiplicity opening an otherwise-free comment line.
fn chgmult_prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, || {
        format!(r"^(?P<chg>{NUMBER})[\t ,]+(?P<mult>\d+)\b")
    })
}

fn simple_nucleus_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, || r"^(?:[A-Za-z]{1,3}|\d{1,3})$".to_string())
}

fn xyz_count_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, || {
        r"(?i)^(?P<nat>\d+)[\s,]*(?:(?P<ubohr>bohr|au)|(?P<uang>ang))?$".to_string()
    })
}

fn units_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, || {
        r"(?i)^units?[\s=]+(?:(?P<ubohr>bohr|au|a\.u\.)|(?P<uang>ang|angstrom))$".to_string()
    })
}

fn pubchem_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, || r"(?i)^pubchem\s*:\s*(?P<query>\S[\S ]*)$".to_string())
}

/// Removes `#` comments (escaped `\#` survives) the way input decks expect.
pub fn filter_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (iln, line) in text.lines().enumerate() {
        if iln > 0 {
            out.push('\n');
        }
        let mut cut = line.len();
        let bytes = line.as_bytes();
        for (pos, &b) in bytes.iter().enumerate() {
            if b == b'#' && (pos == 0 || bytes[pos - 1] != b'\\') {
                cut = pos;
                break;
            }
        }
        out.push_str(&line[..cut]);
    }
    out
}

/// Parses `text` under `dialect`, or under the best-matching dialect when
/// `None`.
///
/// # Errors
///
/// [`MoleculeFormatError`] when unconsumable text remains — with automatic
/// detection, the most specific (shortest-remnant) error among all
/// dialects. PubChem resolution failures propagate as their own kind.
pub fn from_string(
    text: &str,
    dialect: Option<TextDialect>,
) -> Result<(MoleculeInput, TextDialect), ParseError> {
    let filtered = filter_comments(text.trim());

    match dialect {
        Some(d) => Ok((parse_dialect(&filtered, d)?, d)),
        None => {
            let mut best: Option<MoleculeFormatError> = None;
            for d in TextDialect::ALL {
                match parse_dialect(&filtered, d) {
                    Ok(input) => return Ok((input, d)),
                    Err(ParseError::Format(err)) => {
                        let keep = match &best {
                            Some(held) => err.remnant.len() < held.remnant.len(),
                            None => true,
                        };
                        if keep {
                            best = Some(err);
                        }
                    }
                    Err(other) => return Err(other),
                }
            }
            Err(best.expect("at least one dialect attempted").into())
        }
    }
}

fn parse_dialect(text: &str, dialect: TextDialect) -> Result<MoleculeInput, ParseError> {
    match dialect {
        TextDialect::Xyz => parse_xyz(text, true),
        TextDialect::XyzPlus => parse_xyz(text, false),
        TextDialect::Qcin => parse_qcin(text),
    }
}

/// Is `token` a parseable full nucleus label?
fn nucleus_token_ok(token: &str) -> bool {
    parse_nucleus_label(token).is_ok()
}

fn format_error(dialect: TextDialect, remnant: Vec<&str>) -> MoleculeFormatError {
    MoleculeFormatError {
        dialect: dialect.label().to_string(),
        remnant: remnant.join("\n"),
    }
}

fn parse_xyz(text: &str, strict: bool) -> Result<MoleculeInput, ParseError> {
    let dialect = if strict {
        TextDialect::Xyz
    } else {
        TextDialect::XyzPlus
    };
    let mut input = MoleculeInput {
        speclabel: true,
        units: LengthUnit::Angstrom,
        ..Default::default()
    };
    let mut labels: Vec<String> = Vec::new();
    let mut remnant: Vec<&str> = Vec::new();

    for (iln, raw) in text.lines().enumerate() {
        let line = raw.trim();
        match iln {
            0 => {
                let consumed = if strict {
                    line.chars().all(|c| c.is_ascii_digit()) && !line.is_empty()
                } else if let Some(caps) = xyz_count_regex().captures(line) {
                    if caps.name("ubohr").is_some() {
                        input.units = LengthUnit::Bohr;
                    }
                    true
                } else {
                    false
                };
                if !consumed && !line.is_empty() {
                    remnant.push(raw);
                }
            }
            1 => {
                // The comment line; the enhanced form may carry
                // charge/multiplicity at its head.
                if !strict {
                    if let Some(caps) = chgmult_prefix_regex().captures(line) {
                        input.molecular_charge =
                            Some(caps["chg"].parse().expect("charge matched NUMBER"));
                        input.molecular_multiplicity =
                            Some(caps["mult"].parse().expect("multiplicity matched digits"));
                    }
                }
            }
            _ => {
                let matched = atom_line_regex().captures(line).filter(|caps| {
                    let token = caps.name("nucleus").expect("captured").as_str();
                    if strict {
                        simple_nucleus_regex().is_match(token)
                    } else {
                        nucleus_token_ok(token)
                    }
                });
                match matched {
                    Some(caps) => {
                        labels.push(caps["nucleus"].to_string());
                        input.geometry.push(caps["x"].parse().expect("matched NUMBER"));
                        input.geometry.push(caps["y"].parse().expect("matched NUMBER"));
                        input.geometry.push(caps["z"].parse().expect("matched NUMBER"));
                    }
                    None => {
                        if !line.is_empty() {
                            remnant.push(raw);
                        }
                    }
                }
            }
        }
    }

    if !remnant.is_empty() {
        return Err(format_error(dialect, remnant).into());
    }
    input.labels = Some(labels);
    Ok(input)
}

fn parse_qcin(text: &str) -> Result<MoleculeInput, ParseError> {
    let mut input = MoleculeInput {
        speclabel: true,
        units: LengthUnit::Angstrom,
        ..Default::default()
    };

    // <<< pubchem substitution, before any tokenizing
    let mut expanded = String::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(caps) = pubchem_regex().captures(trimmed) {
            let query = caps["query"].trim();
            let result = pubchem::resolve(query)?;
            input.name = Some(format!("IUPAC {}", result.iupac_name));
            input.molecular_charge = Some(result.charge);
            expanded.push_str("units ang\n");
            for (symbol, x, y, z) in &result.atoms {
                expanded.push_str(&format!("{symbol} {x:.6} {y:.6} {z:.6}\n"));
            }
        } else {
            expanded.push_str(line);
            expanded.push('\n');
        }
    }

    // <<< universal directives, each honored once
    let mut kept: Vec<String> = Vec::new();
    let (mut com_found, mut orient_found, mut units_found) = (false, false, false);
    for line in expanded.lines() {
        let trimmed = line.trim();
        let lowered = trimmed.to_ascii_lowercase();
        if !com_found && (lowered == "no_com" || lowered == "nocom") {
            input.fix_com = Some(true);
            com_found = true;
            continue;
        }
        if !orient_found && (lowered == "no_reorient" || lowered == "noreorient") {
            input.fix_orientation = Some(true);
            orient_found = true;
            continue;
        }
        if !units_found {
            if let Some(caps) = units_regex().captures(trimmed) {
                input.units = if caps.name("ubohr").is_some() {
                    LengthUnit::Bohr
                } else {
                    LengthUnit::Angstrom
                };
                units_found = true;
                continue;
            }
        }
        kept.push(line.to_string());
    }

    // <<< `--`-demarcated fragment blocks
    let mut blocks: Vec<Vec<&str>> = vec![Vec::new()];
    for line in kept.iter().map(|l| l.trim()) {
        if line == "--" {
            blocks.push(Vec::new());
        } else if !line.is_empty() {
            blocks.last_mut().expect("nonempty").push(line);
        }
    }

    let mut labels: Vec<String> = Vec::new();
    let mut separators: Vec<usize> = Vec::new();
    let mut frag_charges: Vec<Option<f64>> = Vec::new();
    let mut frag_mults: Vec<Option<u32>> = Vec::new();
    let mut remnant: Vec<&str> = Vec::new();

    for (ifr, block) in blocks.iter().enumerate() {
        // A first block holding nothing but charge/multiplicity sets the
        // molecular totals rather than opening a fragment.
        if ifr == 0
            && block.len() == 1
            && let Some(caps) = chgmult_regex().captures(block[0])
        {
            input.molecular_charge = Some(caps["chg"].parse().expect("matched NUMBER"));
            input.molecular_multiplicity = Some(caps["mult"].parse().expect("matched digits"));
            continue;
        }
        if ifr == 0 && block.is_empty() {
            continue;
        }

        if !labels.is_empty() {
            separators.push(labels.len());
        }

        let mut cgmp_found = false;
        for line in block {
            if !cgmp_found
                && let Some(caps) = chgmult_regex().captures(line)
            {
                frag_charges.push(Some(caps["chg"].parse().expect("matched NUMBER")));
                frag_mults.push(Some(caps["mult"].parse().expect("matched digits")));
                cgmp_found = true;
                continue;
            }
            match atom_line_regex()
                .captures(line)
                .filter(|caps| nucleus_token_ok(caps.name("nucleus").expect("captured").as_str()))
            {
                Some(caps) => {
                    labels.push(caps["nucleus"].to_string());
                    input.geometry.push(caps["x"].parse().expect("matched NUMBER"));
                    input.geometry.push(caps["y"].parse().expect("matched NUMBER"));
                    input.geometry.push(caps["z"].parse().expect("matched NUMBER"));
                }
                None => remnant.push(line),
            }
        }
        if !cgmp_found {
            frag_charges.push(None);
            frag_mults.push(None);
        }
    }

    if !remnant.is_empty() {
        return Err(format_error(TextDialect::Qcin, remnant).into());
    }

    input.labels = Some(labels);
    input.fragment_separators = Some(separators);
    input.fragment_charges = Some(frag_charges);
    input.fragment_multiplicities = Some(frag_mults);
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_are_stripped_but_escapes_survive() {
        let text = "O 0 0 0 # oxygen\nH 1 0 0\\# tagged";
        let filtered = filter_comments(text);
        assert_eq!(filtered, "O 0 0 0 \nH 1 0 0\\# tagged");
    }

    #[test]
    fn strict_xyz_parses_count_comment_atoms() {
        let text = "3\nwater geometry\nO 0.0 0.0 -0.06\nH 0.0 -0.79 0.52\nH 0.0 0.79 0.52\n";
        let (input, dialect) = from_string(text, Some(TextDialect::Xyz)).unwrap();
        assert_eq!(dialect, TextDialect::Xyz);
        assert_eq!(input.labels.as_ref().unwrap().len(), 3);
        assert_eq!(input.geometry.len(), 9);
        assert_eq!(input.units, LengthUnit::Angstrom);
        assert!(input.molecular_charge.is_none());
    }

    #[test]
    fn strict_xyz_rejects_nucleus_extensions() {
        let text = "1\ncomment\nO18 0.0 0.0 0.0\n";
        let err = from_string(text, Some(TextDialect::Xyz)).unwrap_err();
        match err {
            ParseError::Format(e) => assert!(e.remnant.contains("O18")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn enhanced_xyz_takes_units_charge_and_labels() {
        let text = "2 au\n-1 2\nO18 0.0 0.0 0.0\n@H 1.0 0.0 0.0\n";
        let (input, _) = from_string(text, Some(TextDialect::XyzPlus)).unwrap();
        assert_eq!(input.units, LengthUnit::Bohr);
        assert_eq!(input.molecular_charge, Some(-1.0));
        assert_eq!(input.molecular_multiplicity, Some(2));
        assert_eq!(
            input.labels.as_deref().unwrap(),
            ["O18".to_string(), "@H".to_string()]
        );
    }

    #[test]
    fn qcin_parses_fragments_with_headers() {
        let text = "\
0 1
--
-1 1
O 0.0 0.0 0.0
H 0.0 0.0 0.97
--
1 1
Na 3.0 0.0 0.0
units ang
no_com
no_reorient
";
        let (input, dialect) = from_string(text, None).unwrap();
        assert_eq!(dialect, TextDialect::Qcin);
        assert_eq!(input.molecular_charge, Some(0.0));
        assert_eq!(input.fragment_separators.as_deref().unwrap(), [2]);
        assert_eq!(
            input.fragment_charges.as_deref().unwrap(),
            [Some(-1.0), Some(1.0)]
        );
        assert_eq!(input.fix_com, Some(true));
        assert_eq!(input.fix_orientation, Some(true));
        assert_eq!(input.units, LengthUnit::Angstrom);
    }

    #[test]
    fn qcin_leading_chgmult_without_separator_is_fragment_level() {
        let text = "0 1\nO 0.0 0.0 0.0\nH 0.0 0.0 0.97\nH 0.94 0.0 -0.24\n";
        let (input, _) = from_string(text, Some(TextDialect::Qcin)).unwrap();
        // The header shares a block with atoms, so it scopes to fragment 0.
        assert_eq!(input.molecular_charge, None);
        assert_eq!(input.fragment_charges.as_deref().unwrap(), [Some(0.0)]);
        assert_eq!(input.fragment_multiplicities.as_deref().unwrap(), [Some(1)]);
    }

    #[test]
    fn unconsumed_lines_are_reported_verbatim() {
        let text = "O 0.0 0.0 0.0\nbananas\n";
        let err = from_string(text, Some(TextDialect::Qcin)).unwrap_err();
        match err {
            ParseError::Format(e) => {
                assert_eq!(e.remnant, "bananas");
                assert_eq!(e.dialect, "qcin");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn automatic_detection_prefers_the_most_specific_error() {
        // Broken under every dialect; the error carrying the shortest
        // unconsumed remnant wins.
        let text = "O 0.0 0.0 0.0\nnot an atom line at all\n";
        let err = from_string(text, None).unwrap_err();
        match err {
            ParseError::Format(e) => {
                assert_eq!(e.dialect, "xyz");
                assert_eq!(e.remnant, "O 0.0 0.0 0.0");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn automatic_detection_picks_xyz_for_counted_files() {
        let text = "2\n\nH 0.0 0.0 0.0\nH 0.74 0.0 0.0\n";
        let (_, dialect) = from_string(text, None).unwrap();
        assert_eq!(dialect, TextDialect::Xyz);
    }

    #[test]
    fn exponent_coordinates_parse() {
        let text = "H 1.0e-3 -2.5E2 0.0\n";
        let (input, _) = from_string(text, Some(TextDialect::Qcin)).unwrap();
        assert_eq!(input.geometry, vec![1.0e-3, -250.0, 0.0]);
    }

    #[test]
    fn dialect_names_round_trip() {
        for d in TextDialect::ALL {
            assert_eq!(d.label().parse::<TextDialect>().unwrap(), d);
        }
        assert!("pdb".parse::<TextDialect>().is_err());
    }
}
