//! Physical constants consumed by the core (CODATA 2014).
//!
//! Only the length-unit conversions the canonicalizer needs live here; full
//! physical-constant contexts are the domain of downstream consumers.

/// Bohr radius in Angstrom (CODATA 2014).
pub const BOHR_TO_ANGSTROM: f64 = 0.529_177_210_67;

/// Angstrom per Bohr, inverse of [`BOHR_TO_ANGSTROM`].
pub const ANGSTROM_TO_BOHR: f64 = 1.0 / BOHR_TO_ANGSTROM;

/// Geometry units recognized on molecule input and output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LengthUnit {
    /// Atomic units of length (the canonical internal unit).
    Bohr,
    /// Angstrom, the conventional input unit.
    #[default]
    Angstrom,
}

impl LengthUnit {
    /// Parses a unit token as it appears in molecule text (`units ang`,
    /// `units bohr`, ...). Returns `None` for unrecognized tokens so the
    /// caller can raise its own diagnostic naming the offending value.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "bohr" | "au" | "a.u." => Some(LengthUnit::Bohr),
            "ang" | "angstrom" | "angstroms" => Some(LengthUnit::Angstrom),
            _ => None,
        }
    }

    /// Conversion factor from this unit into Bohr.
    pub fn to_bohr(self) -> f64 {
        match self {
            LengthUnit::Bohr => 1.0,
            LengthUnit::Angstrom => ANGSTROM_TO_BOHR,
        }
    }

    /// Conversion factor from Bohr into this unit.
    pub fn from_bohr(self) -> f64 {
        match self {
            LengthUnit::Bohr => 1.0,
            LengthUnit::Angstrom => BOHR_TO_ANGSTROM,
        }
    }

    /// Canonical spelling used when a record is rendered back to text.
    pub fn label(self) -> &'static str {
        match self {
            LengthUnit::Bohr => "Bohr",
            LengthUnit::Angstrom => "Angstrom",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_tokens_parse_case_insensitively() {
        assert_eq!(LengthUnit::from_token("BOHR"), Some(LengthUnit::Bohr));
        assert_eq!(LengthUnit::from_token("au"), Some(LengthUnit::Bohr));
        assert_eq!(LengthUnit::from_token("Ang"), Some(LengthUnit::Angstrom));
        assert_eq!(
            LengthUnit::from_token("angstrom"),
            Some(LengthUnit::Angstrom)
        );
        assert_eq!(LengthUnit::from_token("parsec"), None);
    }

    #[test]
    fn round_trip_factors_are_inverse() {
        let unit = LengthUnit::Angstrom;
        let x = 1.234_567_9;
        let back = x * unit.to_bohr() * unit.from_bohr();
        assert!((back - x).abs() < 1e-14);
    }
}
