//! Construction provenance stamped onto every canonical record.

use serde::{Deserialize, Serialize};

/// Who built a record: creating program, its version, and the routine.
/// Stamped at construction and never mutated afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub creator: String,
    pub version: String,
    pub routine: String,
}

/// Provenance for a record built by this library's `routine`.
pub fn provenance_stamp(routine: &str) -> Provenance {
    Provenance {
        creator: "Elemol".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        routine: routine.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_carries_crate_version_and_routine() {
        let prov = provenance_stamp("elemol.parse.from_input");
        assert_eq!(prov.creator, "Elemol");
        assert_eq!(prov.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(prov.routine, "elemol.parse.from_input");
    }
}
