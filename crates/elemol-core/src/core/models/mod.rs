pub mod molecule;
pub mod provenance;
pub mod record;

pub use molecule::{Molecule, MoleculeError, MoleculeUpdate};
pub use provenance::{Provenance, provenance_stamp};
pub use record::MolRecord;
