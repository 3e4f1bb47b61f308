//! Periodic-table index: alias-keyed lookups over compiled-in NIST data.

mod index;
pub mod table;

pub use index::{
    ElementInfo, NotAnElementError, element_from_z, isotope_mass, lookup, mass_number_range,
    mass_range, most_common_a, to_mass, to_name, to_symbol, to_z,
};
