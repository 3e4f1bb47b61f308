use super::read_molecule;
use crate::cli::InfoArgs;
use crate::config::RunConfig;
use crate::error::{CliError, Result};

pub fn run(args: InfoArgs, config: &RunConfig) -> Result<()> {
    let molecule = read_molecule(&args.input, config)?;
    let record = molecule.record();

    println!("Formula:       {}", molecule.get_molecular_formula());
    println!("Hash:          {}", molecule.get_hash());
    println!("Atoms:         {}", molecule.natom());
    println!("Fragments:     {}", record.fragments.len());
    println!("Charge:        {}", record.molecular_charge);
    println!("Multiplicity:  {}", record.molecular_multiplicity);
    println!("Electrons:     {}", molecule.nelectrons(None)?);
    println!(
        "NRE [Eh]:      {:.10}",
        molecule.nuclear_repulsion_energy(None)?
    );

    for spec in &args.measurements {
        let indices = parse_indices(spec)?;
        let value = molecule.measure(&indices, true)?;
        let kind = match indices.len() {
            2 => "distance [a0]",
            3 => "angle [deg]",
            _ => "dihedral [deg]",
        };
        println!("Measure {spec}: {value:.6} ({kind})");
    }

    println!();
    print!("{}", molecule.pretty_print());
    Ok(())
}

fn parse_indices(spec: &str) -> Result<Vec<usize>> {
    spec.split(',')
        .map(|tok| {
            tok.trim()
                .parse::<usize>()
                .map_err(|_| CliError::InvalidArgument(format!("bad atom index in '{spec}'")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_lists_parse_and_reject_garbage() {
        assert_eq!(parse_indices("0, 1,2").unwrap(), vec![0, 1, 2]);
        assert!(parse_indices("0,x").is_err());
    }
}
