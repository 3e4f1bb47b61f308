use super::read_molecule;
use crate::cli::AlignArgs;
use crate::config::RunConfig;
use crate::error::Result;
use elemol::align::AlignOptions;
use tracing::info;

pub fn run(args: AlignArgs, config: &RunConfig) -> Result<()> {
    let concern = read_molecule(&args.input, config)?;
    let reference = read_molecule(&args.reference, config)?;

    let options = AlignOptions {
        atoms_map: args.atoms_map,
        run_mirror: args.run_mirror,
        generic_ghosts: args.generic_ghosts,
        max_iterations: config.align.max_iterations,
        convergence: config.align.convergence,
        ..Default::default()
    };

    info!(
        "Aligning {} onto {}",
        args.input.display(),
        args.reference.display()
    );
    let (aligned, report) = concern.align(&reference, &options)?;

    println!("RMSD [A]:             {:.8}", report.rmsd);
    println!("Max displacement [A]: {:.8}", report.max_displacement);
    println!("Mirror used:          {}", report.mill.mirror);
    println!("Atom map:             {:?}", report.mill.atommap);

    if let Some(path) = args.output {
        aligned.to_file(&path)?;
        info!("Wrote aligned structure to {}", path.display());
    }
    Ok(())
}
