use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "The Elemol Developers",
    version,
    about = "Elemol CLI - parse, canonicalize, inspect, convert, and align molecular structures.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to a run-control file in TOML format
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Canonicalize a molecule and render it into another dialect.
    Convert(ConvertArgs),
    /// Show derived properties: formula, hash, charge, electron count.
    Info(InfoArgs),
    /// Align one structure onto a reference and report the RMSD.
    Align(AlignArgs),
}

/// Arguments for the `convert` subcommand.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Path to the input molecule file (xyz, qcin, or json).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the output file; stdout when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Output dialect (xyz, qcin, nwchem, orca); inferred from the output
    /// extension when omitted.
    #[arg(short, long, value_name = "NAME")]
    pub to: Option<String>,

    /// Output units for the coordinates.
    #[arg(long, value_name = "bohr|angstrom")]
    pub units: Option<String>,
}

/// Arguments for the `info` subcommand.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Path to the input molecule file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Also measure distances/angles/dihedrals over these 0-indexed atom
    /// index lists, e.g. -m 0,1 -m 0,1,2,3.
    #[arg(short, long = "measure", value_name = "I,J[,K[,L]]")]
    pub measurements: Vec<String>,
}

/// Arguments for the `align` subcommand.
#[derive(Args, Debug)]
pub struct AlignArgs {
    /// Path to the structure to be shifted, rotated, and reordered.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to the reference structure.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub reference: PathBuf,

    /// Path for the aligned structure; skipped when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Also consider the mirror image of the input structure.
    #[arg(long)]
    pub run_mirror: bool,

    /// Match ghost atoms as a wildcard class instead of by element.
    #[arg(long)]
    pub generic_ghosts: bool,

    /// Atom order already corresponds; skip the permutation search.
    #[arg(long)]
    pub atoms_map: bool,
}
