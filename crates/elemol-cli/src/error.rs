use elemol::core::models::MoleculeError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Molecule(#[from] MoleculeError),

    #[error("failed to read config file {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
