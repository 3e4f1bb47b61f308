use crate::error::{CliError, Result};
use elemol::parse::CanonicalizeOptions;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Run-control file: canonicalization and alignment knobs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default)]
    pub canonicalize: CanonicalizeConfig,
    #[serde(default)]
    pub align: AlignConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CanonicalizeConfig {
    pub geometry_noise: u32,
    pub tooclose: f64,
    pub mass_tol: f64,
    pub nonphysical: bool,
    pub zero_ghost_fragments: bool,
}

impl Default for CanonicalizeConfig {
    fn default() -> Self {
        let defaults = CanonicalizeOptions::default();
        Self {
            geometry_noise: defaults.geometry_noise,
            tooclose: defaults.tooclose,
            mass_tol: defaults.mass_tol,
            nonphysical: defaults.nonphysical,
            zero_ghost_fragments: defaults.zero_ghost_fragments,
        }
    }
}

impl CanonicalizeConfig {
    pub fn to_options(&self) -> CanonicalizeOptions {
        CanonicalizeOptions {
            geometry_noise: self.geometry_noise,
            tooclose: self.tooclose,
            mass_tol: self.mass_tol,
            nonphysical: self.nonphysical,
            zero_ghost_fragments: self.zero_ghost_fragments,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AlignConfig {
    pub max_iterations: usize,
    pub convergence: f64,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            max_iterations: 30,
            convergence: 1.0e-10,
        }
    }
}

/// Loads the run-control file, or defaults when none is given.
pub fn load(path: Option<&Path>) -> Result<RunConfig> {
    let Some(path) = path else {
        return Ok(RunConfig::default());
    };
    info!("Loading run-control file from {}", path.display());
    let contents = std::fs::read_to_string(path)?;
    toml::from_str(&contents).map_err(|e| CliError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let config = load(None).unwrap();
        assert_eq!(config.canonicalize.geometry_noise, 8);
        assert_eq!(config.align.max_iterations, 30);
    }

    #[test]
    fn partial_config_overrides_only_named_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("elemol.toml");
        std::fs::write(&path, "[canonicalize]\ngeometry_noise = 6\n").unwrap();
        let config = load(Some(&path)).unwrap();
        assert_eq!(config.canonicalize.geometry_noise, 6);
        assert_eq!(config.canonicalize.tooclose, 0.1);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("elemol.toml");
        std::fs::write(&path, "[canonicalize]\nnoise = 6\n").unwrap();
        assert!(matches!(
            load(Some(&path)),
            Err(CliError::Config { .. })
        ));
    }
}
