//! Engine configuration surface.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use hazard_common::BoundingBox;

/// Configuration for a hazard computation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardConfig {
    /// Geographic extent of the hazard computation.
    pub grid_limit: BoundingBox,

    /// Number of simulated realizations in the ensemble.
    pub num_simulations: usize,

    /// Return periods to evaluate, in years.
    pub return_periods: Vec<f64>,

    /// Minimum count of storm-affected observations a cell needs before
    /// a distribution fit is attempted.
    #[serde(default = "default_min_records")]
    pub min_records: usize,

    /// Years of record represented by each realization.
    #[serde(default = "default_years_per_sim")]
    pub years_per_simulation: f64,

    /// Estimate confidence bounds on the return-period wind speeds.
    #[serde(default)]
    pub calculate_ci: bool,

    /// Bootstrap resamples per cell when confidence bounds are enabled.
    #[serde(default = "default_resamples")]
    pub bootstrap_resamples: usize,

    /// Tile width, in cells.
    #[serde(default = "default_tile_step")]
    pub x_step: usize,

    /// Tile height, in cells.
    #[serde(default = "default_tile_step")]
    pub y_step: usize,

    /// Missing-data sentinel used throughout the output store.
    #[serde(default = "default_nodata")]
    pub nodata: f32,

    /// Directory holding the windfield realization stores.
    pub input_path: PathBuf,

    /// Directory the hazard store is written into.
    pub output_path: PathBuf,

    /// Seed for bootstrap resampling; a random seed is drawn when unset.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

fn default_min_records() -> usize {
    50
}

fn default_years_per_sim() -> f64 {
    10.0
}

fn default_resamples() -> usize {
    200
}

fn default_tile_step() -> usize {
    20
}

fn default_nodata() -> f32 {
    -9999.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let yaml = r#"
grid_limit: { min_x: 150.0, min_y: -25.0, max_x: 155.0, max_y: -20.0 }
num_simulations: 500
return_periods: [50.0, 100.0, 500.0]
input_path: /data/windfield
output_path: /data/hazard
"#;
        let config: HazardConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.min_records, 50);
        assert_eq!(config.years_per_simulation, 10.0);
        assert!(!config.calculate_ci);
        assert_eq!(config.bootstrap_resamples, 200);
        assert_eq!(config.x_step, 20);
        assert_eq!(config.y_step, 20);
        assert_eq!(config.nodata, -9999.0);
        assert_eq!(config.random_seed, None);
    }
}
