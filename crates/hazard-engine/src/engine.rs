//! The tile-sequential hazard computation driver.

use tracing::{info, warn};

use hazard_common::{tile_grid, DomainGrid, Tile};
use windfield_store::{discover_sources, HazardStore, WindfieldSource};

use crate::assembler::HazardGridAssembler;
use crate::bootstrap::bootstrap_tile;
use crate::config::HazardConfig;
use crate::error::{EngineError, EngineResult};
use crate::fit::fit_tile;
use crate::loader::EnsembleLoader;

/// A configured hazard computation run.
///
/// Setup derives the computation domain from the first available
/// realization source clipped to the configured grid limit, opens the
/// full ensemble, and partitions the domain into tiles. `run` then
/// processes tiles strictly sequentially (cells within a tile run on
/// the rayon pool) and writes each completed tile into the hazard store.
#[derive(Debug)]
pub struct HazardEngine {
    config: HazardConfig,
    loader: EnsembleLoader,
    domain: DomainGrid,
    tiles: Vec<Tile>,
}

impl HazardEngine {
    /// Validate the configuration and set up a run.
    ///
    /// Fails before any tile is processed when the configuration is
    /// inconsistent, the grid limit misses the realization grid, or the
    /// ensemble comes up short.
    pub fn new(config: HazardConfig) -> EngineResult<Self> {
        if config.num_simulations == 0 {
            return Err(EngineError::Config("num_simulations must be non-zero".into()));
        }
        if config.return_periods.is_empty() {
            return Err(EngineError::Config("return_periods must not be empty".into()));
        }
        if config.min_records > config.num_simulations {
            return Err(EngineError::Config(format!(
                "min_records ({}) exceeds the ensemble size ({})",
                config.min_records, config.num_simulations
            )));
        }

        let paths = discover_sources(&config.input_path)?;
        let mut full_grid = None;
        for path in &paths {
            match WindfieldSource::open(path) {
                Ok(source) => {
                    full_grid = Some(source.domain_grid());
                    break;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable realization");
                }
            }
        }
        let full_grid = full_grid
            .ok_or_else(|| EngineError::NoSources(config.input_path.display().to_string()))?;

        let window = full_grid
            .clip(&config.grid_limit)
            .ok_or(EngineError::NoOverlap)?;
        let domain = full_grid.subgrid(&window);

        let loader = EnsembleLoader::discover(&config.input_path, config.num_simulations, window)?;
        let tiles = tile_grid(domain.nx(), domain.ny(), config.x_step, config.y_step);

        Ok(Self {
            config,
            loader,
            domain,
            tiles,
        })
    }

    /// The clipped computation domain.
    pub fn domain(&self) -> &DomainGrid {
        &self.domain
    }

    /// Number of tiles the domain was partitioned into.
    pub fn num_tiles(&self) -> usize {
        self.tiles.len()
    }

    /// Run the computation, logging progress at tile granularity.
    pub fn run(&self) -> EngineResult<()> {
        self.run_with_progress(|_| {})
    }

    /// Run the computation, reporting the completed fraction after each
    /// tile to `progress` in addition to the log events.
    pub fn run_with_progress<F: FnMut(f64)>(&self, mut progress: F) -> EngineResult<()> {
        info!(
            nsim = self.loader.nsim(),
            tiles = self.tiles.len(),
            ci = self.config.calculate_ci,
            "calculating return period wind speeds and GEV parameters"
        );

        let store = HazardStore::create(
            &self.config.output_path.join("hazard.zarr"),
            &self.domain.bbox(),
            self.domain.ny(),
            self.domain.nx(),
            &self.config.return_periods,
            self.config.nodata,
            self.config.calculate_ci,
            self.config.y_step,
            self.config.x_step,
        )?;
        let mut assembler = HazardGridAssembler::new(store, self.config.nodata);

        let seed = self.config.random_seed.unwrap_or_else(rand::random);
        let mut last_percent = 0;
        for (k, tile) in self.tiles.iter().enumerate() {
            let block = self.loader.load_tile(tile)?;
            let fit = fit_tile(&block, &self.config);
            let bounds = self
                .config
                .calculate_ci
                .then(|| bootstrap_tile(&block, &self.config, tile_seed(seed, k)));
            assembler.write_tile(tile, &fit, bounds.as_ref())?;

            let done = k + 1;
            progress(done as f64 / self.tiles.len() as f64);
            let percent = done * 100 / self.tiles.len() / 10 * 10;
            if percent != last_percent && percent < 100 {
                info!(percent, "calculating wind hazard");
                last_percent = percent;
            }
        }

        assembler.finalize()?;
        info!("calculating wind hazard: 100 percent complete");
        Ok(())
    }
}

fn tile_seed(seed: u64, tile_index: usize) -> u64 {
    seed.wrapping_add((tile_index as u64).wrapping_mul(0x517C_C1B7_2722_0A95))
}
