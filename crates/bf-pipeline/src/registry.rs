//! Pipeline registry: builds the fixed stage graph from a config.

use crate::catalog::{EstimatorHandle, StageHandle, VariantCatalog, VariantEntry};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use bf_acoustics::{
    Calib, CaponBeamformer, ConventionalBeamformer, EigBeamformer, Environment, FocusGrid,
    FunctionalBeamformer, MicArray, MusicBeamformer, Overlap, PowerSpectra, Shared,
    SourceEstimator, SteeringVector, TimeRecords, read_lock, share,
};
use bf_core::Configurable;
use std::sync::{Arc, RwLock};

/// Owns every stage of the processing graph. Construction is
/// all-or-nothing: any unreadable input file fails the whole build and no
/// partial pipeline escapes.
pub struct PipelineRegistry {
    time: Shared<TimeRecords>,
    calib: Option<Shared<Calib>>,
    mics: Shared<MicArray>,
    env: Shared<Environment>,
    grid: Shared<FocusGrid>,
    freq_data: Shared<PowerSpectra>,
    steer: Shared<SteeringVector>,
}

impl PipelineRegistry {
    pub fn build(config: &PipelineConfig) -> PipelineResult<Self> {
        let mut time = TimeRecords::from_wav(&config.time_data)?;
        time.set_mask(config.start, config.stop);
        time.set_invalid_channels(config.invalid_channels.clone());

        let mics = MicArray::from_file(&config.geometry, config.invalid_channels.clone())?;
        if mics.num_channels() != time.num_channels() {
            return Err(PipelineError::Config {
                message: format!(
                    "geometry has {} channels but the recording has {}",
                    mics.num_channels(),
                    time.num_channels()
                ),
            });
        }

        let calib = match &config.calibration {
            Some(path) => {
                let calib = Calib::from_file(path)?;
                if calib.num_channels() != time.num_channels() {
                    return Err(PipelineError::Config {
                        message: format!(
                            "calibration has {} factors but the recording has {} channels",
                            calib.num_channels(),
                            time.num_channels()
                        ),
                    });
                }
                let calib = share(calib);
                time.set_calib(Arc::clone(&calib));
                Some(calib)
            }
            None => None,
        };

        let g = &config.grid;
        let grid = FocusGrid::new(g.x_min, g.x_max, g.y_min, g.y_max, g.z, g.increment);
        tracing::info!(
            recording = %config.time_data.display(),
            channels = mics.num_channels(),
            "pipeline built"
        );
        Ok(Self::from_stages(
            time,
            calib,
            mics,
            Environment::new(config.speed_of_sound),
            grid,
            config.block_size,
        ))
    }

    /// Assemble a registry from already-constructed stages. `build` is a
    /// thin file-loading wrapper around this.
    pub fn from_stages(
        time: TimeRecords,
        calib: Option<Shared<Calib>>,
        mics: MicArray,
        env: Environment,
        grid: FocusGrid,
        block_size: usize,
    ) -> Self {
        let time = share(time);
        let mics = share(mics);
        let env = share(env);
        let grid = share(grid);
        let freq_data = share(PowerSpectra::new(Arc::clone(&time), block_size, Overlap::Half));
        let steer = share(SteeringVector::new(
            Arc::clone(&grid),
            Arc::clone(&mics),
            Arc::clone(&env),
        ));
        Self {
            time,
            calib,
            mics,
            env,
            grid,
            freq_data,
            steer,
        }
    }

    /// The selectable beamformer variants, sharing this registry's
    /// spectral estimator and steering vector.
    pub fn standard_catalog(&self) -> VariantCatalog {
        fn entry<E>(name: &str, stage: E) -> VariantEntry
        where
            E: SourceEstimator + 'static,
        {
            let controls = stage.param_specs();
            VariantEntry {
                name: name.to_string(),
                stage: Arc::new(RwLock::new(stage)) as EstimatorHandle,
                controls,
            }
        }
        let fd = || Arc::clone(&self.freq_data);
        let st = || Arc::clone(&self.steer);
        // eigenvalue beamforming defaults to all but the two weakest components
        let eig_n = read_lock(&self.mics).num_operative().saturating_sub(2).max(1);
        VariantCatalog::new(vec![
            entry(
                "Conventional Beamforming",
                ConventionalBeamformer::new(fd(), st()),
            ),
            entry(
                "Functional Beamforming",
                FunctionalBeamformer::new(fd(), st(), 4.0),
            ),
            entry("Capon Beamforming", CaponBeamformer::new(fd(), st())),
            entry(
                "Eigenvalue Beamforming",
                EigBeamformer::new(fd(), st(), eig_n),
            ),
            entry("Music Beamforming", MusicBeamformer::new(fd(), st(), 6)),
        ])
    }

    /// Settings groups in display order. `None` marks the group whose
    /// stage is whichever beamformer is currently selected.
    pub fn settings_groups(&self) -> Vec<(String, Option<StageHandle>)> {
        fn stage<T>(handle: &Shared<T>) -> Option<StageHandle>
        where
            T: Configurable + Send + Sync + 'static,
        {
            Some(Arc::clone(handle) as StageHandle)
        }
        let mut groups = vec![
            ("Time Data".to_string(), stage(&self.time)),
            ("Microphone Geometry".to_string(), stage(&self.mics)),
            ("Environment".to_string(), stage(&self.env)),
        ];
        if let Some(calib) = &self.calib {
            groups.push(("Calibration".to_string(), stage(calib)));
        }
        groups.push(("FFT/CSM".to_string(), stage(&self.freq_data)));
        groups.push(("Focus Grid".to_string(), stage(&self.grid)));
        groups.push(("Steering Vector".to_string(), stage(&self.steer)));
        groups.push(("Beamforming Method".to_string(), None));
        groups
    }

    pub fn time(&self) -> &Shared<TimeRecords> {
        &self.time
    }

    pub fn freq_data(&self) -> &Shared<PowerSpectra> {
        &self.freq_data
    }

    pub fn grid(&self) -> &Shared<FocusGrid> {
        &self.grid
    }

    pub fn steer(&self) -> &Shared<SteeringVector> {
        &self.steer
    }
}
