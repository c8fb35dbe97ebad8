//! Dashboard session: selection state, display buffers, trigger.
//!
//! The session is the single writer of all selection and display state.
//! Views read through it; edits and computations go through it. That one
//! rule is what makes the atomic-swap and whole-frame-publish guarantees
//! hold without any further locking in the views.

use crate::catalog::{ActiveSelection, EstimatorHandle, StageHandle, VariantCatalog};
use crate::display::{MapFrame, SourceMapBuffer, SpectrumBuffer, SpectrumFrame};
use crate::error::PipelineResult;
use crate::registry::PipelineRegistry;
use crate::sector::{Sector, SectorSet};
use crate::trigger::{ComputeTrigger, MapRequest, compute_frame};
use bf_acoustics::{Band, read_lock, write_lock};
use bf_core::{ParamSpec, ParamValue};

/// Map-level display settings (what the trigger computes).
#[derive(Debug, Clone, Copy)]
pub struct MapSettings {
    pub freq: f64,
    pub band: Band,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            freq: 4000.0,
            band: Band::ThirdOctave,
        }
    }
}

pub struct Session {
    registry: PipelineRegistry,
    catalog: VariantCatalog,
    active: ActiveSelection,
    groups: Vec<(String, Option<StageHandle>)>,
    selected_group: usize,
    settings: MapSettings,
    trigger: ComputeTrigger,
    map_buffer: SourceMapBuffer,
    spectrum_buffer: SpectrumBuffer,
    sectors: SectorSet,
}

impl Session {
    pub fn new(registry: PipelineRegistry) -> Self {
        let catalog = registry.standard_catalog();
        let active = ActiveSelection::from_entry(catalog.first());
        let groups = registry.settings_groups();
        Self {
            registry,
            catalog,
            active,
            groups,
            selected_group: 0,
            settings: MapSettings::default(),
            trigger: ComputeTrigger::default(),
            map_buffer: SourceMapBuffer::default(),
            spectrum_buffer: SpectrumBuffer::default(),
            sectors: SectorSet::default(),
        }
    }

    pub fn registry(&self) -> &PipelineRegistry {
        &self.registry
    }

    // --- beamformer selection -------------------------------------------

    pub fn beamformer_names(&self) -> Vec<String> {
        self.catalog.names()
    }

    pub fn active_name(&self) -> &str {
        &self.active.name
    }

    /// Swap the active beamformer. The stage and its control set are
    /// replaced together; reselecting the current name is a no-op.
    /// Panics on a name outside the catalog: selectors are built from
    /// `beamformer_names`, an unknown name is a caller bug.
    pub fn select_beamformer(&mut self, name: &str) {
        let entry = self
            .catalog
            .get(name)
            .unwrap_or_else(|| panic!("unknown beamformer variant {name:?}"));
        self.active = ActiveSelection::from_entry(entry);
        tracing::debug!(variant = name, "beamformer selected");
    }

    // --- settings groups ------------------------------------------------

    pub fn group_names(&self) -> Vec<String> {
        self.groups.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn selected_group_name(&self) -> &str {
        &self.groups[self.selected_group].0
    }

    /// Panics on an unknown group name, same contract as
    /// [`Session::select_beamformer`].
    pub fn select_group(&mut self, name: &str) {
        self.selected_group = self
            .groups
            .iter()
            .position(|(n, _)| n == name)
            .unwrap_or_else(|| panic!("unknown settings group {name:?}"));
    }

    /// The stage behind the selected group. The method group resolves to
    /// whichever beamformer is active right now, so the settings panel
    /// always tracks the selector.
    fn selected_stage(&self) -> SelectedStage<'_> {
        match &self.groups[self.selected_group].1 {
            Some(stage) => SelectedStage::Fixed(stage),
            None => SelectedStage::ActiveBeamformer(&self.active.stage),
        }
    }

    pub fn visible_controls(&self) -> Vec<ParamSpec> {
        match self.selected_stage() {
            SelectedStage::Fixed(stage) => read_lock(stage).param_specs(),
            SelectedStage::ActiveBeamformer(_) => self.active.controls.clone(),
        }
    }

    pub fn visible_param(&self, name: &str) -> PipelineResult<ParamValue> {
        let value = match self.selected_stage() {
            SelectedStage::Fixed(stage) => read_lock(stage).param(name)?,
            SelectedStage::ActiveBeamformer(stage) => read_lock(stage).param(name)?,
        };
        Ok(value)
    }

    pub fn set_visible_param(&mut self, name: &str, value: ParamValue) -> PipelineResult<()> {
        match self.selected_stage() {
            SelectedStage::Fixed(stage) => write_lock(stage).set_param(name, value)?,
            SelectedStage::ActiveBeamformer(stage) => write_lock(stage).set_param(name, value)?,
        }
        Ok(())
    }

    // --- map settings and trigger ---------------------------------------

    pub fn map_settings(&self) -> MapSettings {
        self.settings
    }

    pub fn set_frequency(&mut self, freq: f64) {
        self.settings.freq = freq;
    }

    pub fn set_band(&mut self, band: Band) {
        self.settings.band = band;
    }

    pub fn is_computing(&self) -> bool {
        self.trigger.in_flight()
    }

    /// Claim the trigger and capture the computation inputs. The caller
    /// runs [`compute_frame`] (typically on a worker thread) and hands the
    /// result back through [`Session::complete_compute`].
    pub fn begin_compute(&mut self) -> PipelineResult<(EstimatorHandle, MapRequest)> {
        self.trigger.try_begin()?;
        let request = MapRequest {
            freq: self.settings.freq,
            band: self.settings.band,
        };
        Ok((std::sync::Arc::clone(&self.active.stage), request))
    }

    /// Release the trigger and publish the frame. On an error the display
    /// buffers are left exactly as they were.
    pub fn complete_compute(&mut self, result: PipelineResult<MapFrame>) -> PipelineResult<()> {
        self.trigger.finish();
        let frame = result?;
        self.map_buffer.publish(frame);
        self.refresh_spectrum()
    }

    /// Synchronous trigger: compute on the calling thread and publish.
    pub fn calculate(&mut self) -> PipelineResult<()> {
        let (stage, request) = self.begin_compute()?;
        let result = compute_frame(&stage, request);
        self.complete_compute(result)
    }

    // --- display buffers ------------------------------------------------

    pub fn map_frame(&self) -> Option<&MapFrame> {
        self.map_buffer.frame()
    }

    pub fn map_generation(&self) -> u64 {
        self.map_buffer.generation()
    }

    pub fn spectrum(&self) -> &SpectrumFrame {
        self.spectrum_buffer.frame()
    }

    pub fn spectrum_generation(&self) -> u64 {
        self.spectrum_buffer.generation()
    }

    // --- sectors --------------------------------------------------------

    pub fn sectors(&self) -> &SectorSet {
        &self.sectors
    }

    /// Add a sector and rebuild the sector spectra. Fails without side
    /// effects when the palette is exhausted.
    pub fn add_sector(&mut self, sector: Sector) -> PipelineResult<()> {
        self.sectors.add(sector)?;
        self.refresh_spectrum()
    }

    pub fn remove_last_sector(&mut self) -> PipelineResult<Option<Sector>> {
        let removed = self.sectors.remove_last();
        if removed.is_some() {
            self.refresh_spectrum()?;
        }
        Ok(removed)
    }

    /// Rebuild the spectrum display from the current sector set through
    /// the active beamformer. An empty set hides the display instead of
    /// clearing it; an integration error leaves the buffer untouched.
    fn refresh_spectrum(&mut self) -> PipelineResult<()> {
        if self.sectors.is_empty() {
            self.spectrum_buffer.hide();
            return Ok(());
        }
        let frame = self.sectors.build_spectrum(&self.active.stage)?;
        tracing::debug!(sectors = frame.series.len(), "sector spectra rebuilt");
        self.spectrum_buffer.publish(frame.series);
        Ok(())
    }
}

enum SelectedStage<'a> {
    Fixed(&'a StageHandle),
    ActiveBeamformer(&'a EstimatorHandle),
}
