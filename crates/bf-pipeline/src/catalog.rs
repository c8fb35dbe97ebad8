//! Variant catalog and active selection.

use bf_acoustics::SourceEstimator;
use bf_core::{Configurable, ParamSpec};
use std::sync::{Arc, RwLock};

/// Shared handle to a beamformer variant.
pub type EstimatorHandle = Arc<RwLock<dyn SourceEstimator>>;

/// Shared handle to any configurable stage.
pub type StageHandle = Arc<RwLock<dyn Configurable + Send + Sync>>;

/// One selectable pipeline variant: display name, the stage to activate,
/// and the control set shown while it is active.
pub struct VariantEntry {
    pub name: String,
    pub stage: EstimatorHandle,
    pub controls: Vec<ParamSpec>,
}

/// Ordered name -> variant mapping. Names are unique; order is the order
/// shown in the selector.
pub struct VariantCatalog {
    entries: Vec<VariantEntry>,
}

impl VariantCatalog {
    /// Panics on duplicate names: catalogs are statically constructed, a
    /// duplicate is a bug in the registry, not a runtime condition.
    pub fn new(entries: Vec<VariantEntry>) -> Self {
        for (i, entry) in entries.iter().enumerate() {
            assert!(
                !entries[..i].iter().any(|e| e.name == entry.name),
                "duplicate variant name {:?}",
                entry.name
            );
        }
        assert!(!entries.is_empty(), "variant catalog must not be empty");
        Self { entries }
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&VariantEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn first(&self) -> &VariantEntry {
        &self.entries[0]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The currently active variant. Replaced wholesale on every selection
/// change, so the stage and its visible controls can never disagree.
#[derive(Clone)]
pub struct ActiveSelection {
    pub name: String,
    pub stage: EstimatorHandle,
    pub controls: Vec<ParamSpec>,
}

impl ActiveSelection {
    pub fn from_entry(entry: &VariantEntry) -> Self {
        Self {
            name: entry.name.clone(),
            stage: Arc::clone(&entry.stage),
            controls: entry.controls.clone(),
        }
    }
}
