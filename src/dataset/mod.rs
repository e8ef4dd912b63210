//! Historical Dataset
//!
//! Read-only training records, loaded once at startup and shared as
//! `Arc<TrainingSet>`. A target without a configured (or readable) file gets
//! an empty set; the training-data lookup then contributes nothing.

mod training;

pub use training::{DatasetInfo, TrainingRecord, TrainingSet};

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::config::DatasetConfig;
use crate::types::TargetProperty;

#[derive(Debug, Error)]
pub enum DatasetError {
    /// `origin` is a file path or a caller-supplied label for in-memory input.
    #[error("Failed to read dataset {origin}: {source}")]
    Io {
        origin: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Dataset is empty: {0}")]
    Empty(String),
    #[error("Dataset columns: {0}")]
    MissingColumns(String),
}

/// One training set per target property.
#[derive(Debug, Clone, Default)]
pub struct DatasetStore {
    sets: HashMap<TargetProperty, Arc<TrainingSet>>,
}

impl DatasetStore {
    /// Load every configured dataset. Failures degrade to an empty set.
    pub fn from_config(config: &DatasetConfig) -> Self {
        let mut store = Self::default();
        for target in TargetProperty::ALL {
            let Some(path) = config.path_for(target) else {
                continue;
            };
            if !path.exists() {
                warn!(property = %target, path = %path.display(), "Training data file not found, lookup disabled");
                continue;
            }
            match TrainingSet::load_csv(path) {
                Ok(set) => store.insert(target, set),
                Err(e) => warn!(property = %target, error = %e, "Failed to load training data, lookup disabled"),
            }
        }
        store
    }

    pub fn insert(&mut self, target: TargetProperty, set: TrainingSet) {
        self.sets.insert(target, Arc::new(set));
    }

    /// Training set for `target` (empty when none was loaded).
    pub fn get(&self, target: TargetProperty) -> Arc<TrainingSet> {
        self.sets
            .get(&target)
            .cloned()
            .unwrap_or_else(|| Arc::new(TrainingSet::empty()))
    }

    /// Record counts per loaded target, for `info`.
    pub fn summary(&self) -> Vec<(TargetProperty, usize)> {
        TargetProperty::ALL
            .iter()
            .map(|&t| (t, self.sets.get(&t).map_or(0, |s| s.len())))
            .collect()
    }
}
