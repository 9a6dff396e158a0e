use crate::model::{LayerId, OverrideId};
use thiserror::Error;

/// Plafond par défaut du nombre de blocs générés pour une layer.
pub const DEFAULT_MAX_BLOCKS_PER_LAYER: usize = 10_000;

/// Portée des overrides vis-à-vis des layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverrideScope {
    /// Un override remplace la couverture de toutes les layers actives.
    #[default]
    AllLayers,
    /// Seule la première layer du schedule est remplacée.
    PrimaryLayer,
}

/// Options de composition
#[derive(Debug, Clone, Copy)]
pub struct ComposeOptions {
    pub max_blocks_per_layer: usize,
    pub override_scope: OverrideScope,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            max_blocks_per_layer: DEFAULT_MAX_BLOCKS_PER_LAYER,
            override_scope: OverrideScope::default(),
        }
    }
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("invalid time range: end must be after start")]
    InvalidTimeRange,
    #[error("invalid window: window end must be after window start")]
    InvalidWindow,
    #[error("invalid rotation length for layer {0}: must be > 0 hours")]
    InvalidRotationLength(LayerId),
    #[error("invalid override {0}: end must be after start")]
    InvalidOverride(OverrideId),
    #[error("unknown time zone: {0}")]
    InvalidTimeZone(String),
    #[error("invalid local date/time: {0}")]
    InvalidLocalTime(String),
    #[error("layer {layer} would produce ~{estimated} blocks (max {max}); narrow the window")]
    TooManyBlocks {
        layer: LayerId,
        estimated: u64,
        max: usize,
    },
    #[error("unknown layer: {0}")]
    UnknownLayer(String),
    #[error("unknown user: {0}")]
    UnknownUser(String),
    #[error("unknown override: {0}")]
    UnknownOverride(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
