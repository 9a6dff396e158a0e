mod compose;
mod overrides;
mod rotation;
mod types;
mod util;

pub use compose::sort_blocks;
pub use overrides::{application_order, override_targets_layer};
pub use types::{ComposeOptions, OverrideScope, SchedError, DEFAULT_MAX_BLOCKS_PER_LAYER};
pub(crate) use util::window as checked_window;

use crate::model::{Layer, Override, Schedule, ScheduleBlock};
use chrono::{DateTime, Utc};

/// ScheduleComposer : calcule les blocs d'astreinte d'une fenêtre, sans état.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScheduleComposer {
    opts: ComposeOptions,
}

impl ScheduleComposer {
    pub fn new() -> Self {
        Self {
            opts: ComposeOptions::default(),
        }
    }

    pub fn with_options(opts: ComposeOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &ComposeOptions {
        &self.opts
    }

    /// Blocs de rotation d'une seule layer, avant overrides.
    pub fn resolve(
        &self,
        layer: &Layer,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<ScheduleBlock>, SchedError> {
        rotation::resolve(layer, window_start, window_end, &self.opts)
    }

    /// Applique les overrides aux blocs de chaque layer (un vecteur par layer,
    /// dans l'ordre du schedule).
    pub fn clip<'a, I>(
        &self,
        blocks_by_layer: Vec<Vec<ScheduleBlock>>,
        overrides: I,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<ScheduleBlock>, SchedError>
    where
        I: IntoIterator<Item = &'a Override>,
    {
        overrides::clip(
            blocks_by_layer,
            overrides,
            window_start,
            window_end,
            self.opts.override_scope,
        )
    }

    /// Liste finale triée des blocs du schedule sur la fenêtre.
    pub fn compose(
        &self,
        schedule: &Schedule,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<ScheduleBlock>, SchedError> {
        compose::compose(schedule, window_start, window_end, &self.opts)
    }
}

/// Raccourci : `ScheduleComposer::new().resolve(..)`.
pub fn resolve(
    layer: &Layer,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<Vec<ScheduleBlock>, SchedError> {
    ScheduleComposer::new().resolve(layer, window_start, window_end)
}

/// Raccourci : `ScheduleComposer::new().compose(..)`.
pub fn compose(
    schedule: &Schedule,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<Vec<ScheduleBlock>, SchedError> {
    ScheduleComposer::new().compose(schedule, window_start, window_end)
}
