use super::{overrides, rotation, util, ComposeOptions, SchedError};
use crate::model::{Schedule, ScheduleBlock};
use chrono::{DateTime, Utc};
use tracing::debug;

pub(super) fn compose(
    schedule: &Schedule,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    opts: &ComposeOptions,
) -> Result<Vec<ScheduleBlock>, SchedError> {
    let window = util::window(window_start, window_end)?;
    if schedule.layers.is_empty() {
        return Ok(Vec::new());
    }

    // les overrides invalides échouent même hors fenêtre
    for over in &schedule.overrides {
        over.validate()?;
    }

    let per_layer = schedule
        .layers
        .iter()
        .map(|layer| rotation::resolve(layer, window_start, window_end, opts))
        .collect::<Result<Vec<_>, _>>()?;

    let active = schedule.overrides_within(&window);
    let mut blocks = overrides::clip(
        per_layer,
        active,
        window_start,
        window_end,
        opts.override_scope,
    )?;
    sort_blocks(&mut blocks);

    debug!(
        schedule = %schedule.id,
        layers = schedule.layers.len(),
        blocks = blocks.len(),
        "schedule composed"
    );
    Ok(blocks)
}

/// Tri de sortie : début croissant, puis nom de layer (puis id pour la stabilité).
pub fn sort_blocks(blocks: &mut [ScheduleBlock]) {
    blocks.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| a.layer_name.cmp(&b.layer_name))
            .then_with(|| a.layer_id.cmp(&b.layer_id))
    });
}
