use super::{util, ComposeOptions, SchedError};
use crate::model::{BlockSource, Layer, ScheduleBlock};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, trace, warn};

/// Blocs de rotation d'une layer sur `[window_start, window_end)`.
///
/// L'index de rotation est ancré sur `layer.start` en instants absolus : une
/// rotation de 24h avance toujours de 24h réelles, y compris à travers un
/// changement d'heure. La séquence ne dépend donc pas de la fenêtre demandée.
pub(super) fn resolve(
    layer: &Layer,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    opts: &ComposeOptions,
) -> Result<Vec<ScheduleBlock>, SchedError> {
    let window = util::window(window_start, window_end)?;
    layer.validate()?;

    let users = layer.ordered_users();
    if users.is_empty() {
        trace!(layer = %layer.id, "layer has no members, no coverage");
        return Ok(Vec::new());
    }
    if layer.end.is_some_and(|end| end <= window.start) || layer.start >= window.end {
        return Ok(Vec::new());
    }

    let effective_start = layer.start.max(window.start);
    let effective_end = layer.end.map_or(window.end, |end| end.min(window.end));

    let period = layer.rotation_length();
    let period_secs = period.num_seconds();

    let span_secs = (effective_end - effective_start).num_seconds();
    let estimated = util::div_ceil(span_secs, period_secs) as u64 + 2;
    if estimated > opts.max_blocks_per_layer as u64 {
        warn!(
            layer = %layer.id,
            estimated,
            max = opts.max_blocks_per_layer,
            "window too large for rotation length"
        );
        return Err(SchedError::TooManyBlocks {
            layer: layer.id.clone(),
            estimated,
            max: opts.max_blocks_per_layer,
        });
    }

    let total = users.len() as i64;
    let mut index = (effective_start - layer.start).num_seconds() / period_secs;
    let mut blocks = Vec::with_capacity(estimated as usize);

    loop {
        let rotation_start = layer.start + Duration::seconds(period_secs * index);
        let start = rotation_start.max(effective_start);
        if start >= effective_end {
            break;
        }
        let end = (rotation_start + period).min(effective_end);
        let member = users[(index % total) as usize];

        blocks.push(ScheduleBlock {
            layer_id: layer.id.clone(),
            layer_name: layer.name.clone(),
            user_id: member.user_id.clone(),
            user: member.user.clone(),
            start,
            end,
            source: BlockSource::Rotation,
        });
        index += 1;
    }

    debug!(layer = %layer.id, blocks = blocks.len(), "rotation resolved");
    Ok(blocks)
}
