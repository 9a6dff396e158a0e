use super::{util, OverrideScope, SchedError};
use crate::model::{BlockSource, Interval, Override, ScheduleBlock};
use chrono::{DateTime, Utc};
use tracing::trace;

/// Ordre d'application des overrides : début croissant, puis fin, puis id.
///
/// Chaque override est appliqué sur le résultat du précédent : sur un
/// sous-intervalle partagé, le dernier appliqué l'emporte.
pub fn application_order<'a, I>(overrides: I) -> Vec<&'a Override>
where
    I: IntoIterator<Item = &'a Override>,
{
    let mut ordered: Vec<&Override> = overrides.into_iter().collect();
    ordered.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| a.end.cmp(&b.end))
            .then_with(|| a.id.cmp(&b.id))
    });
    ordered
}

/// Indique si un override s'applique à la layer de rang `layer_index` (0-based,
/// ordre du schedule).
pub fn override_targets_layer(scope: OverrideScope, layer_index: usize) -> bool {
    match scope {
        OverrideScope::AllLayers => true,
        OverrideScope::PrimaryLayer => layer_index == 0,
    }
}

pub(super) fn clip<'a, I>(
    blocks_by_layer: Vec<Vec<ScheduleBlock>>,
    overrides: I,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    scope: OverrideScope,
) -> Result<Vec<ScheduleBlock>, SchedError>
where
    I: IntoIterator<Item = &'a Override>,
{
    let window = util::window(window_start, window_end)?;

    let mut spans: Vec<(Interval, &Override)> = Vec::new();
    for over in application_order(overrides) {
        over.validate()?;
        match over.interval().intersect(&window) {
            Some(span) => spans.push((span, over)),
            None => trace!(over = %over.id, "override outside window, discarded"),
        }
    }

    let mut out = Vec::new();
    for (idx, blocks) in blocks_by_layer.into_iter().enumerate() {
        if spans.is_empty() || !override_targets_layer(scope, idx) {
            out.extend(blocks);
            continue;
        }
        out.extend(clip_layer(blocks, &spans));
    }
    Ok(out)
}

// Découpe les blocs d'une seule layer, override par override.
fn clip_layer(
    mut blocks: Vec<ScheduleBlock>,
    spans: &[(Interval, &Override)],
) -> Vec<ScheduleBlock> {
    for (span, over) in spans {
        let mut next = Vec::with_capacity(blocks.len() + 2);
        for block in blocks {
            if !util::overlaps(block.start, block.end, span.start, span.end) {
                next.push(block);
                continue;
            }

            let covered_start = block.start.max(span.start);
            let covered_end = block.end.min(span.end);

            if block.start < covered_start {
                next.push(ScheduleBlock {
                    end: covered_start,
                    ..block.clone()
                });
            }
            next.push(ScheduleBlock {
                user_id: over.user_id.clone(),
                user: over.user.clone(),
                start: covered_start,
                end: covered_end,
                source: BlockSource::Override,
                ..block.clone()
            });
            if covered_end < block.end {
                next.push(ScheduleBlock {
                    start: covered_end,
                    ..block
                });
            }
        }
        blocks = next;
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OverrideId, UserId, UserProfile};
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, h, 0, 0).unwrap()
    }

    fn over(id: &str, start: u32, end: u32) -> Override {
        Override {
            id: OverrideId::new(id),
            user_id: UserId::new(id),
            user: UserProfile::new(id),
            replaces_user_id: None,
            start: at(start),
            end: at(end),
        }
    }

    #[test]
    fn application_order_breaks_start_ties_by_end_then_id() {
        let a = over("a", 4, 8);
        let b = over("b", 2, 6);
        let c = over("c", 4, 6);
        let d = over("d", 4, 6);
        let ids: Vec<&str> = application_order([&a, &b, &d, &c])
            .into_iter()
            .map(|o| o.id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "c", "d", "a"]);
    }

    #[test]
    fn primary_scope_only_targets_first_layer() {
        assert!(override_targets_layer(OverrideScope::AllLayers, 3));
        assert!(override_targets_layer(OverrideScope::PrimaryLayer, 0));
        assert!(!override_targets_layer(OverrideScope::PrimaryLayer, 1));
    }
}
