use super::SchedError;
use crate::model::Interval;
use chrono::{DateTime, Utc};

pub(super) fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Valide la fenêtre demandée (contrat appelant).
pub(crate) fn window(
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<Interval, SchedError> {
    if window_end <= window_start {
        return Err(SchedError::InvalidWindow);
    }
    Ok(Interval {
        start: window_start,
        end: window_end,
    })
}

/// Division entière arrondie vers le haut, pour des valeurs positives.
pub(super) fn div_ceil(value: i64, divisor: i64) -> i64 {
    (value + divisor - 1) / divisor
}
