//! Lecture de la couverture calculée : qui est d'astreinte à un instant donné,
//! prochain changement, trous de couverture et statistiques.

use crate::model::{Interval, ScheduleBlock, UserId};
use crate::scheduler::{checked_window, SchedError};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::collections::{BTreeMap, BTreeSet};

/// Blocs actifs à `instant` (`start <= instant < end`), toutes layers confondues.
pub fn active_at(blocks: &[ScheduleBlock], instant: DateTime<Utc>) -> Vec<&ScheduleBlock> {
    blocks.iter().filter(|b| b.is_active_at(instant)).collect()
}

/// Premier début ou fin de bloc strictement après `after`.
pub fn next_boundary(blocks: &[ScheduleBlock], after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    blocks
        .iter()
        .flat_map(|b| [b.start, b.end])
        .filter(|t| *t > after)
        .min()
}

/// Sous-intervalles de `[window_start, window_end)` sans aucun bloc actif.
///
/// Les blocs qui se chevauchent ou se touchent sont fusionnés avant le calcul.
/// Une fenêtre vide ou inversée est refusée (`InvalidWindow`).
pub fn gaps(
    blocks: &[ScheduleBlock],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<Vec<Interval>, SchedError> {
    checked_window(window_start, window_end)?;

    let mut busy: Vec<(DateTime<Utc>, DateTime<Utc>)> = blocks
        .iter()
        .filter(|b| b.start < window_end && b.end > window_start)
        .map(|b| (b.start.max(window_start), b.end.min(window_end)))
        .collect();
    busy.sort();

    let mut out = Vec::new();
    let mut cursor = window_start;
    for (start, end) in busy {
        if cursor < start {
            out.push(Interval { start: cursor, end: start });
        }
        cursor = cursor.max(end);
    }
    if cursor < window_end {
        out.push(Interval {
            start: cursor,
            end: window_end,
        });
    }
    Ok(out)
}

/// Cible d'escalade visant un schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnCallTarget {
    /// Personnes d'astreinte à l'instant donné.
    #[default]
    Current,
    /// Personnes d'astreinte au prochain changement couvert.
    Next,
}

/// Synthèse de couverture sur une fenêtre.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageSummary {
    pub window: Interval,
    pub total_minutes: i64,
    pub covered_minutes: i64,
    pub coverage_percent: f64,
    pub gaps: Vec<Interval>,
    /// Jours calendaires locaux touchés par au moins un trou.
    pub gap_days: usize,
}

/// Vue en lecture seule sur la sortie du composer.
#[derive(Debug, Clone, Copy)]
pub struct CoverageQuery<'a> {
    blocks: &'a [ScheduleBlock],
}

impl<'a> CoverageQuery<'a> {
    pub fn new(blocks: &'a [ScheduleBlock]) -> Self {
        Self { blocks }
    }

    pub fn blocks(&self) -> &'a [ScheduleBlock] {
        self.blocks
    }

    pub fn active_at(&self, instant: DateTime<Utc>) -> Vec<&'a ScheduleBlock> {
        active_at(self.blocks, instant)
    }

    pub fn next_boundary(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        next_boundary(self.blocks, after)
    }

    pub fn gaps(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Interval>, SchedError> {
        gaps(self.blocks, window_start, window_end)
    }

    /// Utilisateurs distincts à notifier pour une étape d'escalade "schedule",
    /// dans l'ordre de sortie des blocs.
    pub fn on_call(&self, at: DateTime<Utc>, target: OnCallTarget) -> Vec<UserId> {
        let instant = match target {
            OnCallTarget::Current => Some(at),
            OnCallTarget::Next => self.next_covered_change(at),
        };
        let Some(instant) = instant else {
            return Vec::new();
        };

        let mut seen = BTreeSet::new();
        self.active_at(instant)
            .into_iter()
            .filter(|b| seen.insert(b.user_id.clone()))
            .map(|b| b.user_id.clone())
            .collect()
    }

    // prochaine frontière où l'ensemble des personnes actives change par rapport
    // à l'intervalle qui la précède et n'est pas vide
    fn next_covered_change(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let mut previous: BTreeSet<&UserId> = self
            .active_at(at)
            .into_iter()
            .map(|b| &b.user_id)
            .collect();
        let mut cursor = at;
        while let Some(boundary) = self.next_boundary(cursor) {
            let active: BTreeSet<&UserId> = self
                .active_at(boundary)
                .into_iter()
                .map(|b| &b.user_id)
                .collect();
            if !active.is_empty() && active != previous {
                return Some(boundary);
            }
            previous = active;
            cursor = boundary;
        }
        None
    }

    /// Minutes d'astreinte par utilisateur, restreintes à la fenêtre.
    pub fn scheduled_minutes_by_user(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> BTreeMap<UserId, i64> {
        let mut out = BTreeMap::new();
        for block in self.blocks {
            let start = block.start.max(window_start);
            let end = block.end.min(window_end);
            if start < end {
                *out.entry(block.user_id.clone()).or_insert(0) += (end - start).num_minutes();
            }
        }
        out
    }

    /// Couverture de la fenêtre ; `tz` sert uniquement au comptage des jours.
    pub fn summary(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        tz: Tz,
    ) -> Result<CoverageSummary, SchedError> {
        let window = checked_window(window_start, window_end)?;
        let gaps = self.gaps(window.start, window.end)?;
        let total_minutes = window.duration().num_minutes();
        let gap_minutes: i64 = gaps.iter().map(|g| g.duration().num_minutes()).sum();
        let covered_minutes = (total_minutes - gap_minutes).max(0);
        let coverage_percent = if total_minutes > 0 {
            covered_minutes as f64 * 100.0 / total_minutes as f64
        } else {
            100.0
        };
        let gap_days = local_days(&gaps, tz).len();

        Ok(CoverageSummary {
            window,
            total_minutes,
            covered_minutes,
            coverage_percent,
            gaps,
            gap_days,
        })
    }
}

fn local_days(intervals: &[Interval], tz: Tz) -> BTreeSet<NaiveDate> {
    let mut days = BTreeSet::new();
    for interval in intervals {
        let first = interval.start.with_timezone(&tz).date_naive();
        let last = (interval.end - chrono::Duration::nanoseconds(1))
            .with_timezone(&tz)
            .date_naive();
        let mut day = first;
        while day <= last {
            days.insert(day);
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn gap_days_follow_local_calendar() {
        let tz: Tz = "America/New_York".parse().unwrap();
        // 02:00Z..06:00Z le 2 janvier = 21:00 le 1er .. 01:00 le 2 à New York
        let gap = Interval {
            start: Utc.with_ymd_and_hms(2024, 1, 2, 2, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 1, 2, 6, 0, 0).unwrap(),
        };
        let days: Vec<NaiveDate> = local_days(&[gap], tz).into_iter().collect();
        assert_eq!(
            days,
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
            ]
        );
    }

    #[test]
    fn gap_ending_at_midnight_does_not_count_next_day() {
        let gap = Interval {
            start: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        };
        assert_eq!(local_days(&[gap], Tz::UTC).len(), 1);
    }
}
