//! Frontière de présentation : le moteur ne voit que de l'UTC, les saisies et
//! affichages passent par le fuseau du schedule.

use crate::model::ScheduleBlock;
use crate::scheduler::SchedError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Parse un nom de fuseau IANA (`Europe/Paris`, `UTC`, ...).
pub fn parse_zone(name: &str) -> Result<Tz, SchedError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| SchedError::InvalidTimeZone(name.to_string()))
}

/// Interprète une saisie utilisateur en instant UTC.
///
/// Formats acceptés : RFC3339 (offset explicite), `YYYY-MM-DDTHH:MM` local au
/// fuseau, ou `YYYY-MM-DD` (minuit local). Une heure locale ambiguë prend la
/// première occurrence ; une heure inexistante (saut DST) est refusée.
pub fn parse_instant(raw: &str, tz: Tz) -> Result<DateTime<Utc>, SchedError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M"))
        .or_else(|_| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|_| SchedError::InvalidLocalTime(raw.to_string()))?;
    local_to_utc(naive, tz).ok_or_else(|| SchedError::InvalidLocalTime(raw.to_string()))
}

fn local_to_utc(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Date/heure locale lisible, ex. `2024-03-31 03:00 CEST`.
pub fn format_local(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%Y-%m-%d %H:%M %Z").to_string()
}

/// Ligne compacte pour l'affichage d'un bloc.
pub fn render_block(block: &ScheduleBlock, tz: Tz) -> String {
    format!(
        "{} → {} | {} | {} | {}",
        format_local(block.start, tz),
        format_local(block.end, tz),
        block.layer_name,
        block.user.name,
        block.source.as_str()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_input_is_read_in_schedule_zone() {
        let tz = parse_zone("Europe/Paris").unwrap();
        let got = parse_instant("2024-01-15T09:30", tz).unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2024, 1, 15, 8, 30, 0).unwrap());
    }

    #[test]
    fn rfc3339_input_keeps_its_offset() {
        let tz = parse_zone("Asia/Tokyo").unwrap();
        let got = parse_instant("2024-01-15T09:30:00Z", tz).unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap());
    }

    #[test]
    fn bare_date_is_local_midnight() {
        let tz = parse_zone("America/New_York").unwrap();
        let got = parse_instant("2024-07-04", tz).unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2024, 7, 4, 4, 0, 0).unwrap());
    }

    #[test]
    fn nonexistent_local_time_is_rejected() {
        let tz = parse_zone("Europe/Paris").unwrap();
        assert!(matches!(
            parse_instant("2024-03-31T02:30", tz),
            Err(SchedError::InvalidLocalTime(_))
        ));
    }

    #[test]
    fn ambiguous_local_time_takes_first_occurrence() {
        let tz = parse_zone("Europe/Paris").unwrap();
        let got = parse_instant("2024-10-27T02:30", tz).unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2024, 10, 27, 0, 30, 0).unwrap());
    }

    #[test]
    fn unknown_zone_is_an_error() {
        assert!(matches!(
            parse_zone("Mars/Olympus"),
            Err(SchedError::InvalidTimeZone(_))
        ));
    }

    #[test]
    fn format_uses_zone_abbreviation() {
        let tz = parse_zone("Europe/Paris").unwrap();
        let t = Utc.with_ymd_and_hms(2024, 7, 1, 6, 0, 0).unwrap();
        assert_eq!(format_local(t, tz), "2024-07-01 08:00 CEST");
    }
}
