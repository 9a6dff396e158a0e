use crate::model::{Override, ScheduleBlock, UserId, UserProfile};
use crate::timezone;
use anyhow::{bail, Context};
use chrono_tz::Tz;
use csv::{ReaderBuilder, Terminator, WriterBuilder};
use std::fs;
use std::path::Path;

/// Import d'overrides depuis CSV: header `user_id,user_name,start,end[,replaces_user_id]`.
///
/// Les dates sont lues dans le fuseau du schedule (voir [`timezone::parse_instant`]).
pub fn import_overrides_csv<P: AsRef<Path>>(path: P, tz: Tz) -> anyhow::Result<Vec<Override>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let mut out = Vec::new();
    for (line, rec) in rdr.records().enumerate() {
        let rec = rec?;
        let user_id = rec.get(0).context("missing user_id")?.trim();
        let user_name = rec.get(1).context("missing user_name")?.trim();
        if user_id.is_empty() || user_name.is_empty() {
            bail!("invalid override row {} (empty user)", line + 1);
        }
        let start = rec.get(2).context("missing start")?;
        let end = rec.get(3).context("missing end")?;
        let start = timezone::parse_instant(start, tz)
            .with_context(|| format!("invalid start on row {}", line + 1))?;
        let end = timezone::parse_instant(end, tz)
            .with_context(|| format!("invalid end on row {}", line + 1))?;
        let replaces = rec
            .get(4)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(UserId::new);

        let over = Override::new(
            UserId::new(user_id),
            UserProfile::new(user_name),
            replaces,
            start,
            end,
        )
        .with_context(|| format!("invalid override on row {}", line + 1))?;
        out.push(over);
    }
    Ok(out)
}

/// Export JSON des blocs (jolie mise en forme)
pub fn export_blocks_json<P: AsRef<Path>>(path: P, blocks: &[ScheduleBlock]) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(blocks)?;
    fs::write(path, s)?;
    Ok(())
}

/// Export CSV des blocs: header `key,layer_id,layer_name,user_id,user_name,start,end,source`
pub fn export_blocks_csv<P: AsRef<Path>>(path: P, blocks: &[ScheduleBlock]) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new()
        .has_headers(true)
        .terminator(Terminator::Any(b'\n'))
        .from_path(path)?;
    w.write_record([
        "key",
        "layer_id",
        "layer_name",
        "user_id",
        "user_name",
        "start",
        "end",
        "source",
    ])?;
    for b in blocks {
        let key = b.key();
        let start = b.start.to_rfc3339();
        let end = b.end.to_rfc3339();
        w.write_record([
            key.as_str(),
            b.layer_id.as_str(),
            b.layer_name.as_str(),
            b.user_id.as_str(),
            b.user.name.as_str(),
            start.as_str(),
            end.as_str(),
            b.source.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}
