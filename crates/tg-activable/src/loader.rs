//! CSV definition loader.
//!
//! # CSV format
//!
//! One row per activable, in processing order.  Empty cells mean "not set".
//!
//! ```csv
//! id,enabled,segments,preconditions,lifetime,lifetime_secs,cooldown,cooldown_secs,max_activations,max_total_consumes,max_consumes_per_activation,allow_adjustment,time_mode,schedule_start,duration_secs,preview_secs,ending_soon_secs,review_secs,recurrence_secs,num_repeats
//! starter_pack,true,new_players,,fixed,3600,fixed,86400,3,,1,true,,,,,,,,
//! happy_hour,true,,,schedule,,schedule,,,,,true,utc,1728037800,600,60,120,180,3600,3
//! ```
//!
//! | Column             | Values                                                  |
//! |--------------------|---------------------------------------------------------|
//! | `enabled`          | `true` / `false`, default `true`                        |
//! | `segments`         | `;`-separated segment ids, empty = everyone             |
//! | `preconditions`    | `;`-separated, see below                                |
//! | `lifetime`         | `forever` / `fixed` (uses `lifetime_secs`) / `schedule` |
//! | `cooldown`         | `fixed` (uses `cooldown_secs`, default 0) / `schedule`  |
//! | `allow_adjustment` | `true` / `false`, default `true`                        |
//! | `time_mode`        | `utc` / `local`; empty = no schedule                    |
//! | `schedule_start`   | unix seconds of the first occasion (in `time_mode`)     |
//!
//! **`preconditions`** entries:
//!
//! | Entry                        | Meaning                                         |
//! |------------------------------|-------------------------------------------------|
//! | `consumed:<id>:<secs>`       | `<id>` consumed, at least `<secs>` ago          |
//! | `ended_unconsumed:<id>:<secs>` | `<id>` ended unconsumed, at least `<secs>` ago |
//! | `host:<key>`                 | host-evaluated condition `<key>`                |
//!
//! The result is validated as a whole by [`DefinitionSet::new`].

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use tg_core::{ActivableId, ConditionKey, SegmentId, Span, Timestamp};
use tg_schedule::{RecurringSchedule, TimeMode};

use crate::{
    ActivableDefinition, ActivableError, ActivableResult, Cooldown, DefinitionSet, Lifetime,
    Precondition, Precursor, PrecursorKind,
};

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct DefinitionRecord {
    id:                          String,
    enabled:                     Option<bool>,
    segments:                    String,
    preconditions:               String,
    lifetime:                    String,
    lifetime_secs:               Option<i64>,
    cooldown:                    String,
    cooldown_secs:               Option<i64>,
    max_activations:             Option<u32>,
    max_total_consumes:          Option<u32>,
    max_consumes_per_activation: Option<u32>,
    allow_adjustment:            Option<bool>,
    time_mode:                   String,
    schedule_start:              Option<i64>,
    duration_secs:               Option<i64>,
    preview_secs:                Option<i64>,
    ending_soon_secs:            Option<i64>,
    review_secs:                 Option<i64>,
    recurrence_secs:             Option<i64>,
    num_repeats:                 Option<u32>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load and validate a [`DefinitionSet`] from a CSV file.
pub fn load_definitions_csv(path: &Path) -> ActivableResult<DefinitionSet> {
    let file = std::fs::File::open(path).map_err(ActivableError::Io)?;
    load_definitions_reader(file)
}

/// Like [`load_definitions_csv`] but accepts any `Read` source.
pub fn load_definitions_reader<R: Read>(reader: R) -> ActivableResult<DefinitionSet> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut defs = Vec::new();

    for (row, result) in csv_reader.deserialize::<DefinitionRecord>().enumerate() {
        let record = result.map_err(|e| ActivableError::Parse(e.to_string()))?;
        let def = build_definition(record)
            .map_err(|msg| ActivableError::Parse(format!("row {}: {msg}", row + 1)))?;
        defs.push(def);
    }

    DefinitionSet::new(defs)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn build_definition(r: DefinitionRecord) -> Result<ActivableDefinition, String> {
    let id = r.id.trim();
    if id.is_empty() {
        return Err("empty id".to_owned());
    }

    let lifetime = match r.lifetime.trim() {
        "forever" | "" => Lifetime::Forever,
        "fixed" => Lifetime::Fixed(required_secs(r.lifetime_secs, "lifetime_secs")?),
        "schedule" => Lifetime::ScheduleBound,
        other => return Err(format!("unknown lifetime {other:?}")),
    };
    let cooldown = match r.cooldown.trim() {
        "fixed" | "" => Cooldown::Fixed(Span::from_secs(r.cooldown_secs.unwrap_or(0))),
        "schedule" => Cooldown::ScheduleBound,
        other => return Err(format!("unknown cooldown {other:?}")),
    };

    let schedule = match r.time_mode.trim() {
        "" => None,
        mode => {
            let time_mode = parse_time_mode(mode)?;
            let start = r
                .schedule_start
                .ok_or_else(|| "schedule_start is required with a time_mode".to_owned())?;
            Some(RecurringSchedule {
                time_mode,
                start:       Timestamp::from_unix_secs(start),
                duration:    required_secs(r.duration_secs, "duration_secs")?,
                preview:     Span::from_secs(r.preview_secs.unwrap_or(0)),
                ending_soon: Span::from_secs(r.ending_soon_secs.unwrap_or(0)),
                review:      Span::from_secs(r.review_secs.unwrap_or(0)),
                recurrence:  r.recurrence_secs.map(Span::from_secs),
                num_repeats: r.num_repeats,
            })
        }
    };

    Ok(ActivableDefinition {
        id: ActivableId::new(id),
        enabled: r.enabled.unwrap_or(true),
        audience: split_list(&r.segments).map(SegmentId::from).collect(),
        preconditions: split_list(&r.preconditions)
            .map(parse_precondition)
            .collect::<Result<_, _>>()?,
        lifetime,
        schedule,
        max_activations: r.max_activations,
        max_total_consumes: r.max_total_consumes,
        max_consumes_per_activation: r.max_consumes_per_activation,
        cooldown,
        allow_adjustment: r.allow_adjustment.unwrap_or(true),
    })
}

fn split_list(s: &str) -> impl Iterator<Item = &str> {
    s.split(';').map(str::trim).filter(|part| !part.is_empty())
}

fn required_secs(value: Option<i64>, column: &str) -> Result<Span, String> {
    value.map(Span::from_secs).ok_or_else(|| format!("{column} is required"))
}

fn parse_time_mode(s: &str) -> Result<TimeMode, String> {
    match s {
        "utc" => Ok(TimeMode::Utc),
        "local" => Ok(TimeMode::PlayerLocal),
        other => Err(format!("unknown time_mode {other:?}")),
    }
}

fn parse_precondition(s: &str) -> Result<Precondition, String> {
    let parts: Vec<&str> = s.split(':').map(str::trim).collect();
    match parts.as_slice() {
        ["host", key] if !key.is_empty() => Ok(Precondition::Host(ConditionKey::new(*key))),
        [kind @ ("consumed" | "ended_unconsumed"), id, secs] if !id.is_empty() => {
            let delay = secs
                .parse::<i64>()
                .map_err(|_| format!("bad precursor delay {secs:?} in {s:?}"))?;
            Ok(Precondition::Precursor(Precursor {
                activable: ActivableId::new(*id),
                kind: if *kind == "consumed" {
                    PrecursorKind::Consumed
                } else {
                    PrecursorKind::EndedUnconsumed
                },
                delay: Span::from_secs(delay),
            }))
        }
        _ => Err(format!("bad precondition {s:?}")),
    }
}
