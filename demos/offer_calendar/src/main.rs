//! offer_calendar — smallest end-to-end host for the timegate engine.
//!
//! Simulates one player (UTC+2, a new player) for 36 hours at one-minute
//! steps against four live-ops offers.  At hour 20 a new config is hot-loaded:
//! the starter pack gets shorter and happy hour switches to the player's
//! local clock, which exercises reconciliation and schedule-offset blocking.
//!
//! Set `RUST_LOG=debug` to see every start, consumption and adjustment.

mod player;

use std::io::Cursor;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::filter::EnvFilter;

use tg_activable::{DefinitionSet, VisibleStatus, load_definitions_reader};
use tg_core::{ActivableId, SegmentId, Span, Timestamp};
use tg_engine::PlayerActivables;

use player::{DemoPlayer, Inventory};

// ── Constants ─────────────────────────────────────────────────────────────────

const SIM_START:         Timestamp = Timestamp::from_unix_secs(1_727_740_800); // 2024-10-01 00:00 UTC
const STEP:              Span      = Span::from_mins(1);
const SIM_HOURS:         i64       = 36;
const RELOAD_AT_HOURS:   i64       = 20;
const PLAYER_UTC_OFFSET: Span      = Span::from_hours(2);
const STARTER_CONSUME_DELAY: Span  = Span::from_mins(15);

// ── Config CSV ────────────────────────────────────────────────────────────────

// starter_pack : 2 h, once a day, two activations, new players only.
// happy_hour   : 10:30 UTC, 10 min every hour, six times.
// daily_deal   : 09:00 player-local for 4 h, unlocked 10 min after a starter purchase.
// comeback     : 1 h, once, after a starter pack ran out unbought.
const CONFIG_V1: &str = "\
id,enabled,segments,preconditions,lifetime,lifetime_secs,cooldown,cooldown_secs,max_activations,max_total_consumes,max_consumes_per_activation,allow_adjustment,time_mode,schedule_start,duration_secs,preview_secs,ending_soon_secs,review_secs,recurrence_secs,num_repeats\n\
starter_pack,true,new_players,,fixed,7200,fixed,86400,2,,1,true,,,,,,,,\n\
happy_hour,true,,,schedule,,schedule,,,,,true,utc,1727778600,600,60,120,180,3600,6\n\
daily_deal,true,,consumed:starter_pack:600,schedule,,schedule,,,,,true,local,1727773200,14400,1800,1800,3600,86400,\n\
comeback,true,,ended_unconsumed:starter_pack:0,fixed,3600,fixed,0,1,,,true,,,,,,,,\n\
";

// Hot reload: starter pack down to 1 h, happy hour on the player's clock,
// daily deal keeps its review up for 2 h.
const CONFIG_V2: &str = "\
id,enabled,segments,preconditions,lifetime,lifetime_secs,cooldown,cooldown_secs,max_activations,max_total_consumes,max_consumes_per_activation,allow_adjustment,time_mode,schedule_start,duration_secs,preview_secs,ending_soon_secs,review_secs,recurrence_secs,num_repeats\n\
starter_pack,true,new_players,,fixed,3600,fixed,86400,2,,1,true,,,,,,,,\n\
happy_hour,true,,,schedule,,schedule,,,,,true,local,1727778600,600,60,120,180,3600,6\n\
daily_deal,true,,consumed:starter_pack:600,schedule,,schedule,,,,,true,local,1727773200,14400,1800,1800,7200,86400,\n\
comeback,true,,ended_unconsumed:starter_pack:0,fixed,3600,fixed,0,1,,,true,,,,,,,,\n\
";

// ── Logging ───────────────────────────────────────────────────────────────────

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

// ── Player behavior ───────────────────────────────────────────────────────────

/// Buys the first starter pack 15 min in, once per happy hour, and
/// the daily deal once it is ending soon.  Never buys the comeback offer.
fn shop(
    player: &mut PlayerActivables<Inventory>,
    defs:   &DefinitionSet,
    ctx:    &DemoPlayer,
    now:    Timestamp,
) {
    let starter = ActivableId::new("starter_pack");
    if let Some(rec) = player.try_get_state(&starter).and_then(|s| s.latest()) {
        if rec.sequence == 1 && rec.num_consumed == 0 && now == rec.started_at + STARTER_CONSUME_DELAY {
            player.try_consume(defs, &starter, ctx, now);
        }
    }

    let happy = ActivableId::new("happy_hour");
    if player.is_active(&happy, now) && player.latest_num_consumed(&happy) == 0 {
        player.try_consume(defs, &happy, ctx, now);
    }

    let deal = ActivableId::new("daily_deal");
    if let Some(VisibleStatus::EndingSoon(_)) = player.try_get_visible_status(defs, &deal, ctx, now) {
        player.try_consume(defs, &deal, ctx, now);
    }
}

fn status_label(status: Option<VisibleStatus>) -> &'static str {
    match status {
        Some(VisibleStatus::Active(_)) => "active",
        Some(VisibleStatus::EndingSoon(_)) => "ending-soon",
        Some(VisibleStatus::Tentative { .. }) => "tentative",
        Some(VisibleStatus::InReview { .. }) => "review",
        Some(VisibleStatus::InPreview { .. }) => "preview",
        Some(VisibleStatus::None) => "-",
        None => "unknown",
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    init_logging();

    println!("=== offer_calendar — timegate activation engine ===");
    println!("Player: UTC+{PLAYER_UTC_OFFSET}  |  Hours: {SIM_HOURS}  |  Reload at hour {RELOAD_AT_HOURS}");
    println!();

    // 1. Load both config versions up front so a bad reload fails fast.
    let v1 = load_definitions_reader(Cursor::new(CONFIG_V1))?;
    let v2 = load_definitions_reader(Cursor::new(CONFIG_V2))?;
    println!("Loaded {} activables", v1.len());

    // 2. Player context and orchestrator.
    let ctx = DemoPlayer {
        utc_offset: PLAYER_UTC_OFFSET,
        segments:   vec![SegmentId::new("new_players")],
    };
    let mut player = PlayerActivables::new(Inventory::default());
    let ids: Vec<ActivableId> = v1.iter().map(|d| d.id.clone()).collect();

    // 3. Header for the hourly table.
    print!("{:<14}", "time");
    for id in &ids {
        print!(" {:<13}", id.as_str());
    }
    println!();
    println!("{}", "-".repeat(14 + 14 * ids.len()));

    // 4. Minute loop.
    let end = SIM_START + Span::from_hours(SIM_HOURS);
    let reload_at = SIM_START + Span::from_hours(RELOAD_AT_HOURS);
    let mut defs = &v1;
    let mut now = SIM_START;
    while now < end {
        if now == reload_at {
            defs = &v2;
            let report = player.reconcile_after_config_change(defs, &ctx, now);
            info!(adjustments = report.adjustments.len(), "config v2 applied");
            for (id, adjustment) in &report.adjustments {
                println!("  reload: {id}: {adjustment:?}");
            }
        }

        player.tick(defs, &ctx, now);
        shop(&mut player, defs, &ctx, now);

        if (now - SIM_START).as_millis() % Span::from_hours(1).as_millis() == 0 {
            print!("{:<14}", now.to_string());
            for id in &ids {
                print!(" {:<13}", status_label(player.try_get_visible_status(defs, id, &ctx, now)));
            }
            println!();
        }
        now = now + STEP;
    }

    // 5. Summary.
    println!();
    println!("{:<14} {:>10} {:>10}", "offer", "activated", "consumed");
    println!("{}", "-".repeat(36));
    for id in &ids {
        println!(
            "{:<14} {:>10} {:>10}",
            id.as_str(),
            player.num_activated(id),
            player.total_num_consumed(id),
        );
    }
    let inventory = player.hooks();
    println!();
    println!("Grants: {}  |  Revocations: {}  |  Held now: {:?}", inventory.grants, inventory.revocations, inventory.offers);

    // 6. Persisted form of the player's state.
    println!();
    println!("{}", serde_json::to_string_pretty(player.states())?);

    Ok(())
}
