//! Integration tests for tg-engine.

use tg_activable::{
    ActivableDefinition, ActivableSet, ActivableState, Adjustment, Cooldown, DefinitionSet,
    EndReason, Lifetime, PlayerContext, Precondition, Precursor, PrecursorKind, StartBlock,
    VisibleStatus,
};
use tg_core::{ActivableId, SegmentId, Span, Timestamp};
use tg_schedule::{RecurringSchedule, TimeMode};

use crate::{ActivationHooks, EngineError, NoopHooks, PlayerActivables, PlayerActivablesBuilder};

// ── Helpers ───────────────────────────────────────────────────────────────────

const DAY0: Timestamp = Timestamp::from_unix_secs(20_000 * 86_400);

fn at(h: i64, m: i64) -> Timestamp {
    DAY0 + Span::from_hours(h) + Span::from_mins(m)
}

fn id(s: &str) -> ActivableId {
    ActivableId::new(s)
}

fn fixed(name: &str, lifetime: Span, cooldown: Span) -> ActivableDefinition {
    let mut def = ActivableDefinition::new(name);
    def.lifetime = Lifetime::Fixed(lifetime);
    def.cooldown = Cooldown::Fixed(cooldown);
    def
}

fn defs(list: Vec<ActivableDefinition>) -> DefinitionSet {
    DefinitionSet::new(list).unwrap()
}

#[derive(Default)]
struct Player {
    offset:   Span,
    segments: Vec<SegmentId>,
}

impl PlayerContext for Player {
    fn utc_offset(&self) -> Span {
        self.offset
    }

    fn is_in_segment(&self, segment: &SegmentId) -> bool {
        self.segments.contains(segment)
    }
}

/// Records every hook call as `(event, activable, sequence)`.
#[derive(Default)]
struct Recorder {
    events: Vec<(&'static str, String, u32)>,
}

impl ActivationHooks for Recorder {
    fn on_started_activation(&mut self, state: &ActivableState, _player: &dyn PlayerContext) {
        self.events.push(("start", state.id().to_string(), state.num_activated()));
    }

    fn on_finalized(&mut self, state: &ActivableState, _player: &dyn PlayerContext) {
        let sequence = state.latest().map_or(0, |rec| rec.sequence);
        self.events.push(("finalize", state.id().to_string(), sequence));
    }
}

fn event(kind: &'static str, activable: &str, sequence: u32) -> (&'static str, String, u32) {
    (kind, activable.to_owned(), sequence)
}

// ── Tick passes ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tick {
    use super::*;

    #[test]
    fn limits_exhausted_after_four_activations() {
        let mut def = fixed("offer", Span::from_mins(5), Span::ZERO);
        def.max_activations = Some(6);
        def.max_total_consumes = Some(8);
        def.max_consumes_per_activation = Some(2);
        let defs = defs(vec![def]);
        let ctx = Player::default();
        let offer = id("offer");
        let mut player = PlayerActivables::default();

        let mut t = at(9, 0);
        for _ in 0..4 {
            let report = player.tick(&defs, &ctx, t);
            assert_eq!(report.started, vec![offer.clone()]);
            assert!(player.try_consume(&defs, &offer, &ctx, t));
            assert!(player.try_consume(&defs, &offer, &ctx, t));
            t = t + Span::from_mins(1);
        }

        assert_eq!(player.num_activated(&offer), 4);
        assert_eq!(player.total_num_consumed(&offer), 8);
        let report = player.tick(&defs, &ctx, t);
        assert_eq!(report.finalized, vec![offer.clone()]);
        assert!(report.started.is_empty());
        assert!(!player.try_consume(&defs, &offer, &ctx, t));
        assert!(!player.is_active(&offer, t));
    }

    #[test]
    fn zero_cooldown_restarts_within_one_tick() {
        let defs = defs(vec![fixed("a", Span::from_mins(1), Span::ZERO)]);
        let ctx = Player::default();
        let mut player = PlayerActivables::new(Recorder::default());

        player.tick(&defs, &ctx, at(9, 0));
        let report = player.tick(&defs, &ctx, at(9, 1));
        assert_eq!(report.finalized, vec![id("a")]);
        assert_eq!(report.started, vec![id("a")]);
        assert_eq!(player.hooks().events, vec![
            event("start", "a", 1),
            event("finalize", "a", 1),
            event("start", "a", 2),
        ]);
    }

    #[test]
    fn finalize_pass_precedes_start_pass() {
        let defs = defs(vec![
            fixed("a", Span::from_mins(1), Span::ZERO),
            fixed("b", Span::from_mins(1), Span::ZERO),
        ]);
        let ctx = Player::default();
        let mut player = PlayerActivables::new(Recorder::default());

        player.tick(&defs, &ctx, at(9, 0));
        player.hooks_mut().events.clear();
        player.tick(&defs, &ctx, at(9, 1));
        assert_eq!(player.hooks().events, vec![
            event("finalize", "a", 1),
            event("finalize", "b", 1),
            event("start", "a", 2),
            event("start", "b", 2),
        ]);
    }

    #[test]
    fn declaration_order_drives_processing() {
        let defs = defs(vec![ActivableDefinition::new("zeta"), ActivableDefinition::new("alpha")]);
        let report = PlayerActivables::default().tick(&defs, &Player::default(), at(9, 0));
        assert_eq!(report.started, vec![id("zeta"), id("alpha")]);
    }

    #[test]
    fn hooks_can_be_borrowed() {
        let defs = defs(vec![ActivableDefinition::new("a")]);
        let mut recorder = Recorder::default();
        {
            let mut player = PlayerActivables::new(&mut recorder);
            player.tick(&defs, &Player::default(), at(9, 0));
        }
        assert_eq!(recorder.events, vec![event("start", "a", 1)]);
    }

    #[test]
    fn audience_gates_start() {
        let mut def = ActivableDefinition::new("vip");
        def.audience = vec![SegmentId::new("payers")];
        let defs = defs(vec![def]);
        let mut player = PlayerActivables::default();

        assert!(player.tick(&defs, &Player::default(), at(9, 0)).started.is_empty());
        let payer = Player { segments: vec![SegmentId::new("payers")], ..Player::default() };
        assert_eq!(player.tick(&defs, &payer, at(9, 1)).started, vec![id("vip")]);
    }

    #[test]
    fn positive_and_negative_dependents_never_overlap() {
        let source = fixed("source", Span::from_mins(5), Span::from_hours(24));
        let mut positive = ActivableDefinition::new("positive");
        positive.preconditions.push(Precondition::Precursor(Precursor {
            activable: id("source"),
            kind:      PrecursorKind::Consumed,
            delay:     Span::from_mins(1),
        }));
        let mut negative = ActivableDefinition::new("negative");
        negative.preconditions.push(Precondition::Precursor(Precursor {
            activable: id("source"),
            kind:      PrecursorKind::EndedUnconsumed,
            delay:     Span::from_mins(1),
        }));
        let defs = defs(vec![source, positive, negative]);
        let ctx = Player::default();

        // Consumed at 09:02: positive from 09:03, negative never.
        let mut consumer = PlayerActivables::default();
        for minute in 0..30 {
            let t = at(9, minute);
            consumer.tick(&defs, &ctx, t);
            if minute == 2 {
                assert!(consumer.try_consume(&defs, &id("source"), &ctx, t));
            }
            assert_eq!(consumer.is_active(&id("positive"), t), minute >= 3);
            assert!(!consumer.is_active(&id("negative"), t));
        }

        // Never consumed, ends 09:05: negative from 09:06, positive never.
        let mut ignorer = PlayerActivables::default();
        for minute in 0..30 {
            let t = at(9, minute);
            ignorer.tick(&defs, &ctx, t);
            assert_eq!(ignorer.is_active(&id("negative"), t), minute >= 6);
            assert!(!ignorer.is_active(&id("positive"), t));
        }
    }

    #[test]
    fn removed_definition_keeps_state_and_revives() {
        let with_a = defs(vec![fixed("a", Span::from_mins(5), Span::ZERO)]);
        let without_a = DefinitionSet::empty();
        let ctx = Player::default();
        let mut player = PlayerActivables::new(Recorder::default());

        player.tick(&with_a, &ctx, at(9, 0));
        assert!(player.tick(&without_a, &ctx, at(9, 10)).is_empty());
        let kept = player.try_get_state(&id("a")).unwrap();
        assert!(!kept.is_latest_finalized());
        assert!(player.reconcile_after_config_change(&without_a, &ctx, at(9, 10)).is_empty());

        let report = player.tick(&with_a, &ctx, at(9, 11));
        assert_eq!(report.finalized, vec![id("a")]);
        assert_eq!(report.started, vec![id("a")]);
        assert_eq!(player.num_activated(&id("a")), 2);
    }

    #[test]
    fn tick_pass_only_touches_relevant_activables() {
        let defs = defs(vec![ActivableDefinition::new("a"), ActivableDefinition::new("b")]);
        let mut player = PlayerActivables::default();
        let report = player.tick_pass(&defs, &[id("b")], &Player::default(), at(9, 0));
        assert_eq!(report.started, vec![id("b")]);
        assert!(player.try_get_state(&id("a")).is_none());
    }

    #[test]
    fn force_end_is_finalized_by_next_tick() {
        let defs = defs(vec![fixed("a", Span::from_hours(1), Span::from_mins(10))]);
        let ctx = Player::default();
        let mut player = PlayerActivables::default();
        player.tick(&defs, &ctx, at(9, 0));

        assert!(player.force_end_activation(&defs, &id("a"), &ctx, at(9, 5)));
        assert!(!player.is_active(&id("a"), at(9, 5)));
        assert!(player.is_in_cooldown(&id("a"), at(9, 5)));
        let report = player.tick(&defs, &ctx, at(9, 6));
        assert_eq!(report.finalized, vec![id("a")]);
        assert!(report.started.is_empty(), "still cooling down");
        assert_eq!(
            player.try_get_state(&id("a")).unwrap().latest().unwrap().ended_by,
            Some(EndReason::Forced),
        );
    }

    #[test]
    fn unknown_activables_are_inert() {
        let defs = defs(vec![ActivableDefinition::new("a")]);
        let ctx = Player::default();
        let mut player = PlayerActivables::default();
        let ghost = id("ghost");

        assert!(!player.try_consume(&defs, &ghost, &ctx, at(9, 0)));
        assert!(!player.force_end_activation(&defs, &ghost, &ctx, at(9, 0)));
        assert!(!player.can_start_activation(&defs, &ghost, &ctx, at(9, 0)));
        assert!(player.try_get_visible_status(&defs, &ghost, &ctx, at(9, 0)).is_none());
        assert_eq!(player.num_activated(&ghost), 0);
        assert_eq!(player.latest_num_consumed(&ghost), 0);
    }

    #[test]
    fn active_states_lists_running_activations() {
        let defs = defs(vec![
            fixed("short", Span::from_mins(1), Span::from_hours(1)),
            ActivableDefinition::new("long"),
        ]);
        let mut player = PlayerActivables::default();
        player.tick(&defs, &Player::default(), at(9, 0));

        let active: Vec<&str> = player.active_states(at(9, 0)).map(|s| s.id().as_str()).collect();
        assert_eq!(active, ["long", "short"]);
        let active: Vec<&str> = player.active_states(at(9, 2)).map(|s| s.id().as_str()).collect();
        assert_eq!(active, ["long"]);
    }
}

// ── Config reconciliation ─────────────────────────────────────────────────────

#[cfg(test)]
mod reconcile {
    use super::*;

    #[test]
    fn shortened_lifetime_enters_cooldown_without_a_tick() {
        let ctx = Player::default();
        let mut player = PlayerActivables::default();
        let old = defs(vec![fixed("a", Span::from_mins(5), Span::from_mins(5))]);
        player.tick(&old, &ctx, at(9, 0));

        let new = defs(vec![fixed("a", Span::from_mins(2), Span::from_mins(5))]);
        let report = player.reconcile_after_config_change(&new, &ctx, at(9, 4));
        let changes: Vec<&Adjustment> = report.for_activable(&id("a")).collect();
        assert_eq!(changes[0], &Adjustment::Ended { at: at(9, 2), reason: EndReason::Reconfigured });
        assert!(player.is_in_cooldown(&id("a"), at(9, 4)));

        assert!(player.reconcile_after_config_change(&new, &ctx, at(9, 4)).is_empty());
    }

    #[test]
    fn same_config_after_offset_change_leaves_activation_alone() {
        let mut def = ActivableDefinition::new("daily");
        def.lifetime = Lifetime::ScheduleBound;
        def.cooldown = Cooldown::ScheduleBound;
        def.schedule = Some(RecurringSchedule {
            time_mode:   TimeMode::PlayerLocal,
            start:       at(10, 30),
            duration:    Span::from_hours(1),
            preview:     Span::ZERO,
            ending_soon: Span::ZERO,
            review:      Span::ZERO,
            recurrence:  Some(Span::from_days(1)),
            num_repeats: None,
        });
        let defs = defs(vec![def]);
        let mut ctx = Player { offset: Span::from_hours(2), ..Player::default() };
        let mut player = PlayerActivables::default();
        assert_eq!(player.tick(&defs, &ctx, at(8, 45)).started, vec![id("daily")]);
        let before = player.states().clone();

        ctx.offset = Span::from_hours(3);
        assert!(player.reconcile_after_config_change(&defs, &ctx, at(8, 50)).is_empty());
        assert_eq!(player.states(), &before);
        assert!(player.is_active(&id("daily"), at(9, 29)));
        assert!(!player.is_active(&id("daily"), at(9, 30)));
    }

    #[test]
    fn audience_change_does_not_end_running_activation() {
        let ctx = Player { segments: vec![SegmentId::new("vip")], ..Player::default() };
        let mut player = PlayerActivables::default();
        let mut def = fixed("a", Span::from_mins(30), Span::ZERO);
        def.audience = vec![SegmentId::new("vip")];
        player.tick(&defs(vec![def.clone()]), &ctx, at(9, 0));

        def.audience = vec![SegmentId::new("whales")];
        let new = defs(vec![def]);
        assert!(player.reconcile_after_config_change(&new, &ctx, at(9, 5)).is_empty());
        assert!(player.tick(&new, &ctx, at(9, 6)).is_empty());
        assert!(player.is_active(&id("a"), at(9, 6)));
    }

    #[test]
    fn new_definitions_get_no_state() {
        let ctx = Player::default();
        let mut player = PlayerActivables::default();
        let new = defs(vec![ActivableDefinition::new("fresh")]);
        assert!(player.reconcile_after_config_change(&new, &ctx, at(9, 0)).is_empty());
        assert!(player.states().is_empty());
    }

    #[test]
    fn disabled_definition_ends_and_stays_down() {
        let ctx = Player::default();
        let mut player = PlayerActivables::new(Recorder::default());
        let old = defs(vec![ActivableDefinition::new("a")]);
        player.tick(&old, &ctx, at(9, 0));

        let mut off = ActivableDefinition::new("a");
        off.enabled = false;
        let new = defs(vec![off]);
        player.reconcile_after_config_change(&new, &ctx, at(9, 1));
        let report = player.tick(&new, &ctx, at(9, 2));
        assert_eq!(report.finalized, vec![id("a")]);
        assert!(report.started.is_empty());
        assert_eq!(
            player.try_get_visible_status(&new, &id("a"), &ctx, at(9, 2)),
            Some(VisibleStatus::None),
        );
    }
}

// ── Status queries ────────────────────────────────────────────────────────────

#[cfg(test)]
mod status {
    use super::*;

    fn happy_hour() -> ActivableDefinition {
        let mut def = ActivableDefinition::new("happy_hour");
        def.lifetime = Lifetime::ScheduleBound;
        def.cooldown = Cooldown::ScheduleBound;
        def.schedule = Some(RecurringSchedule {
            time_mode:   TimeMode::Utc,
            start:       at(10, 30),
            duration:    Span::from_mins(10),
            preview:     Span::from_mins(1),
            ending_soon: Span::from_mins(2),
            review:      Span::from_mins(3),
            recurrence:  Some(Span::from_hours(1)),
            num_repeats: Some(3),
        });
        def
    }

    #[test]
    fn start_readiness_follows_the_schedule() {
        let defs = defs(vec![happy_hour()]);
        let ctx = Player::default();
        let player = PlayerActivables::default();
        let hh = id("happy_hour");

        assert_eq!(player.start_block(&defs, &hh, &ctx, at(10, 29)), Some(StartBlock::OutsideSchedule));
        assert!(!player.can_start_activation(&defs, &hh, &ctx, at(10, 29)));
        assert!(player.can_start_activation(&defs, &hh, &ctx, at(10, 30)));
    }

    #[test]
    fn phases_through_one_occasion() {
        let defs = defs(vec![happy_hour()]);
        let ctx = Player::default();
        let mut player = PlayerActivables::default();
        let hh = id("happy_hour");
        let status = |p: &PlayerActivables, t| p.try_get_visible_status(&defs, &hh, &ctx, t).unwrap();

        assert!(matches!(status(&player, at(10, 29)), VisibleStatus::InPreview { .. }));
        player.tick(&defs, &ctx, at(10, 30));
        assert!(matches!(status(&player, at(10, 30)), VisibleStatus::Active(_)));
        assert!(matches!(status(&player, at(10, 38)), VisibleStatus::EndingSoon(_)));
        player.tick(&defs, &ctx, at(10, 41));
        assert!(matches!(
            status(&player, at(10, 41)),
            VisibleStatus::InReview { visibility_ends_at, .. } if visibility_ends_at == at(10, 43)
        ));
        assert_eq!(status(&player, at(10, 43)), VisibleStatus::None);
        assert!(matches!(status(&player, at(11, 29)), VisibleStatus::InPreview { .. }));
    }
}

// ── Builder / persistence ─────────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use super::*;

    #[test]
    fn default_builder_is_empty() {
        let player = PlayerActivablesBuilder::new().build().unwrap();
        assert!(player.states().is_empty());
    }

    #[test]
    fn restored_state_continues_where_it_left_off() {
        let defs = defs(vec![fixed("a", Span::from_mins(10), Span::ZERO)]);
        let ctx = Player::default();
        let mut before = PlayerActivables::default();
        before.tick(&defs, &ctx, at(9, 0));
        assert!(before.try_consume(&defs, &id("a"), &ctx, at(9, 1)));

        let json = serde_json::to_string(&before.into_states()).unwrap();
        let saved: ActivableSet = serde_json::from_str(&json).unwrap();
        let mut after = PlayerActivablesBuilder::new()
            .hooks(Recorder::default())
            .states(saved)
            .build()
            .unwrap();

        assert!(after.is_active(&id("a"), at(9, 5)));
        assert_eq!(after.latest_num_consumed(&id("a")), 1);
        after.tick(&defs, &ctx, at(9, 10));
        assert_eq!(after.hooks().events, vec![event("finalize", "a", 1), event("start", "a", 2)]);
    }

    #[test]
    fn inconsistent_state_is_rejected() {
        let json = r#"{"states":{"a":{
            "id":"a","num_activated":2,"total_num_consumed":0,"last_consumed_at":null,
            "latest":null,"latest_finalized":false,"cooldown_until":null,
            "schedule_offset_blocked_until":null,"schedule_time_mode":null}}}"#;
        let saved: ActivableSet = serde_json::from_str(json).unwrap();
        let result = PlayerActivablesBuilder::new().states(saved).build();
        assert!(matches!(result, Err(EngineError::CorruptState { id, .. }) if id.as_str() == "a"));
    }

    #[test]
    fn single_state_can_be_added() {
        let player = PlayerActivablesBuilder::new()
            .hooks(NoopHooks)
            .state(ActivableState::new(id("a")))
            .build()
            .unwrap();
        assert_eq!(player.num_activated(&id("a")), 0);
        assert!(player.try_get_state(&id("a")).is_some());
    }
}

// ── Long-run properties ───────────────────────────────────────────────────────

#[cfg(test)]
mod properties {
    use super::*;

    fn mixed_defs() -> DefinitionSet {
        let mut capped = fixed("capped", Span::from_mins(7), Span::from_mins(3));
        capped.max_activations = Some(5);
        capped.max_consumes_per_activation = Some(2);
        let mut budget = ActivableDefinition::new("budget");
        budget.max_total_consumes = Some(9);
        budget.max_consumes_per_activation = Some(1);
        let mut follow = fixed("follow", Span::from_mins(2), Span::ZERO);
        follow.preconditions.push(Precondition::Precursor(Precursor {
            activable: id("capped"),
            kind:      PrecursorKind::Consumed,
            delay:     Span::from_mins(4),
        }));
        defs(vec![capped, budget, follow])
    }

    fn run(steps: u32) -> ActivableSet {
        let defs = mixed_defs();
        let ctx = Player::default();
        let mut player = PlayerActivables::default();
        let mut previous: Vec<(u32, u32)> = vec![(0, 0); defs.len()];

        let mut t = at(8, 0);
        for step in 0..steps {
            player.tick(&defs, &ctx, t);
            for (i, def) in defs.iter().enumerate() {
                if (step + i as u32) % 4 == 0 {
                    player.try_consume(&defs, &def.id, &ctx, t);
                }
                let Some(state) = player.try_get_state(&def.id) else {
                    continue;
                };
                assert_eq!(state.invariant_violation(Some(def)), None, "{} at step {step}", def.id);
                assert!(!(state.is_active(t) && state.is_in_cooldown(t)));
                let counts = (state.num_activated(), state.total_num_consumed());
                assert!(counts.0 >= previous[i].0 && counts.1 >= previous[i].1, "counters never decrease");
                previous[i] = counts;
            }
            t = t + Span::from_secs(30);
        }
        player.into_states()
    }

    #[test]
    fn invariants_hold_over_a_long_run() {
        let states = run(600);
        let budget = states.get(&id("budget")).unwrap();
        assert_eq!(budget.total_num_consumed(), 9);
        assert_eq!(states.get(&id("capped")).unwrap().num_activated(), 5);
    }

    #[test]
    fn replays_are_identical() {
        assert_eq!(run(300), run(300));
    }
}
