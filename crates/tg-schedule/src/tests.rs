//! Unit tests for tg-schedule.

use tg_core::{Span, Timestamp};

use crate::{RecurringSchedule, ScheduleError, TimeMode};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Midnight of an arbitrary day, far from the epoch.
const DAY0: Timestamp = Timestamp::from_unix_secs(20_000 * 86_400);

fn at(h: i64, m: i64) -> Timestamp {
    DAY0 + Span::from_hours(h) + Span::from_mins(m)
}

fn at_s(h: i64, m: i64, s: i64) -> Timestamp {
    at(h, m) + Span::from_secs(s)
}

/// 10:30 start, 10 min duration, 1 min preview, 2 min ending-soon, 3 min
/// review, hourly, 3 repeats.
fn hourly_utc() -> RecurringSchedule {
    RecurringSchedule {
        time_mode:   TimeMode::Utc,
        start:       at(10, 30),
        duration:    Span::from_mins(10),
        preview:     Span::from_mins(1),
        ending_soon: Span::from_mins(2),
        review:      Span::from_mins(3),
        recurrence:  Some(Span::from_hours(1)),
        num_repeats: Some(3),
    }
}

// ── Occasion boundaries ───────────────────────────────────────────────────────

#[cfg(test)]
mod boundaries {
    use super::*;

    #[test]
    fn first_occasion_shape() {
        let occ = hourly_utc().occasion(0, Span::ZERO).unwrap();
        assert_eq!(occ.index, 0);
        assert_eq!(occ.preview_start, at(10, 29));
        assert_eq!(occ.enabled_start, at(10, 30));
        assert_eq!(occ.ending_soon_start, at(10, 38));
        assert_eq!(occ.enabled_end, at(10, 40));
        assert_eq!(occ.review_end, at(10, 43));
    }

    #[test]
    fn repeats_are_offset_by_recurrence() {
        let s = hourly_utc();
        assert_eq!(s.occasion(1, Span::ZERO).unwrap().enabled_start, at(11, 30));
        assert_eq!(s.occasion(2, Span::ZERO).unwrap().enabled_start, at(12, 30));
        assert!(s.occasion(3, Span::ZERO).is_none(), "only 3 repeats");
    }

    #[test]
    fn ending_soon_never_precedes_enabled_start() {
        let mut s = hourly_utc();
        s.ending_soon = Span::from_mins(30);
        let occ = s.occasion(0, Span::ZERO).unwrap();
        assert_eq!(occ.ending_soon_start, occ.enabled_start);
    }

    #[test]
    fn empty_enabled_range_review_starts_at_enabled_start() {
        let mut s = hourly_utc();
        s.duration = Span::ZERO;
        let occ = s.occasion(0, Span::ZERO).unwrap();
        assert_eq!(occ.enabled_end, occ.enabled_start);
        assert!(!occ.is_enabled_at(occ.enabled_start));
        assert!(occ.is_in_review_at(occ.enabled_start));
    }

    #[test]
    fn utc_mode_ignores_player_offset() {
        let s = hourly_utc();
        let east = s.occasion(0, Span::from_hours(5)).unwrap();
        let utc = s.occasion(0, Span::ZERO).unwrap();
        assert_eq!(east.enabled_range(), utc.enabled_range());
        assert_eq!(east.review_end, utc.review_end);
    }

    #[test]
    fn occasion_remembers_its_offset() {
        let mut s = hourly_utc();
        s.time_mode = TimeMode::PlayerLocal;
        let captured = s.query_occasions(at(8, 35), Span::from_hours(2)).current.unwrap();
        assert_eq!(captured.utc_offset, Span::from_hours(2));
        assert_eq!(s.occasion(captured.index, captured.utc_offset), Some(captured));
        assert_ne!(s.occasion(captured.index, Span::from_hours(3)), Some(captured));
    }

    #[test]
    fn player_local_shifts_by_offset() {
        let mut s = hourly_utc();
        s.time_mode = TimeMode::PlayerLocal;
        // UTC+2: local 10:30 happens at 08:30 UTC.
        let east = s.occasion(0, Span::from_hours(2)).unwrap();
        assert_eq!(east.enabled_start, at(8, 30));
        // UTC-3: local 10:30 happens at 13:30 UTC.
        let west = s.occasion(0, Span::from_hours(-3)).unwrap();
        assert_eq!(west.enabled_start, at(13, 30));
        assert_eq!(west.time_mode, TimeMode::PlayerLocal);
    }

    #[test]
    fn occasion_in_mode_overrides_schedule_mode() {
        let s = hourly_utc();
        let local = s.occasion_in_mode(0, TimeMode::PlayerLocal, Span::from_hours(1)).unwrap();
        assert_eq!(local.enabled_start, at(9, 30));
        assert_eq!(local.time_mode, TimeMode::PlayerLocal);
    }

    #[test]
    fn phase_predicates() {
        let occ = hourly_utc().occasion(0, Span::ZERO).unwrap();
        assert!(occ.is_in_preview_at(at(10, 29)));
        assert!(!occ.is_in_preview_at(at(10, 30)));
        assert!(occ.is_enabled_at(at(10, 30)));
        assert!(occ.is_ending_soon_at(at(10, 38)));
        assert!(!occ.is_enabled_at(at(10, 40)));
        assert!(occ.is_in_review_at(at(10, 40)));
        assert!(!occ.is_in_review_at(at(10, 43)));
    }
}

// ── query_occasions ───────────────────────────────────────────────────────────

#[cfg(test)]
mod query {
    use super::*;

    #[test]
    fn before_first_occasion() {
        let q = hourly_utc().query_occasions(at(9, 0), Span::ZERO);
        assert!(q.previous.is_none());
        assert!(q.current.is_none());
        assert_eq!(q.next.unwrap().index, 0);
    }

    #[test]
    fn inside_first_occasion() {
        let q = hourly_utc().query_occasions(at(10, 35), Span::ZERO);
        assert!(q.previous.is_none());
        assert_eq!(q.current.unwrap().index, 0);
        assert_eq!(q.next.unwrap().index, 1);
    }

    #[test]
    fn enabled_start_is_inclusive_end_is_exclusive() {
        let s = hourly_utc();
        assert_eq!(s.query_occasions(at(10, 30), Span::ZERO).current.unwrap().index, 0);
        let q = s.query_occasions(at(10, 40), Span::ZERO);
        assert!(q.current.is_none());
        assert_eq!(q.previous.unwrap().index, 0);
    }

    #[test]
    fn between_occasions() {
        let q = hourly_utc().query_occasions(at_s(11, 10, 1), Span::ZERO);
        assert_eq!(q.previous.unwrap().index, 0);
        assert!(q.current.is_none());
        assert_eq!(q.next.unwrap().enabled_start, at(11, 30));
    }

    #[test]
    fn inside_later_occasion_reports_previous() {
        let q = hourly_utc().query_occasions(at(12, 31), Span::ZERO);
        assert_eq!(q.previous.unwrap().index, 1);
        assert_eq!(q.current.unwrap().index, 2);
        assert!(q.next.is_none(), "repeats exhausted");
    }

    #[test]
    fn after_last_occasion() {
        let q = hourly_utc().query_occasions(at(23, 0), Span::ZERO);
        assert_eq!(q.previous.unwrap().index, 2);
        assert!(q.current.is_none());
        assert!(q.next.is_none());
    }

    #[test]
    fn infinite_repeats_keep_going() {
        let mut s = hourly_utc();
        s.num_repeats = None;
        let q = s.query_occasions(at(10, 35) + Span::from_days(10), Span::ZERO);
        assert_eq!(q.current.unwrap().index, 240);
        assert_eq!(q.next.unwrap().index, 241);
    }

    #[test]
    fn single_occasion_without_recurrence() {
        let s = RecurringSchedule::once(TimeMode::Utc, at(10, 0), Span::from_hours(2));
        assert_eq!(s.occasion_count(), Some(1));
        assert_eq!(s.query_occasions(at(11, 0), Span::ZERO).current.unwrap().index, 0);
        let after = s.query_occasions(at(13, 0), Span::ZERO);
        assert_eq!(after.previous.unwrap().index, 0);
        assert!(after.next.is_none());
    }

    #[test]
    fn back_to_back_occasions() {
        let mut s = hourly_utc();
        s.duration = Span::from_hours(1);
        let q = s.query_occasions(at(11, 30), Span::ZERO);
        assert_eq!(q.current.unwrap().index, 1);
        assert_eq!(q.previous.unwrap().index, 0);
    }

    #[test]
    fn player_local_query_uses_local_clock() {
        let mut s = hourly_utc();
        s.time_mode = TimeMode::PlayerLocal;
        // 08:35 UTC is 10:35 local for a UTC+2 player.
        let q = s.query_occasions(at(8, 35), Span::from_hours(2));
        let cur = q.current.unwrap();
        assert_eq!(cur.index, 0);
        assert_eq!(cur.enabled_end, at(8, 40));
        // The same UTC instant is before the first occasion in UTC mode.
        assert!(hourly_utc().query_occasions(at(8, 35), Span::from_hours(2)).current.is_none());
    }

    #[test]
    fn current_or_next_prefers_current() {
        let s = hourly_utc();
        assert_eq!(s.query_occasions(at(10, 35), Span::ZERO).current_or_next().unwrap().index, 0);
        assert_eq!(s.query_occasions(at(10, 50), Span::ZERO).current_or_next().unwrap().index, 1);
    }
}

// ── Validation ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod validation {
    use super::*;

    #[test]
    fn well_formed_schedule_validates() {
        assert!(hourly_utc().validate().is_ok());
    }

    #[test]
    fn negative_lead_rejected() {
        let mut s = hourly_utc();
        s.preview = Span::from_mins(-1);
        assert!(matches!(
            s.validate(),
            Err(ScheduleError::NegativeSpan { field: "preview", .. })
        ));
    }

    #[test]
    fn duration_longer_than_recurrence_rejected() {
        let mut s = hourly_utc();
        s.duration = Span::from_hours(2);
        assert!(matches!(s.validate(), Err(ScheduleError::DurationExceedsRecurrence { .. })));
    }

    #[test]
    fn zero_recurrence_rejected() {
        let mut s = hourly_utc();
        s.recurrence = Some(Span::ZERO);
        assert!(matches!(s.validate(), Err(ScheduleError::NonPositiveRecurrence(_))));
    }

    #[test]
    fn zero_repeats_rejected() {
        let mut s = hourly_utc();
        s.num_repeats = Some(0);
        assert!(matches!(s.validate(), Err(ScheduleError::ZeroRepeats)));
    }

    #[test]
    fn repeats_without_recurrence_rejected() {
        let mut s = RecurringSchedule::once(TimeMode::Utc, at(10, 0), Span::from_hours(1));
        s.num_repeats = Some(2);
        assert!(matches!(s.validate(), Err(ScheduleError::RepeatsWithoutRecurrence)));
    }
}
