//! Property-based tests for HolidayCalendarResolver.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, Utc};
use leavedesk_shared::types::{
    CalendarExceptionId, ClassId, DateRange, HolidayId, OrganizationId, WorkingDayPolicyId,
};
use proptest::prelude::*;

use crate::calendar::resolver::{CalendarSources, HolidayCalendarResolver};
use crate::calendar::types::{
    CalendarException, EntrySource, Holiday, HolidayType, OverrideType, SaturdayOffPattern,
    WorkingDayPolicy,
};

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

fn arb_pattern() -> impl Strategy<Value = SaturdayOffPattern> {
    prop_oneof![
        Just(SaturdayOffPattern::None),
        Just(SaturdayOffPattern::SecondOnly),
        Just(SaturdayOffPattern::SecondAndFourth),
        Just(SaturdayOffPattern::All),
    ]
}

fn arb_policy() -> impl Strategy<Value = WorkingDayPolicy> {
    (any::<bool>(), arb_pattern()).prop_map(|(sunday_off, pattern)| WorkingDayPolicy {
        id: WorkingDayPolicyId::new(),
        organization_id: OrganizationId::new(),
        sunday_off,
        saturday_off_pattern: pattern,
        effective_from: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
        effective_to: None,
        created_at: Utc::now(),
    })
}

/// Holidays starting somewhere in the first 60 days of 2025, up to 4 days long.
fn arb_holidays() -> impl Strategy<Value = Vec<Holiday>> {
    prop::collection::vec((0i64..60, 0i64..4), 0..6).prop_map(|spans| {
        spans
            .into_iter()
            .map(|(offset, len)| Holiday {
                id: HolidayId::new(),
                organization_id: OrganizationId::new(),
                start_date: base() + Duration::days(offset),
                end_date: base() + Duration::days(offset + len),
                holiday_type: HolidayType::Festival,
                description: "Festival".to_string(),
            })
            .collect()
    })
}

fn arb_override() -> impl Strategy<Value = OverrideType> {
    prop_oneof![Just(OverrideType::ForceWorking), Just(OverrideType::ForceHoliday)]
}

fn arb_range() -> impl Strategy<Value = DateRange> {
    (0i64..60, 0i64..45).prop_map(|(offset, len)| {
        let start = base() + Duration::days(offset);
        DateRange::new(start, start + Duration::days(len)).unwrap()
    })
}

fn exception(date: NaiveDate, override_type: OverrideType) -> CalendarException {
    CalendarException {
        id: CalendarExceptionId::new(),
        organization_id: OrganizationId::new(),
        date,
        override_type,
        is_applicable_to_all_classes: true,
        classes: BTreeSet::new(),
        reason: "Override".to_string(),
        created_at: Utc::now(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Resolution yields one day per date in ascending order.
    #[test]
    fn prop_one_day_per_date(
        policy in arb_policy(),
        holidays in arb_holidays(),
        range in arb_range(),
    ) {
        let policies = [policy];
        let sources = CalendarSources { policies: &policies, holidays: &holidays, exceptions: &[] };
        let calendar = HolidayCalendarResolver::resolve_range(&sources, range, None);

        let dates: Vec<_> = calendar.days.iter().map(|d| d.date).collect();
        let expected: Vec<_> = range.days().collect();
        prop_assert_eq!(dates, expected);
        prop_assert_eq!(
            calendar.working_day_count() + calendar.non_working_day_count(),
            range.total_days()
        );
    }

    /// Resolving twice gives identical output.
    #[test]
    fn prop_resolution_is_idempotent(
        policy in arb_policy(),
        holidays in arb_holidays(),
        range in arb_range(),
    ) {
        let policies = [policy];
        let sources = CalendarSources { policies: &policies, holidays: &holidays, exceptions: &[] };
        prop_assert_eq!(
            HolidayCalendarResolver::resolve_range(&sources, range, None),
            HolidayCalendarResolver::resolve_range(&sources, range, None)
        );
    }

    /// A day is non-working exactly when it carries at least one entry, and
    /// entries are ordered most authoritative first.
    #[test]
    fn prop_status_matches_entries(
        policy in arb_policy(),
        holidays in arb_holidays(),
        range in arb_range(),
    ) {
        let policies = [policy];
        let sources = CalendarSources { policies: &policies, holidays: &holidays, exceptions: &[] };
        let calendar = HolidayCalendarResolver::resolve_range(&sources, range, None);
        for day in &calendar.days {
            prop_assert_eq!(day.is_working(), day.entries.is_empty());
            prop_assert!(day.entries.windows(2).all(|w| w[0].source <= w[1].source));
            prop_assert!(day.entries.iter().all(|e| e.date == day.date && e.span.contains(day.date)));
        }
    }

    /// Resolving a sub-range agrees with the corresponding slice of a wider range.
    #[test]
    fn prop_sub_range_agrees(
        policy in arb_policy(),
        holidays in arb_holidays(),
        range in arb_range(),
        trim in 0i64..10,
    ) {
        prop_assume!(range.span_days() >= trim * 2);
        let inner = DateRange::new(
            range.start + Duration::days(trim),
            range.end - Duration::days(trim),
        ).unwrap();
        let policies = [policy];
        let sources = CalendarSources { policies: &policies, holidays: &holidays, exceptions: &[] };
        let outer = HolidayCalendarResolver::resolve_range(&sources, range, None);
        let inner_calendar = HolidayCalendarResolver::resolve_range(&sources, inner, None);
        for day in &inner_calendar.days {
            prop_assert_eq!(Some(day), outer.day(day.date));
        }
    }

    /// An exception decides the status of its date regardless of weekend
    /// rules and stored holidays.
    #[test]
    fn prop_exception_always_wins(
        policy in arb_policy(),
        holidays in arb_holidays(),
        range in arb_range(),
        pick in any::<prop::sample::Index>(),
        override_type in arb_override(),
    ) {
        let dates: Vec<_> = range.days().collect();
        let date = dates[pick.index(dates.len())];
        let exceptions = [exception(date, override_type)];
        let policies = [policy];
        let sources = CalendarSources {
            policies: &policies,
            holidays: &holidays,
            exceptions: &exceptions,
        };
        let calendar = HolidayCalendarResolver::resolve_range(&sources, range, None);
        let day = calendar.day(date).unwrap();
        match override_type {
            OverrideType::ForceWorking => {
                prop_assert!(day.is_working());
                prop_assert_eq!(day.forced_working_by, Some(exceptions[0].id));
            }
            OverrideType::ForceHoliday => {
                prop_assert!(!day.is_working());
                prop_assert_eq!(day.primary_entry().map(|e| e.source), Some(EntrySource::Exception));
            }
        }

        // Other dates are unaffected by the exception.
        let without = CalendarSources { exceptions: &[], ..sources };
        let baseline = HolidayCalendarResolver::resolve_range(&without, range, None);
        for (a, b) in calendar.days.iter().zip(&baseline.days) {
            if a.date != date {
                prop_assert_eq!(a, b);
            }
        }
    }

    /// A class-scoped exception never affects a different class.
    #[test]
    fn prop_class_scoped_exception_is_isolated(
        policy in arb_policy(),
        range in arb_range(),
        override_type in arb_override(),
    ) {
        let target = ClassId::new();
        let mut scoped = exception(range.start, override_type);
        scoped.is_applicable_to_all_classes = false;
        scoped.classes.insert(target);
        let exceptions = [scoped];
        let policies = [policy];

        let with = CalendarSources { policies: &policies, holidays: &[], exceptions: &exceptions };
        let without = CalendarSources { policies: &policies, holidays: &[], exceptions: &[] };
        let other = Some(ClassId::new());
        prop_assert_eq!(
            HolidayCalendarResolver::resolve_range(&with, range, other),
            HolidayCalendarResolver::resolve_range(&without, range, other)
        );
    }
}
