//! Property-based tests for weekend policy evaluation.

use chrono::{Datelike, NaiveDate, Utc, Weekday};
use leavedesk_shared::types::{DateRange, OrganizationId, WorkingDayPolicyId};
use proptest::prelude::*;

use crate::calendar::types::{SaturdayOffPattern, WeekendSubtype, WorkingDayPolicy};
use crate::calendar::weekday::days_in_month;
use crate::calendar::weekend::WeekendPolicyEvaluator;

fn arb_pattern() -> impl Strategy<Value = SaturdayOffPattern> {
    prop_oneof![
        Just(SaturdayOffPattern::None),
        Just(SaturdayOffPattern::SecondOnly),
        Just(SaturdayOffPattern::SecondAndFourth),
        Just(SaturdayOffPattern::All),
    ]
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (1990i32..2100, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn arb_month() -> impl Strategy<Value = (i32, u32)> {
    (1990i32..2100, 1u32..=12)
}

fn policy(sunday_off: bool, pattern: SaturdayOffPattern) -> WorkingDayPolicy {
    WorkingDayPolicy {
        id: WorkingDayPolicyId::new(),
        organization_id: OrganizationId::new(),
        sunday_off,
        saturday_off_pattern: pattern,
        effective_from: NaiveDate::from_ymd_opt(1900, 1, 1).unwrap(),
        effective_to: None,
        created_at: Utc::now(),
    }
}

fn saturdays_off(year: i32, month: u32, pattern: SaturdayOffPattern) -> (usize, usize) {
    let p = policy(false, pattern);
    let range = DateRange::month(year, month).unwrap();
    let saturdays: Vec<_> = range.days().filter(|d| d.weekday() == Weekday::Sat).collect();
    let off = saturdays
        .iter()
        .filter(|d| WeekendPolicyEvaluator::evaluate(**d, &p).is_weekend_holiday)
        .count();
    (off, saturdays.len())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A Sunday is a weekend holiday exactly when the policy turns Sundays off.
    #[test]
    fn prop_sunday_off_iff_sunday(
        date in arb_date(),
        sunday_off in any::<bool>(),
        pattern in arb_pattern(),
    ) {
        let status = WeekendPolicyEvaluator::evaluate(date, &policy(sunday_off, pattern));
        let is_sunday = date.weekday() == Weekday::Sun;
        prop_assert_eq!(
            status.subtype == Some(WeekendSubtype::Sunday),
            is_sunday && sunday_off
        );
    }

    /// Monday through Friday are never weekend holidays.
    #[test]
    fn prop_weekdays_are_never_weekend(
        date in arb_date(),
        sunday_off in any::<bool>(),
        pattern in arb_pattern(),
    ) {
        prop_assume!(!matches!(date.weekday(), Weekday::Sat | Weekday::Sun));
        let status = WeekendPolicyEvaluator::evaluate(date, &policy(sunday_off, pattern));
        prop_assert!(!status.is_weekend_holiday);
        prop_assert!(status.subtype.is_none());
    }

    /// Subtype is present exactly when the day is a weekend holiday.
    #[test]
    fn prop_subtype_matches_flag(
        date in arb_date(),
        sunday_off in any::<bool>(),
        pattern in arb_pattern(),
    ) {
        let status = WeekendPolicyEvaluator::evaluate(date, &policy(sunday_off, pattern));
        prop_assert_eq!(status.is_weekend_holiday, status.subtype.is_some());
    }

    /// Every month has four or five Saturdays; the patterns flag the expected count.
    #[test]
    fn prop_saturday_pattern_counts((year, month) in arb_month()) {
        let (none, total) = saturdays_off(year, month, SaturdayOffPattern::None);
        prop_assert!(total == 4 || total == 5);
        prop_assert_eq!(none, 0);

        let (all, _) = saturdays_off(year, month, SaturdayOffPattern::All);
        prop_assert_eq!(all, total);

        let (second, _) = saturdays_off(year, month, SaturdayOffPattern::SecondOnly);
        prop_assert_eq!(second, 1);

        let (second_and_fourth, _) =
            saturdays_off(year, month, SaturdayOffPattern::SecondAndFourth);
        prop_assert_eq!(second_and_fourth, 2);
    }

    /// The second Saturday always falls on day 8 to 14, the fourth on 22 to 28.
    #[test]
    fn prop_second_and_fourth_positions((year, month) in arb_month()) {
        let p = policy(false, SaturdayOffPattern::SecondAndFourth);
        for day in 1..=days_in_month(year, month) {
            let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
            let off = WeekendPolicyEvaluator::evaluate(date, &p).is_weekend_holiday;
            let expected = date.weekday() == Weekday::Sat
                && ((8..=14).contains(&day) || (22..=28).contains(&day));
            prop_assert_eq!(off, expected, "{}", date);
        }
    }

    /// Evaluation is pure.
    #[test]
    fn prop_evaluate_is_deterministic(
        date in arb_date(),
        sunday_off in any::<bool>(),
        pattern in arb_pattern(),
    ) {
        let p = policy(sunday_off, pattern);
        prop_assert_eq!(
            WeekendPolicyEvaluator::evaluate(date, &p),
            WeekendPolicyEvaluator::evaluate(date, &p)
        );
    }
}
