//! Property-based tests for the balance ledger under request lifecycles.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use leavedesk_shared::types::{DateRange, LeaveAllocationId, LeaveBalanceId, UserId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::leave::balance::{BalanceUpdate, LeaveBalanceLedger};
use crate::leave::error::LeaveError;
use crate::leave::types::{LeaveBalance, LeaveStatus, WorkingDayResult};
use crate::leave::workflow::{LeaveWorkflow, NewLeaveRequest};

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Approve,
    Reject,
    Cancel,
    StayPending,
}

fn arb_outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        Just(Outcome::Approve),
        Just(Outcome::Reject),
        Just(Outcome::Cancel),
        Just(Outcome::StayPending),
    ]
}

/// Half-day multiples in `[0, max_halves / 2]`.
fn arb_days(max_halves: i64) -> impl Strategy<Value = Decimal> {
    (0..=max_halves).prop_map(|halves| Decimal::new(halves * 5, 1))
}

fn result_for(index: i64, working_days: Decimal) -> WorkingDayResult {
    // Non-overlapping single-week slots, one per request.
    let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap() + Duration::weeks(index);
    let range = DateRange::new(start, start + Duration::days(4)).unwrap();
    WorkingDayResult {
        range,
        working_days,
        total_days: range.total_days(),
        holidays: Vec::new(),
        is_half_day: false,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// After any sequence of submit followed by approve, reject, cancel or
    /// nothing, the ledger matches the requests exactly and never goes negative.
    #[test]
    fn prop_balance_matches_requests(
        total in arb_days(60),
        carried in arb_days(10),
        steps in prop::collection::vec((arb_days(10).prop_filter("non-zero", |d| !d.is_zero()), arb_outcome()), 0..20),
    ) {
        let user = UserId::new();
        let reviewer = UserId::new();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        let mut balance = LeaveBalance {
            id: LeaveBalanceId::new(),
            user_id: user,
            leave_allocation_id: LeaveAllocationId::new(),
            total_allocated: total,
            used: Decimal::ZERO,
            pending: Decimal::ZERO,
            carried_forward: carried,
            version: 0,
        };
        let mut expected_used = Decimal::ZERO;
        let mut expected_pending = Decimal::ZERO;
        let mut expected_version = 0i64;

        for (index, (working_days, outcome)) in (0i64..).zip(steps) {
            let new = NewLeaveRequest {
                user_id: user,
                leave_type_name: "Casual Leave".to_string(),
                reason: "Personal".to_string(),
            };
            let available_before = balance.available();
            let submitted = match LeaveWorkflow::submit(new, &result_for(index, working_days), &balance, now) {
                Ok(t) => t,
                Err(LeaveError::InsufficientBalance { requested, available }) => {
                    prop_assert!(available < requested);
                    prop_assert_eq!(available, available_before);
                    continue;
                }
                Err(other) => return Err(TestCaseError::fail(format!("unexpected {other:?}"))),
            };
            expected_pending += working_days;
            expected_version += 1;
            balance = submitted.balance;

            let finished = match outcome {
                Outcome::Approve => Some(LeaveWorkflow::approve(&submitted.request, &balance, reviewer, None, now)),
                Outcome::Reject => Some(LeaveWorkflow::reject(&submitted.request, &balance, reviewer, "No cover".into(), now)),
                Outcome::Cancel => Some(LeaveWorkflow::cancel(&submitted.request, &balance, user, now)),
                Outcome::StayPending => None,
            };
            if let Some(result) = finished {
                let t = result.map_err(|e| TestCaseError::fail(e.to_string()))?;
                expected_pending -= working_days;
                if t.request.status == LeaveStatus::Approved {
                    expected_used += working_days;
                }
                expected_version += 1;
                balance = t.balance;
            }

            prop_assert_eq!(balance.used, expected_used);
            prop_assert_eq!(balance.pending, expected_pending);
            prop_assert_eq!(balance.version, expected_version);
            prop_assert_eq!(
                balance.available(),
                balance.total_allocated + balance.carried_forward - balance.used - balance.pending
            );
            prop_assert!(balance.available() >= Decimal::ZERO);
            prop_assert!(balance.pending >= Decimal::ZERO);
        }
    }

    /// Admin edits never touch `used` or `pending`, and a negative result is a
    /// warning rather than an error.
    #[test]
    fn prop_update_preserves_committed_days(
        total in arb_days(40),
        used in arb_days(40),
        pending in arb_days(10),
        new_total in arb_days(40),
    ) {
        let balance = LeaveBalance {
            id: LeaveBalanceId::new(),
            user_id: UserId::new(),
            leave_allocation_id: LeaveAllocationId::new(),
            total_allocated: total,
            used,
            pending,
            carried_forward: Decimal::ZERO,
            version: 7,
        };
        let update = BalanceUpdate { total_allocated: Some(new_total), carried_forward: None };
        let outcome = LeaveBalanceLedger::update_balance(&balance, &update, Decimal::ZERO).unwrap();
        prop_assert_eq!(outcome.balance.used, used);
        prop_assert_eq!(outcome.balance.pending, pending);
        prop_assert_eq!(outcome.balance.version, 8);
        prop_assert_eq!(outcome.warning.is_some(), new_total < used + pending);
    }

    /// Rollups equal the sum of per-balance values.
    #[test]
    fn prop_summary_is_sum(
        rows in prop::collection::vec((arb_days(40), arb_days(20), arb_days(10), arb_days(10)), 0..8),
    ) {
        let balances: Vec<_> = rows
            .iter()
            .map(|&(total, used, pending, carried)| LeaveBalance {
                id: LeaveBalanceId::new(),
                user_id: UserId::new(),
                leave_allocation_id: LeaveAllocationId::new(),
                total_allocated: total,
                used,
                pending,
                carried_forward: carried,
                version: 0,
            })
            .collect();
        let summary = LeaveBalanceLedger::summarize(&balances);
        prop_assert_eq!(summary.balance_count, balances.len());
        prop_assert_eq!(
            summary.available,
            balances.iter().map(LeaveBalance::available).sum::<Decimal>()
        );
        prop_assert_eq!(
            summary.available,
            summary.total_allocated + summary.carried_forward - summary.used - summary.pending
        );
    }
}
