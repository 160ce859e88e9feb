//! Property-based tests for LeaveWorkflow transitions.

use chrono::{NaiveDate, TimeZone, Utc};
use leavedesk_shared::types::{
    LeaveAllocationId, LeaveBalanceId, LeaveRequestId, UserId,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::leave::error::LeaveError;
use crate::leave::types::{LeaveBalance, LeaveRequest, LeaveStatus};
use crate::leave::workflow::LeaveWorkflow;

fn arb_status() -> impl Strategy<Value = LeaveStatus> {
    prop_oneof![
        Just(LeaveStatus::Pending),
        Just(LeaveStatus::Approved),
        Just(LeaveStatus::Rejected),
        Just(LeaveStatus::Cancelled),
    ]
}

fn arb_uuid_user() -> impl Strategy<Value = UserId> {
    any::<u128>().prop_map(|n| UserId::from_uuid(uuid::Uuid::from_u128(n)))
}

fn arb_days() -> impl Strategy<Value = Decimal> {
    (1i64..=20).prop_map(|halves| Decimal::new(halves * 5, 1))
}

fn fixture(status: LeaveStatus, user_id: UserId, days: Decimal) -> (LeaveRequest, LeaveBalance) {
    let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let balance = LeaveBalance {
        id: LeaveBalanceId::new(),
        user_id,
        leave_allocation_id: LeaveAllocationId::new(),
        total_allocated: Decimal::from(20),
        used: Decimal::ZERO,
        pending: days,
        carried_forward: Decimal::ZERO,
        version: 1,
    };
    let request = LeaveRequest {
        id: LeaveRequestId::new(),
        user_id,
        leave_balance_id: balance.id,
        leave_type_name: "Casual Leave".to_string(),
        start_date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2025, 1, 17).unwrap(),
        number_of_days: days,
        is_half_day: false,
        status,
        reason: "Travel".to_string(),
        reviewed_by: None,
        reviewed_at: None,
        review_comment: None,
        created_at: now,
        updated_at: now,
    };
    (request, balance)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Only pending requests can move; terminal states reject every action.
    #[test]
    fn prop_terminal_states_are_final(
        status in arb_status(),
        user in arb_uuid_user(),
        days in arb_days(),
    ) {
        let (request, balance) = fixture(status, user, days);
        let now = Utc::now();
        let approve = LeaveWorkflow::approve(&request, &balance, UserId::new(), None, now);
        let reject = LeaveWorkflow::reject(&request, &balance, UserId::new(), "No".into(), now);
        let cancel = LeaveWorkflow::cancel(&request, &balance, user, now);

        if status == LeaveStatus::Pending {
            prop_assert!(approve.is_ok());
            prop_assert!(reject.is_ok());
            prop_assert!(cancel.is_ok());
        } else {
            prop_assert_eq!(approve, Err(LeaveError::InvalidTransition { from: status, to: LeaveStatus::Approved }));
            prop_assert_eq!(reject, Err(LeaveError::InvalidTransition { from: status, to: LeaveStatus::Rejected }));
            prop_assert_eq!(cancel, Err(LeaveError::InvalidTransition { from: status, to: LeaveStatus::Cancelled }));
        }
    }

    /// Approval conserves `used + pending`; reject and cancel release exactly
    /// the request's days.
    #[test]
    fn prop_transitions_conserve_days(user in arb_uuid_user(), days in arb_days()) {
        let (request, balance) = fixture(LeaveStatus::Pending, user, days);
        let committed = balance.used + balance.pending;
        let now = Utc::now();

        let approved = LeaveWorkflow::approve(&request, &balance, UserId::new(), None, now).unwrap();
        prop_assert_eq!(approved.balance.used + approved.balance.pending, committed);
        prop_assert_eq!(approved.balance.available(), balance.available());

        let rejected = LeaveWorkflow::reject(&request, &balance, UserId::new(), "No".into(), now).unwrap();
        prop_assert_eq!(rejected.balance.available(), balance.available() + days);

        let cancelled = LeaveWorkflow::cancel(&request, &balance, user, now).unwrap();
        prop_assert_eq!(cancelled.balance, rejected.balance);
    }

    /// Blank rejection reasons are refused whatever the status.
    #[test]
    fn prop_blank_rejection_reason_refused(
        status in arb_status(),
        user in arb_uuid_user(),
        blank in "[ \t]{0,5}",
    ) {
        let (request, balance) = fixture(status, user, Decimal::ONE);
        prop_assert_eq!(
            LeaveWorkflow::reject(&request, &balance, UserId::new(), blank, Utc::now()),
            Err(LeaveError::RejectionReasonRequired)
        );
    }

    /// Nobody but the requester can cancel.
    #[test]
    fn prop_only_requester_cancels(
        status in arb_status(),
        user in arb_uuid_user(),
        other in arb_uuid_user(),
    ) {
        prop_assume!(user != other);
        let (request, balance) = fixture(status, user, Decimal::ONE);
        prop_assert_eq!(
            LeaveWorkflow::cancel(&request, &balance, other, Utc::now()),
            Err(LeaveError::NotRequester { request_id: request.id, user_id: other })
        );
    }

    /// `is_valid_transition` agrees with the terminal flag.
    #[test]
    fn prop_valid_transition_iff_pending(from in arb_status(), to in arb_status()) {
        prop_assert_eq!(LeaveWorkflow::is_valid_transition(from, to), !from.is_terminal());
    }
}
