//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `ClassId` where a `UserId` is expected.
//! The boundary receives identifiers as opaque strings and parses them with `FromStr`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a user.");
typed_id!(OrganizationId, "Unique identifier for an organization.");
typed_id!(ClassId, "Unique identifier for a class (group of users sharing a calendar).");
typed_id!(RoleId, "Unique identifier for a role.");
typed_id!(HolidayId, "Unique identifier for a stored holiday.");
typed_id!(
    CalendarExceptionId,
    "Unique identifier for a calendar exception."
);
typed_id!(
    WorkingDayPolicyId,
    "Unique identifier for a working day policy."
);
typed_id!(LeaveTypeId, "Unique identifier for a leave type.");
typed_id!(LeaveAllocationId, "Unique identifier for a leave allocation.");
typed_id!(LeaveBalanceId, "Unique identifier for a leave balance.");
typed_id!(LeaveRequestId, "Unique identifier for a leave request.");
