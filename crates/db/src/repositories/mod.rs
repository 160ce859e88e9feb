//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod calendar;
pub mod leave;

pub use calendar::{
    CalendarData, CalendarRepoError, CalendarRepository, CreateExceptionInput, CreatePolicyInput,
    HolidayInput,
};
pub use leave::{
    CreateAllocationInput, CreateBalanceInput, LeaveRepoError, LeaveRepository, ReviseLeaveInput,
    SubmitLeaveInput,
};
