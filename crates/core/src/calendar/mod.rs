//! Holiday calendar resolution.
//!
//! Decides, for every date of a range, whether it is a working day for a
//! class of an organization.
//!
//! # Modules
//!
//! - `types` - Policies, stored holidays, exceptions and resolved entries
//! - `error` - Calendar-specific error types
//! - `weekday` - Nth-weekday-of-month arithmetic
//! - `weekend` - Weekend policy evaluation and policy selection
//! - `holiday` - Stored holiday validation and edit guards
//! - `exception` - Calendar exception scoping and precedence
//! - `resolver` - Merges all of the above into a per-date calendar

pub mod error;
pub mod exception;
pub mod holiday;
pub mod resolver;
pub mod types;
pub mod weekday;
pub mod weekend;

#[cfg(test)]
mod resolver_props;
#[cfg(test)]
mod weekend_props;

pub use error::CalendarError;
pub use exception::ExceptionService;
pub use holiday::HolidayService;
pub use resolver::{
    CalendarSources, HolidayCalendarResolver, MAX_LOOKAHEAD_DAYS, MonthSummary, ResolvedCalendar,
};
pub use types::{
    CalendarDay, CalendarEntry, CalendarException, DayStatus, EntrySource, Holiday, HolidayKey,
    HolidayType, OverrideType, SaturdayOffPattern, WeekendStatus, WeekendSubtype,
    WorkingDayPolicy,
};
pub use weekday::{days_in_month, is_nth_weekday_of_month, nth_weekday_of_month};
pub use weekend::{PolicyService, WeekendPolicyEvaluator};
