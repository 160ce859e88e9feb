//! Calendar domain types.
//!
//! Weekend holidays are never stored: they are synthesized per query from the
//! effective `WorkingDayPolicy` and identified by a `HolidayKey::Generated` key.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use leavedesk_shared::types::{
    CalendarExceptionId, ClassId, DateRange, HolidayId, OrganizationId, WorkingDayPolicyId,
};
use serde::{Deserialize, Serialize};

/// Which Saturdays of a month are non-working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaturdayOffPattern {
    /// Every Saturday is a working day.
    None,
    /// Only the 2nd Saturday of the month is off.
    SecondOnly,
    /// The 2nd and 4th Saturdays of the month are off.
    SecondAndFourth,
    /// Every Saturday is off.
    All,
}

impl SaturdayOffPattern {
    /// Returns the string representation stored in the database.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::SecondOnly => "SECOND_ONLY",
            Self::SecondAndFourth => "SECOND_AND_FOURTH",
            Self::All => "ALL",
        }
    }

    /// Parses a pattern from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "NONE" => Some(Self::None),
            "SECOND_ONLY" => Some(Self::SecondOnly),
            "SECOND_AND_FOURTH" => Some(Self::SecondAndFourth),
            "ALL" => Some(Self::All),
            _ => None,
        }
    }
}

impl fmt::Display for SaturdayOffPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Organization-wide weekend rule, valid for a period of time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingDayPolicy {
    /// Unique identifier.
    pub id: WorkingDayPolicyId,
    /// Organization this policy belongs to.
    pub organization_id: OrganizationId,
    /// Whether every Sunday is a holiday.
    pub sunday_off: bool,
    /// Which Saturdays are holidays.
    pub saturday_off_pattern: SaturdayOffPattern,
    /// First day the policy applies.
    pub effective_from: NaiveDate,
    /// Last day the policy applies; open-ended when `None`.
    pub effective_to: Option<NaiveDate>,
    /// Creation timestamp, used only as a last-resort tie-break.
    pub created_at: DateTime<Utc>,
}

impl WorkingDayPolicy {
    /// Returns true if the policy covers `date`.
    #[must_use]
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        self.effective_from <= date && self.effective_to.is_none_or(|to| date <= to)
    }

    /// Returns true if the effective periods of both policies share a day.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        let self_reaches_other = self
            .effective_to
            .is_none_or(|to| to >= other.effective_from);
        let other_reaches_self = other
            .effective_to
            .is_none_or(|to| to >= self.effective_from);
        self_reaches_other && other_reaches_self
    }
}

/// Holiday classification.
///
/// `Sunday` and `Saturday` only ever appear on generated entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HolidayType {
    /// Generated from `WorkingDayPolicy::sunday_off`.
    Sunday,
    /// Generated from `WorkingDayPolicy::saturday_off_pattern`.
    Saturday,
    /// Manually recorded second Saturday.
    SecondSaturday,
    /// National holiday.
    NationalHoliday,
    /// Festival.
    Festival,
    /// Organization specific holiday.
    OrganizationHoliday,
    /// Anything else, including forced holidays from exceptions.
    Other,
}

impl HolidayType {
    /// Returns the string representation of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sunday => "SUNDAY",
            Self::Saturday => "SATURDAY",
            Self::SecondSaturday => "SECOND_SATURDAY",
            Self::NationalHoliday => "NATIONAL_HOLIDAY",
            Self::Festival => "FESTIVAL",
            Self::OrganizationHoliday => "ORGANIZATION_HOLIDAY",
            Self::Other => "OTHER",
        }
    }

    /// Parses a holiday type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SUNDAY" => Some(Self::Sunday),
            "SATURDAY" => Some(Self::Saturday),
            "SECOND_SATURDAY" => Some(Self::SecondSaturday),
            "NATIONAL_HOLIDAY" => Some(Self::NationalHoliday),
            "FESTIVAL" => Some(Self::Festival),
            "ORGANIZATION_HOLIDAY" => Some(Self::OrganizationHoliday),
            "OTHER" => Some(Self::Other),
            _ => None,
        }
    }

    /// Returns true for the policy-derived types that are never persisted.
    #[must_use]
    pub fn is_weekend_derived(&self) -> bool {
        matches!(self, Self::Sunday | Self::Saturday)
    }
}

impl fmt::Display for HolidayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored holiday, possibly spanning several days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    /// Unique identifier.
    pub id: HolidayId,
    /// Organization this holiday belongs to.
    pub organization_id: OrganizationId,
    /// First day of the holiday.
    pub start_date: NaiveDate,
    /// Last day of the holiday (inclusive, `>= start_date`).
    pub end_date: NaiveDate,
    /// Holiday classification.
    pub holiday_type: HolidayType,
    /// Human-readable description.
    pub description: String,
}

impl Holiday {
    /// The holiday's interval, or `None` if the row is malformed.
    #[must_use]
    pub fn span(&self) -> Option<DateRange> {
        DateRange::new(self.start_date, self.end_date)
    }
}

/// How a calendar exception overrides a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverrideType {
    /// The date is a working day even if a holiday or weekend says otherwise.
    ForceWorking,
    /// The date is a holiday even if it would otherwise be a working day.
    ForceHoliday,
}

impl OverrideType {
    /// Returns the string representation of the override.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ForceWorking => "FORCE_WORKING",
            Self::ForceHoliday => "FORCE_HOLIDAY",
        }
    }

    /// Parses an override type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "FORCE_WORKING" => Some(Self::ForceWorking),
            "FORCE_HOLIDAY" => Some(Self::ForceHoliday),
            _ => None,
        }
    }
}

impl fmt::Display for OverrideType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A one-off override of a single date for all or some classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarException {
    /// Unique identifier.
    pub id: CalendarExceptionId,
    /// Organization this exception belongs to.
    pub organization_id: OrganizationId,
    /// The overridden date.
    pub date: NaiveDate,
    /// Direction of the override.
    pub override_type: OverrideType,
    /// Applies to every class of the organization.
    pub is_applicable_to_all_classes: bool,
    /// Target classes; empty exactly when `is_applicable_to_all_classes`.
    pub classes: BTreeSet<ClassId>,
    /// Why the override exists.
    pub reason: String,
    /// Creation timestamp; the newest exception wins on a clash.
    pub created_at: DateTime<Utc>,
}

/// Weekday that produced a generated weekend holiday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeekendSubtype {
    /// Sunday off.
    Sunday,
    /// Saturday off per the Saturday pattern.
    Saturday,
}

impl WeekendSubtype {
    /// The holiday type used for entries generated from this subtype.
    #[must_use]
    pub fn holiday_type(self) -> HolidayType {
        match self {
            Self::Sunday => HolidayType::Sunday,
            Self::Saturday => HolidayType::Saturday,
        }
    }
}

/// Result of evaluating a weekend policy for one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekendStatus {
    /// True if the policy makes the date a weekend holiday.
    pub is_weekend_holiday: bool,
    /// Which weekend rule fired, if any.
    pub subtype: Option<WeekendSubtype>,
}

impl WeekendStatus {
    /// A working (non-weekend) date.
    pub const WORKING: Self = Self {
        is_weekend_holiday: false,
        subtype: None,
    };

    /// A weekend holiday of the given subtype.
    #[must_use]
    pub const fn holiday(subtype: WeekendSubtype) -> Self {
        Self {
            is_weekend_holiday: true,
            subtype: Some(subtype),
        }
    }
}

/// Where a calendar entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntrySource {
    /// A `FORCE_HOLIDAY` calendar exception.
    Exception,
    /// A stored holiday row.
    Stored,
    /// Synthesized from the weekend policy.
    Generated,
}

/// Identifies a calendar entry for rendering and editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HolidayKey {
    /// A persisted holiday; editable unless weekend-derived.
    Stored(HolidayId),
    /// A synthesized weekend holiday; read-only.
    Generated {
        /// Which weekend rule produced it.
        subtype: WeekendSubtype,
        /// The date it was generated for.
        date: NaiveDate,
    },
    /// A forced holiday from a calendar exception.
    Exception(CalendarExceptionId),
}

impl HolidayKey {
    /// Parses the identifier format produced by `Display`.
    ///
    /// `sunday-YYYY-MM-DD` and `saturday-YYYY-MM-DD` are generated keys,
    /// `exception-<uuid>` is an exception key, and a bare UUID is stored.
    pub fn parse(s: &str) -> Option<Self> {
        if let Some(date) = s.strip_prefix("sunday-") {
            return NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .ok()
                .map(|date| Self::Generated {
                    subtype: WeekendSubtype::Sunday,
                    date,
                });
        }
        if let Some(date) = s.strip_prefix("saturday-") {
            return NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .ok()
                .map(|date| Self::Generated {
                    subtype: WeekendSubtype::Saturday,
                    date,
                });
        }
        if let Some(id) = s.strip_prefix("exception-") {
            return id.parse().ok().map(Self::Exception);
        }
        s.parse().ok().map(Self::Stored)
    }

    /// Returns true for keys that can never be edited or deleted.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::Generated { .. })
    }
}

impl fmt::Display for HolidayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stored(id) => write!(f, "{id}"),
            Self::Generated {
                subtype: WeekendSubtype::Sunday,
                date,
            } => write!(f, "sunday-{date}"),
            Self::Generated {
                subtype: WeekendSubtype::Saturday,
                date,
            } => write!(f, "saturday-{date}"),
            Self::Exception(id) => write!(f, "exception-{id}"),
        }
    }
}

/// One non-working reason on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    /// Identifier for rendering and edit routing.
    pub key: HolidayKey,
    /// The affected date.
    pub date: NaiveDate,
    /// Holiday classification.
    pub holiday_type: HolidayType,
    /// Human-readable description.
    pub description: String,
    /// Where the entry came from.
    pub source: EntrySource,
    /// The original interval (multi-day for stored holidays, one day otherwise).
    pub span: DateRange,
}

/// Final working status of a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    /// Counts towards working days.
    Working,
    /// Excluded from working days.
    NonWorking,
}

/// A single resolved date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    /// The date.
    pub date: NaiveDate,
    /// Final status after exceptions.
    pub status: DayStatus,
    /// Reasons the date is non-working, most authoritative first.
    /// Empty for working days.
    pub entries: Vec<CalendarEntry>,
    /// The `FORCE_WORKING` exception that cleared holiday status, if any.
    pub forced_working_by: Option<CalendarExceptionId>,
}

impl CalendarDay {
    /// Returns true if the date counts as a working day.
    #[must_use]
    pub fn is_working(&self) -> bool {
        self.status == DayStatus::Working
    }

    /// The entry shown when a single reason is displayed.
    #[must_use]
    pub fn primary_entry(&self) -> Option<&CalendarEntry> {
        self.entries.first()
    }
}
