//! Holiday calendar resolution.
//!
//! Merges stored holidays, generated weekend holidays and calendar exceptions
//! into one status per date. Exceptions are applied last and always win.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use leavedesk_shared::types::{ClassId, DateRange};
use serde::{Deserialize, Serialize};

use crate::calendar::error::CalendarError;
use crate::calendar::exception::ExceptionService;
use crate::calendar::holiday::HolidayService;
use crate::calendar::types::{
    CalendarDay, CalendarEntry, CalendarException, DayStatus, EntrySource, Holiday, HolidayKey,
    HolidayType, OverrideType, WeekendSubtype, WorkingDayPolicy,
};
use crate::calendar::weekend::WeekendPolicyEvaluator;

/// Rows fetched from storage for one organization.
///
/// The slices may be wider than the resolved range; the resolver filters
/// holidays by overlap and exceptions by date and class itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalendarSources<'a> {
    /// Working day policies of the organization.
    pub policies: &'a [WorkingDayPolicy],
    /// Stored holidays overlapping the range.
    pub holidays: &'a [Holiday],
    /// Calendar exceptions within the range.
    pub exceptions: &'a [CalendarException],
}

/// Per-date calendar for a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCalendar {
    /// The resolved range.
    pub range: DateRange,
    /// Class the calendar was resolved for.
    pub class_id: Option<ClassId>,
    /// One element per date, ascending.
    pub days: Vec<CalendarDay>,
}

impl ResolvedCalendar {
    /// The resolved day for `date`, if inside the range.
    #[must_use]
    pub fn day(&self, date: NaiveDate) -> Option<&CalendarDay> {
        let offset = usize::try_from((date - self.range.start).num_days()).ok()?;
        self.days.get(offset).filter(|day| day.date == date)
    }

    /// Working status of `date`, or `None` outside the range.
    #[must_use]
    pub fn is_working_day(&self, date: NaiveDate) -> Option<bool> {
        self.day(date).map(CalendarDay::is_working)
    }

    /// Every non-working reason in the range, ordered by date.
    pub fn entries(&self) -> impl Iterator<Item = &CalendarEntry> {
        self.days.iter().flat_map(|day| day.entries.iter())
    }

    /// Days excluded from working-day counts.
    pub fn non_working_days(&self) -> impl Iterator<Item = &CalendarDay> {
        self.days.iter().filter(|day| !day.is_working())
    }

    /// Dates excluded from working-day counts.
    #[must_use]
    pub fn non_working_dates(&self) -> Vec<NaiveDate> {
        self.non_working_days().map(|day| day.date).collect()
    }

    /// Number of working days in the range.
    #[must_use]
    pub fn working_day_count(&self) -> i64 {
        self.days.iter().filter(|day| day.is_working()).count() as i64
    }

    /// Number of non-working days in the range.
    #[must_use]
    pub fn non_working_day_count(&self) -> i64 {
        self.non_working_days().count() as i64
    }
}

/// Dashboard summary of one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSummary {
    /// Calendar year.
    pub year: i32,
    /// Calendar month (1-12).
    pub month: u32,
    /// Days in the month.
    pub total_days: i64,
    /// Working days after exceptions.
    pub working_days: i64,
    /// Non-working days after exceptions.
    pub non_working_days: i64,
    /// Non-working days whose primary reason is a weekend rule.
    pub weekend_days: i64,
    /// Working days that exist only because of a `FORCE_WORKING` exception.
    pub forced_working_days: i64,
}

/// Longest look-ahead window for upcoming holidays; larger requests are capped.
pub const MAX_LOOKAHEAD_DAYS: i64 = 366;

/// Stateless resolver for holiday calendars.
pub struct HolidayCalendarResolver;

impl HolidayCalendarResolver {
    /// Resolves `[from, to]` for `class_id`.
    ///
    /// # Errors
    ///
    /// Returns `CalendarError::InvalidDateRange` if `to < from`.
    pub fn resolve(
        sources: &CalendarSources<'_>,
        from: NaiveDate,
        to: NaiveDate,
        class_id: Option<ClassId>,
    ) -> Result<ResolvedCalendar, CalendarError> {
        let range =
            DateRange::new(from, to).ok_or(CalendarError::InvalidDateRange { start: from, end: to })?;
        Ok(Self::resolve_range(sources, range, class_id))
    }

    /// Resolves an already validated range.
    #[must_use]
    pub fn resolve_range(
        sources: &CalendarSources<'_>,
        range: DateRange,
        class_id: Option<ClassId>,
    ) -> ResolvedCalendar {
        let mut stored: BTreeMap<NaiveDate, Vec<CalendarEntry>> = BTreeMap::new();
        for holiday in sources.holidays {
            for entry in HolidayService::expand(holiday, &range) {
                stored.entry(entry.date).or_default().push(entry);
            }
        }

        let days = range
            .days()
            .map(|date| {
                let mut entries = stored.remove(&date).unwrap_or_default();

                let weekend = WeekendPolicyEvaluator::evaluate_with(date, sources.policies);
                if let Some(subtype) = weekend.subtype {
                    entries.push(Self::generated_entry(date, subtype));
                }

                Self::apply_exception(date, entries, sources.exceptions, class_id)
            })
            .collect();

        ResolvedCalendar {
            range,
            class_id,
            days,
        }
    }

    /// Returns true if `date` is a working day for `class_id`.
    #[must_use]
    pub fn is_working_day(
        sources: &CalendarSources<'_>,
        date: NaiveDate,
        class_id: Option<ClassId>,
    ) -> bool {
        Self::resolve_range(sources, DateRange::single(date), class_id)
            .is_working_day(date)
            .unwrap_or(true)
    }

    /// The window `[today, today + lookahead_days]` scanned for upcoming
    /// holidays, with `lookahead_days` clamped to `0..=MAX_LOOKAHEAD_DAYS`.
    ///
    /// `None` only when the window would run past the last representable date.
    #[must_use]
    pub fn lookahead_range(today: NaiveDate, lookahead_days: i64) -> Option<DateRange> {
        let days = Duration::try_days(lookahead_days.clamp(0, MAX_LOOKAHEAD_DAYS))?;
        DateRange::new(today, today.checked_add_signed(days)?)
    }

    /// Next non-working days on or after `now`'s date, within `lookahead_days`.
    ///
    /// One entry per day (its primary reason), at most `limit` entries.
    /// Weekend-only days are skipped unless `include_weekends` is set.
    #[must_use]
    pub fn upcoming_holidays(
        sources: &CalendarSources<'_>,
        now: DateTime<Utc>,
        lookahead_days: i64,
        limit: usize,
        include_weekends: bool,
        class_id: Option<ClassId>,
    ) -> Vec<CalendarEntry> {
        let Some(range) = Self::lookahead_range(now.date_naive(), lookahead_days) else {
            return Vec::new();
        };

        Self::resolve_range(sources, range, class_id)
            .days
            .into_iter()
            .filter_map(|day| day.entries.into_iter().next())
            .filter(|entry| include_weekends || entry.source != EntrySource::Generated)
            .take(limit)
            .collect()
    }

    /// Working/non-working totals for one calendar month.
    #[must_use]
    pub fn month_summary(
        sources: &CalendarSources<'_>,
        year: i32,
        month: u32,
        class_id: Option<ClassId>,
    ) -> Option<MonthSummary> {
        let range = DateRange::month(year, month)?;
        let calendar = Self::resolve_range(sources, range, class_id);

        let weekend_days = calendar
            .non_working_days()
            .filter(|day| {
                day.primary_entry()
                    .is_some_and(|entry| entry.source == EntrySource::Generated)
            })
            .count() as i64;
        let forced_working_days = calendar
            .days
            .iter()
            .filter(|day| day.forced_working_by.is_some())
            .count() as i64;

        Some(MonthSummary {
            year,
            month,
            total_days: range.total_days(),
            working_days: calendar.working_day_count(),
            non_working_days: calendar.non_working_day_count(),
            weekend_days,
            forced_working_days,
        })
    }

    fn generated_entry(date: NaiveDate, subtype: WeekendSubtype) -> CalendarEntry {
        let description = match subtype {
            WeekendSubtype::Sunday => "Sunday".to_string(),
            WeekendSubtype::Saturday => {
                format!("{} Saturday", ordinal((date.day() - 1) / 7 + 1))
            }
        };
        CalendarEntry {
            key: HolidayKey::Generated { subtype, date },
            date,
            holiday_type: subtype.holiday_type(),
            description,
            source: EntrySource::Generated,
            span: DateRange::single(date),
        }
    }

    fn apply_exception(
        date: NaiveDate,
        mut entries: Vec<CalendarEntry>,
        exceptions: &[CalendarException],
        class_id: Option<ClassId>,
    ) -> CalendarDay {
        let mut forced_working_by = None;

        if let Some(exception) = ExceptionService::effective_exception(exceptions, date, class_id) {
            match exception.override_type {
                OverrideType::ForceWorking => {
                    entries.clear();
                    forced_working_by = Some(exception.id);
                }
                OverrideType::ForceHoliday => entries.push(CalendarEntry {
                    key: HolidayKey::Exception(exception.id),
                    date,
                    holiday_type: HolidayType::Other,
                    description: exception.reason.clone(),
                    source: EntrySource::Exception,
                    span: DateRange::single(date),
                }),
            }
        }

        entries.sort_by_key(|entry| entry.source);

        let status = if entries.is_empty() {
            DayStatus::Working
        } else {
            DayStatus::NonWorking
        };

        CalendarDay {
            date,
            status,
            entries,
            forced_working_by,
        }
    }
}

fn ordinal(n: u32) -> String {
    let suffix = match n {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::types::SaturdayOffPattern;
    use chrono::TimeZone;
    use leavedesk_shared::types::{
        CalendarExceptionId, HolidayId, OrganizationId, WorkingDayPolicyId,
    };
    use std::collections::BTreeSet;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn policy(pattern: SaturdayOffPattern) -> WorkingDayPolicy {
        WorkingDayPolicy {
            id: WorkingDayPolicyId::new(),
            organization_id: OrganizationId::new(),
            sunday_off: true,
            saturday_off_pattern: pattern,
            effective_from: d(2020, 1, 1),
            effective_to: None,
            created_at: Utc::now(),
        }
    }

    fn holiday(start: NaiveDate, end: NaiveDate, description: &str) -> Holiday {
        Holiday {
            id: HolidayId::new(),
            organization_id: OrganizationId::new(),
            start_date: start,
            end_date: end,
            holiday_type: HolidayType::NationalHoliday,
            description: description.to_string(),
        }
    }

    fn exception(
        date: NaiveDate,
        override_type: OverrideType,
        classes: &[ClassId],
    ) -> CalendarException {
        CalendarException {
            id: CalendarExceptionId::new(),
            organization_id: OrganizationId::new(),
            date,
            override_type,
            is_applicable_to_all_classes: classes.is_empty(),
            classes: classes.iter().copied().collect::<BTreeSet<_>>(),
            reason: "Compensatory working day".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_week_with_sunday_off_and_second_saturday_only() {
        let policies = [policy(SaturdayOffPattern::SecondOnly)];
        let sources = CalendarSources {
            policies: &policies,
            ..CalendarSources::default()
        };
        let calendar =
            HolidayCalendarResolver::resolve(&sources, d(2025, 1, 6), d(2025, 1, 12), None).unwrap();

        assert_eq!(calendar.days.len(), 7);
        assert_eq!(calendar.non_working_dates(), vec![d(2025, 1, 11), d(2025, 1, 12)]);
        assert_eq!(calendar.working_day_count(), 5);

        let saturday = calendar.day(d(2025, 1, 11)).unwrap();
        assert_eq!(saturday.entries[0].description, "2nd Saturday");
        assert_eq!(saturday.entries[0].key.to_string(), "saturday-2025-01-11");
        let sunday = calendar.day(d(2025, 1, 12)).unwrap();
        assert_eq!(sunday.entries[0].holiday_type, HolidayType::Sunday);
        assert_eq!(sunday.entries[0].key.to_string(), "sunday-2025-01-12");
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        let sources = CalendarSources::default();
        assert_eq!(
            HolidayCalendarResolver::resolve(&sources, d(2025, 1, 12), d(2025, 1, 6), None),
            Err(CalendarError::InvalidDateRange {
                start: d(2025, 1, 12),
                end: d(2025, 1, 6),
            })
        );
    }

    #[test]
    fn test_multi_day_stored_holiday_is_expanded() {
        let holidays = [holiday(d(2025, 1, 14), d(2025, 1, 16), "Pongal")];
        let sources = CalendarSources {
            holidays: &holidays,
            ..CalendarSources::default()
        };
        let calendar =
            HolidayCalendarResolver::resolve(&sources, d(2025, 1, 13), d(2025, 1, 17), None).unwrap();
        assert_eq!(
            calendar.non_working_dates(),
            vec![d(2025, 1, 14), d(2025, 1, 15), d(2025, 1, 16)]
        );
        let entry = calendar.day(d(2025, 1, 15)).unwrap().primary_entry().unwrap();
        assert_eq!(entry.source, EntrySource::Stored);
        assert_eq!(entry.span, DateRange::new(d(2025, 1, 14), d(2025, 1, 16)).unwrap());
    }

    #[test]
    fn test_stored_holiday_on_sunday_lists_both_reasons_stored_first() {
        let policies = [policy(SaturdayOffPattern::None)];
        let holidays = [holiday(d(2025, 1, 12), d(2025, 1, 12), "Youth Day")];
        let sources = CalendarSources {
            policies: &policies,
            holidays: &holidays,
            ..CalendarSources::default()
        };
        let calendar =
            HolidayCalendarResolver::resolve(&sources, d(2025, 1, 12), d(2025, 1, 12), None).unwrap();
        let day = calendar.day(d(2025, 1, 12)).unwrap();
        assert_eq!(day.entries.len(), 2);
        assert_eq!(day.entries[0].source, EntrySource::Stored);
        assert_eq!(day.entries[1].source, EntrySource::Generated);
        assert_eq!(calendar.non_working_day_count(), 1);
    }

    #[test]
    fn test_force_working_overrides_weekend_and_stored() {
        let policies = [policy(SaturdayOffPattern::All)];
        let holidays = [holiday(d(2025, 1, 11), d(2025, 1, 11), "Founders Day")];
        let exceptions = [exception(d(2025, 1, 11), OverrideType::ForceWorking, &[])];
        let sources = CalendarSources {
            policies: &policies,
            holidays: &holidays,
            exceptions: &exceptions,
        };
        let calendar =
            HolidayCalendarResolver::resolve(&sources, d(2025, 1, 11), d(2025, 1, 11), None).unwrap();
        let day = calendar.day(d(2025, 1, 11)).unwrap();
        assert!(day.is_working());
        assert!(day.entries.is_empty());
        assert_eq!(day.forced_working_by, Some(exceptions[0].id));
    }

    #[test]
    fn test_force_holiday_on_working_day() {
        let exceptions = [exception(d(2025, 1, 8), OverrideType::ForceHoliday, &[])];
        let sources = CalendarSources {
            exceptions: &exceptions,
            ..CalendarSources::default()
        };
        let calendar =
            HolidayCalendarResolver::resolve(&sources, d(2025, 1, 6), d(2025, 1, 10), None).unwrap();
        assert_eq!(calendar.non_working_dates(), vec![d(2025, 1, 8)]);
        let entry = calendar.day(d(2025, 1, 8)).unwrap().primary_entry().unwrap();
        assert_eq!(entry.source, EntrySource::Exception);
        assert_eq!(entry.description, "Compensatory working day");
        assert_eq!(entry.key, HolidayKey::Exception(exceptions[0].id));
    }

    #[test]
    fn test_class_scoped_exception_only_applies_to_that_class() {
        let class_a = ClassId::new();
        let policies = [policy(SaturdayOffPattern::All)];
        let exceptions = [exception(d(2025, 1, 11), OverrideType::ForceWorking, &[class_a])];
        let sources = CalendarSources {
            policies: &policies,
            exceptions: &exceptions,
            ..CalendarSources::default()
        };

        assert!(HolidayCalendarResolver::is_working_day(&sources, d(2025, 1, 11), Some(class_a)));
        assert!(!HolidayCalendarResolver::is_working_day(
            &sources,
            d(2025, 1, 11),
            Some(ClassId::new())
        ));
        assert!(!HolidayCalendarResolver::is_working_day(&sources, d(2025, 1, 11), None));
    }

    #[test]
    fn test_policy_change_mid_range() {
        let org = OrganizationId::new();
        let mut old = policy(SaturdayOffPattern::None);
        old.organization_id = org;
        old.effective_to = Some(d(2024, 12, 31));
        let mut new = policy(SaturdayOffPattern::All);
        new.organization_id = org;
        new.effective_from = d(2025, 1, 1);
        let policies = [old, new];
        let sources = CalendarSources {
            policies: &policies,
            ..CalendarSources::default()
        };
        // 2024-12-28 Sat (working under old), 2024-12-29 Sun, 2025-01-04 Sat, 2025-01-05 Sun
        let calendar =
            HolidayCalendarResolver::resolve(&sources, d(2024, 12, 28), d(2025, 1, 5), None).unwrap();
        assert_eq!(
            calendar.non_working_dates(),
            vec![d(2024, 12, 29), d(2025, 1, 4), d(2025, 1, 5)]
        );
    }

    #[test]
    fn test_day_lookup_outside_range() {
        let sources = CalendarSources::default();
        let calendar =
            HolidayCalendarResolver::resolve(&sources, d(2025, 1, 6), d(2025, 1, 7), None).unwrap();
        assert!(calendar.day(d(2025, 1, 5)).is_none());
        assert!(calendar.day(d(2025, 1, 8)).is_none());
        assert_eq!(calendar.is_working_day(d(2025, 1, 7)), Some(true));
    }

    #[test]
    fn test_upcoming_holidays_uses_explicit_now() {
        let policies = [policy(SaturdayOffPattern::None)];
        let holidays = [
            holiday(d(2025, 1, 1), d(2025, 1, 1), "New Year"),
            holiday(d(2025, 1, 14), d(2025, 1, 15), "Pongal"),
            holiday(d(2025, 1, 26), d(2025, 1, 26), "Republic Day"),
        ];
        let sources = CalendarSources {
            policies: &policies,
            holidays: &holidays,
            ..CalendarSources::default()
        };
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 9, 30, 0).unwrap();

        let upcoming =
            HolidayCalendarResolver::upcoming_holidays(&sources, now, 30, 10, false, None);
        let dates: Vec<_> = upcoming.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![d(2025, 1, 14), d(2025, 1, 15), d(2025, 1, 26)]);

        let with_weekends =
            HolidayCalendarResolver::upcoming_holidays(&sources, now, 30, 2, true, None);
        assert_eq!(with_weekends.len(), 2);
        assert_eq!(with_weekends[0].date, d(2025, 1, 12));
        assert_eq!(with_weekends[1].date, d(2025, 1, 14));
    }

    #[test]
    fn test_lookahead_is_capped() {
        let today = d(2025, 1, 10);
        let range = HolidayCalendarResolver::lookahead_range(today, i64::MAX).unwrap();
        assert_eq!(range.span_days(), MAX_LOOKAHEAD_DAYS);
        assert_eq!(
            HolidayCalendarResolver::lookahead_range(today, -5),
            Some(DateRange::single(today))
        );
        assert_eq!(HolidayCalendarResolver::lookahead_range(NaiveDate::MAX, 1), None);
    }

    #[test]
    fn test_upcoming_holidays_with_huge_lookahead() {
        let policies = [policy(SaturdayOffPattern::None)];
        let sources = CalendarSources {
            policies: &policies,
            ..CalendarSources::default()
        };
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 9, 30, 0).unwrap();

        let upcoming =
            HolidayCalendarResolver::upcoming_holidays(&sources, now, i64::MAX, 5, true, None);
        assert_eq!(upcoming.len(), 5);
        assert_eq!(upcoming[0].date, d(2025, 1, 12));

        let at_end = Utc.from_utc_datetime(&NaiveDate::MAX.and_hms_opt(0, 0, 0).unwrap());
        assert!(
            HolidayCalendarResolver::upcoming_holidays(&sources, at_end, 30, 5, true, None)
                .is_empty()
        );
    }

    #[test]
    fn test_month_summary() {
        let policies = [policy(SaturdayOffPattern::SecondAndFourth)];
        let holidays = [holiday(d(2025, 1, 14), d(2025, 1, 14), "Pongal")];
        let exceptions = [exception(d(2025, 1, 25), OverrideType::ForceWorking, &[])];
        let sources = CalendarSources {
            policies: &policies,
            holidays: &holidays,
            exceptions: &exceptions,
        };
        let summary = HolidayCalendarResolver::month_summary(&sources, 2025, 1, None).unwrap();
        // Sundays: 5, 12, 19, 26; 2nd/4th Saturdays: 11, 25 (25 forced working); Pongal 14
        assert_eq!(summary.total_days, 31);
        assert_eq!(summary.non_working_days, 6);
        assert_eq!(summary.weekend_days, 5);
        assert_eq!(summary.working_days, 25);
        assert_eq!(summary.forced_working_days, 1);
        assert!(HolidayCalendarResolver::month_summary(&sources, 2025, 13, None).is_none());
    }

    #[test]
    fn test_ordinal() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(4), "4th");
        assert_eq!(ordinal(5), "5th");
    }
}
