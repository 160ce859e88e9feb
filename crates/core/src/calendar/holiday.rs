//! Stored holiday validation, edit guards and per-day expansion.

use leavedesk_shared::types::{DateRange, HolidayId};

use crate::calendar::error::CalendarError;
use crate::calendar::types::{CalendarEntry, EntrySource, Holiday, HolidayKey};

/// Stateless service for stored holidays.
pub struct HolidayService;

impl HolidayService {
    /// Validates a holiday before it is created or updated.
    ///
    /// # Errors
    ///
    /// - `CalendarError::InvalidDateRange` if `end_date < start_date`
    /// - `CalendarError::WeekendTypeNotStorable` for SUNDAY/SATURDAY types
    /// - `CalendarError::DescriptionRequired` for a blank description
    pub fn validate(holiday: &Holiday) -> Result<(), CalendarError> {
        if holiday.end_date < holiday.start_date {
            return Err(CalendarError::InvalidDateRange {
                start: holiday.start_date,
                end: holiday.end_date,
            });
        }
        if holiday.holiday_type.is_weekend_derived() {
            return Err(CalendarError::WeekendTypeNotStorable(holiday.holiday_type));
        }
        if holiday.description.trim().is_empty() {
            return Err(CalendarError::DescriptionRequired);
        }
        Ok(())
    }

    /// Resolves an entry key to the stored holiday it designates.
    ///
    /// # Errors
    ///
    /// Returns `CalendarError::ReadOnlyHoliday` for generated weekend keys and
    /// exception keys; only stored holidays are edited through this path.
    pub fn editable_id(key: &HolidayKey) -> Result<HolidayId, CalendarError> {
        match key {
            HolidayKey::Stored(id) => Ok(*id),
            HolidayKey::Generated { .. } | HolidayKey::Exception(_) => {
                Err(CalendarError::ReadOnlyHoliday { key: *key })
            }
        }
    }

    /// Guards an update or delete of an already loaded holiday row.
    ///
    /// # Errors
    ///
    /// Returns `CalendarError::ReadOnlyHoliday` if the row carries a
    /// weekend-derived type.
    pub fn ensure_editable(holiday: &Holiday) -> Result<(), CalendarError> {
        if holiday.holiday_type.is_weekend_derived() {
            return Err(CalendarError::ReadOnlyHoliday {
                key: HolidayKey::Stored(holiday.id),
            });
        }
        Ok(())
    }

    /// Expands a stored holiday into one entry per affected day inside `window`.
    ///
    /// Each entry keeps the holiday's full interval in `span`.
    #[must_use]
    pub fn expand(holiday: &Holiday, window: &DateRange) -> Vec<CalendarEntry> {
        let Some(span) = holiday.span() else {
            return Vec::new();
        };
        let Some(affected) = span.intersection(window) else {
            return Vec::new();
        };
        affected
            .days()
            .map(|date| CalendarEntry {
                key: HolidayKey::Stored(holiday.id),
                date,
                holiday_type: holiday.holiday_type,
                description: holiday.description.clone(),
                source: EntrySource::Stored,
                span,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::types::{HolidayType, WeekendSubtype};
    use chrono::NaiveDate;
    use leavedesk_shared::types::OrganizationId;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn holiday(start: NaiveDate, end: NaiveDate, holiday_type: HolidayType) -> Holiday {
        Holiday {
            id: HolidayId::new(),
            organization_id: OrganizationId::new(),
            start_date: start,
            end_date: end,
            holiday_type,
            description: "Pongal".to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_multi_day_festival() {
        let h = holiday(d(2025, 1, 14), d(2025, 1, 16), HolidayType::Festival);
        assert!(HolidayService::validate(&h).is_ok());
    }

    #[test]
    fn test_validate_rejects_reversed_range() {
        let h = holiday(d(2025, 1, 16), d(2025, 1, 14), HolidayType::Festival);
        assert!(matches!(
            HolidayService::validate(&h),
            Err(CalendarError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_weekend_types() {
        for ty in [HolidayType::Sunday, HolidayType::Saturday] {
            let h = holiday(d(2025, 1, 12), d(2025, 1, 12), ty);
            assert_eq!(
                HolidayService::validate(&h),
                Err(CalendarError::WeekendTypeNotStorable(ty))
            );
        }
        let manual = holiday(d(2025, 1, 11), d(2025, 1, 11), HolidayType::SecondSaturday);
        assert!(HolidayService::validate(&manual).is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_description() {
        let mut h = holiday(d(2025, 1, 14), d(2025, 1, 14), HolidayType::Festival);
        h.description = "  ".to_string();
        assert_eq!(
            HolidayService::validate(&h),
            Err(CalendarError::DescriptionRequired)
        );
    }

    #[test]
    fn test_generated_key_is_read_only() {
        let key = HolidayKey::Generated {
            subtype: WeekendSubtype::Saturday,
            date: d(2025, 1, 11),
        };
        assert_eq!(
            HolidayService::editable_id(&key),
            Err(CalendarError::ReadOnlyHoliday { key })
        );
        let id = HolidayId::new();
        assert_eq!(HolidayService::editable_id(&HolidayKey::Stored(id)), Ok(id));
    }

    #[test]
    fn test_ensure_editable_rejects_weekend_rows() {
        let h = holiday(d(2025, 1, 12), d(2025, 1, 12), HolidayType::Sunday);
        assert!(matches!(
            HolidayService::ensure_editable(&h),
            Err(CalendarError::ReadOnlyHoliday { .. })
        ));
        let ok = holiday(d(2025, 1, 12), d(2025, 1, 12), HolidayType::NationalHoliday);
        assert!(HolidayService::ensure_editable(&ok).is_ok());
    }

    #[test]
    fn test_expand_clips_to_window_and_keeps_span() {
        let h = holiday(d(2025, 1, 14), d(2025, 1, 16), HolidayType::Festival);
        let window = DateRange::new(d(2025, 1, 15), d(2025, 1, 20)).unwrap();
        let entries = HolidayService::expand(&h, &window);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].date, d(2025, 1, 15));
        assert_eq!(entries[1].date, d(2025, 1, 16));
        assert!(entries.iter().all(|e| e.span == h.span().unwrap()));
        assert!(entries.iter().all(|e| e.source == EntrySource::Stored));
    }

    #[test]
    fn test_expand_outside_window_is_empty() {
        let h = holiday(d(2025, 1, 14), d(2025, 1, 16), HolidayType::Festival);
        let window = DateRange::new(d(2025, 2, 1), d(2025, 2, 5)).unwrap();
        assert!(HolidayService::expand(&h, &window).is_empty());
    }
}
