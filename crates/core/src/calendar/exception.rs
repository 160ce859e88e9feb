//! Calendar exception scoping and precedence.

use chrono::NaiveDate;
use leavedesk_shared::types::ClassId;

use crate::calendar::error::CalendarError;
use crate::calendar::types::CalendarException;

/// Stateless service for calendar exceptions.
pub struct ExceptionService;

impl ExceptionService {
    /// Validates an exception before it is stored.
    ///
    /// # Errors
    ///
    /// Returns `CalendarError::InvalidExceptionScope` when the exception is not
    /// applicable to all classes yet names no class.
    pub fn validate(exception: &CalendarException) -> Result<(), CalendarError> {
        if !exception.is_applicable_to_all_classes && exception.classes.is_empty() {
            return Err(CalendarError::InvalidExceptionScope {
                exception_id: exception.id,
                date: exception.date,
            });
        }
        Ok(())
    }

    /// Returns true if `exception` applies to a calendar resolved for `class_id`.
    ///
    /// Without a class only organization-wide exceptions apply.
    #[must_use]
    pub fn applies_to(exception: &CalendarException, class_id: Option<ClassId>) -> bool {
        exception.is_applicable_to_all_classes
            || class_id.is_some_and(|class| exception.classes.contains(&class))
    }

    /// Picks the exception that governs `date` for `class_id`.
    ///
    /// Only one should exist; if several do, the most recently created wins.
    #[must_use]
    pub fn effective_exception(
        exceptions: &[CalendarException],
        date: NaiveDate,
        class_id: Option<ClassId>,
    ) -> Option<&CalendarException> {
        exceptions
            .iter()
            .filter(|e| e.date == date && Self::applies_to(e, class_id))
            .max_by_key(|e| (e.created_at, e.id))
    }
}
