//! `SeaORM` entity definitions.

pub mod calendar_exception_classes;
pub mod calendar_exceptions;
pub mod holidays;
pub mod leave_allocation_roles;
pub mod leave_allocations;
pub mod leave_balances;
pub mod leave_requests;
pub mod leave_types;
pub mod sea_orm_active_enums;
pub mod working_day_policies;
