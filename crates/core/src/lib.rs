//! Core business logic for Leavedesk.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here. Callers fetch
//! rows from storage, hand them to these services, and persist what comes back.
//!
//! # Modules
//!
//! - `calendar` - Weekend policies, stored holidays, calendar exceptions and the
//!   per-date working/non-working resolution built from them
//! - `leave` - Leave allocations, balances, working-day counting with overlap
//!   detection, and the leave request lifecycle

pub mod calendar;
pub mod leave;
