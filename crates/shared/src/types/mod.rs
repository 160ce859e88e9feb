//! Common types used across the application.

pub mod date;
pub mod days;
pub mod id;

pub use date::{DateRange, parse_iso_date};
pub use days::{HALF_DAY, ensure_day_amount, is_half_day_multiple};
pub use id::*;
