pub mod kz_calendar;

pub use kz_calendar::{parse_date_arg, resolve_as_of_date};
