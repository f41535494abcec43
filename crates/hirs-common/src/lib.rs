//! Common types shared across the HIRS CTP monthly crates.

pub mod context;
pub mod error;
pub mod satellite;
pub mod time;

pub use context::{DailyContext, MonthlyContext, VersionSet};
pub use error::{HirsError, HirsResult};
pub use satellite::Satellite;
pub use time::{
    days_in_month, first_of_month, first_of_next_month, month_interval, parse_datetime,
    TimeInterval,
};
