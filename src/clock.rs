//! Date source and formatting
//!
//! The watermark text and the derived output filenames both carry the run
//! date. The date is supplied through the [`Clock`] trait rather than read
//! from the system inside the rendering path, so filename and content
//! scenarios can be pinned to a fixed date.

use chrono::{Local, NaiveDate};

use crate::error::{Error, Result};

/// Source of "today" for a watermarking run.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Reads the host wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always reports the same date. Used by tests and the `--date` override.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Format a date in the watermark format: zero-padded `MM-DD-YYYY`.
/// Example: "01-15-2024"
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%m-%d-%Y").to_string()
}

/// Parse a date argument in either `MM-DD-YYYY` or ISO `YYYY-MM-DD` form.
pub fn parse_date_arg(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%m-%d-%Y") {
        return Ok(date);
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    Err(Error::InvalidDate(s.to_string()))
}
